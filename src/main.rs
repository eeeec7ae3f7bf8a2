//! Gate Pass CLI
//!
//! Runs the visitor backend and drives the front-desk workflow from a
//! terminal: capture, crop, submit, print.

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use gate_pass::{
    capture::{Camera, CaptureSession, MockCamera},
    config::FileConfig,
    crop::Point,
    pass::{CommandPrinter, FilePrinter, PassRenderer, PrintSink},
    register::{Column, DailyRegister, SortOrder},
    visitor::{HttpVisitorClient, PassDraft, RecordAssembler, SearchKey, VisitorRecord, VisitorService},
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "gate-pass", version, about = "Visitor registration and gate passes")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the visitor API.
    #[cfg(feature = "server")]
    Serve,
    /// Create an operator account in the local database.
    #[cfg(feature = "server")]
    AddUser {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Capture, crop and register a visitor, then print the pass.
    Register(RegisterArgs),
    /// Look up a previous visit.
    Search(SearchArgs),
    /// Show or export one day's register.
    DailyRegister(DailyRegisterArgs),
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    mobile: String,
    /// Aadhaar, PAN, driving licence, passport or elector ID.
    #[arg(long = "id")]
    identity_number: String,
    /// Whom to visit, as listed in `[pass] destinations`.
    #[arg(long)]
    destination: String,
    /// Free text when the destination is `Other`.
    #[arg(long)]
    other: Option<String>,
    /// Reuse the photo from this mobile number's previous visit.
    #[arg(long)]
    use_old_photo: bool,
    /// Move the crop rectangle's top-left corner to `X,Y` (display units).
    #[arg(long, value_parser = parse_point)]
    crop_at: Option<Point>,
    /// Use the synthetic camera instead of a real device.
    #[arg(long)]
    mock_camera: bool,
    /// Directory the pass page is written to.
    #[arg(long, default_value = "passes")]
    out: PathBuf,
    /// Print command such as `lp`; omit to only write the page.
    #[arg(long)]
    print_command: Option<String>,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long, conflicts_with = "id", required_unless_present = "id")]
    mobile: Option<String>,
    /// Aadhaar or PAN.
    #[arg(long)]
    id: Option<String>,
}

#[derive(Args)]
struct DailyRegisterArgs {
    /// Day to list (YYYY-MM-DD); defaults to today.
    date: Option<NaiveDate>,
    /// Case-insensitive text to match in any column.
    #[arg(long, default_value = "")]
    filter: String,
    /// Column to sort by: name, mobile, id, destination, time.
    #[arg(long)]
    sort: Option<Column>,
    #[arg(long)]
    descending: bool,
    /// Write the register as CSV here.
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s.split_once(',').ok_or("expected X,Y")?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Point::new(x, y))
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Gate Pass v{}", gate_pass::VERSION);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = FileConfig::load(cli.config.as_deref())?;
    match cli.command {
        #[cfg(feature = "server")]
        Command::Serve => serve(&config),
        #[cfg(feature = "server")]
        Command::AddUser { username, password } => {
            let store = gate_pass::server::VisitorStore::open(&config.server.database_path)?;
            store.add_user(&username, &gate_pass::server::hash_password(&password))?;
            println!("User {username} added");
            Ok(())
        }
        Command::Register(args) => register(&config, args),
        Command::Search(args) => search(&config, args),
        Command::DailyRegister(args) => daily_register(&config, args),
    }
}

#[cfg(feature = "server")]
fn serve(config: &FileConfig) -> CliResult<()> {
    use gate_pass::metrics::MetricsRegistry;
    use gate_pass::server::{AppState, PassServer, VisitorStore};

    let store = VisitorStore::open(&config.server.database_path)?;
    let state = AppState::new(store, &config.server, &config.pass, MetricsRegistry::new()?)?;
    let server = PassServer::new(config.server.bind_addr, state, config.server.body_limit_bytes);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server.run())?;
    Ok(())
}

fn connect(config: &FileConfig) -> CliResult<HttpVisitorClient> {
    let mut client = HttpVisitorClient::new(&config.client.base_url);
    client.login(&config.client.username, &config.client.password)?;
    Ok(client)
}

fn register(config: &FileConfig, args: RegisterArgs) -> CliResult<()> {
    if !config.pass.destinations.iter().any(|d| d == &args.destination) {
        warn!(destination = %args.destination, "Destination is not in the configured list");
    }

    let client = connect(config)?;
    let assembler = RecordAssembler::new();

    let record = if args.use_old_photo {
        let key = SearchKey::mobile(&args.mobile)?;
        let previous = client
            .search(&key)?
            .ok_or("no previous visit with a photo for this mobile number")?;
        let mut draft = fill_draft(PassDraft::from_record(&previous), &args);
        assembler.submit_draft(&mut draft, &client)?
    } else {
        let mut draft = fill_draft(PassDraft::new(), &args);
        if use_device_camera(&args) {
            capture_and_submit(device_camera()?, config, &args, &mut draft, &assembler, &client)?
        } else {
            capture_and_submit(MockCamera::new(), config, &args, &mut draft, &assembler, &client)?
        }
    };

    let pass = PassRenderer::new(&config.pass)?.render(&record)?;
    println!("{}", pass.to_text());
    match &args.print_command {
        Some(program) => CommandPrinter::new(program.as_str(), &args.out).print(&pass)?,
        None => FilePrinter::new(&args.out).print(&pass)?,
    }
    Ok(())
}

fn fill_draft(mut draft: PassDraft, args: &RegisterArgs) -> PassDraft {
    draft.name = args.name.clone();
    draft.mobile = args.mobile.clone();
    draft.identity_number = args.identity_number.clone();
    draft.select_destination(args.destination.as_str());
    if let Some(other) = &args.other {
        draft.other_destination = other.clone();
    }
    draft
}

#[cfg(feature = "camera")]
fn use_device_camera(args: &RegisterArgs) -> bool {
    !args.mock_camera
}

#[cfg(not(feature = "camera"))]
fn use_device_camera(args: &RegisterArgs) -> bool {
    if !args.mock_camera {
        warn!("Built without the `camera` feature, using the synthetic camera");
    }
    false
}

#[cfg(feature = "camera")]
fn device_camera() -> CliResult<gate_pass::capture::DeviceCamera> {
    Ok(gate_pass::capture::DeviceCamera::new())
}

#[cfg(not(feature = "camera"))]
fn device_camera() -> CliResult<MockCamera> {
    Err("camera support not compiled in".into())
}

fn capture_and_submit<C: Camera>(
    camera: C,
    config: &FileConfig,
    args: &RegisterArgs,
    draft: &mut PassDraft,
    assembler: &RecordAssembler,
    service: &HttpVisitorClient,
) -> CliResult<VisitorRecord> {
    let aborted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&aborted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
    let check = |session: &mut CaptureSession<C>| -> CliResult<()> {
        if aborted.load(Ordering::SeqCst) {
            session.abort();
            return Err("registration cancelled".into());
        }
        Ok(())
    };

    let mut session = CaptureSession::new(camera, config.capture.clone(), config.crop.clone());
    session.start_camera()?;
    check(&mut session)?;
    session.capture_photo()?;
    check(&mut session)?;

    if let Some(target) = args.crop_at {
        let origin = session
            .crop_region()
            .map(|region| region.origin())
            .ok_or("crop region missing after capture")?;
        let grab = Point::new(origin.x + 1.0, origin.y + 1.0);
        session.pointer_down(grab)?;
        session.pointer_move(Point::new(target.x + 1.0, target.y + 1.0));
        session.pointer_up();
    }
    session.apply_crop()?;
    check(&mut session)?;

    Ok(assembler.submit(&mut session, draft, service)?)
}

fn search(config: &FileConfig, args: SearchArgs) -> CliResult<()> {
    let key = match (&args.mobile, &args.id) {
        (Some(mobile), _) => SearchKey::mobile(mobile)?,
        (None, Some(id)) => SearchKey::identity_number(id)?,
        (None, None) => return Err("pass --mobile or --id".into()),
    };
    let client = connect(config)?;
    match client.search(&key)? {
        Some(record) => {
            println!("Name:          {}", record.name);
            println!("Mobile:        {}", record.mobile);
            println!("ID Number:     {}", record.identity_number);
            println!("Last visited:  {}", record.destination);
            println!("Pass code:     {}", record.pass_code());
            println!("Entry (UTC):   {}", record.timestamp.format("%d %b %Y, %H:%M"));
        }
        None => println!("No previous visit found"),
    }
    Ok(())
}

fn daily_register(config: &FileConfig, args: DailyRegisterArgs) -> CliResult<()> {
    let offset = config.pass.offset()?;
    let date = args
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&offset).date_naive());

    let client = connect(config)?;
    let records = client.visitors_on(date)?;
    let register = DailyRegister::new(date, &records, offset);

    let order = if args.descending {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    let rows = register.view(&args.filter, args.sort.map(|column| (column, order)));

    match &args.csv {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            register.write_csv(file, &rows)?;
            info!(path = %path.display(), rows = rows.len(), "Register exported");
        }
        None => {
            println!("{}", register.title());
            println!("{:<24} {:<12} {:<18} {:<28} {}", "Name", "Mobile", "ID", "Whom To Visit", "Entry Time");
            for row in &rows {
                println!(
                    "{:<24} {:<12} {:<18} {:<28} {}",
                    row.name,
                    row.mobile,
                    row.identity_number,
                    row.destination,
                    row.entry_time.format("%H:%M")
                );
            }
            println!("{} of {} visitors", rows.len(), register.len());
        }
    }
    Ok(())
}
