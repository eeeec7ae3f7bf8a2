//! SQLite-backed visitor and user storage.

use crate::capture::VisitorPhoto;
use crate::visitor::{
    NewVisitor, PassCode, SearchKey, ServiceError, VisitorRecord, VisitorService,
};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error("user {0:?} already exists")]
    DuplicateUser(String),
}

const VISITOR_COLUMNS: &str =
    "name, mobile, identity_number, destination, photo, pass_code, timestamp_ms";

/// Persistent visitors and operator accounts.
pub struct VisitorStore {
    conn: Connection,
}

impl VisitorStore {
    /// Opens (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::create_tables(&conn)?;
        tracing::info!(path = %path.display(), "Visitor store opened");
        Ok(Self { conn })
    }

    /// A throwaway store for tests and demos.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::create_tables(&conn)?;
        Ok(Self { conn })
    }

    fn create_tables(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS visitors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                mobile TEXT NOT NULL,
                identity_number TEXT NOT NULL,
                destination TEXT NOT NULL,
                photo TEXT NOT NULL,
                pass_code TEXT NOT NULL UNIQUE,
                timestamp_ms INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS visitors_mobile ON visitors (mobile);
            CREATE INDEX IF NOT EXISTS visitors_identity ON visitors (identity_number);
            CREATE INDEX IF NOT EXISTS visitors_timestamp ON visitors (timestamp_ms);

            CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Stores `visitor` under a freshly minted pass code.
    pub fn insert(&self, visitor: &NewVisitor) -> Result<VisitorRecord, StoreError> {
        let code = PassCode::issue();
        self.conn.execute(
            "INSERT INTO visitors
             (name, mobile, identity_number, destination, photo, pass_code, timestamp_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                visitor.name,
                visitor.mobile,
                visitor.identity_number,
                visitor.destination,
                visitor.photo.as_str(),
                code.as_str(),
                visitor.timestamp.timestamp_millis(),
            ],
        )?;
        tracing::debug!(pass_code = %code, "Visitor stored");
        Ok(VisitorRecord::issued(visitor.clone(), code))
    }

    /// The most recent visit matching `key`.
    pub fn find_latest(&self, key: &SearchKey) -> Result<Option<VisitorRecord>, StoreError> {
        let column = match key {
            SearchKey::Mobile(_) => "mobile",
            SearchKey::IdentityNumber(_) => "identity_number",
        };
        let sql = format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors WHERE {column} = ?1
             ORDER BY timestamp_ms DESC, id DESC LIMIT 1"
        );
        self.conn
            .query_row(&sql, [key.value()], StoredVisitor::from_row)
            .optional()?
            .map(StoredVisitor::into_record)
            .transpose()
    }

    /// Visits in `[start, end)`, oldest first.
    pub fn between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<VisitorRecord>, StoreError> {
        let sql = format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors
             WHERE timestamp_ms >= ?1 AND timestamp_ms < ?2
             ORDER BY timestamp_ms ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![start.timestamp_millis(), end.timestamp_millis()],
            StoredVisitor::from_row,
        )?;
        let records = rows
            .map(|row| row?.into_record())
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(records)
    }

    /// Every visit, oldest first.
    pub fn all(&self) -> Result<Vec<VisitorRecord>, StoreError> {
        let sql = format!("SELECT {VISITOR_COLUMNS} FROM visitors ORDER BY timestamp_ms ASC, id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], StoredVisitor::from_row)?;
        let records = rows
            .map(|row| row?.into_record())
            .collect::<Result<Vec<_>, StoreError>>()?;
        Ok(records)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM visitors", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Adds an operator account. `password_hash` comes from
    /// [`hash_password`](super::auth::hash_password).
    pub fn add_user(&self, username: &str, password_hash: &str) -> Result<(), StoreError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now().timestamp_millis()],
        )?;
        if inserted == 0 {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }
        tracing::info!(username, "User added");
        Ok(())
    }

    pub fn password_hash(&self, username: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT password_hash FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()?)
    }
}

/// Raw column values, converted outside the row callback so that bad
/// data surfaces as [`StoreError::Corrupt`].
struct StoredVisitor {
    name: String,
    mobile: String,
    identity_number: String,
    destination: String,
    photo: String,
    pass_code: String,
    timestamp_ms: i64,
}

impl StoredVisitor {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            mobile: row.get(1)?,
            identity_number: row.get(2)?,
            destination: row.get(3)?,
            photo: row.get(4)?,
            pass_code: row.get(5)?,
            timestamp_ms: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<VisitorRecord, StoreError> {
        let photo = VisitorPhoto::from_data_url(self.photo)
            .map_err(|e| StoreError::Corrupt(format!("photo for {}: {e}", self.pass_code)))?;
        let timestamp = DateTime::from_timestamp_millis(self.timestamp_ms).ok_or_else(|| {
            StoreError::Corrupt(format!("timestamp {} for {}", self.timestamp_ms, self.pass_code))
        })?;
        let visitor = NewVisitor {
            name: self.name,
            mobile: self.mobile,
            identity_number: self.identity_number,
            destination: self.destination,
            photo,
            timestamp,
        };
        Ok(VisitorRecord::issued(visitor, PassCode::from_stored(self.pass_code)))
    }
}

/// UTC bounds `[start, end)` of the calendar day `date` in `offset`.
///
/// `None` when either bound falls outside the representable range.
pub fn local_day_bounds(
    date: NaiveDate,
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date
        .and_time(NaiveTime::MIN)
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
    let end = start.checked_add_signed(Duration::days(1))?;
    Some((Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)))
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err.to_string())
    }
}

/// [`VisitorService`] over a local store, without HTTP in between.
pub struct LocalVisitorService {
    store: Mutex<VisitorStore>,
    offset: FixedOffset,
}

impl LocalVisitorService {
    pub fn new(store: VisitorStore, offset: FixedOffset) -> Self {
        Self {
            store: Mutex::new(store),
            offset,
        }
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&VisitorStore) -> Result<T, StoreError>,
    ) -> Result<T, ServiceError> {
        let store = self
            .store
            .lock()
            .map_err(|_| ServiceError::Store("store lock poisoned".into()))?;
        Ok(f(&store)?)
    }
}

impl VisitorService for LocalVisitorService {
    fn create_visitor(&self, visitor: &NewVisitor) -> Result<PassCode, ServiceError> {
        crate::visitor::validation::validate_visitor(visitor).map_err(|e| ServiceError::Rejected {
            status: 400,
            message: e.to_string(),
        })?;
        self.with_store(|store| store.insert(visitor))
            .map(|record| record.pass_code().clone())
    }

    fn search(&self, key: &SearchKey) -> Result<Option<VisitorRecord>, ServiceError> {
        self.with_store(|store| store.find_latest(key))
    }

    fn visitors_on(&self, date: NaiveDate) -> Result<Vec<VisitorRecord>, ServiceError> {
        let (start, end) = local_day_bounds(date, self.offset).ok_or_else(|| ServiceError::Rejected {
            status: 400,
            message: format!("Date {date} is out of range"),
        })?;
        self.with_store(|store| store.between(start, end))
    }
}
