//! Pass layout.

use super::validity::valid_until;
use crate::config::{ConfigError, PassConfig};
use crate::visitor::VisitorRecord;
use chrono::{FixedOffset, NaiveDateTime, NaiveTime};
use qrcode::render::svg;
use qrcode::QrCode;
use thiserror::Error;

/// Timestamp format printed on the pass, e.g. `15 Mar 2024, 14:05`.
pub const TIMESTAMP_FORMAT: &str = "%d %b %Y, %H:%M";

/// Side length of the scannable code in SVG units.
const CODE_SIZE: u32 = 160;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("record has no pass code")]
    MissingCode,
    #[error("failed to encode pass code: {0}")]
    Code(#[from] qrcode::types::QrError),
    #[error("validity window of pass issued at {0} is out of range")]
    ValidityOutOfRange(NaiveDateTime),
}

/// Lays out records as printable passes.
#[derive(Debug, Clone)]
pub struct PassRenderer {
    title: String,
    site: String,
    validity_hours: u32,
    cutoff: NaiveTime,
    offset: FixedOffset,
}

impl PassRenderer {
    pub fn new(config: &PassConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            title: config.title.clone(),
            site: config.site.clone(),
            validity_hours: config.validity_hours,
            cutoff: config.cutoff_time()?,
            offset: config.offset()?,
        })
    }

    pub fn render(&self, record: &VisitorRecord) -> Result<RenderedPass, RenderError> {
        if record.pass_code().is_empty() {
            return Err(RenderError::MissingCode);
        }
        let code = record.pass_code().to_string();
        let code_svg = QrCode::new(code.as_bytes())?
            .render::<svg::Color<'_>>()
            .min_dimensions(CODE_SIZE, CODE_SIZE)
            .build();

        let issued_at = record.timestamp.with_timezone(&self.offset).naive_local();
        let valid_until = valid_until(issued_at, self.validity_hours, self.cutoff)
            .ok_or(RenderError::ValidityOutOfRange(issued_at))?;
        let pass = RenderedPass {
            title: self.title.clone(),
            site: self.site.clone(),
            photo: record.photo.as_str().to_string(),
            fields: vec![
                ("Name", record.name.clone()),
                ("Mobile", record.mobile.clone()),
                ("ID Number", record.identity_number.clone()),
                ("To Visit", record.destination.clone()),
            ],
            issued_at,
            valid_until,
            code,
            code_svg,
        };
        tracing::debug!(pass_code = %pass.code, valid_until = %pass.valid_until, "Pass rendered");
        Ok(pass)
    }
}

/// A laid-out pass, ready for a print sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPass {
    pub title: String,
    pub site: String,
    /// Photo as a PNG data URL.
    pub photo: String,
    /// Labelled field lines in print order.
    pub fields: Vec<(&'static str, String)>,
    /// Local issue time.
    pub issued_at: NaiveDateTime,
    pub valid_until: NaiveDateTime,
    code: String,
    code_svg: String,
}

impl RenderedPass {
    /// The value encoded in the scannable code.
    pub fn code_value(&self) -> &str {
        &self.code
    }

    /// The scannable code as an SVG document.
    pub fn code_svg(&self) -> &str {
        &self.code_svg
    }

    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn issued_text(&self) -> String {
        self.issued_at.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn valid_until_text(&self) -> String {
        if self.valid_until.date() == self.issued_at.date() {
            format!("Valid until {} on date of issue", self.valid_until.format("%H:%M"))
        } else {
            format!("Valid until {}", self.valid_until.format(TIMESTAMP_FORMAT))
        }
    }

    /// Plain text rendition for terminals and logs.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.site, self.title);
        for (label, value) in &self.fields {
            out.push_str(&format!("{label}: {value}\n"));
        }
        out.push_str(&format!("Time: {}\n{}\nCode: {}\n", self.issued_text(), self.valid_until_text(), self.code));
        out
    }

    /// A6 printable HTML page.
    pub fn to_html(&self) -> String {
        let mut fields = String::new();
        for (label, value) in &self.fields {
            fields.push_str(&format!(
                "    <p class=\"field\">{}: {}</p>\n",
                escape(label),
                escape(value)
            ));
        }
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{title}</title>
  <style>
    @page {{ size: 100mm 140mm; margin: 0; }}
    .pass {{ width: 100mm; height: 140mm; box-sizing: border-box; border: 2px solid #000; border-radius: 8px; padding: 4mm; text-align: center; font-family: sans-serif; }}
    .pass img.photo {{ height: 120px; border-radius: 8px; object-fit: contain; }}
    .pass p {{ margin: 1mm 0; }}
    .code svg {{ width: 30mm; height: 30mm; }}
  </style>
</head>
<body>
  <div class="pass">
    <p class="site">{site}</p>
    <h2>{title}</h2>
    <img class="photo" src="{photo}" alt="Visitor">
{fields}    <p><strong>Time: {issued}</strong></p>
    <p>{valid}</p>
    <div class="code">{svg}</div>
  </div>
</body>
</html>
"#,
            title = escape(&self.title),
            site = escape(&self.site),
            photo = escape(&self.photo),
            fields = fields,
            issued = self.issued_text(),
            valid = self.valid_until_text(),
            svg = self.code_svg,
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
