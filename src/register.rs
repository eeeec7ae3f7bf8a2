//! Daily visitor register: one day's entries as a filterable, sortable
//! table with CSV export.

use crate::visitor::VisitorRecord;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("failed to write register: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write register: {0}")]
    Io(#[from] std::io::Error),
}

/// Register columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Mobile,
    Id,
    WhomToVisit,
    EntryTime,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Name,
        Column::Mobile,
        Column::Id,
        Column::WhomToVisit,
        Column::EntryTime,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Name => "Name",
            Column::Mobile => "Mobile",
            Column::Id => "ID",
            Column::WhomToVisit => "Whom To Visit",
            Column::EntryTime => "Entry Time",
        }
    }
}

impl std::str::FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Column::Name),
            "mobile" => Ok(Column::Mobile),
            "id" => Ok(Column::Id),
            "whom-to-visit" | "destination" => Ok(Column::WhomToVisit),
            "entry-time" | "time" => Ok(Column::EntryTime),
            other => Err(format!("unknown column: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One register line.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterRow {
    pub name: String,
    pub mobile: String,
    pub identity_number: String,
    pub destination: String,
    /// Local entry time.
    pub entry_time: NaiveDateTime,
}

impl RegisterRow {
    fn text(&self, column: Column) -> String {
        match column {
            Column::Name => self.name.clone(),
            Column::Mobile => self.mobile.clone(),
            Column::Id => self.identity_number.clone(),
            Column::WhomToVisit => self.destination.clone(),
            Column::EntryTime => self.entry_time.format("%H:%M").to_string(),
        }
    }

    fn matches(&self, needle: &str) -> bool {
        Column::ALL
            .iter()
            .any(|&c| self.text(c).to_lowercase().contains(needle))
    }
}

/// Visitors who entered on one calendar day.
#[derive(Debug, Clone)]
pub struct DailyRegister {
    date: NaiveDate,
    rows: Vec<RegisterRow>,
}

impl DailyRegister {
    /// Builds the register for `date` from records, converting entry times
    /// into `offset`.
    pub fn new(date: NaiveDate, records: &[VisitorRecord], offset: FixedOffset) -> Self {
        let rows = records
            .iter()
            .map(|r| RegisterRow {
                name: r.name.clone(),
                mobile: r.mobile.clone(),
                identity_number: r.identity_number.clone(),
                destination: r.destination.clone(),
                entry_time: r.timestamp.with_timezone(&offset).naive_local(),
            })
            .collect();
        Self { date, rows }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn rows(&self) -> &[RegisterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn title(&self) -> String {
        format!("Daily Visitor Register for {}", self.date.format("%d-%m-%Y"))
    }

    /// Rows containing `query` in any column, ignoring case, optionally
    /// sorted by one column.
    pub fn view(&self, query: &str, sort: Option<(Column, SortOrder)>) -> Vec<&RegisterRow> {
        let needle = query.trim().to_lowercase();
        let mut rows: Vec<&RegisterRow> = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || row.matches(&needle))
            .collect();

        if let Some((column, order)) = sort {
            rows.sort_by(|a, b| {
                let ordering = match column {
                    Column::EntryTime => a.entry_time.cmp(&b.entry_time),
                    _ => a.text(column).to_lowercase().cmp(&b.text(column).to_lowercase()),
                };
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }
        rows
    }

    /// Writes the title row, the header row and `rows` as CSV.
    pub fn write_csv<W: Write>(&self, writer: W, rows: &[&RegisterRow]) -> Result<(), RegisterError> {
        let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        csv.write_record([self.title()])?;
        csv.write_record(Column::ALL.iter().map(|c| c.header()))?;
        for row in rows {
            csv.write_record(Column::ALL.iter().map(|&c| row.text(c)))?;
        }
        csv.flush()?;
        Ok(())
    }

    /// The whole register as CSV text.
    pub fn to_csv(&self) -> Result<String, RegisterError> {
        let mut buf = Vec::new();
        let rows: Vec<&RegisterRow> = self.rows.iter().collect();
        self.write_csv(&mut buf, &rows)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Suggested export file name, e.g. `Visitor_Register_15-03-2024.csv`.
    pub fn file_name(&self) -> String {
        format!("Visitor_Register_{}.csv", self.date.format("%d-%m-%Y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::VisitorPhoto;
    use crate::visitor::{NewVisitor, PassCode};
    use chrono::{TimeZone, Utc};

    fn record(name: &str, destination: &str, hour: u32, minute: u32) -> VisitorRecord {
        VisitorRecord::issued(
            NewVisitor {
                name: name.into(),
                mobile: "9876543210".into(),
                identity_number: "123456789012".into(),
                destination: destination.into(),
                photo: VisitorPhoto::from_data_url("data:image/png;base64,AAAA").unwrap(),
                timestamp: Utc.with_ymd_and_hms(2024, 3, 15, hour, minute, 0).unwrap(),
            },
            PassCode::issue(),
        )
    }

    fn register() -> DailyRegister {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let records = vec![
            record("Asha Patil", "QCC", 4, 0),
            record("Vikram Rao", "GMIDC-Sup Engr", 5, 30),
            record("Meena Joshi", "AID", 3, 45),
        ];
        DailyRegister::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), &records, ist)
    }

    #[test]
    fn test_title_and_local_times() {
        let register = register();
        assert_eq!(register.title(), "Daily Visitor Register for 15-03-2024");
        assert_eq!(register.len(), 3);
        assert_eq!(register.rows()[0].text(Column::EntryTime), "09:30");
    }

    #[test]
    fn test_filter_is_case_insensitive_across_columns() {
        let register = register();
        let names: Vec<_> = register.view("qcc", None).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Asha Patil"]);
        assert_eq!(register.view("  ", None).len(), 3);
        assert_eq!(register.view("9876", None).len(), 3);
        assert!(register.view("nobody", None).is_empty());
    }

    #[test]
    fn test_sort_by_column() {
        let register = register();
        let by_time: Vec<_> = register
            .view("", Some((Column::EntryTime, SortOrder::Ascending)))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(by_time, ["Meena Joshi", "Asha Patil", "Vikram Rao"]);

        let by_name: Vec<_> = register
            .view("", Some((Column::Name, SortOrder::Descending)))
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(by_name, ["Vikram Rao", "Meena Joshi", "Asha Patil"]);
    }

    #[test]
    fn test_csv_export() {
        let csv = register().to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Daily Visitor Register for 15-03-2024"));
        assert_eq!(lines.next(), Some("Name,Mobile,ID,Whom To Visit,Entry Time"));
        assert_eq!(lines.next(), Some("Asha Patil,9876543210,123456789012,QCC,09:30"));
        assert_eq!(csv.lines().count(), 5);
    }

    #[test]
    fn test_column_names_parse() {
        assert_eq!("time".parse::<Column>(), Ok(Column::EntryTime));
        assert_eq!("Name".parse::<Column>(), Ok(Column::Name));
        assert!("colour".parse::<Column>().is_err());
    }
}
