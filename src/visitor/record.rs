//! Visitor record types.

use crate::capture::VisitorPhoto;
use crate::config::OTHER_DESTINATION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, unique pass token printed as the pass's scannable code.
///
/// Minted by the store when a record is created and never changed. Codes
/// received over the wire must parse as UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PassCode(String);

impl PassCode {
    /// Mints a fresh code.
    pub(crate) fn issue() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Rehydrates a code read back from storage.
    pub(crate) fn from_stored(code: String) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<String> for PassCode {
    type Error = uuid::Error;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Uuid::parse_str(&code)?;
        Ok(Self(code))
    }
}

impl From<PassCode> for String {
    fn from(code: PassCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for PassCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated visitor ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitor {
    pub name: String,
    pub mobile: String,
    pub identity_number: String,
    pub destination: String,
    pub photo: VisitorPhoto,
    pub timestamp: DateTime<Utc>,
}

/// A persisted visitor with its issued pass code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    pub name: String,
    pub mobile: String,
    pub identity_number: String,
    pub destination: String,
    pub photo: VisitorPhoto,
    pass_code: PassCode,
    pub timestamp: DateTime<Utc>,
}

impl VisitorRecord {
    /// Combines a submitted visitor with the code the store assigned to it.
    pub(crate) fn issued(visitor: NewVisitor, pass_code: PassCode) -> Self {
        Self {
            name: visitor.name,
            mobile: visitor.mobile,
            identity_number: visitor.identity_number,
            destination: visitor.destination,
            photo: visitor.photo,
            pass_code,
            timestamp: visitor.timestamp,
        }
    }

    pub fn pass_code(&self) -> &PassCode {
        &self.pass_code
    }
}

/// Form state for one visitor before a pass code is issued.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassDraft {
    pub name: String,
    pub mobile: String,
    pub identity_number: String,
    /// Selected destination from the configured list.
    destination: String,
    /// Free text used when the selection is the `Other` sentinel.
    pub other_destination: String,
    /// Photo to submit: freshly captured, or reused from a previous visit.
    pub photo: Option<VisitorPhoto>,
    pass_code: Option<PassCode>,
}

impl PassDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills identity fields and the stored photo from an earlier
    /// visit. The destination is left for the operator to choose.
    pub fn from_record(record: &VisitorRecord) -> Self {
        Self {
            name: record.name.clone(),
            mobile: record.mobile.clone(),
            identity_number: record.identity_number.clone(),
            photo: Some(record.photo.clone()),
            ..Self::default()
        }
    }

    /// Selects a destination; leaving `Other` clears its free text.
    pub fn select_destination(&mut self, destination: impl Into<String>) {
        self.destination = destination.into();
        if !self.is_other_destination() {
            self.other_destination.clear();
        }
    }

    /// The selected destination.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Whether the selection is the free-text sentinel.
    pub fn is_other_destination(&self) -> bool {
        self.destination == OTHER_DESTINATION
    }

    /// The destination that will be recorded.
    pub fn resolved_destination(&self) -> &str {
        if self.is_other_destination() {
            self.other_destination.trim()
        } else {
            self.destination.trim()
        }
    }

    /// Whether a photo from a previous visit is available for reuse.
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    /// The code issued for this draft, once submitted.
    pub fn pass_code(&self) -> Option<&PassCode> {
        self.pass_code.as_ref()
    }

    pub(crate) fn set_pass_code(&mut self, code: PassCode) {
        self.pass_code = Some(code);
    }

    /// Clears the form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
