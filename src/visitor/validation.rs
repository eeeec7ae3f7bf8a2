//! Field validation for visitor drafts and searches.

use super::record::{NewVisitor, PassDraft};
use crate::config::OTHER_DESTINATION;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("valid regex"));
static NATIONAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{12}$").expect("valid regex"));
static PAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("valid regex"));
static DRIVING_LICENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2} [0-9]{11}$").expect("valid regex"));
static PASSPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][0-9]{7}$").expect("valid regex"));
static ELECTOR_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{7}$").expect("valid regex"));

/// Minimum visitor name length in characters.
pub const MIN_NAME_CHARS: usize = 5;

pub const NAME_MESSAGE: &str = "Name must be at least 5 characters long.";
pub const MOBILE_MESSAGE: &str = "Mobile number must be exactly 10 digits.";
pub const IDENTITY_MESSAGE: &str = "Enter a valid Aadhaar (12 digits), PAN (ABCDE1234F), \
Driving License (e.g., KA01 12345678901), Passport (A1234567), or Electors ID (e.g., ABC1234567).";
pub const SEARCH_IDENTITY_MESSAGE: &str = "Please enter a valid Aadhaar (12 digits) or PAN (ABCDE1234F).";
pub const DESTINATION_MESSAGE: &str = "Please select whom to visit.";
pub const OTHER_DESTINATION_MESSAGE: &str = "Please specify whom to visit.";
pub const PHOTO_MESSAGE: &str = "Please capture a photo before submitting.";

/// Accepted identity document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// 12-digit national ID (Aadhaar).
    NationalId,
    /// Permanent account number, `ABCDE1234F`.
    Pan,
    /// `KA01 12345678901`.
    DrivingLicence,
    /// `A1234567`.
    Passport,
    /// `ABC1234567`.
    ElectorId,
}

impl IdentityKind {
    /// Identifies the document format of `value`, if any.
    pub fn classify(value: &str) -> Option<Self> {
        [
            (Self::NationalId, &NATIONAL_ID),
            (Self::Pan, &PAN),
            (Self::DrivingLicence, &DRIVING_LICENCE),
            (Self::Passport, &PASSPORT),
            (Self::ElectorId, &ELECTOR_ID),
        ]
        .into_iter()
        .find(|(_, pattern)| pattern.is_match(value))
        .map(|(kind, _)| kind)
    }

    /// Whether records can be looked up by this kind of number.
    pub fn is_searchable(self) -> bool {
        matches!(self, Self::NationalId | Self::Pan)
    }
}

pub fn is_valid_name(name: &str) -> bool {
    name.chars().count() >= MIN_NAME_CHARS
}

pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE.is_match(mobile)
}

pub fn is_valid_identity(identity_number: &str) -> bool {
    IdentityKind::classify(identity_number).is_some()
}

/// Per-field validation messages; `None` means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_number: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.messages().next().is_none()
    }

    /// `(field, message)` pairs for every failing field.
    pub fn messages(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        [
            ("name", self.name),
            ("mobile", self.mobile),
            ("identityNumber", self.identity_number),
            ("destination", self.destination),
            ("photo", self.photo),
        ]
        .into_iter()
        .filter_map(|(field, message)| message.map(|m| (field, m)))
    }

    fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in self.messages() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Checks the identity and destination fields only.
pub fn validate_fields(draft: &PassDraft) -> Result<(), FieldErrors> {
    field_errors(draft).into_result()
}

/// Checks every field, including the photo.
pub fn validate(draft: &PassDraft) -> Result<(), FieldErrors> {
    let mut errors = field_errors(draft);
    if draft.photo.is_none() {
        errors.photo = Some(PHOTO_MESSAGE);
    }
    errors.into_result()
}

/// Checks a visitor received for storage. The destination must already
/// be resolved, so the `Other` sentinel itself is rejected.
pub fn validate_visitor(visitor: &NewVisitor) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    if !is_valid_name(&visitor.name) {
        errors.name = Some(NAME_MESSAGE);
    }
    if !is_valid_mobile(&visitor.mobile) {
        errors.mobile = Some(MOBILE_MESSAGE);
    }
    if !is_valid_identity(&visitor.identity_number) {
        errors.identity_number = Some(IDENTITY_MESSAGE);
    }
    let destination = visitor.destination.trim();
    if destination.is_empty() || destination == OTHER_DESTINATION {
        errors.destination = Some(OTHER_DESTINATION_MESSAGE);
    }
    errors.into_result()
}

fn field_errors(draft: &PassDraft) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if !is_valid_name(&draft.name) {
        errors.name = Some(NAME_MESSAGE);
    }
    if !is_valid_mobile(&draft.mobile) {
        errors.mobile = Some(MOBILE_MESSAGE);
    }
    if !is_valid_identity(&draft.identity_number) {
        errors.identity_number = Some(IDENTITY_MESSAGE);
    }
    if draft.destination().trim().is_empty() {
        errors.destination = Some(DESTINATION_MESSAGE);
    } else if draft.resolved_destination().is_empty() {
        errors.destination = Some(OTHER_DESTINATION_MESSAGE);
    }
    errors
}
