//! The persistence collaborator seen from the front desk.

use super::record::{NewVisitor, PassCode, VisitorRecord};
use super::validation::{is_valid_mobile, IdentityKind, MOBILE_MESSAGE, SEARCH_IDENTITY_MESSAGE};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from the visitor service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not authorized")]
    Unauthorized,
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("service unreachable: {0}")]
    Transport(String),
    #[error("storage failure: {0}")]
    Store(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Invalid search input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SearchKeyError(pub &'static str);

/// Field a previous visitor is looked up by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchKey {
    Mobile(String),
    IdentityNumber(String),
}

impl SearchKey {
    pub fn mobile(value: &str) -> Result<Self, SearchKeyError> {
        let value = value.trim();
        if is_valid_mobile(value) {
            Ok(Self::Mobile(value.to_string()))
        } else {
            Err(SearchKeyError(MOBILE_MESSAGE))
        }
    }

    /// Only national IDs and PANs can be searched.
    pub fn identity_number(value: &str) -> Result<Self, SearchKeyError> {
        let value = value.trim();
        match IdentityKind::classify(value) {
            Some(kind) if kind.is_searchable() => Ok(Self::IdentityNumber(value.to_string())),
            _ => Err(SearchKeyError(SEARCH_IDENTITY_MESSAGE)),
        }
    }

    /// Query parameter name.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Mobile(_) => "mobile",
            Self::IdentityNumber(_) => "identityNumber",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Mobile(v) | Self::IdentityNumber(v) => v,
        }
    }
}

/// Stores visitors and issues pass codes.
pub trait VisitorService {
    /// Persists `visitor` and returns its newly minted pass code.
    fn create_visitor(&self, visitor: &NewVisitor) -> Result<PassCode, ServiceError>;

    /// Most recent record matching `key`, if any.
    fn search(&self, key: &SearchKey) -> Result<Option<VisitorRecord>, ServiceError>;

    /// Records whose entry falls on `date` in local time, oldest first.
    fn visitors_on(&self, date: NaiveDate) -> Result<Vec<VisitorRecord>, ServiceError>;
}

impl<S: VisitorService + ?Sized> VisitorService for &S {
    fn create_visitor(&self, visitor: &NewVisitor) -> Result<PassCode, ServiceError> {
        (**self).create_visitor(visitor)
    }

    fn search(&self, key: &SearchKey) -> Result<Option<VisitorRecord>, ServiceError> {
        (**self).search(key)
    }

    fn visitors_on(&self, date: NaiveDate) -> Result<Vec<VisitorRecord>, ServiceError> {
        (**self).visitors_on(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_key() {
        let key = SearchKey::mobile(" 9876543210 ").unwrap();
        assert_eq!(key.field(), "mobile");
        assert_eq!(key.value(), "9876543210");
        assert_eq!(SearchKey::mobile("98765"), Err(SearchKeyError(MOBILE_MESSAGE)));
    }

    #[test]
    fn test_identity_key_accepts_national_id_and_pan_only() {
        assert!(SearchKey::identity_number("123456789012").is_ok());
        assert_eq!(
            SearchKey::identity_number("ABCDE1234F").unwrap().field(),
            "identityNumber"
        );
        assert_eq!(
            SearchKey::identity_number("A1234567"),
            Err(SearchKeyError(SEARCH_IDENTITY_MESSAGE))
        );
    }
}
