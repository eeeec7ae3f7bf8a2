//! Visitor records: typed draft, validation, assembly and submission.
//!
//! A [`PassDraft`] collects the identity fields, the [`RecordAssembler`]
//! validates it, attaches the photo and submits it to a
//! [`VisitorService`], which answers with the record's [`PassCode`].

mod assembler;
mod client;
mod record;
mod service;
pub mod validation;

pub use assembler::{RecordAssembler, SubmitError};
pub use client::HttpVisitorClient;
pub use record::{NewVisitor, PassCode, PassDraft, VisitorRecord};
pub use service::{SearchKey, SearchKeyError, ServiceError, VisitorService};
pub use validation::{FieldErrors, IdentityKind};
