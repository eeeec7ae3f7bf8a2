//! Record assembly and submission.

use super::record::{NewVisitor, PassDraft, VisitorRecord};
use super::service::{ServiceError, VisitorService};
use super::validation::{self, FieldErrors};
use crate::capture::{Camera, CaptureSession, SessionError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Why a submission did not produce a pass code.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("invalid visitor details: {0}")]
    Invalid(FieldErrors),
    #[error("a submission is already in flight")]
    Pending,
    #[error(transparent)]
    Session(SessionError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<FieldErrors> for SubmitError {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

impl From<SessionError> for SubmitError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SubmissionPending => Self::Pending,
            other => Self::Session(other),
        }
    }
}

/// Validates drafts and submits them, one at a time.
#[derive(Debug, Default)]
pub struct RecordAssembler {
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is currently in flight.
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Builds the record to persist from a fully valid draft.
    pub fn assemble(&self, draft: &PassDraft) -> Result<NewVisitor, FieldErrors> {
        validation::validate(draft)?;
        let photo = draft.photo.clone().ok_or_else(|| FieldErrors {
            photo: Some(validation::PHOTO_MESSAGE),
            ..FieldErrors::default()
        })?;
        Ok(NewVisitor {
            name: draft.name.clone(),
            mobile: draft.mobile.clone(),
            identity_number: draft.identity_number.clone(),
            destination: draft.resolved_destination().to_string(),
            photo,
            timestamp: Utc::now(),
        })
    }

    /// Submits a draft that already carries its photo, such as one
    /// pre-filled from a previous visit.
    pub fn submit_draft<S>(&self, draft: &mut PassDraft, service: &S) -> Result<VisitorRecord, SubmitError>
    where
        S: VisitorService + ?Sized,
    {
        let _guard = self.acquire()?;
        self.send(draft, service)
    }

    /// Submits a draft with the session's captured photo.
    ///
    /// On failure the draft is left untouched and the session returns to
    /// its captured state so the operator can try again.
    pub fn submit<C, S>(
        &self,
        session: &mut CaptureSession<C>,
        draft: &mut PassDraft,
        service: &S,
    ) -> Result<VisitorRecord, SubmitError>
    where
        C: Camera,
        S: VisitorService + ?Sized,
    {
        let _guard = self.acquire()?;
        validation::validate_fields(draft)?;

        let photo = session.begin_submit()?;
        let previous = draft.photo.replace(photo);
        let result = self.send(draft, service);
        session.finish_submit(result.is_ok());
        if result.is_err() {
            draft.photo = previous;
        }
        result
    }

    fn acquire(&self) -> Result<InFlight<'_>, SubmitError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SubmitError::Pending)?;
        Ok(InFlight(&self.in_flight))
    }

    fn send<S>(&self, draft: &mut PassDraft, service: &S) -> Result<VisitorRecord, SubmitError>
    where
        S: VisitorService + ?Sized,
    {
        let visitor = self.assemble(draft)?;
        match service.create_visitor(&visitor) {
            Ok(code) => {
                tracing::info!(pass_code = %code, destination = %visitor.destination, "Visitor registered");
                draft.set_pass_code(code.clone());
                Ok(VisitorRecord::issued(visitor, code))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Visitor submission failed");
                Err(e.into())
            }
        }
    }
}
