//! Treatment operations engine.
//!
//! Every operation runs the same pipeline: capability check, scope
//! resolution, validation, then the store. Failures are terminal for the
//! request; nothing is retried here.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{
    CreateTreatment, PatientEntry, Role, Treatment, TreatmentDetail, UpdateTreatment,
};
use crate::query::{ListRequest, Paginated};
use crate::scope::{self, resolve_scope, Caller};
use crate::stats::{StatsWindow, TreatmentStats};
use crate::validate::{validate_create, validate_update, ValidationReport};

/// Operation failures, ordered roughly by how early in the pipeline they
/// occur. Scope-exclusion and plain absence both surface as `NotFound` so a
/// caller cannot probe for the existence of records outside their scope.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("access denied: {0}")]
    Forbidden(&'static str),

    #[error("treatment record not found")]
    NotFound,

    #[error("validation failed")]
    Validation(ValidationReport),

    #[error("invalid patient reference: {0}")]
    Reference(String),

    #[error("database error: {0}")]
    Database(#[from] DbError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The operation engine, borrowing the store for the duration of one call.
pub struct TreatmentService<'a> {
    db: &'a mut Database,
}

impl<'a> TreatmentService<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// List treatments in the caller's scope, filtered and paginated.
    pub fn list(
        &self,
        caller: &Caller,
        request: &ListRequest,
    ) -> ServiceResult<Paginated<TreatmentDetail>> {
        if !scope::can_read(caller) {
            return Err(ServiceError::Forbidden(
                "only doctors and patients may view treatment records",
            ));
        }
        let scope = resolve_scope(caller, request.mine_only);
        Ok(self
            .db
            .list_treatments_detailed(&scope, &request.filter, request.page)?)
    }

    /// Fetch one treatment in the caller's scope.
    pub fn show(&self, caller: &Caller, id: &str) -> ServiceResult<TreatmentDetail> {
        if !scope::can_read(caller) {
            return Err(ServiceError::Forbidden(
                "only doctors and patients may view treatment records",
            ));
        }
        let scope = resolve_scope(caller, false);
        self.db
            .get_treatment_detailed(id, &scope)?
            .ok_or(ServiceError::NotFound)
    }

    /// Create a treatment record. The doctor is always the caller; any
    /// client-supplied doctor value has no field to land in.
    pub fn create(&mut self, caller: &Caller, input: &CreateTreatment) -> ServiceResult<TreatmentDetail> {
        if !scope::can_write(caller) {
            return Err(ServiceError::Forbidden(
                "only doctors may create treatment records",
            ));
        }
        let new = validate_create(input).map_err(ServiceError::Validation)?;
        if !self.db.person_has_role(&new.patient_id, Role::Patient)? {
            return Err(ServiceError::Reference(
                "selected person is not a patient".into(),
            ));
        }
        let treatment = Treatment::new(new, caller.id.clone());
        Ok(self.db.create_treatment(&treatment)?)
    }

    /// Apply a partial update to a treatment in the caller's scope.
    pub fn update(
        &mut self,
        caller: &Caller,
        id: &str,
        input: &UpdateTreatment,
    ) -> ServiceResult<TreatmentDetail> {
        if !scope::can_write(caller) {
            return Err(ServiceError::Forbidden(
                "only doctors may update treatment records",
            ));
        }
        let scope = resolve_scope(caller, false);
        // Missing records report as not-found before any field validation,
        // matching the original operation order.
        if self.db.get_treatment(id, &scope)?.is_none() {
            return Err(ServiceError::NotFound);
        }
        let patch = validate_update(input).map_err(ServiceError::Validation)?;
        self.db
            .update_treatment(id, &patch, &scope)?
            .ok_or(ServiceError::NotFound)
    }

    /// Soft-delete a treatment in the caller's scope.
    pub fn delete(&mut self, caller: &Caller, id: &str) -> ServiceResult<()> {
        if !scope::can_write(caller) {
            return Err(ServiceError::Forbidden(
                "only doctors may delete treatment records",
            ));
        }
        let scope = resolve_scope(caller, false);
        if self.db.soft_delete_treatment(id, &scope)? {
            Ok(())
        } else {
            Err(ServiceError::NotFound)
        }
    }

    /// Aggregate counts over the caller's scope, doctor-only.
    pub fn statistics(&self, caller: &Caller, mine_only: bool) -> ServiceResult<TreatmentStats> {
        if !caller.is_doctor() {
            return Err(ServiceError::Forbidden(
                "only doctors may view treatment statistics",
            ));
        }
        let scope = resolve_scope(caller, mine_only);
        let window = StatsWindow::containing(chrono::Utc::now().date_naive());
        Ok(self.db.treatment_stats(&scope, &window)?)
    }

    /// The patient directory, doctor-only.
    pub fn list_patients(&self, caller: &Caller) -> ServiceResult<Vec<PatientEntry>> {
        if !caller.is_doctor() {
            return Err(ServiceError::Forbidden(
                "only doctors may view the patient directory",
            ));
        }
        Ok(self
            .db
            .list_patients()?
            .iter()
            .map(PatientEntry::from)
            .collect())
    }
}
