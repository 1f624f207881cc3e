//! Otoclinic Core Library
//!
//! Role-scoped treatment encounter records for an ENT clinic, backed by
//! SQLite. Transport is a collaborator concern: callers hand every operation
//! an explicit identity and get back a response envelope.
//!
//! # Architecture
//!
//! ```text
//! Caller (id + role set)
//!        │
//!  [capability check]      write ops and statistics require DOCTOR
//!        │
//!  [scope resolver]        row-level visibility: all / own / deny
//!        │
//!  [filter composer]───[validation gate]
//!        │
//!  [record store]          SQLite, active-rows-only by default
//!        │
//!  [response envelope]     success + message + data, or error taxonomy
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite store (persons, treatments, stats query)
//! - [`models`]: Domain types (Treatment, Person, enums, payloads)
//! - [`scope`]: Caller identity, capabilities, access scope resolver
//! - [`query`]: Filter composition and pagination
//! - [`validate`]: Field validation gate with aggregated reports
//! - [`stats`]: Aggregate counts and calendar windows
//! - [`service`]: The operation engine
//! - [`response`]: Response envelope and error taxonomy

pub mod db;
pub mod models;
pub mod query;
pub mod response;
pub mod scope;
pub mod service;
pub mod stats;
pub mod validate;

// Re-export commonly used types
pub use db::Database;
pub use models::{
    CreateTreatment, EarSide, PatientEntry, Person, PersonSummary, Role, RowState, Treatment,
    TreatmentDetail, TreatmentStatus, UpdateTreatment,
};
pub use query::{ListRequest, Paginated, Pagination, TreatmentFilter, PAGE_SIZE};
pub use response::{ApiResponse, ErrorKind};
pub use scope::{resolve_scope, AccessScope, Caller};
pub use service::{ServiceError, ServiceResult, TreatmentService};
pub use stats::TreatmentStats;
pub use validate::ValidationReport;

use std::path::Path;
use std::sync::{Arc, Mutex};

use response::STORE_FAILURE_MESSAGE;

// =========================================================================
// Factory Functions
// =========================================================================

/// Open or create a store at the given path.
pub fn open_store<P: AsRef<Path>>(path: P) -> Result<ClinicCore, db::DbError> {
    let db = Database::open(path)?;
    Ok(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    })
}

/// Create an in-memory store (for testing).
pub fn open_store_in_memory() -> Result<ClinicCore, db::DbError> {
    let db = Database::open_in_memory()?;
    Ok(ClinicCore {
        db: Arc::new(Mutex::new(db)),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store handle exposing the clinic operations.
///
/// Cheap to clone; an embedding transport layer holds one per process and
/// passes the authenticated [`Caller`] into each call.
#[derive(Clone)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
}

impl ClinicCore {
    // =========================================================================
    // Treatment Operations
    // =========================================================================

    /// List treatments visible to the caller, filtered and paginated.
    pub fn list_treatments(
        &self,
        caller: &Caller,
        request: &ListRequest,
    ) -> ApiResponse<Vec<TreatmentDetail>> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        match TreatmentService::new(&mut db).list(caller, request) {
            Ok(page) => ApiResponse::ok_page("Treatment records retrieved successfully", page),
            Err(err) => convert(err),
        }
    }

    /// Create a treatment record; the caller becomes its doctor.
    pub fn create_treatment(
        &self,
        caller: &Caller,
        input: &CreateTreatment,
    ) -> ApiResponse<TreatmentDetail> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        respond(
            TreatmentService::new(&mut db).create(caller, input),
            "Treatment record created successfully",
        )
    }

    /// Fetch one treatment by id within the caller's scope.
    pub fn show_treatment(&self, caller: &Caller, id: &str) -> ApiResponse<TreatmentDetail> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        respond(
            TreatmentService::new(&mut db).show(caller, id),
            "Treatment record retrieved successfully",
        )
    }

    /// Partially update a treatment within the caller's scope.
    pub fn update_treatment(
        &self,
        caller: &Caller,
        id: &str,
        input: &UpdateTreatment,
    ) -> ApiResponse<TreatmentDetail> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        respond(
            TreatmentService::new(&mut db).update(caller, id, input),
            "Treatment record updated successfully",
        )
    }

    /// Soft-delete a treatment within the caller's scope.
    pub fn delete_treatment(&self, caller: &Caller, id: &str) -> ApiResponse<()> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        match TreatmentService::new(&mut db).delete(caller, id) {
            Ok(()) => ApiResponse::ok_empty("Treatment record deleted successfully"),
            Err(err) => convert(err),
        }
    }

    /// Aggregate counts over the caller's scope; doctor-only.
    pub fn treatment_statistics(&self, caller: &Caller, mine_only: bool) -> ApiResponse<TreatmentStats> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        respond(
            TreatmentService::new(&mut db).statistics(caller, mine_only),
            "Treatment statistics retrieved successfully",
        )
    }

    /// The patient directory; doctor-only.
    pub fn list_patients(&self, caller: &Caller) -> ApiResponse<Vec<PatientEntry>> {
        let Ok(mut db) = self.db.lock() else {
            return poisoned();
        };
        respond(
            TreatmentService::new(&mut db).list_patients(caller),
            "Patient directory retrieved successfully",
        )
    }

    // =========================================================================
    // Person Directory
    // =========================================================================

    /// Add a person to the directory. Persons are normally owned by a
    /// collaborator subsystem sharing this store; this hook exists for
    /// seeding and embedding scenarios.
    pub fn add_person(&self, person: &Person) -> ApiResponse<Person> {
        let Ok(db) = self.db.lock() else {
            return poisoned();
        };
        respond(
            db.insert_person(person)
                .map(|_| person.clone())
                .map_err(ServiceError::from),
            "Person added successfully",
        )
    }
}

fn respond<T>(result: ServiceResult<T>, ok_message: &str) -> ApiResponse<T> {
    match result {
        Ok(data) => ApiResponse::ok(ok_message, data),
        Err(err) => convert(err),
    }
}

/// Convert a failure into its envelope, logging store causes instead of
/// exposing them.
fn convert<T>(err: ServiceError) -> ApiResponse<T> {
    match &err {
        ServiceError::Database(cause) => {
            tracing::error!(error = %cause, "treatment store operation failed");
        }
        ServiceError::Forbidden(reason) => {
            tracing::warn!(reason = %reason, "treatment operation denied");
        }
        _ => {}
    }
    ApiResponse::from_error(err)
}

fn poisoned<T>() -> ApiResponse<T> {
    tracing::error!("store mutex poisoned");
    ApiResponse::failure(ErrorKind::PersistenceFailure, STORE_FAILURE_MESSAGE)
}
