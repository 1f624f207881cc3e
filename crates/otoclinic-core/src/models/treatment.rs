//! Treatment record models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which ear a treatment concerns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EarSide {
    Left,
    Right,
    Both,
}

impl EarSide {
    /// Wire/storage string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            EarSide::Left => "left",
            EarSide::Right => "right",
            EarSide::Both => "both",
        }
    }

    /// Parse a wire/storage string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(EarSide::Left),
            "right" => Some(EarSide::Right),
            "both" => Some(EarSide::Both),
            _ => None,
        }
    }
}

/// Lifecycle status of a treatment record.
///
/// `Completed` and `Cancelled` are terminal by convention only; no transition
/// table is enforced and any authorized update may set any status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreatmentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TreatmentStatus {
    /// Wire/storage string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentStatus::Pending => "pending",
            TreatmentStatus::Completed => "completed",
            TreatmentStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a wire/storage string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TreatmentStatus::Pending),
            "completed" => Some(TreatmentStatus::Completed),
            "cancelled" => Some(TreatmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl Default for TreatmentStatus {
    fn default() -> Self {
        TreatmentStatus::Pending
    }
}

/// Storage-row state: a record is either active or soft-deleted.
///
/// Every normal query path operates on `Active` rows only; deleted rows stay
/// in the store but are invisible to reads, updates and aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowState {
    Active,
    Deleted { at: String },
}

impl RowState {
    /// Map the nullable storage column to a row state.
    pub fn from_deleted_at(deleted_at: Option<String>) -> Self {
        match deleted_at {
            Some(at) => RowState::Deleted { at },
            None => RowState::Active,
        }
    }

    /// The storage projection of this state.
    pub fn deleted_at(&self) -> Option<&str> {
        match self {
            RowState::Active => None,
            RowState::Deleted { at } => Some(at),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RowState::Active)
    }
}

impl Default for RowState {
    fn default() -> Self {
        RowState::Active
    }
}

/// One clinical encounter between a patient and the doctor who recorded it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    /// Unique record ID
    pub id: String,
    /// Patient person ID
    pub patient_id: String,
    /// Doctor person ID - always the creating caller, immutable afterwards
    pub doctor_id: String,
    /// Calendar date of the encounter
    pub treatment_date: NaiveDate,
    /// Presenting complaint
    pub complaint: String,
    /// Prior medical history
    pub medical_history: Option<String>,
    /// Doctor's diagnosis
    pub diagnosis: Option<String>,
    /// Affected ear
    pub ear_affected: EarSide,
    /// Action/therapy given
    pub action: Option<String>,
    /// Lifecycle status
    pub status: TreatmentStatus,
    /// Soft-delete state, never serialized in responses
    #[serde(skip)]
    pub state: RowState,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Treatment {
    /// Create an active record from validated input. The doctor id comes from
    /// the authenticated caller, never from the client payload.
    pub fn new(input: NewTreatment, doctor_id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id: input.patient_id,
            doctor_id,
            treatment_date: input.treatment_date,
            complaint: input.complaint,
            medical_history: input.medical_history,
            diagnosis: input.diagnosis,
            ear_affected: input.ear_affected,
            action: input.action,
            status: input.status,
            state: RowState::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Raw create payload as supplied by a client, before validation.
///
/// There is deliberately no doctor field: the doctor is the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CreateTreatment {
    pub patient_id: Option<String>,
    pub treatment_date: Option<String>,
    pub complaint: Option<String>,
    pub medical_history: Option<String>,
    pub diagnosis: Option<String>,
    pub ear_affected: Option<String>,
    pub action: Option<String>,
    pub status: Option<String>,
}

/// Raw partial-update payload; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateTreatment {
    pub treatment_date: Option<String>,
    pub complaint: Option<String>,
    pub medical_history: Option<String>,
    pub diagnosis: Option<String>,
    pub ear_affected: Option<String>,
    pub action: Option<String>,
    pub status: Option<String>,
}

impl UpdateTreatment {
    /// True when no field is supplied at all.
    pub fn is_empty(&self) -> bool {
        self.treatment_date.is_none()
            && self.complaint.is_none()
            && self.medical_history.is_none()
            && self.diagnosis.is_none()
            && self.ear_affected.is_none()
            && self.action.is_none()
            && self.status.is_none()
    }
}

/// Typed create input produced by the validation gate.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTreatment {
    pub patient_id: String,
    pub treatment_date: NaiveDate,
    pub complaint: String,
    pub medical_history: Option<String>,
    pub diagnosis: Option<String>,
    pub ear_affected: EarSide,
    pub action: Option<String>,
    pub status: TreatmentStatus,
}

/// Typed partial update produced by the validation gate; `None` means the
/// field was not supplied and keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreatmentPatch {
    pub treatment_date: Option<NaiveDate>,
    pub complaint: Option<String>,
    pub medical_history: Option<String>,
    pub diagnosis: Option<String>,
    pub ear_affected: Option<EarSide>,
    pub action: Option<String>,
    pub status: Option<TreatmentStatus>,
}

impl TreatmentPatch {
    pub fn is_empty(&self) -> bool {
        self.treatment_date.is_none()
            && self.complaint.is_none()
            && self.medical_history.is_none()
            && self.diagnosis.is_none()
            && self.ear_affected.is_none()
            && self.action.is_none()
            && self.status.is_none()
    }
}

/// A treatment record with its patient and doctor summaries attached via an
/// explicit join fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentDetail {
    #[serde(flatten)]
    pub record: Treatment,
    pub patient: super::PersonSummary,
    pub doctor: super::PersonSummary,
}
