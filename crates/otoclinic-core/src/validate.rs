//! Validation gate for create and partial-update payloads.
//!
//! Every violation lands in one [`ValidationReport`] keyed by field name;
//! validation never stops at the first failure. The gate turns raw payloads
//! into typed inputs the rest of the engine trusts.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    CreateTreatment, EarSide, NewTreatment, TreatmentPatch, TreatmentStatus, UpdateTreatment,
};

pub const MAX_COMPLAINT_LEN: usize = 1000;
pub const MAX_HISTORY_LEN: usize = 1000;
pub const MAX_DIAGNOSIS_LEN: usize = 500;
pub const MAX_ACTION_LEN: usize = 1000;

/// Aggregated field-level violations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    pub fn into_errors(self) -> BTreeMap<String, Vec<String>> {
        self.errors
    }
}

/// Validate a create payload into a typed [`NewTreatment`].
pub fn validate_create(input: &CreateTreatment) -> Result<NewTreatment, ValidationReport> {
    let mut report = ValidationReport::new();

    let patient_id = required_text(&mut report, "patient_id", input.patient_id.as_ref(), None);
    let treatment_date = match input.treatment_date.as_deref() {
        Some(raw) => parse_date(&mut report, "treatment_date", raw),
        None => {
            report.add("treatment_date", "is required");
            None
        }
    };
    let complaint = required_text(
        &mut report,
        "complaint",
        input.complaint.as_ref(),
        Some(MAX_COMPLAINT_LEN),
    );
    let medical_history = optional_text(
        &mut report,
        "medical_history",
        input.medical_history.as_ref(),
        MAX_HISTORY_LEN,
    );
    let diagnosis = optional_text(
        &mut report,
        "diagnosis",
        input.diagnosis.as_ref(),
        MAX_DIAGNOSIS_LEN,
    );
    let ear_affected = match input.ear_affected.as_deref() {
        Some(raw) => parse_ear(&mut report, raw),
        None => {
            report.add("ear_affected", "is required");
            None
        }
    };
    let action = optional_text(&mut report, "action", input.action.as_ref(), MAX_ACTION_LEN);
    let status = match input.status.as_deref() {
        Some(raw) => parse_status(&mut report, raw),
        None => None,
    };

    match (
        report.is_empty(),
        patient_id,
        treatment_date,
        complaint,
        ear_affected,
    ) {
        (true, Some(patient_id), Some(treatment_date), Some(complaint), Some(ear_affected)) => {
            Ok(NewTreatment {
                patient_id,
                treatment_date,
                complaint,
                medical_history,
                diagnosis,
                ear_affected,
                action,
                status: status.unwrap_or_default(),
            })
        }
        _ => Err(report),
    }
}

/// Validate a partial-update payload into a typed [`TreatmentPatch`]. Only
/// supplied fields are validated; absent fields stay untouched.
pub fn validate_update(input: &UpdateTreatment) -> Result<TreatmentPatch, ValidationReport> {
    let mut report = ValidationReport::new();
    let mut patch = TreatmentPatch::default();

    if let Some(raw) = input.treatment_date.as_deref() {
        patch.treatment_date = parse_date(&mut report, "treatment_date", raw);
    }
    if input.complaint.is_some() {
        patch.complaint = required_text(
            &mut report,
            "complaint",
            input.complaint.as_ref(),
            Some(MAX_COMPLAINT_LEN),
        );
    }
    if input.medical_history.is_some() {
        patch.medical_history = optional_text(
            &mut report,
            "medical_history",
            input.medical_history.as_ref(),
            MAX_HISTORY_LEN,
        );
    }
    if input.diagnosis.is_some() {
        patch.diagnosis = optional_text(
            &mut report,
            "diagnosis",
            input.diagnosis.as_ref(),
            MAX_DIAGNOSIS_LEN,
        );
    }
    if let Some(raw) = input.ear_affected.as_deref() {
        patch.ear_affected = parse_ear(&mut report, raw);
    }
    if input.action.is_some() {
        patch.action = optional_text(&mut report, "action", input.action.as_ref(), MAX_ACTION_LEN);
    }
    if let Some(raw) = input.status.as_deref() {
        patch.status = parse_status(&mut report, raw);
    }

    if report.is_empty() {
        Ok(patch)
    } else {
        Err(report)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn required_text(
    report: &mut ValidationReport,
    field: &str,
    value: Option<&String>,
    max: Option<usize>,
) -> Option<String> {
    match value {
        Some(s) if !s.trim().is_empty() => {
            if let Some(max) = max {
                if char_len(s) > max {
                    report.add(field, format!("must not exceed {max} characters"));
                    return None;
                }
            }
            Some(s.clone())
        }
        _ => {
            report.add(field, "is required");
            None
        }
    }
}

fn optional_text(
    report: &mut ValidationReport,
    field: &str,
    value: Option<&String>,
    max: usize,
) -> Option<String> {
    let s = value?;
    if char_len(s) > max {
        report.add(field, format!("must not exceed {max} characters"));
        return None;
    }
    Some(s.clone())
}

fn parse_date(report: &mut ValidationReport, field: &str, raw: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            report.add(field, "must be a valid date in YYYY-MM-DD format");
            None
        }
    }
}

fn parse_ear(report: &mut ValidationReport, raw: &str) -> Option<EarSide> {
    match EarSide::parse(raw) {
        Some(side) => Some(side),
        None => {
            report.add("ear_affected", "must be one of: left, right, both");
            None
        }
    }
}

fn parse_status(report: &mut ValidationReport, raw: &str) -> Option<TreatmentStatus> {
    match TreatmentStatus::parse(raw) {
        Some(status) => Some(status),
        None => {
            report.add("status", "must be one of: pending, completed, cancelled");
            None
        }
    }
}
