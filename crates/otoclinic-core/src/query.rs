//! Query filter composition and pagination.
//!
//! A resolved [`AccessScope`] and the caller's optional filters compose into
//! one conjunctive WHERE clause. Soft-deleted rows are excluded here, in the
//! same clause, so no query path can see them by accident.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::TreatmentStatus;
use crate::scope::AccessScope;

/// Fixed page size for treatment listings.
pub const PAGE_SIZE: u64 = 15;

/// Optional, conjunctive listing filters. Date bounds are inclusive at
/// calendar-day granularity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TreatmentFilter {
    pub status: Option<TreatmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// A listing request: filters plus scope narrowing and the 1-based page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListRequest {
    pub filter: TreatmentFilter,
    /// Doctor-only narrowing to records they created; ignored for patients
    pub mine_only: bool,
    pub page: u64,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            filter: TreatmentFilter::default(),
            mine_only: false,
            page: 1,
        }
    }
}

/// Pagination metadata carried on listing responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl Pagination {
    /// Build metadata for a page over `total` matching records. An empty
    /// result still reports one page.
    pub fn new(current_page: u64, total: u64) -> Self {
        Self {
            current_page,
            total_pages: total.div_ceil(PAGE_SIZE).max(1),
            per_page: PAGE_SIZE,
            total,
        }
    }
}

/// One page of results plus its pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// A composed WHERE clause with its positional parameters.
///
/// All parameters bind as TEXT: ids, enum wire strings, and `YYYY-MM-DD`
/// dates, matching their storage representation.
#[derive(Debug, Default)]
pub(crate) struct ComposedQuery {
    conditions: Vec<String>,
    params: Vec<String>,
}

impl ComposedQuery {
    /// Compose the scope predicate and filters. Active-rows-only is the first
    /// condition of every composed query.
    pub fn new(scope: &AccessScope, filter: &TreatmentFilter) -> Self {
        let mut query = ComposedQuery::default();
        query.push("deleted_at IS NULL");

        match scope {
            AccessScope::All => {}
            AccessScope::DoctorOwn(id) => query.push_param("doctor_id = ?", id.clone()),
            AccessScope::PatientOwn(id) => query.push_param("patient_id = ?", id.clone()),
            AccessScope::Deny => query.push("1 = 0"),
        }

        if let Some(status) = filter.status {
            query.push_param("status = ?", status.as_str().to_string());
        }
        if let Some(from) = filter.date_from {
            query.push_param("treatment_date >= ?", from.to_string());
        }
        if let Some(to) = filter.date_to {
            query.push_param("treatment_date <= ?", to.to_string());
        }

        query
    }

    pub fn push(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    pub fn push_param(&mut self, condition: impl Into<String>, param: String) {
        self.conditions.push(condition.into());
        self.params.push(param);
    }

    /// The conditions joined with AND, without the `WHERE` keyword.
    pub fn where_clause(&self) -> String {
        self.conditions.join(" AND ")
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}
