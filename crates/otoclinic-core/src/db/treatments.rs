//! Treatment record store: scoped reads, transactional mutations, soft
//! delete, and the single-pass statistics query.

use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{
    age_from, EarSide, PersonSummary, RowState, Treatment, TreatmentDetail, TreatmentPatch,
    TreatmentStatus,
};
use crate::query::{ComposedQuery, Paginated, Pagination, TreatmentFilter, PAGE_SIZE};
use crate::scope::AccessScope;
use crate::stats::{StatsWindow, TreatmentStats};

const TREATMENT_COLUMNS: &str = "id, patient_id, doctor_id, treatment_date, complaint, \
     medical_history, diagnosis, ear_affected, action, status, \
     created_at, updated_at, deleted_at";

const DETAIL_COLUMNS: &str = "t.id, t.patient_id, t.doctor_id, t.treatment_date, t.complaint, \
     t.medical_history, t.diagnosis, t.ear_affected, t.action, t.status, \
     t.created_at, t.updated_at, t.deleted_at, \
     p.name, p.access_code, p.date_of_birth, p.gender, p.phone, p.str_number, \
     d.name, d.access_code, d.date_of_birth, d.gender, d.phone, d.str_number";

const DETAIL_JOINS: &str = "FROM treatments t \
     JOIN persons p ON p.id = t.patient_id \
     JOIN persons d ON d.id = t.doctor_id";

impl Database {
    /// Insert a treatment record as-is, without the detailed read-back.
    pub fn insert_treatment(&self, treatment: &Treatment) -> DbResult<()> {
        insert_treatment(&self.conn, treatment)
    }

    /// Insert a treatment record and read it back with its party summaries,
    /// atomically. A failure in either step leaves no partial state.
    pub fn create_treatment(&mut self, treatment: &Treatment) -> DbResult<TreatmentDetail> {
        let tx = self.conn.transaction()?;
        insert_treatment(&tx, treatment)?;
        let detail = query_detail(&tx, &treatment.id, &AccessScope::All)?
            .ok_or_else(|| DbError::NotFound(treatment.id.clone()))?;
        tx.commit()?;
        Ok(detail)
    }

    /// Get an active treatment within the caller's scope.
    pub fn get_treatment(&self, id: &str, scope: &AccessScope) -> DbResult<Option<Treatment>> {
        let mut query = ComposedQuery::new(scope, &TreatmentFilter::default());
        query.push_param("id = ?", id.to_string());

        self.conn
            .query_row(
                &format!(
                    "SELECT {TREATMENT_COLUMNS} FROM treatments WHERE {}",
                    query.where_clause()
                ),
                params_from_iter(query.params().iter()),
                treatment_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// Get a treatment regardless of soft-delete state. This is the explicit
    /// override of the active-rows-only default.
    pub fn get_treatment_any_state(&self, id: &str) -> DbResult<Option<Treatment>> {
        self.conn
            .query_row(
                &format!("SELECT {TREATMENT_COLUMNS} FROM treatments WHERE id = ?"),
                [id],
                treatment_row,
            )
            .optional()?
            .map(TryInto::try_into)
            .transpose()
    }

    /// Get an active treatment with its party summaries joined in.
    pub fn get_treatment_detailed(
        &self,
        id: &str,
        scope: &AccessScope,
    ) -> DbResult<Option<TreatmentDetail>> {
        query_detail(&self.conn, id, scope)
    }

    /// One page of active treatments in scope, filters applied, parties
    /// joined. Ordered by treatment date then creation time, newest first.
    pub fn list_treatments_detailed(
        &self,
        scope: &AccessScope,
        filter: &TreatmentFilter,
        page: u64,
    ) -> DbResult<Paginated<TreatmentDetail>> {
        let query = ComposedQuery::new(scope, filter);
        let page = page.max(1);

        let total: u64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM treatments WHERE {}",
                query.where_clause()
            ),
            params_from_iter(query.params().iter()),
            |row| row.get::<_, i64>(0).map(|n| n as u64),
        )?;

        let offset = (page - 1) * PAGE_SIZE;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE {} \
             ORDER BY t.treatment_date DESC, t.created_at DESC \
             LIMIT {PAGE_SIZE} OFFSET {offset}",
            query.where_clause()
        ))?;

        let rows = stmt.query_map(params_from_iter(query.params().iter()), detail_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?.try_into()?);
        }

        Ok(Paginated {
            items,
            pagination: Pagination::new(page, total),
        })
    }

    /// Apply a partial update to an active treatment in scope and read the
    /// result back with its parties, atomically. Returns `None` when no
    /// matching active record exists.
    pub fn update_treatment(
        &mut self,
        id: &str,
        patch: &TreatmentPatch,
        scope: &AccessScope,
    ) -> DbResult<Option<TreatmentDetail>> {
        let mut sets: Vec<&str> = Vec::new();
        let mut set_params: Vec<String> = Vec::new();

        if let Some(date) = patch.treatment_date {
            sets.push("treatment_date = ?");
            set_params.push(date.to_string());
        }
        if let Some(complaint) = &patch.complaint {
            sets.push("complaint = ?");
            set_params.push(complaint.clone());
        }
        if let Some(history) = &patch.medical_history {
            sets.push("medical_history = ?");
            set_params.push(history.clone());
        }
        if let Some(diagnosis) = &patch.diagnosis {
            sets.push("diagnosis = ?");
            set_params.push(diagnosis.clone());
        }
        if let Some(ear) = patch.ear_affected {
            sets.push("ear_affected = ?");
            set_params.push(ear.as_str().to_string());
        }
        if let Some(action) = &patch.action {
            sets.push("action = ?");
            set_params.push(action.clone());
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            set_params.push(status.as_str().to_string());
        }
        sets.push("updated_at = ?");
        set_params.push(chrono::Utc::now().to_rfc3339());

        let mut query = ComposedQuery::new(scope, &TreatmentFilter::default());
        query.push_param("id = ?", id.to_string());

        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            &format!(
                "UPDATE treatments SET {} WHERE {}",
                sets.join(", "),
                query.where_clause()
            ),
            params_from_iter(set_params.iter().chain(query.params().iter())),
        )?;
        if affected == 0 {
            return Ok(None);
        }

        let detail = query_detail(&tx, id, scope)?;
        tx.commit()?;
        Ok(detail)
    }

    /// Soft-delete an active treatment in scope. The row stays in the store
    /// but disappears from every normal read and aggregate.
    pub fn soft_delete_treatment(&self, id: &str, scope: &AccessScope) -> DbResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut query = ComposedQuery::new(scope, &TreatmentFilter::default());
        query.push_param("id = ?", id.to_string());

        let affected = self.conn.execute(
            &format!(
                "UPDATE treatments SET deleted_at = ?, updated_at = ? WHERE {}",
                query.where_clause()
            ),
            params_from_iter(
                [now.clone(), now]
                    .iter()
                    .chain(query.params().iter()),
            ),
        )?;
        Ok(affected > 0)
    }

    /// Status and calendar counts over the scope, in one SQL statement so all
    /// six numbers reflect the same snapshot.
    pub fn treatment_stats(
        &self,
        scope: &AccessScope,
        window: &StatsWindow,
    ) -> DbResult<TreatmentStats> {
        let query = ComposedQuery::new(scope, &TreatmentFilter::default());
        let window_params = [
            window.month_start.to_string(),
            window.month_end.to_string(),
            window.week_start.to_string(),
            window.week_end.to_string(),
        ];

        let stats = self.conn.query_row(
            &format!(
                "SELECT COUNT(*), \
                    COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN treatment_date BETWEEN ? AND ? THEN 1 ELSE 0 END), 0), \
                    COALESCE(SUM(CASE WHEN treatment_date BETWEEN ? AND ? THEN 1 ELSE 0 END), 0) \
                 FROM treatments WHERE {}",
                query.where_clause()
            ),
            params_from_iter(window_params.iter().chain(query.params().iter())),
            |row| {
                Ok(TreatmentStats {
                    total: row.get::<_, i64>(0)? as u64,
                    pending: row.get::<_, i64>(1)? as u64,
                    completed: row.get::<_, i64>(2)? as u64,
                    cancelled: row.get::<_, i64>(3)? as u64,
                    this_month: row.get::<_, i64>(4)? as u64,
                    this_week: row.get::<_, i64>(5)? as u64,
                })
            },
        )?;
        Ok(stats)
    }
}

fn insert_treatment(conn: &Connection, treatment: &Treatment) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO treatments (
            id, patient_id, doctor_id, treatment_date, complaint,
            medical_history, diagnosis, ear_affected, action, status,
            created_at, updated_at, deleted_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
        params![
            treatment.id,
            treatment.patient_id,
            treatment.doctor_id,
            treatment.treatment_date.to_string(),
            treatment.complaint,
            treatment.medical_history,
            treatment.diagnosis,
            treatment.ear_affected.as_str(),
            treatment.action,
            treatment.status.as_str(),
            treatment.created_at,
            treatment.updated_at,
            treatment.state.deleted_at(),
        ],
    )?;
    Ok(())
}

fn query_detail(
    conn: &Connection,
    id: &str,
    scope: &AccessScope,
) -> DbResult<Option<TreatmentDetail>> {
    let mut query = ComposedQuery::new(scope, &TreatmentFilter::default());
    query.push_param("t.id = ?", id.to_string());

    conn.query_row(
        &format!(
            "SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE {}",
            query.where_clause()
        ),
        params_from_iter(query.params().iter()),
        detail_row,
    )
    .optional()?
    .map(TryInto::try_into)
    .transpose()
}

/// Intermediate row struct for database mapping.
struct TreatmentRow {
    id: String,
    patient_id: String,
    doctor_id: String,
    treatment_date: String,
    complaint: String,
    medical_history: Option<String>,
    diagnosis: Option<String>,
    ear_affected: String,
    action: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

fn treatment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TreatmentRow> {
    Ok(TreatmentRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        treatment_date: row.get(3)?,
        complaint: row.get(4)?,
        medical_history: row.get(5)?,
        diagnosis: row.get(6)?,
        ear_affected: row.get(7)?,
        action: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        deleted_at: row.get(12)?,
    })
}

impl TryFrom<TreatmentRow> for Treatment {
    type Error = DbError;

    fn try_from(row: TreatmentRow) -> Result<Self, Self::Error> {
        let treatment_date = NaiveDate::parse_from_str(&row.treatment_date, "%Y-%m-%d")
            .map_err(|_| {
                DbError::Constraint(format!("invalid treatment date: {}", row.treatment_date))
            })?;
        let ear_affected = EarSide::parse(&row.ear_affected)
            .ok_or_else(|| DbError::Constraint(format!("unknown ear side: {}", row.ear_affected)))?;
        let status = TreatmentStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("unknown status: {}", row.status)))?;

        Ok(Treatment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            treatment_date,
            complaint: row.complaint,
            medical_history: row.medical_history,
            diagnosis: row.diagnosis,
            ear_affected,
            action: row.action,
            status,
            state: RowState::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Intermediate row for the detailed query: the treatment columns followed by
/// the joined party columns.
struct DetailRow {
    treatment: TreatmentRow,
    patient: PartyColumns,
    doctor: PartyColumns,
}

struct PartyColumns {
    name: String,
    access_code: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    str_number: Option<String>,
}

fn detail_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DetailRow> {
    Ok(DetailRow {
        treatment: treatment_row(row)?,
        patient: PartyColumns {
            name: row.get(13)?,
            access_code: row.get(14)?,
            date_of_birth: row.get(15)?,
            gender: row.get(16)?,
            phone: row.get(17)?,
            str_number: row.get(18)?,
        },
        doctor: PartyColumns {
            name: row.get(19)?,
            access_code: row.get(20)?,
            date_of_birth: row.get(21)?,
            gender: row.get(22)?,
            phone: row.get(23)?,
            str_number: row.get(24)?,
        },
    })
}

impl PartyColumns {
    fn into_summary(self, id: String, today: NaiveDate) -> PersonSummary {
        PersonSummary {
            id,
            name: self.name,
            access_code: self.access_code,
            age: age_from(self.date_of_birth.as_deref(), today),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            phone: self.phone,
            str_number: self.str_number,
        }
    }
}

impl TryFrom<DetailRow> for TreatmentDetail {
    type Error = DbError;

    fn try_from(row: DetailRow) -> Result<Self, Self::Error> {
        let today = chrono::Utc::now().date_naive();
        let patient_id = row.treatment.patient_id.clone();
        let doctor_id = row.treatment.doctor_id.clone();
        Ok(TreatmentDetail {
            record: row.treatment.try_into()?,
            patient: row.patient.into_summary(patient_id, today),
            doctor: row.doctor.into_summary(doctor_id, today),
        })
    }
}
