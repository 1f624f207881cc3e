//! Person database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Person, Role};

const PERSON_COLUMNS: &str = "id, name, roles, email, access_code, date_of_birth, \
     gender, phone, str_number, created_at, updated_at";

impl Database {
    /// Insert a new person.
    pub fn insert_person(&self, person: &Person) -> DbResult<()> {
        let roles_json = serde_json::to_string(&person.roles)?;
        self.conn.execute(
            r#"
            INSERT INTO persons (
                id, name, roles, email, access_code, date_of_birth,
                gender, phone, str_number, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                person.id,
                person.name,
                roles_json,
                person.email,
                person.access_code,
                person.date_of_birth,
                person.gender,
                person.phone,
                person.str_number,
                person.created_at,
                person.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a person by ID.
    pub fn get_person(&self, id: &str) -> DbResult<Option<Person>> {
        self.conn
            .query_row(
                &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?"),
                [id],
                person_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Check whether a person exists and holds the given role.
    pub fn person_has_role(&self, id: &str, role: Role) -> DbResult<bool> {
        Ok(self
            .get_person(id)?
            .map(|p| p.has_role(role))
            .unwrap_or(false))
    }

    /// List all persons holding the PATIENT role, ordered by name.
    ///
    /// Role sets live in a JSON column, so the role filter runs over the
    /// decoded rows rather than in SQL.
    pub fn list_patients(&self) -> DbResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons ORDER BY name"
        ))?;

        let rows = stmt.query_map([], person_row)?;

        let mut patients = Vec::new();
        for row in rows {
            let person: Person = row?.try_into()?;
            if person.has_role(Role::Patient) {
                patients.push(person);
            }
        }
        Ok(patients)
    }
}

/// Intermediate row struct for database mapping.
struct PersonRow {
    id: String,
    name: String,
    roles: String,
    email: Option<String>,
    access_code: Option<String>,
    date_of_birth: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    str_number: Option<String>,
    created_at: String,
    updated_at: String,
}

fn person_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersonRow> {
    Ok(PersonRow {
        id: row.get(0)?,
        name: row.get(1)?,
        roles: row.get(2)?,
        email: row.get(3)?,
        access_code: row.get(4)?,
        date_of_birth: row.get(5)?,
        gender: row.get(6)?,
        phone: row.get(7)?,
        str_number: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl TryFrom<PersonRow> for Person {
    type Error = DbError;

    fn try_from(row: PersonRow) -> Result<Self, Self::Error> {
        let roles: Vec<Role> = serde_json::from_str(&row.roles)?;
        Ok(Person {
            id: row.id,
            name: row.name,
            roles,
            email: row.email,
            access_code: row.access_code,
            date_of_birth: row.date_of_birth,
            gender: row.gender,
            phone: row.phone,
            str_number: row.str_number,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
