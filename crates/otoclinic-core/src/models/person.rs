//! Person models.
//!
//! Persons are owned by a collaborator subsystem; this core persists the
//! subset it needs to resolve references and embed party summaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A role a person may hold. Role names are stored lowercase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    /// Wire/storage string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Patient => "patient",
        }
    }

    /// Parse a wire/storage string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "doctor" => Some(Role::Doctor),
            "patient" => Some(Role::Patient),
            _ => None,
        }
    }
}

/// A person known to the clinic: patient, doctor, or admin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    /// Unique person ID
    pub id: String,
    pub name: String,
    /// Role set; a person may hold several roles
    pub roles: Vec<Role>,
    pub email: Option<String>,
    /// Human-facing access code (e.g. "PRS-ABC12")
    pub access_code: Option<String>,
    /// Date of birth, `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    /// Medical registration number, doctors only
    pub str_number: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Person {
    /// Create a new person with required fields.
    pub fn new(name: String, roles: Vec<Role>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            roles,
            email: None,
            access_code: None,
            date_of_birth: None,
            gender: None,
            phone: None,
            str_number: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Party summary embedded in detailed treatment responses.
    pub fn summary(&self, today: NaiveDate) -> PersonSummary {
        PersonSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            access_code: self.access_code.clone(),
            date_of_birth: self.date_of_birth.clone(),
            age: age_from(self.date_of_birth.as_deref(), today),
            gender: self.gender.clone(),
            phone: self.phone.clone(),
            str_number: self.str_number.clone(),
        }
    }
}

/// Compact party payload attached to detailed treatment responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonSummary {
    pub id: String,
    pub name: String,
    pub access_code: Option<String>,
    pub date_of_birth: Option<String>,
    /// Whole years between date of birth and the server clock
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    /// Present for doctors
    pub str_number: Option<String>,
}

/// Directory entry returned by the patient listing operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientEntry {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&Person> for PatientEntry {
    fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
            email: person.email.clone(),
            phone: person.phone.clone(),
        }
    }
}

/// Whole years between a `YYYY-MM-DD` date of birth and `today`.
/// Unparseable or future dates yield `None`.
pub fn age_from(date_of_birth: Option<&str>, today: NaiveDate) -> Option<u32> {
    let dob = NaiveDate::parse_from_str(date_of_birth?, "%Y-%m-%d").ok()?;
    today.years_since(dob)
}
