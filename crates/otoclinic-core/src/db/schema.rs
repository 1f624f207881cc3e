//! SQLite schema definition.

/// Complete database schema for otoclinic.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Persons
-- ============================================================================

CREATE TABLE IF NOT EXISTS persons (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    roles TEXT NOT NULL DEFAULT '[]',             -- JSON array of role strings
    email TEXT,
    access_code TEXT,
    date_of_birth TEXT,                           -- YYYY-MM-DD
    gender TEXT,
    phone TEXT,
    str_number TEXT,                              -- doctor registration number
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_persons_name ON persons(name);

-- ============================================================================
-- Treatments
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES persons(id),
    doctor_id TEXT NOT NULL REFERENCES persons(id),
    treatment_date TEXT NOT NULL,                 -- YYYY-MM-DD
    complaint TEXT NOT NULL,
    medical_history TEXT,
    diagnosis TEXT,
    ear_affected TEXT NOT NULL CHECK (ear_affected IN ('left', 'right', 'both')),
    action TEXT,
    status TEXT NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'completed', 'cancelled')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT                               -- soft-delete marker, NULL = active
);

CREATE INDEX IF NOT EXISTS idx_treatments_patient_created
    ON treatments(patient_id, created_at);
CREATE INDEX IF NOT EXISTS idx_treatments_doctor ON treatments(doctor_id);
CREATE INDEX IF NOT EXISTS idx_treatments_status ON treatments(status);
CREATE INDEX IF NOT EXISTS idx_treatments_date ON treatments(treatment_date);
"#;
