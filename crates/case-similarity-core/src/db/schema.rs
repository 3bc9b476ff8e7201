//! SQLite schema definition.

/// Complete database schema for the case library.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Clinical Cases
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinical_cases (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    department TEXT,
    primary_diagnosis TEXT NOT NULL,
    icd_code TEXT,
    payload TEXT NOT NULL,                       -- JSON ClinicalCase (without counters)
    view_count INTEGER NOT NULL DEFAULT 0 CHECK (view_count >= 0),
    save_count INTEGER NOT NULL DEFAULT 0 CHECK (save_count >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_cases_primary_diagnosis ON clinical_cases(primary_diagnosis);
CREATE INDEX IF NOT EXISTS idx_cases_icd_code ON clinical_cases(icd_code);
CREATE INDEX IF NOT EXISTS idx_cases_department ON clinical_cases(department);

-- ============================================================================
-- Tag Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS case_tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    category TEXT
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_counter_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO clinical_cases (id, title, primary_diagnosis, payload, view_count) VALUES ('c1', 't', 'd', '{}', -1)",
            [],
        );
        assert!(result.is_err());
    }
}
