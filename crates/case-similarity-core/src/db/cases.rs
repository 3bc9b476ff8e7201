//! Clinical case database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{CaseTag, ClinicalCase};
use crate::repository::{CaseReader, CaseRepository};

const CASE_COLUMNS: &str = "id, payload, view_count, save_count, created_at, updated_at";

const UPSERT_CASE_SQL: &str = r#"
    INSERT INTO clinical_cases (
        id, title, department, primary_diagnosis, icd_code, payload,
        view_count, save_count, created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        department = excluded.department,
        primary_diagnosis = excluded.primary_diagnosis,
        icd_code = excluded.icd_code,
        payload = excluded.payload,
        updated_at = excluded.updated_at
"#;

impl Database {
    /// Insert or update a case.
    ///
    /// Counters of an existing case are kept; they only change through
    /// [`Database::record_view`] and [`Database::record_save`].
    pub fn upsert_case(&self, case: &ClinicalCase) -> DbResult<()> {
        let payload = serde_json::to_string(case)?;

        self.conn.execute(
            UPSERT_CASE_SQL,
            params![
                case.id,
                case.title,
                case.department,
                case.diagnosis.primary,
                case.diagnosis.icd_code,
                payload,
                case.view_count,
                case.save_count,
                case.created_at,
                case.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Insert or update many cases in one transaction, keeping slice order.
    pub fn import_cases(&mut self, cases: &[ClinicalCase]) -> DbResult<usize> {
        let tx = self.transaction()?;
        for case in cases {
            let payload = serde_json::to_string(case)?;
            tx.execute(
                UPSERT_CASE_SQL,
                params![
                    case.id,
                    case.title,
                    case.department,
                    case.diagnosis.primary,
                    case.diagnosis.icd_code,
                    payload,
                    case.view_count,
                    case.save_count,
                    case.created_at,
                    case.updated_at,
                ],
            )?;
        }
        tx.commit()?;
        tracing::debug!(count = cases.len(), "imported cases");
        Ok(cases.len())
    }

    /// Get a case by ID.
    pub fn get_case(&self, id: &str) -> DbResult<Option<ClinicalCase>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM clinical_cases WHERE id = ?", CASE_COLUMNS),
                [id],
                CaseRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all cases in insertion order.
    pub fn list_cases(&self) -> DbResult<Vec<ClinicalCase>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clinical_cases ORDER BY rowid",
            CASE_COLUMNS
        ))?;
        let rows = stmt.query_map([], CaseRow::from_row)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?.try_into()?);
        }
        Ok(cases)
    }

    /// Delete a case.
    pub fn delete_case(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM clinical_cases WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Increment the view counter.
    pub fn record_view(&self, id: &str) -> DbResult<bool> {
        self.bump_counter(id, "view_count")
    }

    /// Increment the save counter.
    pub fn record_save(&self, id: &str) -> DbResult<bool> {
        self.bump_counter(id, "save_count")
    }

    fn bump_counter(&self, id: &str, column: &'static str) -> DbResult<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let rows_affected = self.conn.execute(
            &format!(
                "UPDATE clinical_cases SET {col} = {col} + 1, updated_at = ?2 WHERE id = ?1",
                col = column
            ),
            params![id, now],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct CaseRow {
    id: String,
    payload: String,
    view_count: u32,
    save_count: u32,
    created_at: String,
    updated_at: String,
}

impl CaseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            payload: row.get(1)?,
            view_count: row.get(2)?,
            save_count: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TryFrom<CaseRow> for ClinicalCase {
    type Error = DbError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        let mut case: ClinicalCase = serde_json::from_str(&row.payload)?;
        if case.id != row.id {
            return Err(DbError::Constraint(format!(
                "payload id {} does not match row id {}",
                case.id, row.id
            )));
        }
        case.view_count = row.view_count;
        case.save_count = row.save_count;
        case.created_at = row.created_at;
        case.updated_at = row.updated_at;
        Ok(case)
    }
}

impl CaseReader for Database {
    fn get_case(&self, id: &str) -> DbResult<Option<ClinicalCase>> {
        Database::get_case(self, id)
    }

    fn list_cases(&self) -> DbResult<Vec<ClinicalCase>> {
        Database::list_cases(self)
    }

    fn list_tags(&self) -> DbResult<Vec<CaseTag>> {
        Database::list_tags(self)
    }
}

impl CaseRepository for Database {
    fn upsert_case(&mut self, case: &ClinicalCase) -> DbResult<()> {
        Database::upsert_case(self, case)
    }

    fn upsert_tag(&mut self, tag: &CaseTag) -> DbResult<()> {
        Database::upsert_tag(self, tag)
    }

    fn record_view(&mut self, id: &str) -> DbResult<bool> {
        Database::record_view(self, id)
    }

    fn record_save(&mut self, id: &str) -> DbResult<bool> {
        Database::record_save(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, LabTest};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_case(id: &str, primary: &str) -> ClinicalCase {
        let mut case = ClinicalCase::new(format!("Case {}", id), primary.into());
        case.id = id.into();
        case
    }

    #[test]
    fn test_upsert_and_get() {
        let db = setup_db();

        let mut case = make_case("case-1", "肺癌");
        case.diagnosis.icd_code = Some("C34.1".into());
        case.patient_info.age = Some(62);
        case.patient_info.gender = Gender::Male;
        case.lab_tests = vec![LabTest::new("CEA", true)];
        db.upsert_case(&case).unwrap();

        let retrieved = db.get_case("case-1").unwrap().unwrap();
        assert_eq!(retrieved, case);
        assert!(db.get_case("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_updates_but_keeps_counters() {
        let db = setup_db();

        let mut case = make_case("case-1", "肺炎");
        db.upsert_case(&case).unwrap();
        db.record_view("case-1").unwrap();

        case.title = "Updated title".into();
        db.upsert_case(&case).unwrap();

        let retrieved = db.get_case("case-1").unwrap().unwrap();
        assert_eq!(retrieved.title, "Updated title");
        assert_eq!(retrieved.view_count, 1);
    }

    #[test]
    fn test_list_in_insertion_order() {
        let mut db = setup_db();
        db.import_cases(&[make_case("b", "x"), make_case("a", "y")]).unwrap();
        db.upsert_case(&make_case("c", "z")).unwrap();
        // Updating keeps the original position
        db.upsert_case(&make_case("b", "x2")).unwrap();

        let ids: Vec<String> = db.list_cases().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_counters() {
        let db = setup_db();
        db.upsert_case(&make_case("case-1", "肺炎")).unwrap();

        assert!(db.record_view("case-1").unwrap());
        assert!(db.record_view("case-1").unwrap());
        assert!(db.record_save("case-1").unwrap());
        assert!(!db.record_save("missing").unwrap());

        let case = db.get_case("case-1").unwrap().unwrap();
        assert_eq!(case.view_count, 2);
        assert_eq!(case.save_count, 1);
    }

    #[test]
    fn test_delete() {
        let db = setup_db();
        db.upsert_case(&make_case("case-1", "肺炎")).unwrap();

        assert!(db.delete_case("case-1").unwrap());
        assert!(!db.delete_case("case-1").unwrap());
        assert!(db.list_cases().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        let db = setup_db();
        db.conn()
            .execute(
                "INSERT INTO clinical_cases (id, title, primary_diagnosis, payload) VALUES ('bad', 't', 'd', 'not json')",
                [],
            )
            .unwrap();

        assert!(matches!(db.get_case("bad"), Err(DbError::Json(_))));
    }
}
