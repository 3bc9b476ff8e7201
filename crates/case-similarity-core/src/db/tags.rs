//! Tag catalog database operations.

use rusqlite::params;

use super::{Database, DbResult};
use crate::models::CaseTag;

impl Database {
    /// Insert or update a tag.
    pub fn upsert_tag(&self, tag: &CaseTag) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO case_tags (id, name, category) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category
            "#,
            params![tag.id, tag.name, tag.category],
        )?;
        Ok(())
    }

    /// List all tags ordered by name.
    pub fn list_tags(&self) -> DbResult<Vec<CaseTag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, category FROM case_tags ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(CaseTag {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
            })
        })?;

        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }
}
