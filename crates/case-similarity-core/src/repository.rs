//! Case repository contract and the in-memory backing.
//!
//! The similarity engine only needs [`CaseReader`]. Counter updates and writes
//! live on [`CaseRepository`] and are driven by the case library, never by
//! scoring.

use crate::db::{DbError, DbResult};
use crate::models::{CaseTag, ClinicalCase};

/// Read side of the case store.
pub trait CaseReader {
    /// Look up a case by ID.
    fn get_case(&self, id: &str) -> DbResult<Option<ClinicalCase>>;

    /// All cases in stable enumeration (insertion) order.
    fn list_cases(&self) -> DbResult<Vec<ClinicalCase>>;

    /// The tag catalog.
    fn list_tags(&self) -> DbResult<Vec<CaseTag>>;
}

/// Full case store: reads plus writes and view/save counters.
pub trait CaseRepository: CaseReader {
    /// Insert or replace a case.
    fn upsert_case(&mut self, case: &ClinicalCase) -> DbResult<()>;

    /// Insert or replace a tag catalog entry.
    fn upsert_tag(&mut self, tag: &CaseTag) -> DbResult<()>;

    /// Increment the view counter. Returns `false` for an unknown ID.
    fn record_view(&mut self, id: &str) -> DbResult<bool>;

    /// Increment the save counter. Returns `false` for an unknown ID.
    fn record_save(&mut self, id: &str) -> DbResult<bool>;
}

/// Case store backed by plain vectors (mock-data corpus, tests).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCaseRepository {
    cases: Vec<ClinicalCase>,
    tags: Vec<CaseTag>,
}

impl InMemoryCaseRepository {
    /// Create a repository from an initial corpus.
    ///
    /// Fails with `Constraint` if two cases share an ID.
    pub fn new(cases: Vec<ClinicalCase>, tags: Vec<CaseTag>) -> DbResult<Self> {
        let mut repo = Self::default();
        for case in cases {
            if repo.position(&case.id).is_some() {
                return Err(DbError::Constraint(format!("duplicate case id: {}", case.id)));
            }
            repo.cases.push(case);
        }
        for tag in tags {
            repo.upsert_tag(&tag)?;
        }
        Ok(repo)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.cases.iter().position(|c| c.id == id)
    }

    fn bump(&mut self, id: &str, counter: fn(&mut ClinicalCase) -> &mut u32) -> bool {
        match self.position(id) {
            Some(idx) => {
                let case = &mut self.cases[idx];
                *counter(case) += 1;
                case.touch();
                true
            }
            None => false,
        }
    }
}

impl CaseReader for InMemoryCaseRepository {
    fn get_case(&self, id: &str) -> DbResult<Option<ClinicalCase>> {
        Ok(self.cases.iter().find(|c| c.id == id).cloned())
    }

    fn list_cases(&self) -> DbResult<Vec<ClinicalCase>> {
        Ok(self.cases.clone())
    }

    fn list_tags(&self) -> DbResult<Vec<CaseTag>> {
        Ok(self.tags.clone())
    }
}

impl CaseRepository for InMemoryCaseRepository {
    fn upsert_case(&mut self, case: &ClinicalCase) -> DbResult<()> {
        match self.position(&case.id) {
            Some(idx) => self.cases[idx] = case.clone(),
            None => self.cases.push(case.clone()),
        }
        Ok(())
    }

    fn upsert_tag(&mut self, tag: &CaseTag) -> DbResult<()> {
        match self.tags.iter().position(|t| t.id == tag.id) {
            Some(idx) => self.tags[idx] = tag.clone(),
            None => self.tags.push(tag.clone()),
        }
        Ok(())
    }

    fn record_view(&mut self, id: &str) -> DbResult<bool> {
        Ok(self.bump(id, |c| &mut c.view_count))
    }

    fn record_save(&mut self, id: &str) -> DbResult<bool> {
        Ok(self.bump(id, |c| &mut c.save_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str) -> ClinicalCase {
        let mut case = ClinicalCase::new(format!("Case {}", id), "肺炎".into());
        case.id = id.into();
        case
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let repo = InMemoryCaseRepository::new(vec![case("c"), case("a"), case("b")], vec![]).unwrap();
        let ids: Vec<String> = repo.list_cases().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = InMemoryCaseRepository::new(vec![case("a"), case("a")], vec![]);
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_counters() {
        let mut repo = InMemoryCaseRepository::new(vec![case("a")], vec![]).unwrap();

        assert!(repo.record_view("a").unwrap());
        assert!(repo.record_view("a").unwrap());
        assert!(repo.record_save("a").unwrap());
        assert!(!repo.record_view("missing").unwrap());

        let stored = repo.get_case("a").unwrap().unwrap();
        assert_eq!(stored.view_count, 2);
        assert_eq!(stored.save_count, 1);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut repo = InMemoryCaseRepository::new(vec![case("a"), case("b")], vec![]).unwrap();

        let mut updated = case("a");
        updated.title = "Updated".into();
        repo.upsert_case(&updated).unwrap();
        repo.upsert_case(&case("c")).unwrap();

        let cases = repo.list_cases().unwrap();
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].title, "Updated");
        assert_eq!(cases[2].id, "c");
    }

    #[test]
    fn test_tags() {
        let mut repo = InMemoryCaseRepository::default();
        repo.upsert_tag(&CaseTag::new("t1", "Lung")).unwrap();
        repo.upsert_tag(&CaseTag::new("t1", "Lung tumour")).unwrap();

        let tags = repo.list_tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "Lung tumour");
    }
}
