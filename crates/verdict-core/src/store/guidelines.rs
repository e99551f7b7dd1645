//! Append-only guideline registry.

use indexmap::IndexMap;

use crate::types::{Guideline, Identity};
use crate::validation::require_non_blank;
use crate::ModerationError;

/// Guidelines keyed by id, in registration order.
pub type GuidelineMap = IndexMap<String, Guideline>;

/// Ordered mapping from guideline id to [`Guideline`].
///
/// Guidelines are listed in registration order and never change once added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuidelineStore {
    guidelines: GuidelineMap,
}

impl GuidelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new guideline at the end of the store.
    ///
    /// The duplicate check runs before the blank check, so re-registering an
    /// existing id always reports `DuplicateId`.
    pub fn add(
        &mut self,
        id: &str,
        text: &str,
        creator_address: Identity,
    ) -> Result<(), ModerationError> {
        if self.guidelines.contains_key(id) {
            return Err(ModerationError::DuplicateId(id.to_string()));
        }

        require_non_blank(&[id, text], "Guideline ID and text cannot be empty")?;

        let guideline = Guideline {
            id: id.to_string(),
            text: text.to_string(),
            creator_address,
        };
        self.guidelines.insert(id.to_string(), guideline);

        tracing::debug!(guideline_id = id, total = self.guidelines.len(), "Guideline registered");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Guideline> {
        self.guidelines.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.guidelines.contains_key(id)
    }

    /// Copy of every guideline in registration order.
    pub fn list_all(&self) -> GuidelineMap {
        self.guidelines.clone()
    }

    pub fn len(&self) -> usize {
        self.guidelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guidelines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn creator() -> Identity {
        Identity::new("0xcreator")
    }

    #[test]
    fn test_add_and_get() {
        let mut store = GuidelineStore::new();
        store.add("no-dogs", "No dog content", creator()).unwrap();

        let guideline = store.get("no-dogs").unwrap();
        assert_eq!(guideline.text, "No dog content");
        assert_eq!(guideline.creator_address, creator());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_rejected_and_original_kept() {
        let mut store = GuidelineStore::new();
        store.add("g1", "first", creator()).unwrap();

        let err = store.add("g1", "second", Identity::new("0xother")).unwrap_err();
        assert!(matches!(err, ModerationError::DuplicateId(ref id) if id == "g1"));

        let stored = store.get("g1").unwrap();
        assert_eq!(stored.text, "first");
        assert_eq!(stored.creator_address, creator());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut store = GuidelineStore::new();

        for (id, text) in [("", "text"), ("  ", "text"), ("id", ""), ("id", " \t ")] {
            let err = store.add(id, text, creator()).unwrap_err();
            assert!(matches!(err, ModerationError::InputValidation(_)));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_are_stored_untrimmed() {
        let mut store = GuidelineStore::new();
        store.add(" padded ", "text", creator()).unwrap();

        assert!(store.contains(" padded "));
        assert!(!store.contains("padded"));
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut store = GuidelineStore::new();
        for id in ["zeta", "alpha", "mid"] {
            store.add(id, "text", creator()).unwrap();
        }

        let ids: Vec<_> = store.list_all().keys().cloned().collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_list_is_a_copy() {
        let mut store = GuidelineStore::new();
        store.add("g1", "text", creator()).unwrap();

        let snapshot = store.list_all();
        store.add("g2", "text", creator()).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.list_all().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_second_add_always_duplicate(id in "[a-z0-9-]{1,16}", a in ".{1,32}", b in ".{0,32}") {
            prop_assume!(!a.trim().is_empty());

            let mut store = GuidelineStore::new();
            store.add(&id, &a, creator()).unwrap();

            let second = store.add(&id, &b, Identity::new("0xsecond"));
            prop_assert!(matches!(second, Err(ModerationError::DuplicateId(_))));
            prop_assert_eq!(&store.get(&id).unwrap().text, &a);
        }
    }
}
