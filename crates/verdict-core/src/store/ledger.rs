//! Two-level moderation ledger: post id -> guideline id -> result.

use indexmap::IndexMap;

use crate::types::{ModerationResult, PageResult};

/// Results recorded for a single post, keyed by guideline id.
pub type PostResults = IndexMap<String, ModerationResult>;

/// Every recorded result, keyed by post id then guideline id.
pub type AllResults = IndexMap<String, PostResults>;

/// Ordered ledger of moderation verdicts.
///
/// Posts are listed in the order they were first moderated. Within a post,
/// guidelines are listed in the order they were first applied; overwriting a
/// result keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationLedger {
    posts: AllResults,
}

impl ModerationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the result for `(post_id, guideline_id)`. Last write wins.
    pub fn upsert(&mut self, post_id: &str, guideline_id: &str, result: ModerationResult) {
        let post = self.posts.entry(post_id.to_string()).or_default();
        let replaced = post.insert(guideline_id.to_string(), result).is_some();

        tracing::debug!(post_id, guideline_id, replaced, "Moderation result recorded");
    }

    pub fn get(&self, post_id: &str, guideline_id: &str) -> Option<&ModerationResult> {
        self.posts.get(post_id)?.get(guideline_id)
    }

    /// Copy of the results for one post; empty when the post is unknown.
    pub fn get_for_post(&self, post_id: &str) -> PostResults {
        self.posts.get(post_id).cloned().unwrap_or_default()
    }

    /// Copy of the whole ledger.
    pub fn get_all(&self) -> AllResults {
        self.posts.clone()
    }

    /// Number of recorded (post, guideline) results.
    pub fn len(&self) -> usize {
        self.posts.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.values().all(IndexMap::is_empty)
    }

    /// One page of results, most recently written first.
    ///
    /// Results are flattened post by post in ledger order and then reversed.
    /// `page` is 1-indexed. Out-of-range pages, `page < 1` and `per_page <= 0`
    /// produce an empty page; `page` and `per_page` are echoed unchanged.
    pub fn paginate(&self, page: i64, per_page: i64) -> PageResult {
        let all_results: Vec<&ModerationResult> = self
            .posts
            .values()
            .flat_map(|post| post.values())
            .collect();

        let total = all_results.len();
        let total_pages = if per_page > 0 {
            total.div_ceil(per_page as usize)
        } else {
            0
        };

        let results = match page_bounds(page, per_page, total) {
            Some((start, end)) => all_results
                .iter()
                .rev()
                .skip(start)
                .take(end - start)
                .map(|result| (*result).clone())
                .collect(),
            None => Vec::new(),
        };

        PageResult {
            results,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Slice bounds `[start, end)` into the reversed result list, clamped to `total`.
fn page_bounds(page: i64, per_page: i64, total: usize) -> Option<(usize, usize)> {
    if page < 1 || per_page <= 0 {
        return None;
    }

    let start = usize::try_from((page - 1).checked_mul(per_page)?).ok()?;
    if start >= total {
        return None;
    }
    let end = start.saturating_add(per_page as usize).min(total);

    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Identity, Outcome};
    use proptest::prelude::*;

    fn result(post_id: &str, guideline_id: &str, content: &str) -> ModerationResult {
        ModerationResult {
            post_id: post_id.to_string(),
            guideline_id: guideline_id.to_string(),
            post_content: content.to_string(),
            outcome: Outcome::Keep,
            reasoning: String::new(),
            moderator_address: Identity::new("0xmod"),
        }
    }

    fn ledger_with_three() -> (ModerationLedger, [ModerationResult; 3]) {
        let r1 = result("p1", "g1", "one");
        let r2 = result("p2", "g1", "two");
        let r3 = result("p3", "g2", "three");

        let mut ledger = ModerationLedger::new();
        for r in [&r1, &r2, &r3] {
            ledger.upsert(&r.post_id, &r.guideline_id, r.clone());
        }
        (ledger, [r1, r2, r3])
    }

    #[test]
    fn test_get_absent_levels() {
        let (ledger, _) = ledger_with_three();
        assert!(ledger.get("p1", "g1").is_some());
        assert!(ledger.get("p1", "g2").is_none());
        assert!(ledger.get("nope", "g1").is_none());
        assert!(ledger.get_for_post("nope").is_empty());
    }

    #[test]
    fn test_overwrite_keeps_single_entry_and_position() {
        let mut ledger = ModerationLedger::new();
        ledger.upsert("p1", "g1", result("p1", "g1", "first"));
        ledger.upsert("p1", "g2", result("p1", "g2", "other"));
        ledger.upsert("p1", "g1", result("p1", "g1", "second"));

        assert_eq!(ledger.get("p1", "g1").unwrap().post_content, "second");

        let post = ledger.get_for_post("p1");
        assert_eq!(post.len(), 2);
        let order: Vec<_> = post.keys().cloned().collect();
        assert_eq!(order, vec!["g1", "g2"]);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_outer_order_is_first_moderated() {
        let mut ledger = ModerationLedger::new();
        ledger.upsert("zz", "g1", result("zz", "g1", "a"));
        ledger.upsert("aa", "g1", result("aa", "g1", "b"));
        ledger.upsert("zz", "g2", result("zz", "g2", "c"));

        let posts: Vec<_> = ledger.get_all().keys().cloned().collect();
        assert_eq!(posts, vec!["zz", "aa"]);
    }

    #[test]
    fn test_pagination_scenario() {
        let (ledger, [r1, r2, r3]) = ledger_with_three();

        let first = ledger.paginate(1, 2);
        assert_eq!(first.results, vec![r3.clone(), r2.clone()]);
        assert_eq!(first.total, 3);
        assert_eq!(first.page, 1);
        assert_eq!(first.per_page, 2);
        assert_eq!(first.total_pages, 2);

        let second = ledger.paginate(2, 2);
        assert_eq!(second.results, vec![r1]);
        assert_eq!(second.total_pages, 2);

        let third = ledger.paginate(3, 2);
        assert!(third.results.is_empty());
        assert_eq!(third.total, 3);
        assert_eq!(third.page, 3);
        assert_eq!(third.total_pages, 2);
    }

    #[test]
    fn test_pagination_degenerate_arguments() {
        let (ledger, _) = ledger_with_three();

        let zero = ledger.paginate(1, 0);
        assert!(zero.results.is_empty());
        assert_eq!(zero.total_pages, 0);
        assert_eq!(zero.total, 3);

        let negative = ledger.paginate(1, -5);
        assert!(negative.results.is_empty());
        assert_eq!(negative.per_page, -5);
        assert_eq!(negative.total_pages, 0);

        assert!(ledger.paginate(0, 2).results.is_empty());
        assert!(ledger.paginate(-3, 2).results.is_empty());
        assert!(ledger.paginate(i64::MAX, i64::MAX).results.is_empty());
    }

    #[test]
    fn test_pagination_follows_flattened_order() {
        // A later result for an earlier post stays inside that post's block.
        let mut ledger = ModerationLedger::new();
        ledger.upsert("p1", "g1", result("p1", "g1", "a"));
        ledger.upsert("p2", "g1", result("p2", "g1", "b"));
        ledger.upsert("p1", "g2", result("p1", "g2", "c"));

        let page = ledger.paginate(1, 10);
        let contents: Vec<_> = page.results.iter().map(|r| r.post_content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_empty_ledger_page() {
        let ledger = ModerationLedger::new();
        let page = ledger.paginate(1, 10);
        assert!(page.results.is_empty());
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    proptest! {
        #[test]
        fn prop_pages_partition_reversed_results(count in 0usize..40, per_page in 1i64..8) {
            let mut ledger = ModerationLedger::new();
            for i in 0..count {
                let post = format!("p{i}");
                ledger.upsert(&post, "g", result(&post, "g", &i.to_string()));
            }

            let first = ledger.paginate(1, per_page);
            let mut seen = Vec::new();
            for page in 1..=(first.total_pages as i64 + 1) {
                seen.extend(ledger.paginate(page, per_page).results);
            }

            let expected: Vec<_> = (0..count).rev().map(|i| i.to_string()).collect();
            let contents: Vec<_> = seen.into_iter().map(|r| r.post_content).collect();
            prop_assert_eq!(contents, expected);
            prop_assert_eq!(first.total_pages, count.div_ceil(per_page as usize));
        }
    }
}
