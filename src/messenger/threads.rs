use std::collections::HashSet;

use crate::common::{CommentGroup, ThreadPage};

/// Client-side view of one page of a project's threads.
///
/// `page`/`query` describe what is shown; a request in flight is tracked
/// separately so a failure leaves the last loaded page in place.
#[derive(Debug)]
pub struct ThreadList {
    items: Vec<CommentGroup>,
    page: u32,
    per_page: u32,
    query: Option<String>,
    has_next: bool,
    pending: Option<(u32, Option<String>)>,
}

impl ThreadList {
    pub fn new(per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            page: 1,
            per_page,
            query: None,
            has_next: false,
            pending: None,
        }
    }

    pub fn items(&self) -> &[CommentGroup] {
        &self.items
    }

    /// Page number of the list on screen.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Search text of the list on screen.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Search text of the newest request, loaded or not.
    pub fn active_query(&self) -> Option<&str> {
        match &self.pending {
            Some((_, query)) => query.as_deref(),
            None => self.query(),
        }
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a request for `page`/`query`; the caller sends the command.
    /// Any earlier request still in flight is superseded.
    pub fn request(&mut self, page: u32, query: Option<String>) -> (u32, Option<String>) {
        let query = query
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        let request = (page.max(1), query);
        self.pending = Some(request.clone());
        request
    }

    /// Whether `page`/`query` is the request currently awaited.
    pub fn is_current(&self, page: u32, query: Option<&str>) -> bool {
        matches!(&self.pending, Some((p, q)) if *p == page && q.as_deref() == query)
    }

    /// Store a loaded page, de-duplicated by hash. Stale responses are ignored.
    pub fn apply(&mut self, page: u32, query: Option<&str>, result: ThreadPage) -> bool {
        if !self.is_current(page, query) {
            log::debug!("Discarding stale thread page {page} ({query:?})");
            return false;
        }
        let Some((page, query)) = self.pending.take() else {
            return false;
        };
        self.has_next = result.has_next(page, self.per_page);
        let mut seen = HashSet::new();
        self.items = result
            .items
            .into_iter()
            .filter(|group| seen.insert(group.hash.clone()))
            .collect();
        self.page = page;
        self.query = query;
        true
    }

    /// The awaited request failed; the last loaded list stays. Failures of
    /// superseded requests return `false` and change nothing.
    pub fn fail(&mut self, page: u32, query: Option<&str>) -> bool {
        if !self.is_current(page, query) {
            log::debug!("Ignoring failure of stale thread page {page} ({query:?})");
            return false;
        }
        self.pending = None;
        true
    }

    pub fn find(&self, hash: &str) -> Option<&CommentGroup> {
        self.items.iter().find(|group| group.hash == hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(id: i64, hash: &str) -> CommentGroup {
        CommentGroup {
            id,
            hash: hash.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_message_at: None,
            recipients: Vec::new(),
            last_comment: None,
        }
    }

    fn page_of(groups: Vec<CommentGroup>) -> ThreadPage {
        ThreadPage {
            items: groups,
            page: None,
            per_page: None,
            total: Some(45),
        }
    }

    #[test]
    fn duplicate_hashes_are_dropped() {
        let mut list = ThreadList::new(20);
        list.request(1, None);
        assert!(list.apply(
            1,
            None,
            page_of(vec![group(1, "a"), group(2, "b"), group(3, "a")])
        ));
        let hashes: Vec<_> = list.items().iter().map(|g| g.hash.as_str()).collect();
        assert_eq!(hashes, vec!["a", "b"]);
        assert_eq!(list.items()[0].id, 1);
        assert!(list.has_next());
    }

    #[test]
    fn failure_keeps_previous_list() {
        let mut list = ThreadList::new(20);
        list.request(1, None);
        list.apply(1, None, page_of(vec![group(1, "a")]));

        list.request(2, None);
        assert!(list.is_loading());
        assert!(list.fail(2, None));
        assert!(!list.is_loading());
        assert_eq!(list.items().len(), 1);
        assert_eq!(list.page(), 1);
        assert!(!list.has_previous());
    }

    #[test]
    fn failure_of_superseded_request_is_ignored() {
        let mut list = ThreadList::new(20);
        list.request(1, Some("old".into()));
        list.request(1, Some("new".into()));

        assert!(!list.fail(1, Some("old")));
        assert!(list.is_loading());
        assert!(list.fail(1, Some("new")));
        assert!(!list.is_loading());
        assert_eq!(list.query(), None);
    }

    #[test]
    fn stale_pages_are_ignored() {
        let mut list = ThreadList::new(20);
        list.request(1, Some("old".into()));
        assert_eq!(
            list.request(1, Some("  new ".into())),
            (1, Some("new".to_string()))
        );
        assert_eq!(list.active_query(), Some("new"));
        assert_eq!(list.query(), None);

        assert!(!list.apply(1, Some("old"), page_of(vec![group(1, "a")])));
        assert!(list.items().is_empty());
        assert!(list.apply(1, Some("new"), page_of(vec![group(2, "b")])));
        assert_eq!(list.find("b").map(|g| g.id), Some(2));
        assert_eq!(list.query(), Some("new"));
        assert!(!list.is_loading());
    }

    #[test]
    fn page_never_drops_below_one() {
        let mut list = ThreadList::new(20);
        assert_eq!(list.request(0, Some("".into())), (1, None));
        assert!(!list.has_previous());
    }
}
