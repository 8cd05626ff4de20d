use std::collections::HashSet;
use std::future::Future;

use chrono::{DateTime, Utc};

use crate::common::{Comment, Page};
use crate::network::{ApiClient, ApiError};

/// Items a cursor pager can de-duplicate and order.
pub trait PagedItem {
    fn item_id(&self) -> i64;
    fn created_at(&self) -> DateTime<Utc>;
}

impl PagedItem for Comment {
    fn item_id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Paged fetch with an opaque cursor: `fetch_page(cursor) -> (items, next cursor)`.
pub trait PageSource {
    type Item;

    fn fetch_page(
        &self,
        before_id: Option<i64>,
    ) -> impl Future<Output = Result<Page<Self::Item>, ApiError>> + Send;
}

/// Comments of one thread, fetched `limit` at a time.
pub struct CommentSource<'a> {
    pub client: &'a ApiClient,
    pub group_hash: &'a str,
    pub limit: u32,
}

impl PageSource for CommentSource<'_> {
    type Item = Comment;

    async fn fetch_page(&self, before_id: Option<i64>) -> Result<Page<Comment>, ApiError> {
        self.client
            .list_comments(self.group_hash, before_id, self.limit)
            .await
    }
}

/// Identifies one page request issued by a [`CursorPager`].
pub type RequestId = u64;

/// Client-side state of a cursor-paginated listing.
///
/// The backend serves pages newest to oldest; `items` is kept oldest to
/// newest and never holds two entries with the same id. At most one page
/// request is outstanding, and only its result or failure is applied.
#[derive(Debug)]
pub struct CursorPager<T> {
    items: Vec<T>,
    next_before_id: Option<i64>,
    has_more: bool,
    outstanding: Option<RequestId>,
    last_request: RequestId,
}

impl<T> Default for CursorPager<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_before_id: None,
            has_more: false,
            outstanding: None,
            last_request: 0,
        }
    }
}

impl<T: PagedItem> CursorPager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    /// "Load older" is offered only when it would issue a request.
    pub fn can_load_older(&self) -> bool {
        self.has_more && self.outstanding.is_none() && self.next_before_id.is_some()
    }

    fn issue(&mut self) -> RequestId {
        self.last_request += 1;
        self.outstanding = Some(self.last_request);
        self.last_request
    }

    /// Drop everything and request the newest page. Supersedes any request in flight.
    pub fn begin_initial(&mut self) -> RequestId {
        self.clear();
        self.issue()
    }

    /// Ticket and cursor for the next older page, or `None` if a request must not be issued.
    pub fn begin_older(&mut self) -> Option<(RequestId, i64)> {
        if !self.can_load_older() {
            return None;
        }
        let cursor = self.next_before_id?;
        Some((self.issue(), cursor))
    }

    /// Merge the page answering `request`. Pages of superseded requests are
    /// dropped and `false` is returned.
    pub fn apply_page(&mut self, request: RequestId, page: Page<T>) -> bool {
        if self.outstanding != Some(request) {
            log::debug!("Discarding superseded page request {request}");
            return false;
        }
        self.outstanding = None;
        self.next_before_id = page.next_before_id();
        self.has_more = self.next_before_id.is_some();

        self.items.extend(page.items);
        let mut seen = HashSet::new();
        self.items.retain(|item| seen.insert(item.item_id()));
        self.items
            .sort_by_key(|item| (item.created_at(), item.item_id()));
        true
    }

    /// `request` failed; loaded items stay and loading may be retried.
    /// Returns `false` when the request was already superseded.
    pub fn fail(&mut self, request: RequestId) -> bool {
        if self.outstanding != Some(request) {
            return false;
        }
        self.outstanding = None;
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.next_before_id = None;
        self.has_more = false;
        self.outstanding = None;
    }
}

/// Drive `source` until it runs out of pages. Returns the number of requests made.
pub async fn fetch_all<S>(source: &S, pager: &mut CursorPager<S::Item>) -> Result<usize, ApiError>
where
    S: PageSource,
    S::Item: PagedItem,
{
    let mut request = pager.begin_initial();
    let mut cursor = None;
    let mut requests = 0;
    loop {
        requests += 1;
        match source.fetch_page(cursor).await {
            Ok(page) => {
                pager.apply_page(request, page);
            }
            Err(err) => {
                pager.fail(request);
                return Err(err);
            }
        }
        match pager.begin_older() {
            Some((next, before_id)) => {
                request = next;
                cursor = Some(before_id);
            }
            None => return Ok(requests),
        }
    }
}
