//! Cursor-based paging over the problem catalog.
//!
//! `PagingEngine` is a restartable loader that merges the two filter
//! dimensions (free-text search, categorical filter) into one remote
//! query per page, applies the local fallback filter when both are
//! active, and derives forward/backward page keys. Pages are not cached;
//! every filter change defines a new logical sequence starting at page 0.

use std::sync::Arc;

use tracing::debug;

use crate::api::{ApiError, RemoteFetcher};
use crate::models::{PageQuery, PageResult, Question};

/// Default page size for catalog requests.
/// 20 keeps responses small while filling a typical list view.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
enum LoadState {
    Idle,
    Loading(u32),
    Loaded,
    Failed { page: u32, message: String },
}

/// Consumer-facing view of the engine: the flattened item list plus
/// loading/error state split between the initial load and appends, so an
/// append failure never discards pages already shown.
#[derive(Debug, Clone, PartialEq)]
pub struct PagingSnapshot {
    pub items: Vec<Question>,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub initial_error: Option<String>,
    pub append_error: Option<String>,
}

/// Fetch one page and shape it per the paging contract: local
/// post-filtering when both filter dimensions are active, then key
/// derivation. `next_key` is absent whenever the filtered page is empty,
/// even if the remote reports more unfiltered results - pagination
/// intentionally stops on an empty filtered page.
pub async fn fetch_page<F: RemoteFetcher>(
    fetcher: &F,
    query: &PageQuery,
) -> Result<PageResult<Question>, ApiError> {
    let raw = fetcher.fetch_problem_page(query).await?;
    let total = raw.questions.len();

    let items: Vec<Question> = if query.needs_local_filter() {
        let want = query.category_filter.as_deref().unwrap_or_default();
        raw.questions
            .into_iter()
            .filter(|q| q.difficulty.eq_ignore_ascii_case(want))
            .collect()
    } else {
        raw.questions
    };

    if items.len() != total {
        debug!(
            page = query.page_index,
            kept = items.len(),
            total,
            "Applied local category post-filter"
        );
    }

    let p = query.page_index;
    Ok(PageResult {
        previous_key: p.checked_sub(1),
        next_key: if items.is_empty() { None } else { Some(p + 1) },
        items,
    })
}

/// Stateful, restartable pager over the problem catalog.
pub struct PagingEngine<F> {
    fetcher: Arc<F>,
    page_size: u32,
    search_text: String,
    category_filter: Option<String>,
    // Committed pages in order; index == page index.
    pages: Vec<PageResult<Question>>,
    state: LoadState,
}

impl<F: RemoteFetcher> PagingEngine<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_page_size(fetcher, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(fetcher: Arc<F>, page_size: u32) -> Self {
        Self {
            fetcher,
            page_size,
            search_text: String::new(),
            category_filter: None,
            pages: Vec::new(),
            state: LoadState::Idle,
        }
    }

    // ===== Filter state =====

    /// Replace the search text. A change discards all loaded pages and
    /// restarts at page 0 on the next load.
    pub fn update_search(&mut self, text: &str) {
        let text = text.trim();
        if text != self.search_text {
            debug!(search = text, "Search updated, resetting pager");
            self.search_text = text.to_string();
            self.reset();
        }
    }

    /// Replace the categorical filter. A change discards all loaded pages
    /// and restarts at page 0 on the next load.
    pub fn update_filter(&mut self, category: Option<&str>) {
        if category != self.category_filter.as_deref() {
            debug!(?category, "Filter updated, resetting pager");
            self.category_filter = category.map(String::from);
            self.reset();
        }
    }

    /// Clear both filter dimensions.
    pub fn clear_filters(&mut self) {
        if !self.search_text.is_empty() || self.category_filter.is_some() {
            self.search_text.clear();
            self.category_filter = None;
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.pages.clear();
        self.state = LoadState::Idle;
    }

    // ===== Loading =====

    fn query_for(&self, page_index: u32) -> PageQuery {
        PageQuery {
            page_index,
            page_size: self.page_size,
            search_text: self.search_text.clone(),
            category_filter: self.category_filter.clone(),
        }
    }

    /// Load the next uncommitted page (the failed page again after a
    /// failure, page 0 from idle). Pages commit strictly in order, so
    /// `previous_key`/`next_key` linkage is never reordered.
    pub async fn load_next(&mut self) {
        let page = self.pages.len() as u32;
        self.state = LoadState::Loading(page);
        let query = self.query_for(page);

        match fetch_page(self.fetcher.as_ref(), &query).await {
            Ok(result) => {
                self.pages.push(result);
                self.state = LoadState::Loaded;
            }
            Err(e) => {
                self.state = LoadState::Failed {
                    page,
                    message: e.to_string(),
                };
            }
        }
    }

    /// Re-enter `Loading` for the page that failed. No-op beyond a plain
    /// load when nothing failed.
    pub async fn retry(&mut self) {
        self.load_next().await
    }

    /// Whether a further page is expected under the current filters.
    pub fn has_next(&self) -> bool {
        match self.pages.last() {
            Some(page) => page.next_key.is_some(),
            None => true,
        }
    }

    /// The committed page results, in order.
    pub fn pages(&self) -> &[PageResult<Question>] {
        &self.pages
    }

    // ===== Recovery =====

    /// Derive the page to reload around a scroll anchor after cache
    /// invalidation or restart: `previous_key + 1` of the closest loaded
    /// page, falling back to `next_key - 1` when there is no previous key.
    pub fn refresh_key(&self, anchor_page: u32) -> Option<u32> {
        if self.pages.is_empty() {
            return None;
        }
        let closest = anchor_page.min(self.pages.len() as u32 - 1) as usize;
        let page = &self.pages[closest];
        page.previous_key
            .map(|k| k + 1)
            .or_else(|| page.next_key.map(|k| k - 1))
    }

    // ===== Consumer view =====

    pub fn snapshot(&self) -> PagingSnapshot {
        let items: Vec<Question> = self
            .pages
            .iter()
            .flat_map(|p| p.items.iter().cloned())
            .collect();

        let (is_loading_initial, is_loading_more) = match self.state {
            LoadState::Loading(page) => (page == 0, page > 0),
            _ => (false, false),
        };
        let (initial_error, append_error) = match &self.state {
            LoadState::Failed { page: 0, message } => (Some(message.clone()), None),
            LoadState::Failed { message, .. } => (None, Some(message.clone())),
            _ => (None, None),
        };

        PagingSnapshot {
            items,
            is_loading_initial,
            is_loading_more,
            initial_error,
            append_error,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use crate::models::{
        BadgeCollection, ContestRanking, ProblemPage, ProfileCalendar, QuestionStatusCounts,
        RecentSubmissions, UserProfile,
    };

    fn question(id: i64, title: &str, difficulty: &str) -> Question {
        Question {
            id,
            title_slug: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            difficulty: difficulty.to_string(),
            paid_only: false,
            ac_rate: 50.0,
        }
    }

    /// In-memory catalog that mimics the remote's offset paging and its
    /// mutually exclusive search/category slots.
    struct MockCatalog {
        questions: Vec<Question>,
        queries: Mutex<Vec<PageQuery>>,
        fail_next: AtomicBool,
    }

    impl MockCatalog {
        fn new(questions: Vec<Question>) -> Self {
            Self {
                questions,
                queries: Mutex::new(Vec::new()),
                fail_next: AtomicBool::new(false),
            }
        }

        fn seen(&self) -> Vec<PageQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteFetcher for MockCatalog {
        async fn fetch_user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
            Err(ApiError::NotFound(username.to_string()))
        }
        async fn fetch_question_counts(
            &self,
            username: &str,
        ) -> Result<QuestionStatusCounts, ApiError> {
            Err(ApiError::NotFound(username.to_string()))
        }
        async fn fetch_profile_calendar(
            &self,
            username: &str,
            _year: Option<i32>,
        ) -> Result<ProfileCalendar, ApiError> {
            Err(ApiError::NotFound(username.to_string()))
        }
        async fn fetch_recent_submissions(
            &self,
            username: &str,
            _limit: u32,
        ) -> Result<RecentSubmissions, ApiError> {
            Err(ApiError::NotFound(username.to_string()))
        }
        async fn fetch_contest_ranking(
            &self,
            username: &str,
        ) -> Result<ContestRanking, ApiError> {
            Err(ApiError::NotFound(username.to_string()))
        }
        async fn fetch_badges(&self, username: &str) -> Result<BadgeCollection, ApiError> {
            Err(ApiError::NotFound(username.to_string()))
        }

        async fn fetch_problem_page(&self, query: &PageQuery) -> Result<ProblemPage, ApiError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ApiError::ServerError("remote down".to_string()));
            }

            let (search, category) = query.wire_filters();
            let matched: Vec<Question> = self
                .questions
                .iter()
                .filter(|q| match (search, category) {
                    (Some(kw), _) => q.title.to_lowercase().contains(&kw.to_lowercase()),
                    (None, Some(slug)) => q.difficulty.eq_ignore_ascii_case(slug),
                    (None, None) => true,
                })
                .cloned()
                .collect();

            let skip = (query.page_index * query.page_size) as usize;
            let limit = query.page_size as usize;
            let page: Vec<Question> = matched.iter().skip(skip).take(limit).cloned().collect();
            Ok(ProblemPage {
                has_more: skip + limit < matched.len(),
                total_length: matched.len() as i64,
                questions: page,
            })
        }
    }

    fn catalog() -> Vec<Question> {
        // 5 "binary" questions: 4 medium ahead of the single easy one, so
        // a 4-item page 0 of the search carries no easy items at all.
        vec![
            question(1, "Binary Search", "Medium"),
            question(2, "Binary Tree Paths", "Medium"),
            question(3, "Binary Watch", "Medium"),
            question(4, "Maximum Binary Gap", "Medium"),
            question(5, "Add Binary", "Easy"),
            question(6, "Two Sum", "Easy"),
            question(7, "Valid Parentheses", "Easy"),
        ]
    }

    fn engine(page_size: u32) -> (Arc<MockCatalog>, PagingEngine<MockCatalog>) {
        let fetcher = Arc::new(MockCatalog::new(catalog()));
        let engine = PagingEngine::with_page_size(fetcher.clone(), page_size);
        (fetcher, engine)
    }

    #[tokio::test]
    async fn test_unfiltered_page_zero_is_idempotent() {
        let (_, mut first) = engine(3);
        first.load_next().await;
        let (_, mut second) = engine(3);
        second.load_next().await;

        assert_eq!(first.pages(), second.pages());
        let page = &first.pages()[0];
        assert_eq!(page.previous_key, None);
        assert_eq!(page.next_key, Some(1));
        assert_eq!(page.items.len(), 3);
    }

    #[tokio::test]
    async fn test_search_and_filter_precedence() {
        let (fetcher, mut engine) = engine(10);
        engine.update_search("binary");
        engine.update_filter(Some("easy"));
        engine.load_next().await;

        // The wire request carries the search keyword and no category.
        let seen = fetcher.seen();
        assert_eq!(seen[0].wire_filters(), (Some("binary"), None));

        // The returned sequence is locally narrowed to the category.
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert!(snapshot.items[0].difficulty.eq_ignore_ascii_case("easy"));
    }

    #[tokio::test]
    async fn test_filter_only_queries_by_category() {
        let (fetcher, mut engine) = engine(10);
        engine.update_filter(Some("easy"));
        engine.load_next().await;

        assert_eq!(fetcher.seen()[0].wire_filters(), (None, Some("easy")));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.items.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_filtered_page_stops_pagination() {
        // Page size 4: page 0 of the "binary" search is all medium, so a
        // local "easy" filter empties it while the remote still has more.
        let (_, mut engine) = engine(4);
        engine.update_search("binary");
        engine.update_filter(Some("easy"));
        engine.load_next().await;

        let page = &engine.pages()[0];
        assert!(page.items.is_empty());
        assert_eq!(page.next_key, None);
        assert!(!engine.has_next());
    }

    #[tokio::test]
    async fn test_page_key_linkage() {
        let (_, mut engine) = engine(3);
        engine.load_next().await;
        engine.load_next().await;

        let pages = engine.pages();
        assert_eq!(pages[0].previous_key, None);
        assert_eq!(pages[0].next_key, Some(1));
        assert_eq!(pages[1].previous_key, Some(0));
        assert_eq!(pages[1].next_key, Some(2));
    }

    #[tokio::test]
    async fn test_filter_change_resets_to_page_zero() {
        let (fetcher, mut engine) = engine(2);
        engine.load_next().await;
        engine.load_next().await;
        engine.load_next().await;
        assert_eq!(engine.pages().len(), 3);

        engine.update_filter(Some("easy"));
        assert!(engine.snapshot().items.is_empty());
        assert!(engine.pages().is_empty());

        engine.load_next().await;
        let last = fetcher.seen().pop().unwrap();
        assert_eq!(last.page_index, 0);
        assert_eq!(last.category_filter.as_deref(), Some("easy"));
    }

    #[tokio::test]
    async fn test_initial_failure_and_retry() {
        let (fetcher, mut engine) = engine(3);
        fetcher.fail_next.store(true, Ordering::SeqCst);
        engine.load_next().await;

        let snapshot = engine.snapshot();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.initial_error.is_some());
        assert!(snapshot.append_error.is_none());

        engine.retry().await;
        let snapshot = engine.snapshot();
        assert!(snapshot.initial_error.is_none());
        assert_eq!(snapshot.items.len(), 3);
    }

    #[tokio::test]
    async fn test_append_failure_preserves_loaded_pages() {
        let (fetcher, mut engine) = engine(3);
        engine.load_next().await;
        fetcher.fail_next.store(true, Ordering::SeqCst);
        engine.load_next().await;

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.items.len(), 3);
        assert!(snapshot.initial_error.is_none());
        assert_eq!(snapshot.append_error.as_deref(), Some("Server error: remote down"));

        // Retry reloads the failed page without disturbing page 0.
        engine.retry().await;
        assert_eq!(engine.pages().len(), 2);
        assert_eq!(engine.snapshot().items.len(), 6);
    }

    #[tokio::test]
    async fn test_refresh_key_recovers_around_anchor() {
        let (_, mut engine) = engine(2);
        assert_eq!(engine.refresh_key(0), None);

        engine.load_next().await;
        engine.load_next().await;
        engine.load_next().await;

        // Anchor inside the loaded range: previous_key + 1.
        assert_eq!(engine.refresh_key(1), Some(1));
        // Anchor past the end clamps to the closest loaded page.
        assert_eq!(engine.refresh_key(9), Some(2));
        // Page 0 has no previous key; falls back to next_key - 1.
        assert_eq!(engine.refresh_key(0), Some(0));
    }

    #[tokio::test]
    async fn test_loading_state_split() {
        let (_, engine) = engine(3);
        let snapshot = engine.snapshot();
        assert!(!snapshot.is_loading_initial);
        assert!(!snapshot.is_loading_more);
    }
}
