//! GraphQL client for the LeetCode query endpoint.
//!
//! This module provides the `RemoteFetcher` trait - one operation per
//! cached entity kind plus the paginated problem-list query - and
//! `LeetCodeClient`, its production implementation over a single
//! anonymous GraphQL endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    BadgeCollection, BadgesResponse, CalendarResponse, ContestRanking, ContestRankingResponse,
    PageQuery, ProblemPage, ProblemPageResponse, ProfileCalendar, QuestionCountsResponse,
    QuestionStatusCounts, RecentSubmissions, RecentSubmissionsResponse, UserProfile,
    UserProfileResponse,
};

use super::queries;
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Single query endpoint; every operation is a POST here.
const GRAPHQL_ENDPOINT: &str = "https://leetcode.com/graphql";

/// The endpoint rejects requests without a site referer.
const REFERER: &str = "https://leetcode.com/";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
/// 1 second is polite to the server while not making users wait too long.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Abstraction over the external query service. One operation per cached
/// entity kind, each keyed by username, plus the paginated problem list.
///
/// Implementations perform no caching and no application-level retries;
/// retry policy belongs to the caller. Backoff on 429 inside an
/// implementation is transport-level and allowed.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch_user_profile(&self, username: &str) -> Result<UserProfile, ApiError>;

    async fn fetch_question_counts(&self, username: &str)
        -> Result<QuestionStatusCounts, ApiError>;

    async fn fetch_profile_calendar(
        &self,
        username: &str,
        year: Option<i32>,
    ) -> Result<ProfileCalendar, ApiError>;

    async fn fetch_recent_submissions(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<RecentSubmissions, ApiError>;

    async fn fetch_contest_ranking(&self, username: &str) -> Result<ContestRanking, ApiError>;

    async fn fetch_badges(&self, username: &str) -> Result<BadgeCollection, ApiError>;

    /// Fetch one raw page of the problem catalog. Offset-based:
    /// `skip = page_index * page_size`.
    async fn fetch_problem_page(&self, query: &PageQuery) -> Result<ProblemPage, ApiError>;
}

// GraphQL response envelope: either `data` or an `errors` array.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// GraphQL client for LeetCode.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct LeetCodeClient {
    client: Client,
    endpoint: String,
}

impl LeetCodeClient {
    /// Create a new client against the production endpoint.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_endpoint(GRAPHQL_ENDPOINT)
    }

    /// Create a client against an alternate endpoint (tests, mirrors).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// POST one GraphQL operation and decode its `data` payload, backing
    /// off and retrying when rate limited.
    async fn post_query<T: DeserializeOwned>(&self, body: &Value) -> Result<T, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&self.endpoint)
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::REFERER, REFERER)
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status.as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(retry = retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2; // Exponential backoff
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ApiError::from_status(status, &text));
            }

            let envelope: Envelope<T> = response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

            if !envelope.errors.is_empty() {
                let messages: Vec<&str> =
                    envelope.errors.iter().map(|e| e.message.as_str()).collect();
                return Err(ApiError::Query(messages.join("; ")));
            }

            return envelope
                .data
                .ok_or_else(|| ApiError::InvalidResponse("response carried no data".to_string()));
        }
    }
}

#[async_trait]
impl RemoteFetcher for LeetCodeClient {
    async fn fetch_user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        debug!(username, "Fetching user profile");
        let body = queries::user_profile_request(username);
        let response: UserProfileResponse = self.post_query(&body).await?;
        response
            .matched_user
            .map(|u| u.to_profile())
            .ok_or_else(|| ApiError::NotFound(username.to_string()))
    }

    async fn fetch_question_counts(
        &self,
        username: &str,
    ) -> Result<QuestionStatusCounts, ApiError> {
        debug!(username, "Fetching question status counts");
        let body = queries::question_counts_request(username);
        let response: QuestionCountsResponse = self.post_query(&body).await?;
        response
            .to_counts()
            .ok_or_else(|| ApiError::NotFound(username.to_string()))
    }

    async fn fetch_profile_calendar(
        &self,
        username: &str,
        year: Option<i32>,
    ) -> Result<ProfileCalendar, ApiError> {
        debug!(username, ?year, "Fetching profile calendar");
        let body = queries::profile_calendar_request(username, year);
        let response: CalendarResponse = self.post_query(&body).await?;
        response
            .matched_user
            .and_then(|m| m.user_calendar)
            .map(|c| c.to_calendar())
            .ok_or_else(|| ApiError::NotFound(username.to_string()))
    }

    async fn fetch_recent_submissions(
        &self,
        username: &str,
        limit: u32,
    ) -> Result<RecentSubmissions, ApiError> {
        debug!(username, limit, "Fetching recent submissions");
        let body = queries::recent_submissions_request(username, limit);
        let response: RecentSubmissionsResponse = self.post_query(&body).await?;
        response
            .recent_ac_submission_list
            .map(|submissions| RecentSubmissions { submissions })
            .ok_or_else(|| ApiError::NotFound(username.to_string()))
    }

    async fn fetch_contest_ranking(&self, username: &str) -> Result<ContestRanking, ApiError> {
        debug!(username, "Fetching contest ranking");
        let body = queries::contest_ranking_request(username);
        let response: ContestRankingResponse = self.post_query(&body).await?;
        // A null ranking is how the remote reports "never attended a
        // contest" as well as an unknown username.
        response
            .user_contest_ranking
            .map(|r| r.to_ranking())
            .ok_or_else(|| ApiError::NotFound(username.to_string()))
    }

    async fn fetch_badges(&self, username: &str) -> Result<BadgeCollection, ApiError> {
        debug!(username, "Fetching badges");
        let body = queries::badges_request(username);
        let response: BadgesResponse = self.post_query(&body).await?;
        response
            .matched_user
            .map(|b| b.to_collection())
            .ok_or_else(|| ApiError::NotFound(username.to_string()))
    }

    async fn fetch_problem_page(&self, query: &PageQuery) -> Result<ProblemPage, ApiError> {
        debug!(
            page = query.page_index,
            size = query.page_size,
            "Fetching problem page"
        );
        let body = queries::problem_page_request(query);
        let response: ProblemPageResponse = self.post_query(&body).await?;
        response
            .problemset_question_list
            .map(|p| p.to_page())
            .ok_or_else(|| {
                ApiError::InvalidResponse("problem list missing from response".to_string())
            })
    }
}
