//! GraphQL documents and request builders for the LeetCode endpoint.
//!
//! Every operation is a POST of `{ query, operationName, variables }` to
//! the single `/graphql` endpoint. The builders here produce the request
//! body; the client owns transport and decoding.

use serde_json::{json, Map, Value};

use crate::models::PageQuery;

pub const USER_PROFILE_QUERY: &str = r#"
query userInfo($username: String!) {
    matchedUser(username: $username) {
        username
        githubUrl
        twitterUrl
        linkedinUrl
        profile {
            ranking
            userAvatar
            realName
            aboutMe
            school
            countryName
            company
            jobTitle
            skillTags
            reputation
        }
    }
}
"#;

pub const QUESTION_COUNTS_QUERY: &str = r#"
query userSessionProgress($username: String!) {
    allQuestionsCount {
        difficulty
        count
    }
    matchedUser(username: $username) {
        submitStats {
            acSubmissionNum {
                difficulty
                count
                submissions
            }
            totalSubmissionNum {
                difficulty
                count
                submissions
            }
        }
    }
}
"#;

pub const PROFILE_CALENDAR_QUERY: &str = r#"
query userProfileCalendar($username: String!, $year: Int) {
    matchedUser(username: $username) {
        userCalendar(year: $year) {
            activeYears
            streak
            totalActiveDays
            dccBadges {
                timestamp
                badge {
                    name
                    icon
                }
            }
            submissionCalendar
        }
    }
}
"#;

pub const RECENT_SUBMISSIONS_QUERY: &str = r#"
query recentAcSubmissions($username: String!, $limit: Int!) {
    recentAcSubmissionList(username: $username, limit: $limit) {
        id
        title
        titleSlug
        timestamp
    }
}
"#;

pub const CONTEST_RANKING_QUERY: &str = r#"
query userContestRankingInfo($username: String!) {
    userContestRanking(username: $username) {
        attendedContestsCount
        rating
        globalRanking
        totalParticipants
        topPercentage
        badge {
            name
        }
    }
}
"#;

pub const BADGES_QUERY: &str = r#"
query userBadges($username: String!) {
    matchedUser(username: $username) {
        badges {
            id
            name
            displayName
            icon
            creationDate
            category
        }
        upcomingBadges {
            name
            icon
            progress
        }
    }
}
"#;

pub const PROBLEM_PAGE_QUERY: &str = r#"
query problemsetQuestionListV2($limit: Int, $skip: Int, $searchKeyword: String, $categorySlug: String) {
    problemsetQuestionListV2(
        limit: $limit,
        skip: $skip,
        searchKeyword: $searchKeyword,
        sortBy: { sortField: CUSTOM, sortOrder: ASCENDING },
        categorySlug: $categorySlug
    ) {
        questions {
            id
            titleSlug
            title
            difficulty
            paidOnly
            acRate
        }
        totalLength
        hasMore
    }
}
"#;

fn request(query: &str, operation: &str, variables: Value) -> Value {
    json!({
        "query": query,
        "operationName": operation,
        "variables": variables,
    })
}

pub fn user_profile_request(username: &str) -> Value {
    request(
        USER_PROFILE_QUERY,
        "userInfo",
        json!({ "username": username }),
    )
}

pub fn question_counts_request(username: &str) -> Value {
    request(
        QUESTION_COUNTS_QUERY,
        "userSessionProgress",
        json!({ "username": username }),
    )
}

pub fn profile_calendar_request(username: &str, year: Option<i32>) -> Value {
    let mut variables = Map::new();
    variables.insert("username".to_string(), json!(username));
    if let Some(year) = year {
        variables.insert("year".to_string(), json!(year));
    }
    request(
        PROFILE_CALENDAR_QUERY,
        "userProfileCalendar",
        Value::Object(variables),
    )
}

pub fn recent_submissions_request(username: &str, limit: u32) -> Value {
    request(
        RECENT_SUBMISSIONS_QUERY,
        "recentAcSubmissions",
        json!({ "username": username, "limit": limit }),
    )
}

pub fn contest_ranking_request(username: &str) -> Value {
    request(
        CONTEST_RANKING_QUERY,
        "userContestRankingInfo",
        json!({ "username": username }),
    )
}

pub fn badges_request(username: &str) -> Value {
    request(BADGES_QUERY, "userBadges", json!({ "username": username }))
}

/// Build the problem-page request. The remote is offset-based
/// (`skip = page_index * page_size`); an empty search keyword is sent as
/// null and an empty category slug is omitted entirely, which is what the
/// endpoint expects for "no filter".
pub fn problem_page_request(query: &PageQuery) -> Value {
    let (search, category) = query.wire_filters();
    let skip = query.page_index as i64 * query.page_size as i64;

    let mut variables = Map::new();
    variables.insert("limit".to_string(), json!(query.page_size));
    variables.insert("skip".to_string(), json!(skip));
    variables.insert(
        "searchKeyword".to_string(),
        search.map_or(Value::Null, |s| json!(s)),
    );
    if let Some(slug) = category {
        variables.insert("categorySlug".to_string(), json!(slug));
    }

    request(
        PROBLEM_PAGE_QUERY,
        "problemsetQuestionListV2",
        Value::Object(variables),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: u32, search: &str, filter: Option<&str>) -> PageQuery {
        PageQuery {
            page_index: index,
            page_size: 20,
            search_text: search.to_string(),
            category_filter: filter.map(String::from),
        }
    }

    #[test]
    fn test_problem_page_offset() {
        let body = problem_page_request(&page(3, "", None));
        assert_eq!(body["variables"]["skip"], 60);
        assert_eq!(body["variables"]["limit"], 20);
        assert_eq!(body["variables"]["searchKeyword"], Value::Null);
        assert!(body["variables"].get("categorySlug").is_none());
    }

    #[test]
    fn test_search_and_filter_are_mutually_exclusive_on_the_wire() {
        let body = problem_page_request(&page(0, "binary", Some("easy")));
        assert_eq!(body["variables"]["searchKeyword"], "binary");
        // The category never reaches the wire while a search is active.
        assert!(body["variables"].get("categorySlug").is_none());
    }

    #[test]
    fn test_filter_only_sends_category_slug() {
        let body = problem_page_request(&page(0, "", Some("easy")));
        assert_eq!(body["variables"]["searchKeyword"], Value::Null);
        assert_eq!(body["variables"]["categorySlug"], "easy");
    }

    #[test]
    fn test_calendar_year_is_optional() {
        let with_year = profile_calendar_request("neal", Some(2024));
        assert_eq!(with_year["variables"]["year"], 2024);
        let without = profile_calendar_request("neal", None);
        assert!(without["variables"].get("year").is_none());
    }
}
