// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// One entry in the problem catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    #[serde(rename = "titleSlug")]
    pub title_slug: String,
    pub title: String,
    pub difficulty: String,
    #[serde(rename = "paidOnly")]
    pub paid_only: bool,
    #[serde(rename = "acRate")]
    pub ac_rate: f64,
}

/// Parameters for one page of the problem catalog. Derived each time the
/// combined filter state changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageQuery {
    /// 0-based page index. The remote service is offset-based:
    /// `skip = page_index * page_size`.
    pub page_index: u32,
    pub page_size: u32,
    pub search_text: String,
    pub category_filter: Option<String>,
}

impl PageQuery {
    /// Split the combined filter state into the wire's two mutually
    /// exclusive slots. The remote cannot apply free-text search and a
    /// category filter in one request, so a non-blank search always wins
    /// the wire slot and the category drops to a local post-filter.
    pub fn wire_filters(&self) -> (Option<&str>, Option<&str>) {
        let search = self.search_text.trim();
        if !search.is_empty() {
            (Some(search), None)
        } else if let Some(ref cat) = self.category_filter {
            (None, Some(cat.as_str()))
        } else {
            (None, None)
        }
    }

    /// True when both filter dimensions are active and a local post-filter
    /// must be applied to the returned page.
    pub fn needs_local_filter(&self) -> bool {
        !self.search_text.trim().is_empty() && self.category_filter.is_some()
    }
}

/// One loaded page with navigation keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// `page_index - 1`, absent on page 0.
    pub previous_key: Option<u32>,
    /// `page_index + 1`, absent when the (possibly locally filtered) item
    /// sequence is empty.
    pub next_key: Option<u32>,
}

/// Raw remote page before local filtering and key derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemPage {
    pub questions: Vec<Question>,
    pub total_length: i64,
    pub has_more: bool,
}

// Wire shape of the `problemsetQuestionListV2` operation
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemPageResponse {
    #[serde(rename = "problemsetQuestionListV2")]
    pub problemset_question_list: Option<ProblemPageFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemPageFields {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(rename = "totalLength", default)]
    pub total_length: i64,
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}

impl ProblemPageFields {
    pub fn to_page(&self) -> ProblemPage {
        ProblemPage {
            questions: self.questions.clone(),
            total_length: self.total_length,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(search: &str, filter: Option<&str>) -> PageQuery {
        PageQuery {
            page_index: 0,
            page_size: 20,
            search_text: search.to_string(),
            category_filter: filter.map(String::from),
        }
    }

    #[test]
    fn test_search_wins_wire_slot() {
        let q = query("binary", Some("easy"));
        assert_eq!(q.wire_filters(), (Some("binary"), None));
        assert!(q.needs_local_filter());
    }

    #[test]
    fn test_filter_only_uses_category_slug() {
        let q = query("", Some("easy"));
        assert_eq!(q.wire_filters(), (None, Some("easy")));
        assert!(!q.needs_local_filter());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let q = query("   ", None);
        assert_eq!(q.wire_filters(), (None, None));
        assert!(!q.needs_local_filter());
    }
}
