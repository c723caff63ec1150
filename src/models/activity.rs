// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

// ============================================================================
// Profile calendar
// ============================================================================

/// Yearly submission activity for a username.
///
/// `submission_calendar` is kept in the remote's own encoding: a JSON
/// string mapping day-epoch seconds to submission counts. Decoding it is a
/// presentation concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCalendar {
    pub active_years: Vec<i32>,
    pub streak: i32,
    pub total_active_days: i32,
    pub dcc_badges: Vec<DccBadge>,
    pub submission_calendar: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DccBadge {
    pub timestamp: Option<f64>,
    pub name: Option<String>,
    pub icon: Option<String>,
}

// Wire shape of the `userProfileCalendar` operation
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarResponse {
    #[serde(rename = "matchedUser")]
    pub matched_user: Option<CalendarWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarWrapper {
    #[serde(rename = "userCalendar")]
    pub user_calendar: Option<CalendarFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarFields {
    #[serde(rename = "activeYears", default)]
    pub active_years: Vec<i32>,
    #[serde(default)]
    pub streak: i32,
    #[serde(rename = "totalActiveDays", default)]
    pub total_active_days: i32,
    #[serde(rename = "dccBadges", default)]
    pub dcc_badges: Vec<DccBadgeWire>,
    #[serde(rename = "submissionCalendar", default)]
    pub submission_calendar: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DccBadgeWire {
    pub timestamp: Option<f64>,
    pub badge: Option<DccBadgeInner>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DccBadgeInner {
    pub name: Option<String>,
    pub icon: Option<String>,
}

impl CalendarFields {
    pub fn to_calendar(&self) -> ProfileCalendar {
        ProfileCalendar {
            active_years: self.active_years.clone(),
            streak: self.streak,
            total_active_days: self.total_active_days,
            dcc_badges: self
                .dcc_badges
                .iter()
                .map(|d| DccBadge {
                    timestamp: d.timestamp,
                    name: d.badge.as_ref().and_then(|b| b.name.clone()),
                    icon: d.badge.as_ref().and_then(|b| b.icon.clone()),
                })
                .collect(),
            submission_calendar: self.submission_calendar.clone(),
        }
    }
}

// ============================================================================
// Recent submissions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSubmission {
    pub id: String,
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub title_slug: String,
    /// Epoch seconds, as a string on the wire.
    pub timestamp: String,
}

/// The most recent accepted submissions for a username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSubmissions {
    pub submissions: Vec<RecentSubmission>,
}

// Wire shape of the `recentAcSubmissions` operation
#[derive(Debug, Clone, Deserialize)]
pub struct RecentSubmissionsResponse {
    #[serde(rename = "recentAcSubmissionList")]
    pub recent_ac_submission_list: Option<Vec<RecentSubmission>>,
}
