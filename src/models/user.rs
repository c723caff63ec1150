// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

// ============================================================================
// User profile
// ============================================================================

/// Public profile for a LeetCode username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub real_name: Option<String>,
    pub avatar_url: Option<String>,
    pub ranking: Option<i64>,
    pub country: Option<String>,
    pub school: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub about: Option<String>,
    pub skill_tags: Vec<String>,
    pub reputation: Option<i64>,
    pub github_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
}

// Wire shape of the `userInfo` operation
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfileResponse {
    #[serde(rename = "matchedUser")]
    pub matched_user: Option<MatchedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchedUser {
    pub username: String,
    #[serde(rename = "githubUrl")]
    pub github_url: Option<String>,
    #[serde(rename = "twitterUrl")]
    pub twitter_url: Option<String>,
    #[serde(rename = "linkedinUrl")]
    pub linkedin_url: Option<String>,
    pub profile: Option<ProfileFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileFields {
    pub ranking: Option<i64>,
    #[serde(rename = "userAvatar")]
    pub user_avatar: Option<String>,
    #[serde(rename = "realName")]
    pub real_name: Option<String>,
    #[serde(rename = "aboutMe")]
    pub about_me: Option<String>,
    pub school: Option<String>,
    #[serde(rename = "countryName")]
    pub country_name: Option<String>,
    pub company: Option<String>,
    #[serde(rename = "jobTitle")]
    pub job_title: Option<String>,
    #[serde(rename = "skillTags", default)]
    pub skill_tags: Vec<String>,
    pub reputation: Option<i64>,
}

impl MatchedUser {
    pub fn to_profile(&self) -> UserProfile {
        let p = self.profile.as_ref();
        UserProfile {
            username: self.username.clone(),
            real_name: p.and_then(|p| p.real_name.clone()),
            avatar_url: p.and_then(|p| p.user_avatar.clone()),
            ranking: p.and_then(|p| p.ranking),
            country: p.and_then(|p| p.country_name.clone()),
            school: p.and_then(|p| p.school.clone()),
            company: p.and_then(|p| p.company.clone()),
            job_title: p.and_then(|p| p.job_title.clone()),
            about: p.and_then(|p| p.about_me.clone()),
            skill_tags: p.map(|p| p.skill_tags.clone()).unwrap_or_default(),
            reputation: p.and_then(|p| p.reputation),
            github_url: self.github_url.clone(),
            twitter_url: self.twitter_url.clone(),
            linkedin_url: self.linkedin_url.clone(),
        }
    }
}

// ============================================================================
// Question status counts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCount {
    pub difficulty: String,
    pub count: i64,
    #[serde(default)]
    pub submissions: i64,
}

/// Solved/attempted question counts per difficulty for a username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStatusCounts {
    /// Site-wide question totals per difficulty.
    pub all_questions: Vec<DifficultyCount>,
    /// Accepted submissions per difficulty.
    pub accepted: Vec<DifficultyCount>,
    /// Total submissions per difficulty.
    pub total: Vec<DifficultyCount>,
}

// Wire shape of the `userSessionProgress` operation
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionCountsResponse {
    #[serde(rename = "allQuestionsCount", default)]
    pub all_questions_count: Vec<DifficultyCount>,
    #[serde(rename = "matchedUser")]
    pub matched_user: Option<SubmitStatsWrapper>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitStatsWrapper {
    #[serde(rename = "submitStats")]
    pub submit_stats: SubmitStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitStats {
    #[serde(rename = "acSubmissionNum", default)]
    pub ac_submission_num: Vec<DifficultyCount>,
    #[serde(rename = "totalSubmissionNum", default)]
    pub total_submission_num: Vec<DifficultyCount>,
}

impl QuestionCountsResponse {
    pub fn to_counts(&self) -> Option<QuestionStatusCounts> {
        let stats = &self.matched_user.as_ref()?.submit_stats;
        Some(QuestionStatusCounts {
            all_questions: self.all_questions_count.clone(),
            accepted: stats.ac_submission_num.clone(),
            total: stats.total_submission_num.clone(),
        })
    }
}

// ============================================================================
// Contest ranking
// ============================================================================

/// Contest standing for a username. Users who never attended a contest
/// have no ranking at all on the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestRanking {
    pub attended_contests_count: i32,
    pub rating: f64,
    pub global_ranking: i64,
    pub total_participants: i64,
    pub top_percentage: f64,
    pub badge_name: Option<String>,
}

// Wire shape of the `userContestRankingInfo` operation
#[derive(Debug, Clone, Deserialize)]
pub struct ContestRankingResponse {
    #[serde(rename = "userContestRanking")]
    pub user_contest_ranking: Option<ContestRankingFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestRankingFields {
    #[serde(rename = "attendedContestsCount")]
    pub attended_contests_count: i32,
    pub rating: f64,
    #[serde(rename = "globalRanking")]
    pub global_ranking: i64,
    #[serde(rename = "totalParticipants")]
    pub total_participants: i64,
    #[serde(rename = "topPercentage")]
    pub top_percentage: f64,
    pub badge: Option<ContestBadge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContestBadge {
    pub name: Option<String>,
}

impl ContestRankingFields {
    pub fn to_ranking(&self) -> ContestRanking {
        ContestRanking {
            attended_contests_count: self.attended_contests_count,
            rating: self.rating,
            global_ranking: self.global_ranking,
            total_participants: self.total_participants,
            top_percentage: self.top_percentage,
            badge_name: self.badge.as_ref().and_then(|b| b.name.clone()),
        }
    }
}

// ============================================================================
// Badges
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "creationDate")]
    pub creation_date: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingBadge {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub progress: Option<i32>,
}

/// Earned and upcoming badges for a username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeCollection {
    pub badges: Vec<Badge>,
    pub upcoming: Vec<UpcomingBadge>,
}

// Wire shape of the `userBadges` operation
#[derive(Debug, Clone, Deserialize)]
pub struct BadgesResponse {
    #[serde(rename = "matchedUser")]
    pub matched_user: Option<BadgeFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BadgeFields {
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(rename = "upcomingBadges", default)]
    pub upcoming_badges: Vec<UpcomingBadge>,
}

impl BadgeFields {
    pub fn to_collection(&self) -> BadgeCollection {
        BadgeCollection {
            badges: self.badges.clone(),
            upcoming: self.upcoming_badges.clone(),
        }
    }
}
