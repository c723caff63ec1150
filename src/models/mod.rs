//! Data models for LeetCode profile entities.
//!
//! This module contains the data structures used to represent
//! synchronized profile data including:
//!
//! - `UserProfile`: public profile fields for a username
//! - `QuestionStatusCounts`: solved/attempted counts per difficulty
//! - `ProfileCalendar`: yearly submission activity
//! - `RecentSubmissions`, `ContestRanking`, `BadgeCollection`
//! - `Question`, `PageQuery`, `PageResult`: problem-list paging types
//!
//! Wire-response wrappers (GraphQL envelopes) live next to the domain
//! types they decode into.

pub mod activity;
pub mod question;
pub mod user;

pub use activity::{
    CalendarResponse, DccBadge, ProfileCalendar, RecentSubmission, RecentSubmissions,
    RecentSubmissionsResponse,
};
pub use question::{PageQuery, PageResult, ProblemPage, ProblemPageResponse, Question};
pub use user::{
    Badge, BadgeCollection, BadgesResponse, ContestRanking, ContestRankingResponse,
    DifficultyCount, QuestionCountsResponse, QuestionStatusCounts, UpcomingBadge, UserProfile,
    UserProfileResponse,
};
