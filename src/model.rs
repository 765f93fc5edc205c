//! Data model for the aggregated user statistics handed to the card renderer.
//!
//! Field names serialize in camelCase so the cache file and the render input
//! document keep the exact shape of the GitHub GraphQL responses they mirror.

use serde::{Deserialize, Serialize};

/// One programming language and its usage weight as reported by GitHub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub language_name: String,
    pub color: String,
    pub value: u64,
}

/// A single calendar date's contribution count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionDay {
    pub date: String,
    pub contribution_count: u64,
}

/// One week of the contribution calendar, chronological day order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub contribution_days: Vec<ContributionDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionCalendar {
    pub total_contributions: u64,
    pub weeks: Vec<Week>,
}

/// Mirror of the GraphQL `contributionsCollection` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    pub total_commit_contributions: u64,
    pub restricted_contributions_count: u64,
    pub total_issue_contributions: u64,
    pub total_repository_contributions: u64,
    pub total_pull_request_contributions: u64,
    pub total_pull_request_review_contributions: u64,
    pub contribution_calendar: ContributionCalendar,
}

/// Aggregate root, one instance per render.
///
/// All scalar counters are additive across accounts. `contribution_calendar`
/// is derived: empty in raw per-account records, populated by the pipeline
/// from `contributions_collection.contribution_calendar.weeks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub closed_issues: u64,
    pub star_count: u64,
    pub open_issues: u64,
    pub total_commits: u64,
    pub total_contributions: u64,
    pub total_pull_requests: u64,
    pub repo_views: u64,
    pub lines_of_code_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_changed: u64,
    pub code_byte_total: u64,
    pub fork_count: u64,
    pub top_languages: Vec<Language>,
    pub contributions_collection: ContributionsCollection,
    #[serde(default)]
    pub contribution_calendar: Vec<ContributionDay>,
}

/// Document shape the composition layer reads (`input.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderInput {
    pub user_stats: UserStats,
}
