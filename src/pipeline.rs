//! The statistics aggregation pipeline.
//!
//! Raw per-account records are folded into a single `UserStats` in four
//! stages, in order: merge accounts, flatten the week calendar into days,
//! sort-and-merge duplicate dates, deduplicate languages. Each stage is a
//! pure in-memory transformation; the only I/O sits behind `StatsSource`.

use crate::loader::{LoadError, StatsSource};
use crate::model::{ContributionDay, Language, UserStats};
use chrono::{DateTime, NaiveDate};
use log::debug;

/// Fold an ordered list of per-account records into one aggregate.
///
/// The first record is the accumulator: scalar counters are summed into it,
/// `top_languages` and calendar `weeks` are concatenated onto it. Languages
/// and calendar days are left un-deduplicated for the later stages.
///
/// Returns `None` for an empty input list.
pub fn merge_user_stats(stats: Vec<UserStats>) -> Option<UserStats> {
    let mut iter = stats.into_iter();
    let mut merged = iter.next()?;

    for stat in iter {
        merged.closed_issues += stat.closed_issues;
        merged.star_count += stat.star_count;
        merged.open_issues += stat.open_issues;
        merged.total_commits += stat.total_commits;
        merged.total_contributions += stat.total_contributions;
        merged.total_pull_requests += stat.total_pull_requests;
        merged.repo_views += stat.repo_views;
        merged.lines_of_code_changed += stat.lines_of_code_changed;
        merged.lines_added += stat.lines_added;
        merged.lines_deleted += stat.lines_deleted;
        merged.lines_changed += stat.lines_changed;
        merged.code_byte_total += stat.code_byte_total;
        merged.fork_count += stat.fork_count;
        merged.top_languages.extend(stat.top_languages);

        let collection = &mut merged.contributions_collection;
        let other = stat.contributions_collection;
        collection.total_commit_contributions += other.total_commit_contributions;
        collection.restricted_contributions_count += other.restricted_contributions_count;
        collection.total_issue_contributions += other.total_issue_contributions;
        collection.total_repository_contributions += other.total_repository_contributions;
        collection.total_pull_request_contributions += other.total_pull_request_contributions;
        collection.total_pull_request_review_contributions +=
            other.total_pull_request_review_contributions;
        collection.contribution_calendar.total_contributions +=
            other.contribution_calendar.total_contributions;
        collection
            .contribution_calendar
            .weeks
            .extend(other.contribution_calendar.weeks);
    }

    Some(merged)
}

/// Populate the flat `contribution_calendar` from the nested week calendar.
///
/// Pure append in week/day order; duplicates across merged accounts survive
/// until `sort_and_merge_calendar` runs.
pub fn flatten_weeks(stats: &mut UserStats) {
    stats.contribution_calendar = stats
        .contributions_collection
        .contribution_calendar
        .weeks
        .iter()
        .flat_map(|week| week.contribution_days.iter().cloned())
        .collect();
}

/// Parse a day's date for chronological ordering.
///
/// Dates compare as dates, not lexically; plain ISO dates and RFC 3339
/// timestamps are both accepted. Unparseable strings sort first, in their
/// original relative order.
fn day_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(date).ok().map(|dt| dt.date_naive()))
}

/// Sort the flat calendar ascending by date and merge duplicate dates.
///
/// Counts of same-date entries are summed into the earliest entry; runs of
/// three or more duplicates collapse into one. Afterwards dates are strictly
/// increasing and unique.
pub fn sort_and_merge_calendar(stats: &mut UserStats) {
    stats
        .contribution_calendar
        .sort_by_key(|day| day_date(&day.date));

    let mut merged: Vec<ContributionDay> = Vec::with_capacity(stats.contribution_calendar.len());
    for day in stats.contribution_calendar.drain(..) {
        match merged.last_mut() {
            Some(prev) if prev.date == day.date => prev.contribution_count += day.contribution_count,
            _ => merged.push(day),
        }
    }
    stats.contribution_calendar = merged;
}

/// Deduplicate `top_languages` by name and sort descending by summed value.
///
/// Each language keeps the color of its first occurrence in pre-merge order;
/// the sort is stable, so equal values keep first-encountered order.
pub fn sort_and_merge_languages(stats: &mut UserStats) {
    let mut languages: Vec<Language> = Vec::new();
    for language in stats.top_languages.drain(..) {
        match languages
            .iter_mut()
            .find(|known| known.language_name == language.language_name)
        {
            Some(known) => known.value += language.value,
            None => languages.push(language),
        }
    }
    languages.sort_by(|a, b| b.value.cmp(&a.value));
    stats.top_languages = languages;
}

/// Run the full pipeline over raw per-account records.
///
/// Returns `None` when no records were supplied.
pub fn aggregate_user_stats(stats: Vec<UserStats>) -> Option<UserStats> {
    debug!("aggregating {} raw record(s)", stats.len());
    let mut merged = merge_user_stats(stats)?;
    flatten_weeks(&mut merged);
    sort_and_merge_calendar(&mut merged);
    sort_and_merge_languages(&mut merged);
    Some(merged)
}

/// Library entry point for the render path: load raw records for `usernames`
/// from `source`, then aggregate them.
pub fn prepare_user_stats(
    source: &dyn StatsSource,
    usernames: &[String],
) -> Result<Option<UserStats>, LoadError> {
    let raw = source.load(usernames)?;
    Ok(aggregate_user_stats(raw))
}
