use pretty_assertions::assert_eq;
use statcards::loader::{FileCacheSource, LoadError, StatsSource};
use statcards::model::{ContributionDay, RenderInput};
use statcards::pipeline::prepare_user_stats;
use std::fs;
use tempfile::tempdir;

/// Cache fixture in the exact camelCase shape the GraphQL mirror uses.
const CACHE_JSON: &str = r##"{
  "closedIssues": 1,
  "starCount": 2,
  "openIssues": 3,
  "totalCommits": 4,
  "totalContributions": 5,
  "totalPullRequests": 6,
  "repoViews": 7,
  "linesOfCodeChanged": 8,
  "linesAdded": 9,
  "linesDeleted": 10,
  "linesChanged": 11,
  "codeByteTotal": 12,
  "forkCount": 13,
  "topLanguages": [
    { "languageName": "Go", "color": "#00ADD8", "value": 10 },
    { "languageName": "Rust", "color": "#dea584", "value": 3 }
  ],
  "contributionsCollection": {
    "totalCommitContributions": 4,
    "restrictedContributionsCount": 0,
    "totalIssueContributions": 1,
    "totalRepositoryContributions": 2,
    "totalPullRequestContributions": 3,
    "totalPullRequestReviewContributions": 0,
    "contributionCalendar": {
      "totalContributions": 5,
      "weeks": [
        {
          "contributionDays": [
            { "date": "2024-06-01", "contributionCount": 5 }
          ]
        }
      ]
    }
  }
}"##;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn prepare_aggregates_cached_record_per_username() {
    let dir = tempdir().unwrap();
    let source = FileCacheSource::in_dir(dir.path());
    fs::write(source.path(), CACHE_JSON).unwrap();

    // The cache record is shared, so two usernames double every counter.
    let stats = prepare_user_stats(&source, &names(&["alice", "bob"]))
        .unwrap()
        .unwrap();

    assert_eq!(stats.star_count, 4);
    assert_eq!(stats.total_contributions, 10);
    assert_eq!(stats.fork_count, 26);
    assert_eq!(
        stats.contributions_collection.total_commit_contributions,
        8
    );

    // Duplicate calendar days collapse into one summed entry.
    assert_eq!(
        stats.contribution_calendar,
        vec![ContributionDay {
            date: "2024-06-01".to_string(),
            contribution_count: 10,
        }]
    );

    // Duplicate languages dedup and stay sorted descending by summed value.
    let languages: Vec<(&str, u64)> = stats
        .top_languages
        .iter()
        .map(|l| (l.language_name.as_str(), l.value))
        .collect();
    assert_eq!(languages, vec![("Go", 20), ("Rust", 6)]);
}

#[test]
fn prepare_with_no_usernames_yields_none() {
    let dir = tempdir().unwrap();
    let source = FileCacheSource::in_dir(dir.path());
    fs::write(source.path(), CACHE_JSON).unwrap();

    assert_eq!(prepare_user_stats(&source, &[]).unwrap(), None);
}

#[test]
fn missing_cache_is_fatal_with_no_partial_list() {
    let dir = tempdir().unwrap();
    let source = FileCacheSource::in_dir(dir.path());

    let err = source.load(&names(&["alice", "bob"])).unwrap_err();
    assert!(matches!(err, LoadError::MissingCache { .. }));
    assert!(err.to_string().contains("github-user-stats.json"));
}

#[test]
fn malformed_cache_propagates_as_parse_error() {
    let dir = tempdir().unwrap();
    let source = FileCacheSource::in_dir(dir.path());
    fs::write(source.path(), "{ not json").unwrap();

    let err = source.load(&names(&["alice"])).unwrap_err();
    assert!(matches!(err, LoadError::Malformed { .. }));
}

#[test]
fn loader_returns_one_record_per_username_in_order() {
    let dir = tempdir().unwrap();
    let source = FileCacheSource::in_dir(dir.path());
    fs::write(source.path(), CACHE_JSON).unwrap();

    let records = source.load(&names(&["a", "b", "c"])).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], records[2]);
}

#[test]
fn render_input_serializes_with_camel_case_keys() {
    let dir = tempdir().unwrap();
    let source = FileCacheSource::in_dir(dir.path());
    fs::write(source.path(), CACHE_JSON).unwrap();

    let user_stats = prepare_user_stats(&source, &names(&["alice"]))
        .unwrap()
        .unwrap();
    let json = serde_json::to_string_pretty(&RenderInput { user_stats }).unwrap();

    assert!(json.contains("\"userStats\""));
    assert!(json.contains("\"contributionCalendar\""));
    assert!(json.contains("\"topLanguages\""));
    assert!(json.contains("\"languageName\""));

    // Round-trips through the same shape it was read from.
    let back: RenderInput = serde_json::from_str(&json).unwrap();
    assert_eq!(back.user_stats.star_count, 2);
}
