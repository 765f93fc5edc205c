//! GitHub GraphQL client for the stats regeneration mode.
//!
//! Only the `fetch` subcommand talks to the network; the render path reads
//! the cache file this client's results are persisted to. One raw `UserStats`
//! record is built per account from a handful of per-concern queries.

use crate::model::{ContributionsCollection, Language, UserStats};
use anyhow::{Context, Result};
use log::warn;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Deserialize)]
struct CountObj {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
}

/// Lines-of-code totals accumulated over a user's commit history.
#[derive(Debug, Default)]
pub struct LocStats {
    pub additions: u64,
    pub deletions: u64,
    pub commits: u64,
}

impl GithubClient {
    /// Create a GitHub GraphQL client using the ACCESS_TOKEN env variable.
    pub fn new() -> Result<Self> {
        let token =
            std::env::var("ACCESS_TOKEN").context("ACCESS_TOKEN environment variable not set")?;
        Ok(Self {
            token: Arc::new(token),
            http: Arc::new(Client::new()),
        })
    }

    /// Low-level GraphQL request with basic retry/backoff and `errors` checking.
    async fn graphql(&self, query: &str) -> Result<Value> {
        const MAX_RETRIES: usize = 4;
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let req = self
                .http
                .post("https://api.github.com/graphql")
                .bearer_auth(&*self.token)
                .header("User-Agent", "statcards")
                .json(&serde_json::json!({ "query": query }));

            let resp = req
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Network error sending GraphQL request: {e}"))?;

            let status = resp.status();
            let headers = resp.headers().clone();

            // Parse JSON even for non-2xx to capture error payloads.
            let json: Value = resp
                .json()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to parse JSON from GitHub: {e}"))?;

            if let Some(errors) = json.get("errors") {
                return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
            }

            if status.is_success() {
                return Ok(json);
            }

            // Honor Retry-After when rate limited.
            if status.as_u16() == 429 {
                if attempt >= MAX_RETRIES {
                    return Err(anyhow::anyhow!(
                        "GitHub API returned 429 (rate-limited) and retries exhausted"
                    ));
                }
                let wait_secs = headers
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if status.is_server_error() && attempt < MAX_RETRIES {
                let backoff = Duration::from_millis(250u64.saturating_mul(1 << (attempt - 1)));
                sleep(backoff).await;
                continue;
            }

            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {}: {json:#}",
                status.as_u16()
            ));
        }
    }

    /// Fetch the complete raw stats record for one account.
    ///
    /// `repo_views` stays 0: repository traffic is only exposed through the
    /// per-repo REST API and needs push access, which a stats token for
    /// arbitrary accounts does not have.
    pub async fn fetch_user_stats(&self, username: &str) -> Result<UserStats> {
        let issues = self.issue_counts(username).await?;
        let pull_requests = self.pull_request_count(username).await?;
        let contributions = self.contributions(username).await?;
        let repos = self.repo_overview(username).await?;
        let loc = self.total_loc(username).await?;

        Ok(UserStats {
            closed_issues: issues.closed,
            open_issues: issues.open,
            star_count: repos.stars,
            fork_count: repos.forks,
            code_byte_total: repos.code_bytes,
            top_languages: repos.top_languages,
            total_commits: contributions.total_commit_contributions,
            total_contributions: contributions.contribution_calendar.total_contributions,
            total_pull_requests: pull_requests,
            repo_views: 0,
            lines_added: loc.additions,
            lines_deleted: loc.deletions,
            lines_changed: loc.additions + loc.deletions,
            lines_of_code_changed: loc.additions + loc.deletions,
            contributions_collection: contributions,
            contribution_calendar: Vec::new(),
        })
    }

    /// Closed and open issue counts.
    async fn issue_counts(&self, username: &str) -> Result<IssueCounts> {
        let query = format!(
            r#"
            {{
                user(login: "{username}") {{
                    closed: issues(states: CLOSED) {{
                        totalCount
                    }}
                    open: issues(states: OPEN) {{
                        totalCount
                    }}
                }}
            }}
        "#
        );

        #[derive(Deserialize)]
        struct IssuesResponse {
            data: Option<IssuesData>,
        }
        #[derive(Deserialize)]
        struct IssuesData {
            user: Option<IssuesUser>,
        }
        #[derive(Deserialize)]
        struct IssuesUser {
            closed: CountObj,
            open: CountObj,
        }

        let json = self.graphql(&query).await?;
        let parsed: IssuesResponse =
            serde_json::from_value(json).context("Failed to deserialize issue_counts response")?;

        let counts = parsed
            .data
            .and_then(|d| d.user)
            .map(|u| IssueCounts {
                closed: u.closed.total_count,
                open: u.open.total_count,
            })
            .unwrap_or_default();

        Ok(counts)
    }

    /// Total pull request count.
    async fn pull_request_count(&self, username: &str) -> Result<u64> {
        let query = format!(
            r#"
            {{
                user(login: "{username}") {{
                    pullRequests {{
                        totalCount
                    }}
                }}
            }}
        "#
        );

        #[derive(Deserialize)]
        struct PullsResponse {
            data: Option<PullsData>,
        }
        #[derive(Deserialize)]
        struct PullsData {
            user: Option<PullsUser>,
        }
        #[derive(Deserialize)]
        struct PullsUser {
            #[serde(rename = "pullRequests")]
            pull_requests: CountObj,
        }

        let json = self.graphql(&query).await?;
        let parsed: PullsResponse = serde_json::from_value(json)
            .context("Failed to deserialize pull_request_count response")?;

        Ok(parsed
            .data
            .and_then(|d| d.user)
            .map(|u| u.pull_requests.total_count)
            .unwrap_or(0))
    }

    /// Full contributions collection including the nested week/day calendar.
    ///
    /// The response object already matches the camelCase shape of
    /// `ContributionsCollection`, so it deserializes straight into the model.
    async fn contributions(&self, username: &str) -> Result<ContributionsCollection> {
        let query = format!(
            r#"
            {{
                user(login: "{username}") {{
                    contributionsCollection {{
                        totalCommitContributions
                        restrictedContributionsCount
                        totalIssueContributions
                        totalRepositoryContributions
                        totalPullRequestContributions
                        totalPullRequestReviewContributions
                        contributionCalendar {{
                            totalContributions
                            weeks {{
                                contributionDays {{
                                    date
                                    contributionCount
                                }}
                            }}
                        }}
                    }}
                }}
            }}
        "#
        );

        #[derive(Deserialize)]
        struct ContribResponse {
            data: Option<ContribData>,
        }
        #[derive(Deserialize)]
        struct ContribData {
            user: Option<ContribUser>,
        }
        #[derive(Deserialize)]
        struct ContribUser {
            #[serde(rename = "contributionsCollection")]
            contributions_collection: Option<ContributionsCollection>,
        }

        let json = self.graphql(&query).await?;
        let parsed: ContribResponse =
            serde_json::from_value(json).context("Failed to deserialize contributions response")?;

        Ok(parsed
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.contributions_collection)
            .unwrap_or_default())
    }

    /// Stars, forks and language byte totals across the first 100 owned repos.
    async fn repo_overview(&self, username: &str) -> Result<RepoOverview> {
        let query = format!(
            r#"
        {{
            user(login: "{username}") {{
                repositories(ownerAffiliations: OWNER, first: 100) {{
                    nodes {{
                        stargazers {{
                            totalCount
                        }}
                        forkCount
                        languages(first: 10, orderBy: {{field: SIZE, direction: DESC}}) {{
                            edges {{
                                size
                                node {{
                                    name
                                    color
                                }}
                            }}
                        }}
                    }}
                }}
            }}
        }}
        "#
        );

        #[derive(Deserialize)]
        struct ReposResponse {
            data: Option<ReposData>,
        }
        #[derive(Deserialize)]
        struct ReposData {
            user: Option<ReposUser>,
        }
        #[derive(Deserialize)]
        struct ReposUser {
            repositories: RepoNodes,
        }
        #[derive(Deserialize)]
        struct RepoNodes {
            nodes: Option<Vec<RepoNode>>,
        }
        #[derive(Deserialize)]
        struct RepoNode {
            stargazers: CountObj,
            #[serde(rename = "forkCount")]
            fork_count: u64,
            languages: Option<LanguageEdges>,
        }
        #[derive(Deserialize)]
        struct LanguageEdges {
            edges: Option<Vec<LanguageEdge>>,
        }
        #[derive(Deserialize)]
        struct LanguageEdge {
            size: u64,
            node: LanguageNode,
        }
        #[derive(Deserialize)]
        struct LanguageNode {
            name: String,
            color: Option<String>,
        }

        let json = self.graphql(&query).await?;
        let parsed: ReposResponse =
            serde_json::from_value(json).context("Failed to deserialize repo_overview response")?;

        let mut overview = RepoOverview::default();
        let mut by_name: HashMap<String, usize> = HashMap::new();

        let nodes = parsed
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.repositories.nodes)
            .unwrap_or_default();

        for node in nodes {
            overview.stars += node.stargazers.total_count;
            overview.forks += node.fork_count;

            let edges = node.languages.and_then(|l| l.edges).unwrap_or_default();
            for edge in edges {
                overview.code_bytes += edge.size;
                match by_name.get(&edge.node.name) {
                    Some(&idx) => overview.top_languages[idx].value += edge.size,
                    None => {
                        by_name.insert(edge.node.name.clone(), overview.top_languages.len());
                        overview.top_languages.push(Language {
                            language_name: edge.node.name,
                            color: edge.node.color.unwrap_or_default(),
                            value: edge.size,
                        });
                    }
                }
            }
        }

        overview.top_languages.sort_by(|a, b| b.value.cmp(&a.value));
        Ok(overview)
    }

    /// List owned repositories (first page; first: 100 matches repo_overview).
    async fn list_owned_repos(&self, username: &str) -> Result<Vec<String>> {
        let query = format!(
            r#"
        {{
            user(login: "{username}") {{
                repositories(ownerAffiliations: OWNER, first: 100) {{
                    nodes {{
                        name
                    }}
                }}
            }}
        }}
        "#
        );

        #[derive(Deserialize)]
        struct RepoListResponse {
            data: Option<RepoListData>,
        }
        #[derive(Deserialize)]
        struct RepoListData {
            user: Option<RepoListUser>,
        }
        #[derive(Deserialize)]
        struct RepoListUser {
            repositories: RepoNames,
        }
        #[derive(Deserialize)]
        struct RepoNames {
            nodes: Option<Vec<RepoNameNode>>,
        }
        #[derive(Deserialize)]
        struct RepoNameNode {
            name: String,
        }

        let json = self.graphql(&query).await?;
        let parsed: RepoListResponse = serde_json::from_value(json)
            .context("Failed to deserialize list_owned_repos response")?;

        let names = parsed
            .data
            .and_then(|d| d.user)
            .and_then(|u| u.repositories.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|n| n.name)
            .collect();

        Ok(names)
    }

    /// LOC for a single repository, iterating default-branch history pages and
    /// counting only commits authored by `username`.
    async fn repo_loc(&self, username: &str, repo: &str) -> Result<LocStats> {
        #[derive(Deserialize)]
        struct HistoryResponse {
            data: Option<HistoryData>,
        }
        #[derive(Deserialize)]
        struct HistoryData {
            repository: Option<HistoryRepo>,
        }
        #[derive(Deserialize)]
        struct HistoryRepo {
            #[serde(rename = "defaultBranchRef")]
            default_branch_ref: Option<DefaultBranchRef>,
        }
        #[derive(Deserialize)]
        struct DefaultBranchRef {
            target: Option<TargetCommit>,
        }
        #[derive(Deserialize)]
        struct TargetCommit {
            history: Option<HistoryPage>,
        }
        #[derive(Deserialize)]
        struct HistoryPage {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Option<Vec<HistoryNode>>,
        }
        #[derive(Deserialize)]
        struct PageInfo {
            #[serde(rename = "hasNextPage")]
            has_next_page: bool,
            #[serde(rename = "endCursor")]
            end_cursor: Option<String>,
        }
        #[derive(Deserialize)]
        struct HistoryNode {
            additions: Option<u64>,
            deletions: Option<u64>,
            author: Option<CommitAuthor>,
        }
        #[derive(Deserialize)]
        struct CommitAuthor {
            user: Option<UserLogin>,
        }
        #[derive(Deserialize)]
        struct UserLogin {
            login: Option<String>,
        }

        let mut stats = LocStats::default();
        let mut cursor: Option<String> = None;

        loop {
            let after = cursor
                .as_ref()
                .map(|c| format!("\"{c}\""))
                .unwrap_or_else(|| "null".to_string());

            let query = format!(
                r#"
                {{
                    repository(name: "{repo}", owner: "{username}") {{
                        defaultBranchRef {{
                            target {{
                                ... on Commit {{
                                    history(first: 100, after: {after}) {{
                                        pageInfo {{
                                            hasNextPage
                                            endCursor
                                        }}
                                        nodes {{
                                            additions
                                            deletions
                                            author {{
                                                user {{
                                                    login
                                                }}
                                            }}
                                        }}
                                    }}
                                }}
                            }}
                        }}
                    }}
                }}
                "#
            );

            let json = self.graphql(&query).await?;
            let parsed: HistoryResponse = serde_json::from_value(json)
                .context("Failed to deserialize repo_loc (history) response")?;

            let history = parsed
                .data
                .and_then(|d| d.repository)
                .and_then(|r| r.default_branch_ref)
                .and_then(|db| db.target)
                .and_then(|t| t.history)
                .ok_or_else(|| {
                    anyhow::anyhow!("Missing commit history for {}/{}", username, repo)
                })?;

            if let Some(nodes) = history.nodes {
                for node in nodes {
                    let author_login = node
                        .author
                        .and_then(|a| a.user)
                        .and_then(|u| u.login)
                        .unwrap_or_default();

                    if author_login == username {
                        stats.commits = stats.commits.saturating_add(1);
                        stats.additions =
                            stats.additions.saturating_add(node.additions.unwrap_or(0));
                        stats.deletions =
                            stats.deletions.saturating_add(node.deletions.unwrap_or(0));
                    }
                }
            }

            if !history.page_info.has_next_page {
                break;
            }

            cursor = history.page_info.end_cursor;
        }

        Ok(stats)
    }

    /// Aggregate LOC across owned repos (sequential).
    pub async fn total_loc(&self, username: &str) -> Result<LocStats> {
        let repos = self.list_owned_repos(username).await?;
        let mut total = LocStats::default();

        for repo in repos {
            match self.repo_loc(username, &repo).await {
                Ok(loc) => {
                    total.additions = total.additions.saturating_add(loc.additions);
                    total.deletions = total.deletions.saturating_add(loc.deletions);
                    total.commits = total.commits.saturating_add(loc.commits);
                }
                Err(e) => {
                    // One unreadable repo should not sink the whole fetch.
                    warn!("failed to get LOC for repo {repo}: {e:#}");
                }
            }
        }

        Ok(total)
    }
}

#[derive(Default)]
struct IssueCounts {
    closed: u64,
    open: u64,
}

#[derive(Default)]
struct RepoOverview {
    stars: u64,
    forks: u64,
    code_bytes: u64,
    top_languages: Vec<Language>,
}
