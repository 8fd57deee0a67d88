//! GitHub REST v3 activity source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, trace};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, ClientBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use super::link::parse_link_header;
use super::{ActivitySource, Page, PageInfo, RepoRef, RepositoryMetadata, ResourceKind, SourceError, SourceResult};
use crate::activity::CommitParticipationSeries;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PER_PAGE: u32 = 100;
/// GitHub caps page sizes at 100
pub const MAX_PER_PAGE: u32 = 100;

const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
/// Media type that adds `starred_at` to stargazer listings
const STAR_MEDIA_TYPE: &str = "application/vnd.github.v3.star+json";

/// Connection settings for the GitHub client
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub per_page: u32,
    pub timeout: Duration,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: format!("gitometer/{}", env!("CARGO_PKG_VERSION")),
            per_page: DEFAULT_PER_PAGE,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GitHubConfig {
    /// Validate connection settings
    pub fn validate(&self) -> Result<(), String> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(format!("per-page must be between 1 and {}", MAX_PER_PAGE));
        }
        if self.timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }
        if self.user_agent.trim().is_empty() {
            return Err("User agent must not be empty".to_string());
        }
        Url::parse(&self.api_url).map_err(|e| format!("Invalid api-url '{}': {}", self.api_url, e))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    id: u64,
    name: String,
    owner: OwnerResponse,
    default_branch: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct StargazerResponse {
    starred_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GitSignature {
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<GitSignature>,
    committer: Option<GitSignature>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct ParticipationResponse {
    all: Vec<u64>,
}

/// GitHub API client. Construct once and share behind an `Arc`.
pub struct GitHubClient {
    client: Client,
    base_url: Url,
    per_page: u32,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> SourceResult<Self> {
        Self::with_builder(config, Client::builder())
    }

    fn with_builder(config: GitHubConfig, builder: ClientBuilder) -> SourceResult<Self> {
        config.validate().map_err(SourceError::configuration)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| SourceError::configuration(format!("Invalid user agent: {}", e)))?,
        );

        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| SourceError::configuration("Access token contains invalid characters"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            debug!("No GitHub access token configured, using unauthenticated requests");
        }

        let client = builder
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        // A trailing slash keeps Url::join from replacing the last path segment
        let mut api_url = config.api_url.clone();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        let base_url = Url::parse(&api_url)
            .map_err(|e| SourceError::configuration(format!("Invalid api-url '{}': {}", config.api_url, e)))?;

        Ok(Self {
            client,
            base_url,
            per_page: config.per_page,
        })
    }

    fn repo_url(&self, repo: &RepoRef, suffix: &str) -> SourceResult<Url> {
        let path = if suffix.is_empty() {
            format!("repos/{}/{}", repo.owner(), repo.name())
        } else {
            format!("repos/{}/{}/{}", repo.owner(), repo.name(), suffix)
        };
        self.base_url
            .join(&path)
            .map_err(|e| SourceError::configuration(format!("Cannot build URL for {}: {}", repo, e)))
    }

    async fn get(&self, url: Url, accept: &'static str, repo: &RepoRef) -> SourceResult<Response> {
        trace!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, accept)
            .send()
            .await?;

        check_status(response.status(), &url, repo)?;
        Ok(response)
    }
}

/// Map a response status to the matching source error
fn check_status(status: StatusCode, url: &Url, repo: &RepoRef) -> SourceResult<()> {
    match status {
        StatusCode::NOT_FOUND => Err(SourceError::not_found(repo.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::Unauthorized {
            url: url.to_string(),
            status: status.as_u16(),
        }),
        s if !s.is_success() => Err(SourceError::Http {
            url: url.to_string(),
            status: s.as_u16(),
        }),
        _ => Ok(()),
    }
}

/// 202 means the statistics are being computed in the background
fn check_participation_ready(status: StatusCode, repo: &RepoRef) -> SourceResult<()> {
    if status == StatusCode::ACCEPTED {
        return Err(SourceError::StatsPending { repository: repo.to_string() });
    }
    Ok(())
}

/// Pagination from the `Link` header. A response without one is a single page.
fn page_info(headers: &HeaderMap, url: &Url) -> SourceResult<PageInfo> {
    match headers.get(LINK) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|e| SourceError::decode(url.as_str(), format!("Link header: {}", e)))?;
            Ok(parse_link_header(value))
        }
        None => Ok(PageInfo::default()),
    }
}

#[async_trait]
impl ActivitySource for GitHubClient {
    fn name(&self) -> &str {
        "github"
    }

    async fn fetch_repository(&self, repo: &RepoRef) -> SourceResult<RepositoryMetadata> {
        let url = self.repo_url(repo, "")?;
        let response = self.get(url, JSON_MEDIA_TYPE, repo).await?;
        let body: RepoResponse = response.json().await?;

        Ok(RepositoryMetadata {
            id: body.id,
            owner: body.owner.login,
            name: body.name,
            default_branch: body.default_branch.unwrap_or_default(),
            description: body.description,
            created_at: body.created_at,
            stargazers_count: body.stargazers_count,
        })
    }

    async fn fetch_page(&self, repo: &RepoRef, kind: ResourceKind, page: u32) -> SourceResult<Page> {
        let mut url = self.repo_url(repo, &kind.to_string())?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());

        let accept = match kind {
            ResourceKind::Stargazers => STAR_MEDIA_TYPE,
            ResourceKind::Commits => JSON_MEDIA_TYPE,
        };

        let response = self.get(url.clone(), accept, repo).await?;
        let info = page_info(response.headers(), &url)?;

        let records = match kind {
            ResourceKind::Stargazers => {
                let body: Vec<StargazerResponse> = response.json().await?;
                body.into_iter().map(|s| s.starred_at).collect()
            }
            ResourceKind::Commits => {
                let body: Vec<CommitResponse> = response.json().await?;
                body.into_iter()
                    .map(|c| {
                        c.commit.author.and_then(|s| s.date)
                            .or_else(|| c.commit.committer.and_then(|s| s.date))
                            .ok_or_else(|| SourceError::decode(url.as_str(), format!("commit {} has no date", c.sha)))
                    })
                    .collect::<SourceResult<Vec<_>>>()?
            }
        };

        debug!("Fetched {} page {} of {}: {} records", kind, page, repo, records.len());
        Ok(Page::new(records, info))
    }

    async fn fetch_participation(&self, repo: &RepoRef) -> SourceResult<CommitParticipationSeries> {
        let url = self.repo_url(repo, "stats/participation")?;
        let response = self.get(url, JSON_MEDIA_TYPE, repo).await?;

        check_participation_ready(response.status(), repo)?;

        let body: ParticipationResponse = response.json().await?;
        Ok(CommitParticipationSeries::new(body.all))
    }
}
