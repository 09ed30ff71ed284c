use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_UPLOADS_URL: &str = "https://uploads.github.com";
const PER_PAGE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }
}

#[derive(Debug, Serialize)]
struct NewRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
}

#[derive(Debug, Serialize)]
struct ReleaseChanges {
    draft: bool,
}

#[derive(Debug, Deserialize)]
struct ReleaseTag {
    tag_name: Option<String>,
}

/// Where releases live
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Latest published release, `None` when the repository has none
    async fn latest_release(&self, owner: &str, repo: &str) -> anyhow::Result<Option<Release>>;

    /// Tag names of every release
    async fn all_release_tag_names(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<String>>;

    async fn create_release(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        body: &str,
        draft: bool,
    ) -> anyhow::Result<Release>;

    async fn publish_release(&self, owner: &str, repo: &str, release_id: u64) -> anyhow::Result<Release>;

    async fn upload_release_asset(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        name: &str,
        content: Bytes,
    ) -> anyhow::Result<()>;

    async fn download_release_asset(
        &self,
        owner: &str,
        repo: &str,
        asset: &ReleaseAsset,
    ) -> anyhow::Result<Bytes>;
}

/// GitHub REST client for the releases of a repository
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    uploads_url: String,
}

impl GitHubClient {
    pub fn new(
        token: Option<&str>,
        api_url: impl Into<String>,
        uploads_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("modsync"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("invalid GitHub token")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("build GitHub client")?;

        Ok(GitHubClient {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            uploads_url: uploads_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client configured from `GITHUB_TOKEN`, `GITHUB_API_URL` and `GITHUB_UPLOADS_URL`
    pub fn from_env() -> anyhow::Result<Self> {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());
        let api_url =
            std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let uploads_url = std::env::var("GITHUB_UPLOADS_URL")
            .unwrap_or_else(|_| DEFAULT_UPLOADS_URL.to_string());

        Self::new(token.as_deref(), api_url, uploads_url)
    }

    fn releases_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{owner}/{repo}/releases", self.api_url)
    }
}

#[async_trait]
impl ReleaseHost for GitHubClient {
    async fn latest_release(&self, owner: &str, repo: &str) -> anyhow::Result<Option<Release>> {
        let response = self
            .client
            .get(format!("{}/latest", self.releases_url(owner, repo)))
            .send()
            .await
            .context("retrieve latest release")?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(owner, repo, "no latest release");
            return Ok(None);
        }

        let release = response
            .error_for_status()
            .context("retrieve latest release")?
            .json::<Release>()
            .await
            .context("decode latest release")?;

        Ok(Some(release))
    }

    async fn all_release_tag_names(&self, owner: &str, repo: &str) -> anyhow::Result<Vec<String>> {
        let mut tag_names = Vec::new();
        let mut page = 1;

        loop {
            let releases = self
                .client
                .get(self.releases_url(owner, repo))
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await
                .and_then(|response| response.error_for_status())
                .with_context(|| format!("list releases of {owner}/{repo}"))?
                .json::<Vec<ReleaseTag>>()
                .await
                .context("decode releases")?;

            let count = releases.len();
            tag_names.extend(releases.into_iter().filter_map(|release| release.tag_name));
            debug!(owner, repo, page, count, "listed releases");

            if count < PER_PAGE {
                return Ok(tag_names);
            }
            page += 1;
        }
    }

    async fn create_release(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
        body: &str,
        draft: bool,
    ) -> anyhow::Result<Release> {
        let release = self
            .client
            .post(self.releases_url(owner, repo))
            .json(&NewRelease {
                tag_name: name,
                name,
                body,
                draft,
            })
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("create release {name}"))?
            .json::<Release>()
            .await
            .context("decode created release")?;

        info!(owner, repo, name, id = release.id, "created release");
        Ok(release)
    }

    async fn publish_release(&self, owner: &str, repo: &str, release_id: u64) -> anyhow::Result<Release> {
        let release = self
            .client
            .patch(format!("{}/{release_id}", self.releases_url(owner, repo)))
            .json(&ReleaseChanges { draft: false })
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("publish release {release_id}"))?
            .json::<Release>()
            .await
            .context("decode published release")?;

        info!(owner, repo, id = release_id, "published release");
        Ok(release)
    }

    async fn upload_release_asset(
        &self,
        owner: &str,
        repo: &str,
        release_id: u64,
        name: &str,
        content: Bytes,
    ) -> anyhow::Result<()> {
        self.client
            .post(format!(
                "{}/repos/{owner}/{repo}/releases/{release_id}/assets",
                self.uploads_url
            ))
            .query(&[("name", name)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("upload release asset {name}"))?;

        info!(owner, repo, id = release_id, name, "uploaded release asset");
        Ok(())
    }

    async fn download_release_asset(
        &self,
        owner: &str,
        repo: &str,
        asset: &ReleaseAsset,
    ) -> anyhow::Result<Bytes> {
        self.client
            .get(format!(
                "{}/repos/{owner}/{repo}/releases/assets/{}",
                self.api_url, asset.id
            ))
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("download release asset {}", asset.name))?
            .bytes()
            .await
            .with_context(|| format!("read release asset {}", asset.name))
    }
}
