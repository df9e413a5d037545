//! Wikipedia / Wikimedia REST integration.
//!
//! Five read-only GET targets describe one page. The subject goes into a query
//! parameter for the `action=query` targets and into a percent-encoded URL path
//! segment for the REST targets.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use tracing::debug;

use crate::domain::{DateWindow, QueryKey, QuerySpec};
use crate::error::{AppError, FetchError};

const DEFAULT_WIKI: &str = "en.wikipedia.org";
const DEFAULT_PAGEVIEWS_BASE: &str = "https://wikimedia.org/api/rest_v1/metrics/pageviews/per-article/";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const THUMB_SIZE: &str = "250";

/// Anything that can resolve a `QuerySpec` into a decoded JSON payload.
///
/// The HTTP client is the production implementation; tests plug in canned payloads.
pub trait JsonSource: Send + Sync {
    fn fetch_json(&self, spec: &QuerySpec) -> impl Future<Output = Result<serde_json::Value, FetchError>> + Send;
}

/// Connection settings, read from the environment (`.env` supported) and CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Wiki host, e.g. `en.wikipedia.org`.
    pub wiki: String,
    pub pageviews_base: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wiki: DEFAULT_WIKI.to_string(),
            pageviews_base: DEFAULT_PAGEVIEWS_BASE.to_string(),
            user_agent: format!("wiki-pulse/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(wiki) = std::env::var("WPULSE_WIKI") {
            config.wiki = wiki;
        }
        if let Ok(ua) = std::env::var("WPULSE_USER_AGENT") {
            config.user_agent = ua;
        }
        if let Ok(raw) = std::env::var("WPULSE_TIMEOUT_SECS") {
            config.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| AppError::new(2, format!("Invalid WPULSE_TIMEOUT_SECS '{raw}'.")))?;
        }
        Ok(config)
    }

    /// Pageviews project name: the wiki host without its `.org` suffix.
    pub fn project(&self) -> &str {
        self.wiki.strip_suffix(".org").unwrap_or(&self.wiki)
    }

    pub fn endpoints(&self) -> Result<Endpoints, AppError> {
        let parse = |raw: &str| -> Result<Url, AppError> {
            let url = Url::parse(raw).map_err(|e| AppError::new(2, format!("Invalid API URL '{raw}': {e}")))?;
            if url.cannot_be_a_base() {
                return Err(AppError::new(2, format!("API URL '{raw}' cannot carry a path.")));
            }
            Ok(url)
        };

        Ok(Endpoints {
            action: parse(&format!("https://{}/w/api.php", self.wiki))?,
            summary: parse(&format!("https://{}/api/rest_v1/page/summary/", self.wiki))?,
            pageviews: parse(&self.pageviews_base)?,
            project: self.project().to_string(),
        })
    }
}

/// Validated base URLs for the five targets.
#[derive(Debug, Clone)]
pub struct Endpoints {
    action: Url,
    summary: Url,
    pageviews: Url,
    project: String,
}

impl Endpoints {
    /// Build the five query targets for one subject, in `QueryKey::ALL` order.
    pub fn query_specs(&self, subject: &str, window: &DateWindow) -> Vec<QuerySpec> {
        QueryKey::ALL
            .iter()
            .map(|&key| QuerySpec {
                key,
                url: self.url_for(key, subject, window),
            })
            .collect()
    }

    fn url_for(&self, key: QueryKey, subject: &str, window: &DateWindow) -> Url {
        match key {
            QueryKey::Metadata => self.action_query(&[
                ("titles", subject),
                ("prop", "info|pageimages|links|langlinks"),
                ("inprop", "url|protection"),
                ("piprop", "thumbnail"),
                ("pithumbsize", THUMB_SIZE),
                ("pllimit", "max"),
                ("lllimit", "max"),
                ("llprop", "title"),
            ]),
            QueryKey::Revisions => self.action_query(&[
                ("prop", "revisions"),
                ("titles", subject),
                ("rvlimit", "max"),
                ("rvprop", "timestamp|user|ids"),
                ("rvdir", "newer"),
            ]),
            QueryKey::Backlinks => self.action_query(&[
                ("list", "backlinks"),
                ("bltitle", subject),
                ("bllimit", "max"),
            ]),
            QueryKey::Summary => with_segments(&self.summary, &[subject]),
            QueryKey::Pageviews => with_segments(
                &self.pageviews,
                &[
                    self.project.as_str(),
                    "all-access",
                    "all-agents",
                    subject,
                    "daily",
                    window.from_compact().as_str(),
                    window.to_compact().as_str(),
                ],
            ),
        }
    }

    fn action_query(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.action.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", "query").append_pair("format", "json");
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }
        url
    }
}

/// Append path segments; each one is percent-encoded, `/` included.
fn with_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // Bases are checked by `ClientConfig::endpoints`, so the segment list is always available.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Production `JsonSource` backed by `reqwest`.
pub struct WikiClient {
    client: Client,
    endpoints: Endpoints,
}

impl WikiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoints: config.endpoints()?,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

impl JsonSource for WikiClient {
    async fn fetch_json(&self, spec: &QuerySpec) -> Result<serde_json::Value, FetchError> {
        debug!(key = %spec.key, url = %spec.url, "fetching");

        let resp = self
            .client
            .get(spec.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                key: spec.key,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Source {
                key: spec.key,
                status: status.as_u16(),
            });
        }

        resp.json::<serde_json::Value>().await.map_err(|e| {
            if e.is_decode() {
                FetchError::Malformed(format!("{} payload is not JSON: {e}", spec.key))
            } else {
                FetchError::Transport {
                    key: spec.key,
                    message: e.to_string(),
                }
            }
        })
    }
}
