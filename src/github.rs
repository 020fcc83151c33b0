//! GitHub avatar and profile fetching.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::asset::{AssetOrigin, ImageAsset};
use crate::error::{FrameError, FrameResult};

static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The subset of `GET /users/{name}` used for recommendations and badges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub public_repos: u64,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub bio: Option<String>,
}

/// The subset of a repository entry used for language detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSummary {
    #[serde(default)]
    pub language: Option<String>,
}

/// HTTP client for github.com avatars and the GitHub REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    avatar_base: String,
    api_base: String,
    api_timeout: Duration,
}

impl GithubClient {
    pub fn new(
        avatar_base: impl Into<String>,
        api_base: impl Into<String>,
        api_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::ClientBuilder::new().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            avatar_base: trim_base(avatar_base.into()),
            api_base: trim_base(api_base.into()),
            api_timeout,
        })
    }

    /// Downloads `{avatar_base}/{identifier}.png?size={size}`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_avatar(
        &self,
        identifier: &str,
        size: u32,
        timeout: Duration,
    ) -> FrameResult<ImageAsset> {
        let url = format!("{}/{identifier}.png?size={size}", self.avatar_base);
        let bytes = self.get_ok(&url, identifier, timeout).await?.bytes().await;
        let bytes = bytes.map_err(|err| classify(err, &url))?;
        let avatar = ImageAsset::from_bytes(bytes.to_vec(), AssetOrigin::Remote)?;
        tracing::debug!(
            origin = ?avatar.origin(),
            width = avatar.size().width,
            height = avatar.size().height,
            "fetched avatar"
        );
        Ok(avatar)
    }

    /// Fetches the public profile of `identifier`.
    pub async fn fetch_profile(&self, identifier: &str) -> FrameResult<ProfileSummary> {
        let url = format!("{}/users/{identifier}", self.api_base);
        let response = self.get_ok(&url, identifier, self.api_timeout).await?;
        response
            .json::<ProfileSummary>()
            .await
            .map_err(|err| classify(err, &url))
    }

    /// Fetches up to 100 public repositories of `identifier`.
    pub async fn fetch_repos(&self, identifier: &str) -> FrameResult<Vec<RepoSummary>> {
        let url = format!("{}/users/{identifier}/repos?per_page=100", self.api_base);
        let response = self.get_ok(&url, identifier, self.api_timeout).await?;
        response
            .json::<Vec<RepoSummary>>()
            .await
            .map_err(|err| classify(err, &url))
    }

    /// Like [`fetch_repos`](Self::fetch_repos), but any failure yields an
    /// empty list.
    pub async fn fetch_repos_or_empty(&self, identifier: &str) -> Vec<RepoSummary> {
        match self.fetch_repos(identifier).await {
            Ok(repos) => repos,
            Err(err) => {
                tracing::warn!(identifier, error = %err, "failed to fetch repositories, continuing without them");
                Vec::new()
            }
        }
    }

    async fn get_ok(
        &self,
        url: &str,
        identifier: &str,
        timeout: Duration,
    ) -> FrameResult<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| classify(err, url))?;

        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::NOT_FOUND => Err(FrameError::UserNotFound(identifier.to_string())),
            status => Err(FrameError::Upstream {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

/// Maps a transport error onto the crate's error taxonomy.
fn classify(err: reqwest::Error, url: &str) -> FrameError {
    if err.is_decode() {
        return FrameError::Upstream {
            status: err.status().map_or(200, |s| s.as_u16()),
            url: url.to_string(),
        };
    }
    if let Some(status) = err.status() {
        return FrameError::Upstream {
            status: status.as_u16(),
            url: url.to_string(),
        };
    }
    FrameError::Transient(err.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::asset::tests::solid_png;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    /// Serves a fake github.com / api.github.com on an ephemeral port and
    /// returns its base URL.
    ///
    /// - `/{name}.png`: `octocat` and `torvalds` get a PNG, `broken` a 502,
    ///   `slow` stalls for five seconds, anything else 404.
    /// - `/users/{name}`: profiles for `octocat`, `reactdev` and `busy`.
    /// - `/users/{name}/repos`: repositories for the same users; `norepos`
    ///   answers 500.
    pub(crate) async fn spawn_stub_github() -> String {
        async fn avatar(Path(file): Path<String>) -> Response {
            let name = file.trim_end_matches(".png");
            match name {
                "octocat" | "torvalds" | "reactdev" | "busy" => (
                    [("content-type", "image/png")],
                    solid_png(96, 96, [36, 41, 46, 255]),
                )
                    .into_response(),
                "broken" => AxumStatus::BAD_GATEWAY.into_response(),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    AxumStatus::OK.into_response()
                }
                _ => AxumStatus::NOT_FOUND.into_response(),
            }
        }

        async fn user(Path(name): Path<String>) -> Response {
            let profile = match name.as_str() {
                "octocat" => json!({"login": "octocat", "public_repos": 8, "followers": 20, "following": 9, "bio": null}),
                "reactdev" => json!({"login": "reactdev", "public_repos": 3, "followers": 1, "following": 1, "bio": "Frontend engineer, React lover"}),
                "busy" => json!({"login": "busy", "public_repos": 40, "followers": 50, "following": 30, "bio": "Pythonista"}),
                "norepos" => json!({"login": "norepos", "public_repos": 0, "followers": 0, "following": 0}),
                "broken" => return AxumStatus::BAD_GATEWAY.into_response(),
                _ => return (AxumStatus::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
            };
            Json(profile).into_response()
        }

        async fn repos(Path(name): Path<String>) -> Response {
            let repos = match name.as_str() {
                "octocat" => json!([{"language": "JavaScript"}, {"language": null}, {"language": "JavaScript"}, {"language": "Ruby"}]),
                "busy" => json!([{"language": "Python"}, {"language": "Python"}, {"language": "Go"}]),
                "norepos" => return AxumStatus::INTERNAL_SERVER_ERROR.into_response(),
                _ => json!([]),
            };
            Json(repos).into_response()
        }

        let app = Router::new()
            .route("/:file", get(avatar))
            .route("/users/:name", get(user))
            .route("/users/:name/repos", get(repos));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn client() -> GithubClient {
        let base = spawn_stub_github().await;
        GithubClient::new(&base, &base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_avatar_bytes() {
        let avatar = client()
            .await
            .fetch_avatar("octocat", 256, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(avatar.origin(), AssetOrigin::Remote);
        assert_eq!(avatar.size().width, 96);
    }

    #[tokio::test]
    async fn avatar_status_mapping() {
        let client = client().await;
        let timeout = Duration::from_secs(5);

        let missing = client.fetch_avatar("ghost", 64, timeout).await.unwrap_err();
        assert!(matches!(missing, FrameError::UserNotFound(ref u) if u == "ghost"));

        let broken = client.fetch_avatar("broken", 64, timeout).await.unwrap_err();
        assert!(matches!(broken, FrameError::Upstream { status: 502, .. }));
    }

    #[tokio::test]
    async fn avatar_timeout_is_transient() {
        let err = client()
            .await
            .fetch_avatar("slow", 64, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "{err:?}");
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = GithubClient::new(&base, &base, Duration::from_secs(1)).unwrap();
        let err = client.fetch_profile("octocat").await.unwrap_err();
        assert!(err.is_transient(), "{err:?}");
    }

    #[tokio::test]
    async fn fetches_profile_and_repos() {
        let client = client().await;

        let profile = client.fetch_profile("octocat").await.unwrap();
        assert_eq!(profile.public_repos, 8);
        assert_eq!(profile.bio, None);

        let repos = client.fetch_repos("octocat").await.unwrap();
        assert_eq!(repos.len(), 4);
        assert_eq!(repos[0].language.as_deref(), Some("JavaScript"));

        assert!(matches!(
            client.fetch_profile("ghost").await.unwrap_err(),
            FrameError::UserNotFound(_)
        ));
    }

    #[tokio::test]
    async fn repo_failure_degrades_to_empty() {
        let repos = client().await.fetch_repos_or_empty("norepos").await;
        assert!(repos.is_empty());
    }

    #[test]
    fn base_urls_are_trimmed() {
        let client = GithubClient::new("https://github.com/", "https://api.github.com", Duration::from_secs(1)).unwrap();
        assert_eq!(client.avatar_base, "https://github.com");
    }
}
