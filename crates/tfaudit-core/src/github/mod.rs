use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::audit::AuditRun;

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// CI context required for pull-request commenting. Built only when all three
/// signals are present; otherwise the enrichment step is skipped entirely.
#[derive(Debug, Clone)]
pub struct CiContext {
    pub token: String,
    pub repository: String,
    pub event_path: PathBuf,
    pub api_base: String,
}

impl CiContext {
    const TOKEN_ENV: &'static str = "GITHUB_TOKEN";
    const REPOSITORY_ENV: &'static str = "GITHUB_REPOSITORY";
    const EVENT_PATH_ENV: &'static str = "GITHUB_EVENT_PATH";
    const API_URL_ENV: &'static str = "GITHUB_API_URL";

    /// Detect the GitHub Actions context from the environment. Returns `None`
    /// unless `GITHUB_TOKEN`, `GITHUB_REPOSITORY` and `GITHUB_EVENT_PATH` are
    /// all set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_map(std::env::vars().collect())
    }

    fn from_map(vars: HashMap<String, String>) -> Option<Self> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let token = get(Self::TOKEN_ENV)?;
        let repository = get(Self::REPOSITORY_ENV)?;
        let event_path = PathBuf::from(get(Self::EVENT_PATH_ENV)?);
        let api_base = get(Self::API_URL_ENV).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Some(Self {
            token,
            repository,
            event_path,
            api_base,
        })
    }

    /// Read the event-description file and extract the pull request number.
    /// Returns `Ok(None)` when the event does not describe a pull request.
    pub fn pull_request_number(&self) -> Result<Option<u64>> {
        let raw = fs::read_to_string(&self.event_path).with_context(|| {
            format!("failed to read event file at {}", self.event_path.display())
        })?;
        let event: serde_json::Value =
            serde_json::from_str(&raw).context("event file is not valid JSON")?;
        Ok(event
            .get("pull_request")
            .and_then(|pr| pr.get("number"))
            .and_then(serde_json::Value::as_u64))
    }
}

/// Capability interface for posting audit results somewhere out-of-band.
/// Absence or failure of a poster never affects the pass/fail verdict.
#[async_trait]
pub trait CommentPoster: Send + Sync {
    async fn post_comment(&self, body: &str) -> Result<()>;
}

/// Posts issue comments on the pull request that triggered the run.
#[derive(Debug, Clone)]
pub struct GithubCommenter {
    http: Client,
    url: String,
    token: String,
}

impl GithubCommenter {
    pub fn new(ctx: &CiContext, pr_number: u64) -> Result<Self> {
        let url = format!(
            "{}/repos/{}/issues/{}/comments",
            ctx.api_base.trim_end_matches('/'),
            ctx.repository,
            pr_number
        );
        let http = Client::builder()
            .user_agent("tfaudit/0.2")
            .build()
            .context("failed to build GitHub HTTP client")?;
        Ok(Self {
            http,
            url,
            token: ctx.token.clone(),
        })
    }
}

#[async_trait]
impl CommentPoster for GithubCommenter {
    async fn post_comment(&self, body: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .json(&CommentRequest { body })
            .send()
            .await
            .context("failed to call GitHub comments API")?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("GitHub API error ({}): {}", status, text);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CommentRequest<'a> {
    body: &'a str,
}

/// Fixed comment layout: header, audited file, raw analysis text.
pub fn comment_body(filepath: &str, analysis: &str) -> String {
    format!("### 🤖 AI Security Audit Results\n\n**File:** `{filepath}`\n\n---\n\n{analysis}")
}

/// Post one comment per analyzed unit, swallowing and logging every failure.
pub async fn post_run_comments(poster: &dyn CommentPoster, run: &AuditRun) {
    for unit in &run.units {
        let body = comment_body(&unit.unit, &unit.detail);
        if let Err(err) = poster.post_comment(&body).await {
            warn!(unit = %unit.unit, error = %format!("{err:#}"), "failed to post pull request comment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write as _;

    fn ctx_vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn context_requires_all_three_signals() {
        assert!(CiContext::from_map(ctx_vars(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "acme/infra"),
        ]))
        .is_none());
        let ctx = CiContext::from_map(ctx_vars(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "acme/infra"),
            ("GITHUB_EVENT_PATH", "/tmp/event.json"),
        ]))
        .expect("complete context should build");
        assert_eq!(ctx.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn blank_signal_counts_as_absent() {
        assert!(CiContext::from_map(ctx_vars(&[
            ("GITHUB_TOKEN", "  "),
            ("GITHUB_REPOSITORY", "acme/infra"),
            ("GITHUB_EVENT_PATH", "/tmp/event.json"),
        ]))
        .is_none());
    }

    fn context_with_event(event: &serde_json::Value) -> (CiContext, tempfile::NamedTempFile) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{event}").unwrap();
        let ctx = CiContext::from_map(ctx_vars(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "acme/infra"),
            ("GITHUB_EVENT_PATH", file.path().to_str().unwrap()),
        ]))
        .unwrap();
        (ctx, file)
    }

    #[test]
    fn pull_request_number_is_extracted() {
        let (ctx, _file) = context_with_event(&json!({"pull_request": {"number": 42}}));
        assert_eq!(ctx.pull_request_number().unwrap(), Some(42));
    }

    #[test]
    fn non_pull_request_event_yields_none() {
        let (ctx, _file) = context_with_event(&json!({"ref": "refs/heads/main"}));
        assert_eq!(ctx.pull_request_number().unwrap(), None);
    }

    #[test]
    fn unreadable_event_file_is_an_error() {
        let ctx = CiContext::from_map(ctx_vars(&[
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", "acme/infra"),
            ("GITHUB_EVENT_PATH", "/nonexistent/event.json"),
        ]))
        .unwrap();
        assert!(ctx.pull_request_number().is_err());
    }

    #[test]
    fn comment_body_has_fixed_layout() {
        let body = comment_body("main.tf", "all good");
        assert!(body.starts_with("### 🤖 AI Security Audit Results"));
        assert!(body.contains("**File:** `main.tf`"));
        assert!(body.ends_with("all good"));
    }

    #[tokio::test]
    async fn commenter_posts_to_the_pull_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/repos/acme/infra/issues/7/comments")
                    .header("authorization", "Bearer t")
                    .body_contains("AI Security Audit Results");
                then.status(201).json_body(json!({"id": 1}));
            })
            .await;

        let (mut ctx, _file) = context_with_event(&json!({"pull_request": {"number": 7}}));
        ctx.api_base = server.base_url();
        let commenter = GithubCommenter::new(&ctx, 7).unwrap();
        commenter
            .post_comment(&comment_body("main.tf", "looks fine"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_failure_surfaces_as_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/repos/acme/infra/issues/7/comments");
                then.status(403).body("forbidden");
            })
            .await;

        let (mut ctx, _file) = context_with_event(&json!({"pull_request": {"number": 7}}));
        ctx.api_base = server.base_url();
        let commenter = GithubCommenter::new(&ctx, 7).unwrap();
        let err = commenter.post_comment("body").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
