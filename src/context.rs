use crate::env::Environment;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Environment variable names exported by the runner
pub mod vars {
    pub const REPOSITORY: &str = "GITHUB_REPOSITORY";
    pub const EVENT_PATH: &str = "GITHUB_EVENT_PATH";
    pub const GRAPHQL_URL: &str = "GITHUB_GRAPHQL_URL";
    pub const API_URL: &str = "GITHUB_API_URL";
}

/// GraphQL endpoint used when the runner does not advertise one.
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Identifies the pull request a run executes for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl InvocationContext {
    /// Builds the context from `GITHUB_REPOSITORY` and the event payload at
    /// `GITHUB_EVENT_PATH`.
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let repository = env.var(vars::REPOSITORY).ok_or_else(|| {
            anyhow::anyhow!(
                "context.repo requires a GITHUB_REPOSITORY environment variable like 'owner/repo'"
            )
        })?;
        let (owner, repo) = parse_repository(&repository)?;

        let payload = match env.var(vars::EVENT_PATH) {
            Some(path) => read_event_payload(Path::new(&path))?,
            None => Value::Null,
        };
        let number = event_number(&payload).ok_or_else(|| {
            anyhow::anyhow!("Unable to determine the pull request number from the event payload")
        })?;

        Ok(InvocationContext {
            owner,
            repo,
            number,
        })
    }

    /// `owner/repo` form, as used in log lines.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Splits an `<owner>/<repo>` string into its two parts.
///
/// Both parts must be non-empty and there must be exactly one slash.
pub fn parse_repository(repository: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = repository.trim().split('/').collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(anyhow::anyhow!(
            "Invalid repository format: '{repository}'. Expected <owner>/<repo>."
        )),
    }
}

/// Parses the webhook event payload.
///
/// - Returns `Value::Null` if `content` is empty or contains only whitespace.
/// - Returns an `Err` if the JSON is invalid.
pub fn parse_event_payload(content: &[u8]) -> Result<Value> {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(content).context("Failed to parse event payload")
}

/// Reads the event payload file, treating a missing file as an empty payload.
fn read_event_payload(path: &Path) -> Result<Value> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "GITHUB_EVENT_PATH does not exist");
        return Ok(Value::Null);
    }
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    parse_event_payload(&content)
}

/// Picks the issue or pull request number out of an event payload.
///
/// `issue` wins over `pull_request`, which wins over a top-level `number`.
pub fn event_number(payload: &Value) -> Option<u64> {
    let subject = ["issue", "pull_request"]
        .iter()
        .map(|key| &payload[*key])
        .find(|value| value.is_object())
        .unwrap_or(payload);
    subject["number"].as_u64()
}

/// Resolves the GraphQL endpoint, preferring `GITHUB_GRAPHQL_URL`, then
/// `GITHUB_API_URL` with `/graphql` appended.
///
/// An Enterprise Server REST base ending in `/api/v3` maps to `/api/graphql`.
pub fn graphql_url(env: &dyn Environment) -> String {
    if let Some(url) = env.var(vars::GRAPHQL_URL).filter(|v| !v.is_empty()) {
        return url;
    }
    if let Some(api) = env.var(vars::API_URL).filter(|v| !v.is_empty()) {
        let base = api.trim_end_matches('/');
        let base = base.strip_suffix("/v3").filter(|b| b.ends_with("/api")).unwrap_or(base);
        return format!("{base}/graphql");
    }
    DEFAULT_GRAPHQL_URL.to_string()
}
