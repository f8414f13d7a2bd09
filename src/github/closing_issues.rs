use crate::context::InvocationContext;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Number of closing issue references requested. Later pages are not fetched.
pub const CLOSING_ISSUES_LIMIT: u32 = 10;

pub const CLOSING_ISSUES_QUERY: &str = r#"
query ($owner: String!, $name: String!, $number: Int!) {
  repository(owner: $owner, name: $name) {
    pullRequest(number: $number) {
      id
      closingIssuesReferences(first: 10) {
        nodes {
          number
          title
        }
      }
    }
  }
}
"#;

const USER_AGENT: &str = concat!("closing-issues/", env!("CARGO_PKG_VERSION"));

/// An issue the pull request will close on merge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LinkedIssue {
    pub number: u64,
    pub title: String,
}

#[derive(Deserialize, Debug)]
struct GraphQLResponse {
    data: Option<QueryData>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Deserialize, Debug)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct QueryData {
    repository: Option<Repository>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Repository {
    pull_request: Option<PullRequest>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    closing_issues_references: IssueConnection,
}

#[derive(Deserialize, Debug)]
struct IssueConnection {
    nodes: Vec<LinkedIssue>,
}

/// Decodes a GraphQL response body into the closing issues it lists.
///
/// Order is kept as returned by the server.
///
/// # Returns
///
/// * `Ok(issues)` when the response carries the issue connection.
/// * `Err` when the response reports errors, lacks the repository or pull
///   request, or an issue is missing its `number` or `title`.
pub fn parse_closing_issues(json: &str) -> Result<Vec<LinkedIssue>> {
    let response: GraphQLResponse =
        serde_json::from_str(json).context("Failed to parse closing issues response")?;

    if !response.errors.is_empty() {
        let details: Vec<String> = response
            .errors
            .iter()
            .map(|e| format!(" - {}", e.message))
            .collect();
        return Err(anyhow::anyhow!(
            "Request failed due to following response errors:\n{}",
            details.join("\n")
        ));
    }

    let pull_request = response
        .data
        .ok_or_else(|| anyhow::anyhow!("No data in GraphQL response"))?
        .repository
        .ok_or_else(|| anyhow::anyhow!("Repository not found in response"))?
        .pull_request
        .ok_or_else(|| anyhow::anyhow!("Pull request not found in response"))?;

    Ok(pull_request.closing_issues_references.nodes)
}

/// Runs the closing issues query for the pull request named by `context`.
pub async fn fetch_closing_issues(
    client: &reqwest::Client,
    url: &str,
    token: &str,
    context: &InvocationContext,
) -> Result<Vec<LinkedIssue>> {
    let body = json!({
        "query": CLOSING_ISSUES_QUERY,
        "variables": {
            "owner": context.owner,
            "name": context.repo,
            "number": context.number,
        },
    });

    let response = client
        .post(url)
        .bearer_auth(token)
        .header("Accept", "application/json")
        .header("User-Agent", USER_AGENT)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!("API request error: {}", response.status()));
    }

    let text = response.text().await?;
    parse_closing_issues(&text)
}

/// One log line per issue, `#<number> <title>`.
pub fn format_issue_line(issue: &LinkedIssue) -> String {
    format!("#{} {}", issue.number, issue.title)
}
