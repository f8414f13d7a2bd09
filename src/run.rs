use crate::context::{self, InvocationContext};
use crate::env::Environment;
use crate::github::closing_issues::{self, LinkedIssue};
use crate::input;
use crate::workflow::Workflow;
use anyhow::{Context, Result};
use std::io::Write;

/// Title of the log group listing the issues.
pub const LOG_GROUP_TITLE: &str = "Issues to close";
/// Name of the step output holding the JSON array of issues.
pub const ISSUES_OUTPUT: &str = "issues";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Looks up the issues a single pull request will close.
pub struct Resolver {
    context: InvocationContext,
    graphql_url: String,
}

impl Resolver {
    pub fn new(context: InvocationContext, graphql_url: impl Into<String>) -> Self {
        Resolver {
            context,
            graphql_url: graphql_url.into(),
        }
    }

    /// Queries the closing issues, logs them in a group and sets the `issues`
    /// output.
    ///
    /// The token is read before any request is made, so a missing token never
    /// reaches the network.
    pub async fn resolve<W: Write>(
        &self,
        env: &dyn Environment,
        workflow: &mut Workflow<W>,
    ) -> Result<Vec<LinkedIssue>> {
        let token = input::get_input(env, input::GITHUB_TOKEN_INPUT, true)?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        tracing::debug!(
            repository = %self.context.full_name(),
            number = self.context.number,
            url = %self.graphql_url,
            "querying closing issue references"
        );
        let issues = closing_issues::fetch_closing_issues(
            &client,
            &self.graphql_url,
            &token,
            &self.context,
        )
        .await?;
        tracing::debug!(count = issues.len(), "received closing issue references");

        workflow.start_group(LOG_GROUP_TITLE)?;
        for issue in &issues {
            workflow.info(&closing_issues::format_issue_line(issue))?;
        }
        workflow.end_group()?;

        let serialized = serde_json::to_string(&issues)?;
        workflow.set_output(ISSUES_OUTPUT, &serialized)?;

        Ok(issues)
    }
}

/// Entry point for one action run.
///
/// Every error is reported through [`Workflow::set_failed`]; the function
/// itself always returns normally. Use [`Workflow::is_failed`] for the outcome.
pub async fn run<W: Write>(env: &dyn Environment, workflow: &mut Workflow<W>) {
    if let Err(err) = try_run(env, workflow).await {
        tracing::debug!(error = ?err, "run failed");
        if let Err(write_err) = workflow.set_failed(&format!("{err:#}")) {
            tracing::error!(error = %write_err, "failed to report failure");
        }
    }
}

async fn try_run<W: Write>(env: &dyn Environment, workflow: &mut Workflow<W>) -> Result<()> {
    let context = InvocationContext::from_env(env)?;
    let resolver = Resolver::new(context, context::graphql_url(env));
    resolver.resolve(env, workflow).await?;
    Ok(())
}
