use closing_issues::env::ProcessEnvironment;
use closing_issues::workflow::Workflow;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let env = ProcessEnvironment;
    closing_issues::logging::init(&env);

    let mut workflow = Workflow::from_env(&env);
    closing_issues::run::run(&env, &mut workflow).await;

    if workflow.is_failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
