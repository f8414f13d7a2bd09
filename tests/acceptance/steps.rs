use crate::ActionWorld;
use closing_issues::workflow::Workflow;
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn table_rows(step: &Step) -> Vec<Vec<String>> {
    step.table
        .as_ref()
        .map(|table| table.rows.iter().skip(1).cloned().collect())
        .unwrap_or_default()
}

/// Reads the value stored under `name` in a GITHUB_OUTPUT file.
fn read_output(content: &str, name: &str) -> Option<String> {
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        if let Some(delimiter) = line.strip_prefix(&format!("{name}<<")) {
            let value: Vec<&str> = lines.by_ref().take_while(|l| *l != delimiter).collect();
            return Some(value.join("\n"));
        }
    }
    None
}

fn captured(world: &ActionWorld) -> String {
    String::from_utf8(world.captured_output.clone()).expect("Invalid UTF-8")
}

fn closing_issues_body(nodes: Value) -> Value {
    json!({
        "data": {
            "repository": {
                "pullRequest": {
                    "id": "PR_kwDOtest",
                    "closingIssuesReferences": { "nodes": nodes }
                }
            }
        }
    })
}

async fn mount_response(world: &ActionWorld, response: ResponseTemplate) {
    let server = world.server.as_ref().expect("pull request context not set up");
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer ghs_test"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[given(regex = r"^the workflow runs for pull request (\S+)/(\S+)#(\d+)$")]
async fn given_pull_request(world: &mut ActionWorld, owner: String, repo: String, number: u64) {
    let server = wiremock::MockServer::start().await;
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let event_path = dir.path().join("event.json");
    let event = json!({ "action": "opened", "number": number, "pull_request": { "number": number } });
    std::fs::write(&event_path, event.to_string()).expect("Failed to write event payload");

    let output_file = dir.path().join("output");
    std::fs::write(&output_file, "").expect("Failed to create output file");

    world
        .env
        .insert("GITHUB_REPOSITORY".to_string(), format!("{owner}/{repo}"));
    world.env.insert(
        "GITHUB_EVENT_PATH".to_string(),
        event_path.to_string_lossy().to_string(),
    );
    world.env.insert(
        "GITHUB_GRAPHQL_URL".to_string(),
        format!("{}/graphql", server.uri()),
    );
    world.env.insert(
        "GITHUB_OUTPUT".to_string(),
        output_file.to_string_lossy().to_string(),
    );

    world.output_file = Some(output_file);
    world.workdir = Some(dir);
    world.server = Some(server);
}

#[given("the workflow provides a token")]
async fn given_token(world: &mut ActionWorld) {
    world
        .env
        .insert("INPUT_GITHUB-TOKEN".to_string(), "ghs_test".to_string());
}

#[given("the workflow provides no token")]
async fn given_no_token(world: &mut ActionWorld) {
    world.env.remove("INPUT_GITHUB-TOKEN");
}

#[given("the pull request closes the issues:")]
async fn given_closing_issues(world: &mut ActionWorld, step: &Step) {
    let nodes: Vec<Value> = table_rows(step)
        .into_iter()
        .map(|row| {
            let number: u64 = row[0].parse().expect("issue number must be an integer");
            json!({ "number": number, "title": row[1] })
        })
        .collect();
    let body = closing_issues_body(Value::Array(nodes));
    mount_response(world, ResponseTemplate::new(200).set_body_json(body)).await;
}

#[given("the pull request closes no issues")]
async fn given_no_closing_issues(world: &mut ActionWorld) {
    let body = closing_issues_body(json!([]));
    mount_response(world, ResponseTemplate::new(200).set_body_json(body)).await;
}

#[given(regex = r"^the API responds with status (\d+)$")]
async fn given_api_status(world: &mut ActionWorld, status: u16) {
    mount_response(world, ResponseTemplate::new(status).set_body_string("Not Found")).await;
}

#[given(regex = r#"^the API reports the error "(.*)"$"#)]
async fn given_api_error(world: &mut ActionWorld, message: String) {
    let body = json!({
        "data": { "repository": null },
        "errors": [{ "type": "NOT_FOUND", "message": message }]
    });
    mount_response(world, ResponseTemplate::new(200).set_body_json(body)).await;
}

#[given("the API omits the pull request")]
async fn given_api_omits_pull_request(world: &mut ActionWorld) {
    let body = json!({ "data": { "repository": { "pullRequest": null } } });
    mount_response(world, ResponseTemplate::new(200).set_body_json(body)).await;
}

#[given("the API returns an issue without a title")]
async fn given_api_issue_without_title(world: &mut ActionWorld) {
    let body = closing_issues_body(json!([{ "number": 7 }]));
    mount_response(world, ResponseTemplate::new(200).set_body_json(body)).await;
}

#[when("the action runs")]
async fn when_action_runs(world: &mut ActionWorld) {
    let mut workflow = Workflow::new(Vec::new(), world.output_file.clone());
    closing_issues::run::run(&world.env, &mut workflow).await;

    world.failed = Some(workflow.is_failed());
    world.captured_output = workflow.into_inner();
}

#[then("the step succeeds")]
async fn then_step_succeeds(world: &mut ActionWorld) {
    assert_eq!(
        world.failed,
        Some(false),
        "Step failed with output:\n---\n{}\n---",
        captured(world)
    );
}

#[then(regex = r#"^the step fails with "(.*)"$"#)]
async fn then_step_fails_with(world: &mut ActionWorld, message: String) {
    assert_eq!(world.failed, Some(true), "Step should have failed");
    let output = captured(world);
    let expected = format!("::error::{message}");
    assert!(
        output.lines().any(|line| line == expected),
        "Expected '{}', but got:\n---\n{}\n---",
        expected,
        output
    );
}

#[then(regex = r"^the step fails with a message matching '(.*)'$")]
async fn then_step_fails_matching(world: &mut ActionWorld, pattern: String) {
    assert_eq!(world.failed, Some(true), "Step should have failed");
    let re = regex::Regex::new(&format!("^::error::{pattern}$")).expect("Invalid pattern");
    let output = captured(world);
    assert!(
        output.lines().any(|line| re.is_match(line)),
        "Expected a line matching '{}', but got:\n---\n{}\n---",
        re,
        output
    );
}

#[then(regex = r"^the issues output is '(.*)'$")]
async fn then_issues_output_is(world: &mut ActionWorld, expected: String) {
    let path = world.output_file.as_ref().expect("output file not set up");
    let content = std::fs::read_to_string(path).expect("Failed to read output file");
    let value = read_output(&content, "issues").expect("issues output not set");
    assert_eq!(value, expected);

    let reparsed: Value = serde_json::from_str(&value).expect("issues output is not JSON");
    assert_eq!(serde_json::to_string(&reparsed).unwrap(), value);
}

#[then("no output is set")]
async fn then_no_output(world: &mut ActionWorld) {
    let path = world.output_file.as_ref().expect("output file not set up");
    let content = std::fs::read_to_string(path).expect("Failed to read output file");
    assert!(content.is_empty(), "Unexpected outputs:\n{content}");
}

#[then("the log shows:")]
async fn then_log_shows(world: &mut ActionWorld, step: &Step) {
    let expected = step.docstring.as_ref().expect("docstring required");
    assert_eq!(captured(world).trim_end(), expected.trim());
}

#[then("the API was not called")]
async fn then_api_not_called(world: &mut ActionWorld) {
    let server = world.server.as_ref().expect("pull request context not set up");
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty(), "Expected no requests, got {}", requests.len());
}

#[then(regex = r"^the API was queried for (\S+)/(\S+)#(\d+)$")]
async fn then_api_queried_for(world: &mut ActionWorld, owner: String, repo: String, number: u64) {
    let server = world.server.as_ref().expect("pull request context not set up");
    let requests = server
        .received_requests()
        .await
        .expect("request recording disabled");
    assert_eq!(requests.len(), 1);

    let body: Value = requests[0].body_json().expect("request body is not JSON");
    assert_eq!(
        body["variables"],
        json!({ "owner": owner, "name": repo, "number": number })
    );
    let query = body["query"].as_str().expect("query missing");
    assert!(query.contains("closingIssuesReferences(first: 10)"));
}
