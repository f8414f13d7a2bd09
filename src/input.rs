use crate::env::Environment;
use anyhow::Result;

/// Name of the input carrying the API token.
pub const GITHUB_TOKEN_INPUT: &str = "github-token";

/// Returns the environment variable the runner uses for an action input.
///
/// Spaces become underscores and the name is upper-cased; hyphens are kept,
/// so `github-token` maps to `INPUT_GITHUB-TOKEN`.
pub fn input_variable_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Reads an action input from the environment.
///
/// # Arguments
///
/// * `env` - Source of environment variables.
/// * `name` - Input name as declared in `action.yml`.
/// * `required` - Whether an absent or blank value is an error.
///
/// # Returns
///
/// * `Ok(value)` with surrounding whitespace trimmed. An optional input that is
///   not set yields an empty string.
/// * `Err` if `required` is set and the input is absent or blank.
pub fn get_input(env: &dyn Environment, name: &str, required: bool) -> Result<String> {
    let value = env
        .var(&input_variable_name(name))
        .map(|v| v.trim().to_string())
        .unwrap_or_default();

    if required && value.is_empty() {
        return Err(anyhow::anyhow!("Input required and not supplied: {name}"));
    }

    Ok(value)
}
