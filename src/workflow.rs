use crate::env::Environment;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

/// File the runner reads step outputs from.
pub const OUTPUT_FILE_VAR: &str = "GITHUB_OUTPUT";

/// Writes workflow commands for the runner and records whether the step failed.
///
/// Commands go to `writer` (stdout in production). Outputs are appended to
/// the `GITHUB_OUTPUT` file when one is configured.
pub struct Workflow<W: Write> {
    writer: W,
    output_file: Option<PathBuf>,
    failed: bool,
}

impl Workflow<io::Stdout> {
    pub fn from_env(env: &dyn Environment) -> Self {
        let output_file = env
            .var(OUTPUT_FILE_VAR)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        Workflow::new(io::stdout(), output_file)
    }
}

impl<W: Write> Workflow<W> {
    pub fn new(writer: W, output_file: Option<PathBuf>) -> Self {
        Workflow {
            writer,
            output_file,
            failed: false,
        }
    }

    /// Plain log line.
    pub fn info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.writer, "{message}")
    }

    /// Opens a collapsible log group.
    pub fn start_group(&mut self, title: &str) -> io::Result<()> {
        self.issue_command("group", &[], title)
    }

    pub fn end_group(&mut self) -> io::Result<()> {
        self.issue_command("endgroup", &[], "")
    }

    /// Sets a step output.
    ///
    /// Uses the output file when the runner provides one and falls back to the
    /// `set-output` command otherwise.
    pub fn set_output(&mut self, name: &str, value: &str) -> Result<()> {
        match &self.output_file {
            Some(path) => {
                let message = prepare_key_value_message(name, value)?;
                let mut file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)
                    .with_context(|| format!("Failed to open output file {}", path.display()))?;
                writeln!(file, "{message}").context("Failed to write output file")?;
            }
            None => {
                writeln!(self.writer)?;
                self.issue_command("set-output", &[("name", name)], value)?;
            }
        }
        Ok(())
    }

    /// Reports `message` as an error annotation and marks the step failed.
    pub fn set_failed(&mut self, message: &str) -> io::Result<()> {
        self.failed = true;
        self.issue_command("error", &[], message)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn issue_command(
        &mut self,
        command: &str,
        properties: &[(&str, &str)],
        message: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "{}",
            format_command(command, properties, message)
        )
    }
}

/// Renders `::command key=value,...::message`.
pub fn format_command(command: &str, properties: &[(&str, &str)], message: &str) -> String {
    let mut line = format!("::{command}");
    if !properties.is_empty() {
        let props: Vec<String> = properties
            .iter()
            .map(|(key, value)| format!("{key}={}", escape_property(value)))
            .collect();
        line.push(' ');
        line.push_str(&props.join(","));
    }
    line.push_str("::");
    line.push_str(&escape_data(message));
    line
}

pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Builds a heredoc-style `name<<delimiter` entry for the output file.
fn prepare_key_value_message(name: &str, value: &str) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());

    if name.contains(&delimiter) {
        return Err(anyhow::anyhow!(
            "Unexpected input: name should not contain the delimiter \"{delimiter}\""
        ));
    }
    if value.contains(&delimiter) {
        return Err(anyhow::anyhow!(
            "Unexpected input: value should not contain the delimiter \"{delimiter}\""
        ));
    }

    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}"))
}
