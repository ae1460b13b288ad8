//! Local command backend.
//!
//! Delegates generation to a user-configured command that reads a prompt on
//! stdin and writes its answer to stdout (`llm`, `ollama run`, `claude -p`,
//! custom scripts). No API keys or providers are baked in.
//!
//! The system prompt is substituted into any argv entry containing
//! `{system}`; when no entry does, it is prepended to stdin ahead of the user
//! prompt.
use super::{AnalysisModel, BaselineGenerator, PromptPair};
use crate::util::truncate_string;
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

const SYSTEM_PLACEHOLDER: &str = "{system}";

/// Analysis model backed by a local command.
#[derive(Debug, Clone)]
pub struct CommandModel {
    argv: Vec<String>,
}

impl CommandModel {
    pub fn new(command: &str) -> Result<Self> {
        Ok(Self {
            argv: split_command(command)?,
        })
    }

    fn render(&self, prompt: &PromptPair) -> (Vec<String>, String) {
        let uses_placeholder = self
            .argv
            .iter()
            .any(|arg| arg.contains(SYSTEM_PLACEHOLDER));
        if uses_placeholder {
            let argv = self
                .argv
                .iter()
                .map(|arg| arg.replace(SYSTEM_PLACEHOLDER, &prompt.system))
                .collect();
            (argv, prompt.user.clone())
        } else {
            let stdin = format!("{}\n\n{}", prompt.system, prompt.user);
            (self.argv.clone(), stdin)
        }
    }
}

impl AnalysisModel for CommandModel {
    fn complete(&mut self, prompt: &PromptPair) -> Result<String> {
        let (argv, stdin) = self.render(prompt);
        run_command(&argv, &stdin)
    }
}

/// Baseline generator backed by a local command.
///
/// The command receives a JSON array of diffs on stdin and must print a JSON
/// array with one message per diff, in the same order.
#[derive(Debug, Clone)]
pub struct CommandBaseline {
    argv: Vec<String>,
}

impl CommandBaseline {
    pub fn new(command: &str) -> Result<Self> {
        Ok(Self {
            argv: split_command(command)?,
        })
    }
}

impl BaselineGenerator for CommandBaseline {
    fn generate(&mut self, diffs: &[String]) -> Result<Vec<String>> {
        let input = serde_json::to_string(diffs).context("serialize baseline batch")?;
        let output = run_command(&self.argv, &input)?;
        let json = strip_code_fences(&output);
        let messages: Vec<String> = serde_json::from_str(json).with_context(|| {
            format!(
                "parse baseline output as a JSON array of strings: {}",
                truncate_string(&output, 200)
            )
        })?;
        Ok(messages)
    }
}

fn split_command(command: &str) -> Result<Vec<String>> {
    let argv =
        shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;
    if argv.is_empty() {
        return Err(anyhow!("LM command is empty"));
    }
    Ok(argv)
}

/// Run `argv` with `stdin` piped in and return its stdout.
fn run_command(argv: &[String], stdin: &str) -> Result<String> {
    let start = Instant::now();
    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn LM command: {}", argv[0]))?;

    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(stdin.as_bytes())
            .context("write prompt to LM stdin")?;
    }

    let output = child.wait_with_output().context("wait for LM command")?;
    let elapsed_ms = start.elapsed().as_millis();

    tracing::debug!(
        elapsed_ms,
        prompt_bytes = stdin.len(),
        response_bytes = output.stdout.len(),
        "lm command complete"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "LM command failed with status {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")
}

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(start) = text.find("```") else {
        return text;
    };
    let body_start = start + 3;
    let body_start = text[body_start..]
        .find('\n')
        .map(|offset| body_start + offset + 1)
        .unwrap_or(body_start);
    match text[body_start..].find("```") {
        Some(end) => text[body_start..body_start + end].trim(),
        None => text,
    }
}
