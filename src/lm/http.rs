//! OpenAI-compatible chat completions backend.
//!
//! Works against any server exposing `POST .../chat/completions` (Ollama,
//! vLLM, llama.cpp server, hosted APIs). Each call is a single blocking
//! request.
use super::prompts::BASELINE_SYSTEM;
use super::{AnalysisModel, BaselineGenerator, PromptPair};
use crate::config::HttpBackend;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Analysis model served over HTTP.
pub struct HttpModel {
    agent: ureq::Agent,
    settings: HttpBackend,
    api_key: Option<String>,
}

impl HttpModel {
    pub fn new(settings: &HttpBackend) -> Result<Self> {
        let api_key = match settings.api_key_env.as_deref() {
            Some(var) => Some(
                std::env::var(var)
                    .with_context(|| format!("read API key from environment variable {var}"))?,
            ),
            None => None,
        };
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
            .build();
        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
            settings: settings.clone(),
            api_key,
        })
    }

    fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            stream: false,
        };

        let start = Instant::now();
        let mut builder = self.agent.post(self.settings.endpoint.as_str());
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        let mut response = builder
            .send_json(&request)
            .with_context(|| format!("POST {}", self.settings.endpoint))?;
        let parsed: ChatResponse = response
            .body_mut()
            .read_json()
            .context("parse chat completion response")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no content"))?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = system.len() + user.len(),
            response_bytes = content.len(),
            model = %self.settings.model,
            "lm request complete"
        );
        Ok(content)
    }
}

impl AnalysisModel for HttpModel {
    fn complete(&mut self, prompt: &PromptPair) -> Result<String> {
        self.chat(&prompt.system, &prompt.user)
    }
}

/// Baseline generator served over HTTP: one chat call per diff.
pub struct HttpBaseline {
    model: HttpModel,
}

impl HttpBaseline {
    pub fn new(settings: &HttpBackend) -> Result<Self> {
        Ok(Self {
            model: HttpModel::new(settings)?,
        })
    }
}

impl BaselineGenerator for HttpBaseline {
    fn generate(&mut self, diffs: &[String]) -> Result<Vec<String>> {
        diffs
            .iter()
            .map(|diff| {
                self.model
                    .chat(BASELINE_SYSTEM.trim(), diff)
                    .map(|message| first_line(&message))
            })
            .collect()
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}
