//! Language-model collaborators.
//!
//! The pipeline only sees two traits: an analysis model that answers a
//! system/user prompt pair with free text, and a baseline generator that turns
//! a batch of diffs into one message each. Backends are picked from config.
mod command;
mod http;
pub mod prompts;
pub mod response;

use crate::config::ModelBackend;
use anyhow::Result;

pub use command::{CommandBaseline, CommandModel};
pub use http::{HttpBaseline, HttpModel};
pub use prompts::PromptPair;

/// Model used for rectify / evaluate / classify.
pub trait AnalysisModel {
    /// Blocking call returning the model's raw text output.
    fn complete(&mut self, prompt: &PromptPair) -> Result<String>;

    /// Drop any cached per-request state; called after every row.
    fn release(&mut self) {}
}

/// Model used to generate baseline commit messages.
pub trait BaselineGenerator {
    /// One message per diff, same order, same count.
    fn generate(&mut self, diffs: &[String]) -> Result<Vec<String>>;

    /// Drop any cached state once the baseline stage is done.
    fn release(&mut self) {}
}

impl<M: AnalysisModel + ?Sized> AnalysisModel for Box<M> {
    fn complete(&mut self, prompt: &PromptPair) -> Result<String> {
        (**self).complete(prompt)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

impl<B: BaselineGenerator + ?Sized> BaselineGenerator for Box<B> {
    fn generate(&mut self, diffs: &[String]) -> Result<Vec<String>> {
        (**self).generate(diffs)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Build the configured analysis model backend.
pub fn analysis_model(backend: &ModelBackend) -> Result<Box<dyn AnalysisModel>> {
    Ok(match backend {
        ModelBackend::Command { command } => Box::new(CommandModel::new(command)?),
        ModelBackend::Http(settings) => Box::new(HttpModel::new(settings)?),
    })
}

/// Build the configured baseline generator backend.
pub fn baseline_generator(backend: &ModelBackend) -> Result<Box<dyn BaselineGenerator>> {
    Ok(match backend {
        ModelBackend::Command { command } => Box::new(CommandBaseline::new(command)?),
        ModelBackend::Http(settings) => Box::new(HttpBaseline::new(settings)?),
    })
}
