//! Workflow init step.
//!
//! Writes a default config so `run` has something to load.
use crate::cli::InitArgs;
use crate::config::{default_config, write_config};
use anyhow::{anyhow, Result};

/// Write the default config, refusing to clobber an existing one.
pub fn run_init(args: &InitArgs) -> Result<()> {
    if args.config.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            args.config.display()
        ));
    }
    let mut config = default_config();
    if let Some(repo) = args.repo.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        config.io.repo = repo.to_string();
    }
    write_config(&args.config, &config)?;
    println!("wrote {}", args.config.display());
    if config.io.repo.is_empty() {
        println!("set io.repo (or pass --repo to `rectify run`) before running");
    }
    Ok(())
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
