//! Bug-fix commit mining over a git history.
//!
//! Walks non-merge commits oldest first with the `git` CLI and turns every
//! matching file of every bug-fixing commit into one row. The keyword list and
//! regex are a cheap heuristic, not a classifier.
use crate::config::IoConfig;
use crate::record::MinedRow;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

/// Source of raw rows for a run.
pub trait CommitMiner {
    /// Mine rows, stopping after `limit` qualifying commits when set.
    fn mine(&mut self, limit: Option<usize>) -> Result<Vec<MinedRow>>;
}

const BUG_KEYWORDS: [&str; 21] = [
    "fixed",
    "bug",
    "fixes",
    "fix",
    "crash",
    "solves",
    "resolves",
    "issue",
    "regression",
    "fail",
    "npe",
    "except",
    "broken",
    "error",
    "hang",
    "leak",
    "overflow",
    "avoid",
    "workaround",
    "break",
    "stop",
];

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';

fn bug_regex() -> &'static Regex {
    static BUG: OnceLock<Regex> = OnceLock::new();
    BUG.get_or_init(|| {
        Regex::new(r"(?i)((solv(ed|es|e|ing))|(fix(s|es|ing|ed)?)|((error|bug|issue)(s)?))")
            .expect("bug regex is valid")
    })
}

/// Whether a commit message looks like a bug fix.
pub fn is_bug_fix(message: &str) -> bool {
    let lower = message.to_lowercase();
    if BUG_KEYWORDS.iter().any(|keyword| lower.contains(keyword)) {
        return true;
    }
    let first_line = message.lines().next().unwrap_or_default();
    bug_regex().is_match(first_line)
}

/// Miner backed by the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitMiner {
    git: PathBuf,
    repo: String,
    clone_dir: PathBuf,
    extensions: Vec<String>,
}

impl GitMiner {
    pub fn new(io: &IoConfig) -> Result<Self> {
        let git = which::which("git").context("locate git executable on PATH")?;
        let clone_dir = match &io.local_repo_path {
            Some(path) => path.clone(),
            None => default_clone_dir(&io.repo)?,
        };
        Ok(Self {
            git,
            repo: io.repo.clone(),
            clone_dir,
            extensions: io
                .file_extensions
                .iter()
                .map(|ext| ext.trim().to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
        })
    }

    /// Use a local checkout directly; clone remote repositories once.
    fn checkout(&self) -> Result<PathBuf> {
        let local = Path::new(&self.repo);
        if local.is_dir() {
            return Ok(local.to_path_buf());
        }
        if self.clone_dir.join(".git").exists() {
            tracing::info!(path = %self.clone_dir.display(), "reusing existing clone");
            return Ok(self.clone_dir.clone());
        }
        if let Some(parent) = self.clone_dir.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        tracing::info!(repo = %self.repo, path = %self.clone_dir.display(), "cloning repository");
        let status = Command::new(&self.git)
            .arg("clone")
            .arg("--quiet")
            .arg(&self.repo)
            .arg(&self.clone_dir)
            .status()
            .context("run git clone")?;
        if !status.success() {
            return Err(anyhow!("git clone of {} failed with {status}", self.repo));
        }
        Ok(self.clone_dir.clone())
    }

    fn git(&self, repo: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.git)
            .arg("-C")
            .arg(repo)
            .args(args)
            .output()
            .with_context(|| format!("run git {}", args.join(" ")))?;
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn wants(&self, path: &str) -> bool {
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }
}

impl CommitMiner for GitMiner {
    fn mine(&mut self, limit: Option<usize>) -> Result<Vec<MinedRow>> {
        let repo = self.checkout()?;
        tracing::info!(repo = %repo.display(), "mining bug-fixing commits");
        let log_format = format!("--format={RECORD_SEP}%H{FIELD_SEP}%B");
        let log = self.git(&repo, &["log", "--reverse", "--no-merges", &log_format])?;

        let mut rows = Vec::new();
        let mut commits = 0usize;
        for (hash, message) in parse_log(&log) {
            if limit.is_some_and(|limit| commits >= limit) {
                break;
            }
            if !is_bug_fix(&message) {
                continue;
            }
            let changed = self.git(
                &repo,
                &[
                    "diff-tree",
                    "--root",
                    "--no-commit-id",
                    "-r",
                    "--name-only",
                    "--diff-filter=d",
                    "-z",
                    &hash,
                ],
            )?;
            let mut produced = false;
            for path in changed.split('\0').filter(|path| !path.is_empty()) {
                if !self.wants(path) {
                    continue;
                }
                let patch = self.git(
                    &repo,
                    &["show", "--format=", "--no-color", &hash, "--", path],
                )?;
                let diff = strip_diff_header(&patch);
                if diff.trim().is_empty() {
                    continue;
                }
                rows.push(MinedRow {
                    commit_hash: hash.clone(),
                    message: message.clone(),
                    file_path: path.to_string(),
                    diff: diff.to_string(),
                });
                produced = true;
            }
            if produced {
                commits += 1;
            }
        }
        tracing::info!(rows = rows.len(), commits, "mining complete");
        Ok(rows)
    }
}

/// Split `git log` output into `(hash, message)` pairs.
fn parse_log(log: &str) -> Vec<(String, String)> {
    log.split(RECORD_SEP)
        .filter_map(|record| {
            let (hash, message) = record.split_once(FIELD_SEP)?;
            let hash = hash.trim();
            if hash.is_empty() {
                return None;
            }
            Some((hash.to_string(), message.trim().to_string()))
        })
        .collect()
}

/// Drop the `diff --git`/index/`---`/`+++` preamble; keep from the first hunk.
fn strip_diff_header(patch: &str) -> &str {
    if patch.starts_with("@@") {
        return patch;
    }
    match patch.find("\n@@") {
        Some(offset) => &patch[offset + 1..],
        None => "",
    }
}

fn default_clone_dir(repo: &str) -> Result<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow!("cannot determine a cache directory; set io.local_repo_path"))?;
    let name = repo
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .map(|name| name.trim_end_matches(".git"))
        .filter(|name| !name.is_empty())
        .unwrap_or("repo");
    Ok(base.join("rectify").join("repos").join(name))
}
