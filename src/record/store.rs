//! Authoritative in-memory results table with checkpointing.
//!
//! The store reconciles freshly mined rows with a prior results file, answers
//! which rows still lack a given field, applies partial updates, and flushes
//! the full table to disk on demand.
use super::io::{read_table, write_table};
use super::schema::{Field, IdentityKey, MinedRow, RowUpdate, WorkItem};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the starting table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// No usable prior results; every derived field starts absent.
    ColdStart,
    /// Prior results were merged in by identity key.
    Resumed,
}

/// Results table plus the path it checkpoints to.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    items: Vec<WorkItem>,
    index: HashMap<IdentityKey, usize>,
    origin: Origin,
}

impl RecordStore {
    /// Merge `fresh` rows with whatever is persisted at `path`.
    ///
    /// Every fresh key appears exactly once, in mined order, carrying over the
    /// prior row's derived values when one exists. Prior rows that were not
    /// mined this time are kept after the fresh rows. A missing or unreadable
    /// prior table is a cold start; an unreadable one is first moved aside so
    /// the next flush cannot destroy it. Only failing to move it is an error.
    pub fn reconcile(fresh: Vec<MinedRow>, path: &Path) -> Result<Self> {
        let prior = load_prior(path)?;
        let origin = if prior.is_some() {
            Origin::Resumed
        } else {
            Origin::ColdStart
        };
        let prior = prior.unwrap_or_default();

        let mut prior_by_key: HashMap<&IdentityKey, &WorkItem> = HashMap::new();
        for item in &prior {
            prior_by_key.entry(&item.key).or_insert(item);
        }

        let mut store = Self {
            path: path.to_path_buf(),
            items: Vec::with_capacity(fresh.len()),
            index: HashMap::new(),
            origin,
        };
        let mut carried = 0usize;
        for key in fresh {
            if store.index.contains_key(&key) {
                continue;
            }
            let item = match prior_by_key.get(&key) {
                Some(existing) => {
                    carried += 1;
                    WorkItem::with_derived_from(key, existing)
                }
                None => WorkItem::fresh(key),
            };
            store.push(item);
        }
        let mined = store.items.len();
        for item in &prior {
            if !store.index.contains_key(&item.key) {
                store.push(item.clone());
            }
        }

        tracing::info!(
            mined,
            carried,
            retained = store.items.len() - mined,
            total = store.items.len(),
            "results reconciled"
        );
        Ok(store)
    }

    /// Load a persisted table for read-only use (reports, status).
    pub fn load(path: &Path) -> Result<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            items: Vec::new(),
            index: HashMap::new(),
            origin: Origin::Resumed,
        };
        for item in read_table(path)? {
            if !store.index.contains_key(&item.key) {
                store.push(item);
            }
        }
        Ok(store)
    }

    fn push(&mut self, item: WorkItem) {
        self.index.insert(item.key.clone(), self.items.len());
        self.items.push(item);
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&WorkItem> {
        self.index.get(key).map(|&position| &self.items[position])
    }

    /// Rows whose `field` is still absent, in table order.
    ///
    /// Evaluated lazily against the live table, so rows updated earlier in the
    /// run are never yielded again.
    pub fn rows_needing(&self, field: Field) -> impl Iterator<Item = (&IdentityKey, &WorkItem)> {
        self.items
            .iter()
            .filter(move |item| item.is_missing(field))
            .map(|item| (&item.key, item))
    }

    /// Whether a row with this key still lacks `field`.
    pub fn needs(&self, key: &IdentityKey, field: Field) -> bool {
        self.get(key).is_some_and(|item| item.is_missing(field))
    }

    /// Apply a partial update to exactly one row.
    ///
    /// The update is all-or-nothing: a value of the wrong kind leaves the row
    /// as it was.
    pub fn update(&mut self, key: &IdentityKey, update: RowUpdate) -> Result<()> {
        let position = *self.index.get(key).ok_or_else(|| {
            anyhow!(
                "no row for commit {} file {}",
                key.commit_hash,
                key.file_path
            )
        })?;
        update.apply_to(&mut self.items[position])
    }

    /// Write the whole table to its checkpoint path.
    pub fn flush(&self) -> Result<()> {
        write_table(self.path(), &self.items)?;
        tracing::debug!(rows = self.items.len(), path = %self.path().display(), "checkpoint written");
        Ok(())
    }
}

fn load_prior(path: &Path) -> Result<Option<Vec<WorkItem>>> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no prior results; starting fresh");
        return Ok(None);
    }
    match read_table(path) {
        Ok(items) => {
            tracing::info!(path = %path.display(), rows = items.len(), "resuming from prior results");
            Ok(Some(items))
        }
        Err(err) => {
            let aside = set_aside(path)?;
            tracing::warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = format!("{err:#}"),
                "prior results unreadable; starting fresh"
            );
            Ok(None)
        }
    }
}

/// Rename an unreadable table to the first free `<name>.corrupt[.N]` path.
fn set_aside(path: &Path) -> Result<PathBuf> {
    let mut name = path.as_os_str().to_os_string();
    name.push(".corrupt");
    let base = PathBuf::from(name);
    let mut target = base.clone();
    let mut attempt = 0usize;
    while target.exists() {
        attempt += 1;
        let mut numbered = base.as_os_str().to_os_string();
        numbered.push(format!(".{attempt}"));
        target = PathBuf::from(numbered);
    }
    fs::rename(path, &target).with_context(|| {
        format!(
            "move unreadable results {} aside to {}",
            path.display(),
            target.display()
        )
    })?;
    Ok(target)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
