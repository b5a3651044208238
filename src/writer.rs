// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! All-or-nothing commit of a round.
//!
//! The writer is the only part of the generator that touches the output
//! tree. It reconciles a [`RoundOutcome`] with the manifest of the previous
//! round:
//!
//! | Previous file of ...                          | Action               |
//! |-----------------------------------------------|----------------------|
//! | an entity rendered this round, same content   | left alone           |
//! | an entity rendered this round, new content    | replaced atomically  |
//! | an entity with errors this round              | kept, entry carried  |
//! | an entity gone from the sources               | deleted              |
//!
//! Every changed file goes through a [`NamedTempFile`] in its target
//! directory and is persisted by rename, so readers never observe a half
//! written file.
//!
//! # Layout
//!
//! ```text
//! {output.dir}/
//! ├── .entity-forge-manifest.yml
//! ├── mod.rs                    pub mod repository; pub mod service; ...
//! ├── repository/
//! │   ├── mod.rs                pub mod book_repository;
//! │   └── book_repository.rs
//! └── service/
//!     ├── mod.rs
//!     └── book_service.rs
//! ```

#[cfg(test)]
mod tests;

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::{self, Write},
    path::{Component, Path, PathBuf}
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    emit::GENERATED_MARKER,
    error::ForgeError,
    naming::QualifiedName,
    pipeline::{RoundOutcome, content_hash}
};

/// Manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = ".entity-forge-manifest.yml";

/// Module index file name.
const INDEX_FILE: &str = "mod.rs";

/// Generated files of the last committed round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Artifact files keyed by `/`-separated path below the output
    /// directory.
    #[serde(default)]
    pub files:   BTreeMap<String, ManifestEntry>,
    /// Module index files and their content hash.
    #[serde(default)]
    pub indexes: BTreeMap<String, String>
}

/// One generated artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Qualified entity name.
    pub entity: String,
    /// Artifact kind name.
    pub kind:   String,
    /// Stable artifact id.
    pub id:     String,
    /// SHA-256 of the content.
    pub hash:   String
}

impl Manifest {
    /// Manifest stored in `out_dir`; empty when there is none.
    pub fn load(out_dir: &Path) -> Result<Self, ForgeError> {
        let path = out_dir.join(MANIFEST_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ForgeError::io("cannot read", path, e))
        };
        serde_yaml::from_str(&text).map_err(|source| ForgeError::Manifest {
            path,
            source
        })
    }

    fn to_yaml(&self, path: &Path) -> Result<String, ForgeError> {
        serde_yaml::to_string(self).map_err(|source| ForgeError::Manifest {
            path: path.to_path_buf(),
            source
        })
    }
}

/// What a commit did, paths relative to the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Files created or replaced.
    pub written:   Vec<PathBuf>,
    /// Files whose content did not change.
    pub unchanged: Vec<PathBuf>,
    /// Files of failed entities left as they were.
    pub retained:  Vec<PathBuf>,
    /// Stale files deleted.
    pub removed:   Vec<PathBuf>
}

impl CommitReport {
    /// Check whether the commit touched the filesystem.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}

/// Write the outcome of a round below `out_dir`.
///
/// Only entities without error diagnostics are written; entities with
/// errors keep whatever the previous round produced for them.
#[tracing::instrument(skip_all, fields(out_dir = %out_dir.display(), artifacts = outcome.artifacts.len()))]
pub fn commit(outcome: &RoundOutcome, out_dir: &Path) -> Result<CommitReport, ForgeError> {
    let previous = Manifest::load(out_dir)?;
    let mut next = Manifest::default();
    let mut report = CommitReport::default();

    for (key, entry) in &previous.files {
        if is_retained(&entry.entity, &outcome.failed) {
            next.files.insert(key.clone(), entry.clone());
            report.retained.push(PathBuf::from(key));
        }
    }

    for artifact in &outcome.artifacts {
        let key = manifest_key(&artifact.plan.target);
        let relative = PathBuf::from(&key);
        if write_if_changed(&out_dir.join(&relative), &artifact.text)? {
            report.written.push(relative);
        } else {
            report.unchanged.push(relative);
        }
        next.files.insert(
            key,
            ManifestEntry {
                entity: artifact.plan.entity.to_string(),
                kind:   artifact.plan.kind.to_string(),
                id:     artifact.plan.id.to_string(),
                hash:   artifact.hash.clone()
            }
        );
    }

    for (key, text) in module_indexes(next.files.keys()) {
        let relative = PathBuf::from(&key);
        if write_if_changed(&out_dir.join(&relative), &text)? {
            report.written.push(relative);
        }
        next.indexes.insert(key, content_hash(&text));
    }

    let stale = previous
        .files
        .keys()
        .filter(|k| !next.files.contains_key(*k))
        .chain(previous.indexes.keys().filter(|k| !next.indexes.contains_key(*k)));
    for key in stale {
        if remove_file(out_dir, key)? {
            report.removed.push(PathBuf::from(key));
        }
    }

    if next != previous || !out_dir.join(MANIFEST_FILE).exists() {
        let path = out_dir.join(MANIFEST_FILE);
        write_atomic(&path, &next.to_yaml(&path)?)?;
    }

    report.written.sort();
    report.removed.sort();
    tracing::info!(
        written = report.written.len(),
        unchanged = report.unchanged.len(),
        retained = report.retained.len(),
        removed = report.removed.len(),
        "round committed"
    );
    Ok(report)
}

/// Entity failed this round, directly or through its source file.
///
/// A file that fails to parse is keyed to its module, and inline modules of
/// that file are invisible, so every entity below a failed owner is kept.
fn is_retained(entity: &str, failed: &BTreeSet<QualifiedName>) -> bool {
    failed.iter().any(|owner| {
        entity
            .strip_prefix(owner.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Portable manifest key of a relative target.
fn manifest_key(target: &Path) -> String {
    target
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `mod.rs` of every directory holding generated files, keyed like the
/// manifest.
fn module_indexes<'a>(files: impl Iterator<Item = &'a String>) -> BTreeMap<String, String> {
    let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for file in files {
        let mut parts: Vec<&str> = file.split('/').collect();
        let Some(last) = parts.pop() else {
            continue;
        };
        let module = last.strip_suffix(".rs").unwrap_or(last);
        children
            .entry(parts.join("/"))
            .or_default()
            .insert(module.to_owned());
        while let Some(dir) = parts.pop() {
            children
                .entry(parts.join("/"))
                .or_default()
                .insert(dir.to_owned());
        }
    }

    children
        .into_iter()
        .map(|(dir, modules)| {
            let key = if dir.is_empty() {
                INDEX_FILE.to_owned()
            } else {
                format!("{dir}/{INDEX_FILE}")
            };
            let mut text = format!("{GENERATED_MARKER}\n\n");
            for module in modules.iter().filter(|m| m.as_str() != "mod") {
                text.push_str(&format!("pub mod {module};\n"));
            }
            (key, text)
        })
        .collect()
}

/// Write unless the file already holds exactly `text`. Returns whether it
/// wrote.
fn write_if_changed(path: &Path, text: &str) -> Result<bool, ForgeError> {
    match fs::read_to_string(path) {
        Ok(current) if current == text => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {}
        Err(e) => return Err(ForgeError::io("cannot read", path, e))
    }
    write_atomic(path, text)?;
    Ok(true)
}

fn write_atomic(path: &Path, text: &str) -> Result<(), ForgeError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| ForgeError::io("cannot create", dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| ForgeError::io("cannot create a file in", dir, e))?;
    temp.write_all(text.as_bytes())
        .map_err(|e| ForgeError::io("cannot write", temp.path().to_path_buf(), e))?;
    temp.persist(path)
        .map_err(|e| ForgeError::io("cannot replace", path, e.error))?;
    tracing::debug!(path = %path.display(), "written");
    Ok(())
}

/// Delete a stale file and the directories it leaves empty. Returns whether
/// the file existed.
fn remove_file(out_dir: &Path, key: &str) -> Result<bool, ForgeError> {
    let path = out_dir.join(key);
    match fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(ForgeError::io("cannot remove", path, e))
    }
    tracing::debug!(path = %path.display(), "removed stale file");

    let mut dir = path.parent();
    while let Some(current) = dir {
        if current == out_dir || fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
    Ok(true)
}
