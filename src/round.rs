// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation rounds.
//!
//! A [`Round`] is the complete input of one generator invocation: the source
//! files, the configuration and the directive vocabulary. It is an explicit
//! value passed through the pipeline; nothing about a round lives in global
//! state, so two rounds can run side by side in one process.
//!
//! # Module Paths
//!
//! Source files are mapped to Rust module paths the way rustc resolves
//! `mod` declarations:
//!
//! ```text
//! src/lib.rs            crate
//! src/main.rs           crate
//! src/model.rs          crate::model
//! src/model/mod.rs      crate::model
//! src/model/book.rs     crate::model::book
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{config::ForgeConfig, error::ForgeError, schema::MetadataSchema};

/// One host source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path used in diagnostics.
    pub path:   PathBuf,
    /// Rust module path of the file, e.g. `crate::model`.
    pub module: String,
    /// File contents.
    pub text:   String
}

impl SourceFile {
    /// Source file with an explicit module path.
    pub fn new(path: impl Into<PathBuf>, module: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path:   path.into(),
            module: module.into(),
            text:   text.into()
        }
    }
}

/// Input of one generator invocation.
#[derive(Debug, Clone)]
pub struct Round {
    sources: Vec<SourceFile>,
    config:  ForgeConfig,
    schema:  MetadataSchema
}

impl Round {
    /// Round over explicit sources.
    ///
    /// Sources are sorted by path, so the order callers discover files in
    /// never influences the result.
    pub fn new(mut sources: Vec<SourceFile>, config: ForgeConfig) -> Self {
        sources.sort_by(|a, b| a.path.cmp(&b.path));
        let schema = config.schema();
        Self {
            sources,
            config,
            schema
        }
    }

    /// Round over every `.rs` file below `src_root`.
    ///
    /// The configured output directory is skipped when it lies inside
    /// `src_root`.
    pub fn discover(src_root: &Path, config: ForgeConfig) -> Result<Self, ForgeError> {
        let skipped = nested_output(src_root, &config.output_dir());
        let mut sources = Vec::new();

        let walker = WalkDir::new(src_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                skipped.as_deref().is_none_or(|skipped| {
                    entry.path().strip_prefix(src_root).map_or(true, |rel| rel != skipped)
                })
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file()
                || entry.path().extension().is_none_or(|ext| ext != "rs")
            {
                continue;
            }

            let relative = entry.path().strip_prefix(src_root).unwrap_or(entry.path());
            let Some(module) = module_path(relative) else {
                continue;
            };
            let text = std::fs::read_to_string(entry.path())
                .map_err(|e| ForgeError::io("cannot read source", entry.path(), e))?;
            sources.push(SourceFile::new(entry.path(), module, text));
        }

        tracing::info!(root = %src_root.display(), files = sources.len(), "sources discovered");
        Ok(Self::new(sources, config))
    }

    /// Source files, sorted by path.
    #[must_use]
    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Directive vocabulary.
    #[must_use]
    pub fn schema(&self) -> &MetadataSchema {
        &self.schema
    }
}

/// Output directory relative to `src_root`, when it lies inside it.
///
/// Both paths are canonicalized, so `./src`, absolute roots and `..`
/// segments all match. A missing output directory has nothing to skip.
fn nested_output(src_root: &Path, output: &Path) -> Option<PathBuf> {
    let root = std::fs::canonicalize(src_root).ok()?;
    let output = std::fs::canonicalize(output).ok()?;
    output.strip_prefix(&root).ok().map(Path::to_path_buf)
}

/// Module path of a file relative to the crate source root.
///
/// Returns `None` for paths that are not valid module files.
pub fn module_path(relative: &Path) -> Option<String> {
    let mut segments = vec!["crate".to_owned()];
    let components: Vec<String> = relative
        .iter()
        .map(|c| c.to_string_lossy().into_owned())
        .collect();
    let (file, dirs) = components.split_last()?;
    let stem = file.strip_suffix(".rs")?;

    segments.extend(dirs.iter().cloned());
    let is_root = dirs.is_empty() && (stem == "lib" || stem == "main");
    if !is_root && stem != "mod" {
        segments.push(stem.to_owned());
    }

    segments
        .iter()
        .all(|s| syn::parse_str::<syn::Ident>(s).is_ok() || s == "crate")
        .then(|| segments.join("::"))
}
