// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Qualified names and naming conventions.
//!
//! # Conventions
//!
//! | Input             | Helper                     | Output            |
//! |-------------------|----------------------------|-------------------|
//! | `BookRepository`  | [`file_stem`]              | `book_repository` |
//! | `category`        | [`pluralize`]              | `categories`      |
//! | `BlogPost`        | [`collection_path`]        | `/blog-posts`     |
//! | `{name}Filter`    | [`render_template`]        | `BookFilter`      |

use std::fmt;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

/// Fully qualified Rust path of a declaration, e.g. `crate::model::Book`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Wrap a full path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Join a module path and a simple name.
    pub fn join(module: &str, name: &str) -> Self {
        if module.is_empty() {
            Self(name.to_owned())
        } else {
            Self(format!("{module}::{name}"))
        }
    }

    /// Full path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment.
    #[must_use]
    pub fn simple(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// Everything before the last segment.
    #[must_use]
    pub fn module(&self) -> &str {
        self.0.rsplit_once("::").map_or("", |(module, _)| module)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Replace `{name}` in a naming template.
pub fn render_template(template: &str, name: &str) -> String {
    template.replace("{name}", name)
}

/// Snake-case file stem of a type name.
pub fn file_stem(type_name: &str) -> String {
    type_name.to_case(Case::Snake)
}

/// English plural of a lowercase word.
pub fn pluralize(s: &str) -> String {
    if s.ends_with('s') || s.ends_with("sh") || s.ends_with("ch") || s.ends_with('x') {
        format!("{}es", s)
    } else if s.ends_with('y') && !s.ends_with("ay") && !s.ends_with("ey") && !s.ends_with("oy") {
        format!("{}ies", &s[..s.len() - 1])
    } else {
        format!("{}s", s)
    }
}

/// Default controller base path: `/` + pluralized kebab-case name.
pub fn collection_path(entity_name: &str) -> String {
    let kebab = entity_name.to_case(Case::Kebab);
    let (head, last) = kebab.rsplit_once('-').map_or(("", kebab.as_str()), |(h, l)| (h, l));
    if head.is_empty() {
        format!("/{}", pluralize(last))
    } else {
        format!("/{}-{}", head, pluralize(last))
    }
}

/// Normalize a user supplied path to start with a single `/`.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_parts() {
        let name = QualifiedName::new("crate::model::Book");
        assert_eq!(name.simple(), "Book");
        assert_eq!(name.module(), "crate::model");
        assert_eq!(QualifiedName::join("crate", "Tag").as_str(), "crate::Tag");
        assert_eq!(QualifiedName::new("Tag").module(), "");
    }

    #[test]
    fn pluralize_regular() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("post"), "posts");
    }

    #[test]
    fn pluralize_es() {
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("match"), "matches");
    }

    #[test]
    fn pluralize_ies() {
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("key"), "keys");
    }

    #[test]
    fn collection_paths() {
        assert_eq!(collection_path("Book"), "/books");
        assert_eq!(collection_path("BlogCategory"), "/blog-categories");
    }

    #[test]
    fn templates_and_stems() {
        assert_eq!(render_template("{name}Repository", "Book"), "BookRepository");
        assert_eq!(file_stem("BookRepository"), "book_repository");
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_path("reviews/"), "/reviews");
        assert_eq!(normalize_path("//a/b"), "/a/b");
        assert_eq!(normalize_path(" / "), "");
    }
}
