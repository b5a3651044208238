// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Constraint checks used by generated services and config binders.
//!
//! Generated code collects every violation of an instance before failing, so
//! callers see all problems at once:
//!
//! ```rust
//! use entity_forge_core::validate::Violations;
//!
//! let mut violations = Violations::new();
//! violations.check_not_blank("title", "  ");
//! violations.check_min("pages", 0_u32, 1);
//! assert_eq!(violations.len(), 2);
//! assert!(violations.into_result().is_err());
//! ```

use std::fmt;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct Violation {
    /// Field or config key the constraint is declared on.
    pub field:   String,
    /// Human readable reason.
    pub message: String
}

/// All failed constraints of one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    items: Vec<Violation>
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (i, violation) in self.items.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl Violations {
    /// No violations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.items.push(Violation {
            field:   field.into(),
            message: message.into()
        });
    }

    /// Text must contain a non-whitespace character.
    pub fn check_not_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be blank");
        }
    }

    /// Text must have at least `min` characters.
    pub fn check_min_length(&mut self, field: &str, value: &str, min: usize) {
        let len = value.chars().count();
        if len < min {
            self.push(field, format!("length {len} is below the minimum of {min}"));
        }
    }

    /// Text must have at most `max` characters.
    pub fn check_max_length(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.push(field, format!("length {len} exceeds the maximum of {max}"));
        }
    }

    /// Number must be at least `min`.
    pub fn check_min<T: PartialOrd + fmt::Display>(&mut self, field: &str, value: T, min: T) {
        if value < min {
            self.push(field, format!("{value} is below the minimum of {min}"));
        }
    }

    /// Number must be at most `max`.
    pub fn check_max<T: PartialOrd + fmt::Display>(&mut self, field: &str, value: T, max: T) {
        if value > max {
            self.push(field, format!("{value} exceeds the maximum of {max}"));
        }
    }

    /// Recorded violations.
    #[must_use]
    pub fn items(&self) -> &[Violation] {
        &self.items
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check whether nothing was violated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}
