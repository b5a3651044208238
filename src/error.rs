// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Infrastructure errors.
//!
//! Problems with user metadata are never errors of this type; they are
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s collected per round. A
//! [`ForgeError`] means the round itself could not run or could not be
//! committed: unreadable sources, a malformed configuration document, an
//! unknown override key, or a failed write.

use std::path::PathBuf;

/// Failure outside the diagnostic model.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    /// Filesystem access failed.
    #[error("{action} `{}`: {source}", path.display())]
    Io {
        /// What was attempted.
        action: &'static str,
        /// Affected path.
        path:   PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error
    },

    /// Configuration document is not valid YAML or has unknown keys.
    #[error("invalid configuration `{}`: {source}", path.display())]
    Config {
        /// Configuration file.
        path:   PathBuf,
        /// Parse error.
        #[source]
        source: serde_yaml::Error
    },

    /// Option override is malformed or names an unknown key.
    #[error("invalid option `{option}`: {reason}")]
    Option {
        /// Raw option text.
        option: String,
        /// Why it was rejected.
        reason: String
    },

    /// Manifest of a previous round could not be read.
    #[error("corrupt manifest `{}`: {source}", path.display())]
    Manifest {
        /// Manifest file.
        path:   PathBuf,
        /// Parse error.
        #[source]
        source: serde_yaml::Error
    },

    /// Source directory walk failed.
    #[error("cannot walk sources: {0}")]
    Walk(#[from] walkdir::Error)
}

impl ForgeError {
    /// Wrap an I/O error with the attempted action and path.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_names_path() {
        let err = ForgeError::io(
            "cannot read",
            "src/lib.rs",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone")
        );
        assert_eq!(err.to_string(), "cannot read `src/lib.rs`: gone");
    }

    #[test]
    fn option_error_message() {
        let err = ForgeError::Option {
            option: "nope".to_owned(),
            reason: "expected key=value".to_owned()
        };
        assert_eq!(err.to_string(), "invalid option `nope`: expected key=value");
    }
}
