// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generator configuration.
//!
//! Loaded once per round from a YAML document (`entity-forge.yml` by
//! default) and never mutated afterwards. Every value is optional; blank
//! values count as unset.
//!
//! # Document
//!
//! ```yaml
//! output:
//!   dir: src/generated          # where the generated tree is written
//!   crate_path: crate::generated # where the host mounts it
//!
//! repository:                   # same keys for predicate_builder, service,
//!   enabled: true               # controller and config_binder
//!   module: repository
//!   naming: "{name}Repository"
//!   requires_any: [repository, service, controller, get_or_create]
//!
//! metamodel:
//!   naming: "Q{name}"
//!   module: crate::meta         # default: the entity's own module
//!   registered:
//!     crate::model::Book: crate::querydsl::BookPaths
//!
//! schema:
//!   directives: []              # extra or replacement directive specs
//! ```
//!
//! # Options
//!
//! `key=value` options (CLI `--option`) fill values the document leaves
//! unset; the document wins when both are present.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf}
};

use serde::{Deserialize, Serialize};

use crate::{
    error::ForgeError,
    naming::QualifiedName,
    plan::ArtifactKind,
    schema::{Capability, DirectiveSpec, MetadataSchema}
};

/// Default configuration file name.
pub const DEFAULT_FILE: &str = "entity-forge.yml";

/// Output location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    /// Directory of the generated tree.
    pub dir:        Option<PathBuf>,
    /// Rust path where the host mounts the generated tree.
    pub crate_path: Option<String>
}

/// Settings of one artifact kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactSettings {
    /// Whether the kind is generated at all.
    pub enabled:      Option<bool>,
    /// Module (directory) below the output root.
    pub module:       Option<String>,
    /// Type name template with a `{name}` placeholder.
    pub naming:       Option<String>,
    /// Applicability: the entity needs any of these capabilities.
    pub requires_any: Option<Vec<Capability>>
}

/// Query metamodel lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetamodelSettings {
    /// Type name template, default `Q{name}`.
    pub naming:     Option<String>,
    /// Module holding metamodels; default is the entity's module.
    pub module:     Option<String>,
    /// Explicit entity to metamodel registrations.
    pub registered: BTreeMap<QualifiedName, QualifiedName>
}

/// Directive vocabulary additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaSettings {
    /// Extra directives; same-named built-ins are replaced.
    pub directives: Vec<DirectiveSpec>
}

/// Complete generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
    /// Output location.
    pub output:            OutputSettings,
    /// Repository artifacts.
    pub repository:        ArtifactSettings,
    /// Predicate builder (filter) artifacts.
    #[serde(alias = "filter")]
    pub predicate_builder: ArtifactSettings,
    /// Service artifacts.
    pub service:           ArtifactSettings,
    /// Controller artifacts.
    pub controller:        ArtifactSettings,
    /// Config binder artifacts.
    pub config_binder:     ArtifactSettings,
    /// Metamodel lookup.
    pub metamodel:         MetamodelSettings,
    /// Directive vocabulary additions.
    pub schema:            SchemaSettings
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn fill(slot: &mut Option<String>, value: &str) {
    if non_blank(slot).is_none() {
        *slot = Some(value.to_owned());
    }
}

impl ForgeConfig {
    /// Parse a YAML document.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self, ForgeError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ForgeError::Config {
            path: origin.to_path_buf(),
            source
        })
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ForgeError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ForgeError::io("cannot read configuration", path, e))?;
        Self::from_yaml(&text, path)
    }

    /// Load a configuration file, or defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ForgeError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `key=value` options to values the document left unset.
    pub fn apply_options<S: AsRef<str>>(&mut self, options: &[S]) -> Result<(), ForgeError> {
        for option in options {
            let option = option.as_ref();
            let invalid = |reason: &str| ForgeError::Option {
                option: option.to_owned(),
                reason: reason.to_owned()
            };

            let (key, value) = option
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| invalid("expected key=value"))?;
            let (section, field) = key
                .split_once('.')
                .ok_or_else(|| invalid("expected a dotted key such as service.module"))?;

            match (section, field) {
                ("output", "dir") => {
                    if self.output.dir.is_none() {
                        self.output.dir = Some(PathBuf::from(value));
                    }
                }
                ("output", "crate_path") => fill(&mut self.output.crate_path, value),
                ("metamodel", "naming") => fill(&mut self.metamodel.naming, value),
                ("metamodel", "module") => fill(&mut self.metamodel.module, value),
                _ => {
                    let kind = ArtifactKind::parse(section)
                        .ok_or_else(|| invalid("unknown section"))?;
                    let settings = self.artifact_mut(kind);
                    match field {
                        "module" => fill(&mut settings.module, value),
                        "naming" => fill(&mut settings.naming, value),
                        "enabled" => {
                            let enabled = value
                                .parse::<bool>()
                                .map_err(|_| invalid("enabled expects true or false"))?;
                            if settings.enabled.is_none() {
                                settings.enabled = Some(enabled);
                            }
                        }
                        _ => return Err(invalid("unknown key"))
                    }
                }
            }
        }
        Ok(())
    }

    /// Settings of one artifact kind.
    #[must_use]
    pub fn artifact(&self, kind: ArtifactKind) -> &ArtifactSettings {
        match kind {
            ArtifactKind::Repository => &self.repository,
            ArtifactKind::PredicateBuilder => &self.predicate_builder,
            ArtifactKind::Service => &self.service,
            ArtifactKind::Controller => &self.controller,
            ArtifactKind::ConfigBinder => &self.config_binder
        }
    }

    fn artifact_mut(&mut self, kind: ArtifactKind) -> &mut ArtifactSettings {
        match kind {
            ArtifactKind::Repository => &mut self.repository,
            ArtifactKind::PredicateBuilder => &mut self.predicate_builder,
            ArtifactKind::Service => &mut self.service,
            ArtifactKind::Controller => &mut self.controller,
            ArtifactKind::ConfigBinder => &mut self.config_binder
        }
    }

    /// Whether a kind is generated.
    #[must_use]
    pub fn is_enabled(&self, kind: ArtifactKind) -> bool {
        self.artifact(kind).enabled.unwrap_or(true)
    }

    /// Module (directory) of a kind.
    #[must_use]
    pub fn module(&self, kind: ArtifactKind) -> String {
        non_blank(&self.artifact(kind).module)
            .unwrap_or(kind.default_module())
            .to_owned()
    }

    /// Naming template of a kind.
    #[must_use]
    pub fn naming(&self, kind: ArtifactKind) -> String {
        non_blank(&self.artifact(kind).naming)
            .unwrap_or(kind.default_naming())
            .to_owned()
    }

    /// Applicability capabilities of a kind.
    #[must_use]
    pub fn requires_any(&self, kind: ArtifactKind) -> Vec<Capability> {
        self.artifact(kind)
            .requires_any
            .clone()
            .unwrap_or_else(|| kind.default_requires().to_vec())
    }

    /// Output directory, relative to the working directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .dir
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("src/generated"))
    }

    /// Rust path of the mounted generated tree.
    #[must_use]
    pub fn crate_path(&self) -> String {
        non_blank(&self.output.crate_path)
            .unwrap_or("crate::generated")
            .to_owned()
    }

    /// Metamodel naming template.
    #[must_use]
    pub fn metamodel_naming(&self) -> String {
        non_blank(&self.metamodel.naming).unwrap_or("Q{name}").to_owned()
    }

    /// Metamodel module, if configured.
    #[must_use]
    pub fn metamodel_module(&self) -> Option<&str> {
        non_blank(&self.metamodel.module)
    }

    /// Standard schema extended with configured directives.
    #[must_use]
    pub fn schema(&self) -> MetadataSchema {
        MetadataSchema::standard().extended(self.schema.directives.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ForgeConfig {
        ForgeConfig::from_yaml(text, Path::new("entity-forge.yml")).unwrap()
    }

    #[test]
    fn empty_document_is_default() {
        let config = parse("");
        assert_eq!(config, ForgeConfig::default());
        assert_eq!(config.output_dir(), PathBuf::from("src/generated"));
        assert_eq!(config.crate_path(), "crate::generated");
        assert_eq!(config.module(ArtifactKind::PredicateBuilder), "filter");
        assert_eq!(config.naming(ArtifactKind::Service), "{name}Service");
        assert!(config.is_enabled(ArtifactKind::Controller));
    }

    #[test]
    fn filter_alias_and_disabled_kind() {
        let config = parse("filter:\n  enabled: false\n  module: query\n");
        assert!(!config.is_enabled(ArtifactKind::PredicateBuilder));
        assert_eq!(config.module(ArtifactKind::PredicateBuilder), "query");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ForgeConfig::from_yaml("repositry:\n  module: x\n", Path::new("f.yml"));
        assert!(matches!(err, Err(ForgeError::Config { .. })));
    }

    #[test]
    fn blank_values_fall_back() {
        let config = parse("service:\n  module: '  '\n");
        assert_eq!(config.module(ArtifactKind::Service), "service");
    }

    #[test]
    fn options_fill_unset_values_only() {
        let mut config = parse("service:\n  module: svc\n");
        config
            .apply_options(&[
                "service.module=other",
                "controller.module=web",
                "repository.enabled=false",
                "output.crate_path=crate::gen"
            ])
            .unwrap();
        assert_eq!(config.module(ArtifactKind::Service), "svc");
        assert_eq!(config.module(ArtifactKind::Controller), "web");
        assert!(!config.is_enabled(ArtifactKind::Repository));
        assert_eq!(config.crate_path(), "crate::gen");
    }

    #[test]
    fn malformed_options() {
        let mut config = ForgeConfig::default();
        assert!(config.apply_options(&["nokey"]).is_err());
        assert!(config.apply_options(&["bogus.module=x"]).is_err());
        assert!(config.apply_options(&["service.colour=x"]).is_err());
        assert!(config.apply_options(&["service.enabled=maybe"]).is_err());
    }

    #[test]
    fn requires_any_override() {
        let config = parse("controller:\n  requires_any: [repository]\n");
        assert_eq!(
            config.requires_any(ArtifactKind::Controller),
            vec![Capability::Repository]
        );
    }

    #[test]
    fn registered_metamodels() {
        let config = parse("metamodel:\n  registered:\n    crate::Book: crate::meta::BookPaths\n");
        assert_eq!(
            config.metamodel.registered[&QualifiedName::new("crate::Book")].as_str(),
            "crate::meta::BookPaths"
        );
    }

    #[test]
    fn configured_directives_extend_schema() {
        let config = parse("schema:\n  directives:\n    - name: crud\n      targets: [struct]\n      grants: [repository, controller]\n");
        assert!(config.schema().directive("crud").is_some());
    }
}
