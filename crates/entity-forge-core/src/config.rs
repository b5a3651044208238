// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Config sources and value coercion for generated binders.
//!
//! A binder generated for `#[config_binding(prefix = "app.mail")]` reads
//! dotted keys from any [`ConfigSource`] and coerces each raw
//! [`ConfigValue`] into the field type through [`Coerce`]:
//!
//! | Field type         | Accepted raw values                              |
//! |--------------------|--------------------------------------------------|
//! | `String`           | text, numbers, booleans                          |
//! | `bool`             | booleans, `true/false/yes/no/on/off/1/0` text    |
//! | integers           | integers in range, integral floats, numeric text |
//! | `f32` / `f64`      | numbers, numeric text                            |
//! | `Vec<T>`           | lists, comma separated text                      |
//!
//! # Example
//!
//! ```rust
//! use entity_forge_core::config::{MapSource, optional, or_default_str, required};
//!
//! let source: MapSource = [("app.mail.host", "smtp.local"), ("app.mail.port", "2525")]
//!     .into_iter()
//!     .collect();
//!
//! let host: String = required(&source, "app.mail.host").unwrap();
//! let port: u16 = or_default_str(&source, "app.mail.port", "25").unwrap();
//! let tls: Option<bool> = optional(&source, "app.mail.tls").unwrap();
//! assert_eq!((host.as_str(), port, tls), ("smtp.local", 2525, None));
//! ```

use std::collections::BTreeMap;

use crate::validate::Violations;

/// Raw value read from a config source.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Sequence.
    List(Vec<ConfigValue>)
}

impl ConfigValue {
    fn describe(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(v) => format!("boolean `{v}`"),
            Self::Int(v) => format!("integer `{v}`"),
            Self::Float(v) => format!("float `{v}`"),
            Self::Text(v) => format!("text {v:?}"),
            Self::List(items) => format!("list of {} items", items.len())
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Read access to flat, dotted config keys.
pub trait ConfigSource {
    /// Raw value under `key`, if present.
    fn value(&self, key: &str) -> Option<ConfigValue>;
}

impl<S: ConfigSource + ?Sized> ConfigSource for &S {
    fn value(&self, key: &str) -> Option<ConfigValue> {
        (**self).value(key)
    }
}

/// In-memory config source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSource {
    values: BTreeMap<String, ConfigValue>
}

impl MapSource {
    /// Empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigSource for MapSource {
    fn value(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (key, value) in iter {
            source.insert(key, value);
        }
        source
    }
}

/// YAML document flattened into dotted keys.
///
/// Nested mappings become `parent.child` keys; sequences stay lists.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YamlSource {
    inner: MapSource
}

#[cfg(feature = "yaml")]
impl YamlSource {
    /// Parse and flatten a YAML document.
    pub fn parse(text: &str) -> Result<Self, BindError> {
        let document: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| BindError::Document(e.to_string()))?;
        let mut inner = MapSource::new();
        flatten(String::new(), &document, &mut inner);
        Ok(Self {
            inner
        })
    }
}

#[cfg(feature = "yaml")]
impl ConfigSource for YamlSource {
    fn value(&self, key: &str) -> Option<ConfigValue> {
        self.inner.value(key)
    }
}

#[cfg(feature = "yaml")]
fn flatten(prefix: String, value: &serde_yaml::Value, out: &mut MapSource) {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Mapping(map) => {
            for (key, child) in map {
                let key = match key {
                    Yaml::String(s) => s.clone(),
                    other => yaml_scalar(other)
                        .map(|v| match v {
                            ConfigValue::Text(s) => s,
                            ConfigValue::Int(i) => i.to_string(),
                            ConfigValue::Float(f) => f.to_string(),
                            ConfigValue::Bool(b) => b.to_string(),
                            _ => String::new()
                        })
                        .unwrap_or_default()
                };
                let path = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
                flatten(path, child, out);
            }
        }
        other => {
            if !prefix.is_empty()
                && let Some(value) = yaml_scalar(other)
            {
                out.insert(prefix, value);
            }
        }
    }
}

#[cfg(feature = "yaml")]
fn yaml_scalar(value: &serde_yaml::Value) -> Option<ConfigValue> {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Some(ConfigValue::Null),
        Yaml::Bool(b) => Some(ConfigValue::Bool(*b)),
        Yaml::Number(n) => n
            .as_i64()
            .map(ConfigValue::Int)
            .or_else(|| n.as_f64().map(ConfigValue::Float)),
        Yaml::String(s) => Some(ConfigValue::Text(s.clone())),
        Yaml::Sequence(items) => Some(ConfigValue::List(
            items.iter().filter_map(yaml_scalar).collect()
        )),
        Yaml::Tagged(tagged) => yaml_scalar(&tagged.value),
        Yaml::Mapping(_) => None
    }
}

/// Failure to convert one raw value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoerceError {
    /// Raw value has an incompatible shape.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Target type name.
        expected: &'static str,
        /// Description of the raw value.
        found:    String
    },

    /// Raw value does not fit the target type.
    #[error("{found} is out of range for {expected}")]
    OutOfRange {
        /// Target type name.
        expected: &'static str,
        /// Description of the raw value.
        found:    String
    }
}

/// Failure to bind a config structure.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// Required key absent.
    #[error("missing required config key `{key}`")]
    Missing {
        /// Full dotted key.
        key: String
    },

    /// Value present but not convertible.
    #[error("config key `{key}`: {source}")]
    Coerce {
        /// Full dotted key.
        key:    String,
        /// Conversion failure.
        #[source]
        source: CoerceError
    },

    /// Bound values violate declared constraints.
    #[error(transparent)]
    Invalid(#[from] Violations),

    /// Source document could not be parsed.
    #[error("invalid config document: {0}")]
    Document(String)
}

/// Conversion from a raw config value.
pub trait Coerce: Sized {
    /// Name used in error messages.
    const TYPE_NAME: &'static str;

    /// Convert a raw value.
    fn coerce(value: &ConfigValue) -> Result<Self, CoerceError>;
}

fn mismatch<T: Coerce>(value: &ConfigValue) -> CoerceError {
    CoerceError::Mismatch {
        expected: T::TYPE_NAME,
        found:    value.describe()
    }
}

impl Coerce for String {
    const TYPE_NAME: &'static str = "text";

    fn coerce(value: &ConfigValue) -> Result<Self, CoerceError> {
        match value {
            ConfigValue::Text(s) => Ok(s.clone()),
            ConfigValue::Int(i) => Ok(i.to_string()),
            ConfigValue::Float(f) => Ok(f.to_string()),
            ConfigValue::Bool(b) => Ok(b.to_string()),
            other => Err(mismatch::<Self>(other))
        }
    }
}

impl Coerce for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn coerce(value: &ConfigValue) -> Result<Self, CoerceError> {
        match value {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::Int(0) => Ok(false),
            ConfigValue::Int(1) => Ok(true),
            ConfigValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(mismatch::<Self>(value))
            },
            other => Err(mismatch::<Self>(other))
        }
    }
}

macro_rules! coerce_int {
    ($($ty:ty),*) => {
        $(impl Coerce for $ty {
            const TYPE_NAME: &'static str = stringify!($ty);

            fn coerce(value: &ConfigValue) -> Result<Self, CoerceError> {
                let wide = match value {
                    ConfigValue::Int(i) => i128::from(*i),
                    ConfigValue::Float(f) if f.fract() == 0.0 && f.is_finite() => *f as i128,
                    ConfigValue::Text(s) => s
                        .trim()
                        .parse::<i128>()
                        .map_err(|_| mismatch::<Self>(value))?,
                    other => return Err(mismatch::<Self>(other))
                };
                <$ty>::try_from(wide).map_err(|_| CoerceError::OutOfRange {
                    expected: Self::TYPE_NAME,
                    found:    value.describe()
                })
            }
        })*
    };
}

coerce_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Coerce for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn coerce(value: &ConfigValue) -> Result<Self, CoerceError> {
        match value {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Int(i) => Ok(*i as f64),
            ConfigValue::Text(s) => s.trim().parse().map_err(|_| mismatch::<Self>(value)),
            other => Err(mismatch::<Self>(other))
        }
    }
}

impl Coerce for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn coerce(value: &ConfigValue) -> Result<Self, CoerceError> {
        f64::coerce(value).map(|f| f as f32)
    }
}

impl<T: Coerce> Coerce for Vec<T> {
    const TYPE_NAME: &'static str = "list";

    fn coerce(value: &ConfigValue) -> Result<Self, CoerceError> {
        match value {
            ConfigValue::List(items) => items.iter().map(T::coerce).collect(),
            ConfigValue::Text(s) if s.trim().is_empty() => Ok(Vec::new()),
            ConfigValue::Text(s) => s
                .split(',')
                .map(|part| T::coerce(&ConfigValue::Text(part.trim().to_owned())))
                .collect(),
            ConfigValue::Null => Ok(Vec::new()),
            single => Ok(vec![T::coerce(single)?])
        }
    }
}

fn coerce_at<T: Coerce>(key: &str, value: &ConfigValue) -> Result<T, BindError> {
    T::coerce(value).map_err(|source| BindError::Coerce {
        key: key.to_owned(),
        source
    })
}

/// Required key.
pub fn required<T: Coerce>(source: &impl ConfigSource, key: &str) -> Result<T, BindError> {
    match source.value(key) {
        None | Some(ConfigValue::Null) => Err(BindError::Missing {
            key: key.to_owned()
        }),
        Some(value) => coerce_at(key, &value)
    }
}

/// Optional key; absent and null are `None`.
pub fn optional<T: Coerce>(source: &impl ConfigSource, key: &str) -> Result<Option<T>, BindError> {
    match source.value(key) {
        None | Some(ConfigValue::Null) => Ok(None),
        Some(value) => coerce_at(key, &value).map(Some)
    }
}

/// Key with a textual default that is coerced like a configured value.
pub fn or_default_str<T: Coerce>(
    source: &impl ConfigSource,
    key: &str,
    default: &str
) -> Result<T, BindError> {
    match source.value(key) {
        None | Some(ConfigValue::Null) => coerce_at(key, &ConfigValue::Text(default.to_owned())),
        Some(value) => coerce_at(key, &value)
    }
}
