// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Predicate composition for generated filters.
//!
//! A generated `{Entity}Filter` turns its populated fields into a
//! [`Predicate`] tree through the entity's [`Metamodel`] root path. Storage
//! backends translate the tree into their own query language, or evaluate it
//! in memory with [`Predicate::matches`].
//!
//! ```text
//! QBook::root()                     Path []
//!   .get("author").get("id")        Path [author, id]
//!   .is_in([1, 2])                  Predicate::In
//!
//! QBook::root()
//!   .get("tags").any().get("id")    Path [tags, *, id]
//!   .is_in([7])                     matches when any tag has id 7
//! ```
//!
//! # Example
//!
//! ```rust
//! use entity_forge_core::predicate::{Path, PredicateBuilder};
//!
//! let root = Path::root();
//! let mut builder = PredicateBuilder::new();
//! builder.and(root.get("title").contains("rust"));
//! builder.and(root.get("published").eq(true));
//!
//! let predicate = builder.build();
//! assert_eq!(predicate.to_string(), "title contains \"rust\" and published = true");
//! ```

use std::{collections::BTreeMap, fmt};

use async_trait::async_trait;

use crate::{Entity, Page, Pagination, Repository};

/// Scalar or structured value compared by predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer in `i64` range.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered collection.
    List(Vec<Value>),
    /// Named fields of a nested record.
    Record(BTreeMap<String, Value>)
}

impl Value {
    fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::UInt(a), Self::UInt(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Self::UInt(a), Self::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::UInt(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::UInt(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! int_value {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

int_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// Values up to `i64::MAX` stay `Int` so equal numbers compare equal
/// whatever their source type.
impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

// Pointer-sized integers are at most 64 bits wide on every supported target.
impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::from(value as u64)
    }
}

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Named field.
    Field(String),
    /// Existential step over a collection.
    Any
}

/// Navigation from an entity root to a nested attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<Segment>
}

impl Path {
    /// Empty path addressing the entity itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Step into a named field.
    #[must_use]
    pub fn get(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(field.to_owned()));
        Self {
            segments
        }
    }

    /// Step into any element of a collection.
    #[must_use]
    pub fn any(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Any);
        Self {
            segments
        }
    }

    /// Segments of this path.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Equality test.
    pub fn eq(&self, value: impl Into<Value>) -> Predicate {
        Predicate::Eq {
            path:  self.clone(),
            value: value.into()
        }
    }

    /// Case-insensitive substring test on text.
    pub fn contains(&self, needle: impl Into<String>) -> Predicate {
        Predicate::Contains {
            path:   self.clone(),
            needle: needle.into()
        }
    }

    /// Greater-or-equal test.
    pub fn ge(&self, value: impl Into<Value>) -> Predicate {
        Predicate::Ge {
            path:  self.clone(),
            value: value.into()
        }
    }

    /// Less-or-equal test.
    pub fn le(&self, value: impl Into<Value>) -> Predicate {
        Predicate::Le {
            path:  self.clone(),
            value: value.into()
        }
    }

    /// Membership test.
    pub fn is_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Predicate {
        Predicate::In {
            path:   self.clone(),
            values: values.into_iter().map(Into::into).collect()
        }
    }

    fn resolve<'v>(&self, value: &'v Value) -> Vec<&'v Value> {
        let mut current = vec![value];
        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match (segment, value) {
                    (Segment::Field(name), Value::Record(fields)) => {
                        if let Some(found) = fields.get(name) {
                            next.push(found);
                        }
                    }
                    (Segment::Any, Value::List(items)) => next.extend(items.iter()),
                    _ => {}
                }
            }
            current = next;
        }
        current
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                Segment::Field(name) => f.write_str(name)?,
                Segment::Any => f.write_str("*")?
            }
        }
        Ok(())
    }
}

/// Composable boolean condition over entity attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Always true; the empty filter.
    True,
    /// `path = value`.
    Eq {
        /// Attribute path.
        path:  Path,
        /// Expected value.
        value: Value
    },
    /// Case-insensitive substring match.
    Contains {
        /// Attribute path.
        path:   Path,
        /// Substring to find.
        needle: String
    },
    /// `path >= value`.
    Ge {
        /// Attribute path.
        path:  Path,
        /// Lower bound.
        value: Value
    },
    /// `path <= value`.
    Le {
        /// Attribute path.
        path:  Path,
        /// Upper bound.
        value: Value
    },
    /// `path in (values)`.
    In {
        /// Attribute path.
        path:   Path,
        /// Accepted values.
        values: Vec<Value>
    },
    /// All clauses hold.
    And(Vec<Predicate>),
    /// At least one clause holds.
    Or(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>)
}

impl Predicate {
    /// Conjunction, flattening nested `And` and dropping `True`.
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Self::True, p) | (p, Self::True) => p,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), p) => {
                left.push(p);
                Self::And(left)
            }
            (p, Self::And(mut right)) => {
                right.insert(0, p);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right])
        }
    }

    /// Disjunction.
    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Self::Or(mut left), p) => {
                left.push(p);
                Self::Or(left)
            }
            (left, right) => Self::Or(vec![left, right])
        }
    }

    /// Negation.
    #[must_use]
    pub fn negate(self) -> Predicate {
        Self::Not(Box::new(self))
    }

    /// Check whether this predicate accepts everything.
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Evaluate against a record value.
    ///
    /// Paths containing [`Segment::Any`] hold when at least one reached
    /// element satisfies the test.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Self::True => true,
            Self::Eq {
                path,
                value
            } => path.resolve(record).into_iter().any(|v| v == value),
            Self::Contains {
                path,
                needle
            } => {
                let needle = needle.to_lowercase();
                path.resolve(record).into_iter().any(|v| match v {
                    Value::Text(text) => text.to_lowercase().contains(&needle),
                    _ => false
                })
            }
            Self::Ge {
                path,
                value
            } => path
                .resolve(record)
                .into_iter()
                .any(|v| v.compare(value).is_some_and(|o| o.is_ge())),
            Self::Le {
                path,
                value
            } => path
                .resolve(record)
                .into_iter()
                .any(|v| v.compare(value).is_some_and(|o| o.is_le())),
            Self::In {
                path,
                values
            } => path
                .resolve(record)
                .into_iter()
                .any(|v| values.contains(v)),
            Self::And(clauses) => clauses.iter().all(|p| p.matches(record)),
            Self::Or(clauses) => clauses.iter().any(|p| p.matches(record)),
            Self::Not(inner) => !inner.matches(record)
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::Eq {
                path,
                value
            } => write!(f, "{path} = {value}"),
            Self::Contains {
                path,
                needle
            } => write!(f, "{path} contains {needle:?}"),
            Self::Ge {
                path,
                value
            } => write!(f, "{path} >= {value}"),
            Self::Le {
                path,
                value
            } => write!(f, "{path} <= {value}"),
            Self::In {
                path,
                values
            } => write!(f, "{path} in {}", Value::List(values.clone())),
            Self::And(clauses) => join(f, clauses, " and "),
            Self::Or(clauses) => {
                f.write_str("(")?;
                join(f, clauses, " or ")?;
                f.write_str(")")
            }
            Self::Not(inner) => write!(f, "not ({inner})")
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, clauses: &[Predicate], sep: &str) -> fmt::Result {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{clause}")?;
    }
    Ok(())
}

/// Accumulates clauses into a conjunction.
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    clauses: Vec<Predicate>
}

impl PredicateBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause.
    pub fn and(&mut self, predicate: Predicate) -> &mut Self {
        if !predicate.is_true() {
            self.clauses.push(predicate);
        }
        self
    }

    /// Finish: `True` when empty, the clause itself when single.
    pub fn build(self) -> Predicate {
        let mut clauses = self.clauses;
        match clauses.len() {
            0 => Predicate::True,
            1 => clauses.remove(0),
            _ => Predicate::And(clauses)
        }
    }
}

/// Query metamodel of an entity.
///
/// Implemented by the host (or its metamodel generator) for the `Q{Entity}`
/// type a generated filter composes through.
pub trait Metamodel {
    /// Simple name of the described entity.
    const ENTITY: &'static str;

    /// Root path of the entity.
    fn root() -> Path {
        Path::root()
    }
}

/// Converts a filter into a predicate.
pub trait ToPredicate {
    /// Build the predicate for the populated criteria.
    fn to_predicate(&self) -> Predicate;
}

/// Repositories able to evaluate predicates.
#[async_trait]
pub trait PredicateExecutor<E: Entity>: Repository<E> {
    /// One page of entities matching `predicate`.
    async fn find_matching(
        &self,
        predicate: Predicate,
        page: Pagination
    ) -> Result<Page<E>, Self::Error>;

    /// Number of entities matching `predicate`.
    async fn count_matching(&self, predicate: Predicate) -> Result<u64, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Value {
        let mut author = BTreeMap::new();
        author.insert("id".to_owned(), Value::Int(3));

        let tags = Value::List(
            [7, 9]
                .into_iter()
                .map(|id| {
                    let mut tag = BTreeMap::new();
                    tag.insert("id".to_owned(), Value::Int(id));
                    Value::Record(tag)
                })
                .collect()
        );

        let mut fields = BTreeMap::new();
        fields.insert("title".to_owned(), Value::from("The Rust Book"));
        fields.insert("published".to_owned(), Value::Bool(true));
        fields.insert("pages".to_owned(), Value::Int(550));
        fields.insert("author".to_owned(), Value::Record(author));
        fields.insert("tags".to_owned(), tags);
        Value::Record(fields)
    }

    #[test]
    fn empty_builder_is_true() {
        assert!(PredicateBuilder::new().build().is_true());
    }

    #[test]
    fn single_clause_is_not_wrapped() {
        let mut builder = PredicateBuilder::new();
        builder.and(Path::root().get("pages").ge(10));
        assert!(matches!(builder.build(), Predicate::Ge { .. }));
    }

    #[test]
    fn and_flattens_and_drops_true() {
        let root = Path::root();
        let p = Predicate::True
            .and(root.get("a").eq(1))
            .and(root.get("b").eq(2))
            .and(Predicate::True);
        match p {
            Predicate::And(clauses) => assert_eq!(clauses.len(), 2),
            other => panic!("unexpected {other:?}")
        }
    }

    #[test]
    fn contains_ignores_case() {
        assert!(Path::root().get("title").contains("rust").matches(&book()));
        assert!(!Path::root().get("title").contains("go").matches(&book()));
    }

    #[test]
    fn nested_id_in() {
        let p = Path::root().get("author").get("id").is_in([1, 3]);
        assert!(p.matches(&book()));
    }

    #[test]
    fn any_step_is_existential() {
        let root = Path::root().get("tags").any().get("id");
        assert!(root.is_in([9]).matches(&book()));
        assert!(!root.is_in([8]).matches(&book()));
    }

    #[test]
    fn range_bounds() {
        let pages = Path::root().get("pages");
        assert!(pages.ge(500).and(pages.le(600)).matches(&book()));
        assert!(!pages.ge(600).matches(&book()));
    }

    #[test]
    fn missing_field_does_not_match() {
        assert!(!Path::root().get("isbn").eq("x").matches(&book()));
        assert!(Path::root().get("isbn").eq("x").negate().matches(&book()));
    }

    #[test]
    fn display_paths() {
        let p = Path::root().get("tags").any().get("id").is_in([1, 2]);
        assert_eq!(p.to_string(), "tags.*.id in (1, 2)");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn large_unsigned_values_stay_exact() {
        let big = u64::MAX - 1;
        assert_eq!(Value::from(big), Value::UInt(big));
        assert_eq!(Value::from(42_u64), Value::Int(42));
        assert_eq!(Value::from(-3_isize), Value::Int(-3));

        let mut fields = BTreeMap::new();
        fields.insert("serial".to_owned(), Value::from(big));
        let record = Value::Record(fields);

        let serial = Path::root().get("serial");
        assert!(serial.eq(big).matches(&record));
        assert!(!serial.eq(u64::MAX).matches(&record));
        assert!(serial.ge(i64::MAX).matches(&record));
        assert!(serial.le(u64::MAX).matches(&record));
        assert_eq!(serial.eq(big).to_string(), format!("serial = {big}"));
    }

    #[test]
    fn option_value_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_owned()));
    }
}
