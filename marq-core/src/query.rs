//! Typed query AST.
//!
//! Stores receive a [`Query`] value instead of an opaque filter document:
//! `any_of` conditions are OR'd together, then AND'd with every `all_of`
//! condition. Null semantics follow the document-store convention the
//! content modules were written against: `IsNull` matches absent fields as
//! well as explicit nulls, and `Ne` matches documents that lack the field.

use serde_json::Value;

/// One filter condition on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive regex match over a string-valued field.
    /// `pattern` is a plain regex body; stores apply it case-insensitively.
    Regex { field: String, pattern: String },
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    /// Field is JSON null or absent.
    IsNull { field: String },
}

impl Condition {
    pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Condition::Regex {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Condition::IsNull {
            field: field.into(),
        }
    }
}

/// A per-collection filter query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// OR'd together. Empty means "match everything" (subject to `all_of`).
    pub any_of: Vec<Condition>,
    /// AND'd with the `any_of` disjunction.
    pub all_of: Vec<Condition>,
    /// Reference field to embed on returned documents.
    pub populate: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match everything in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn any_of(mut self, conditions: Vec<Condition>) -> Self {
        self.any_of = conditions;
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.all_of.push(condition);
        self
    }

    pub fn populate(mut self, field: impl Into<String>) -> Self {
        self.populate = Some(field.into());
        self
    }

    /// Shorthand for an exact single-field match.
    pub fn by_field(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().filter(Condition::eq(field, value))
    }
}
