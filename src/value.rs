//! Dynamic row values and their kind tags.
//!
//! Rows are decoded into `serde_json::Map` (insertion ordered through the
//! `preserve_order` feature). Schema inference never inspects values directly;
//! it works on the closed [`ValueKind`] tag derived from each value.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// One decoded input document: field name to dynamic JSON value.
pub type Row = Map<String, Value>;

/// Closed tag over the variants a dynamic JSON value can take.
///
/// Numbers are split into [`ValueKind::Integer`] (fits in `i64`) and
/// [`ValueKind::Float`] (everything else).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
}

impl ValueKind {
    /// Every non-null kind, in tie-break order for dominant-kind selection.
    ///
    /// Kinds whose physical column type comes earlier in the physical type
    /// declaration order are listed first, so a tie always resolves the same way.
    pub const RANKED: [ValueKind; 6] = [
        ValueKind::String,
        ValueKind::Array,
        ValueKind::Object,
        ValueKind::Float,
        ValueKind::Integer,
        ValueKind::Boolean,
    ];

    /// Tag a dynamic value.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(n) if n.is_i64() => ValueKind::Integer,
            Value::Number(_) => ValueKind::Float,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Lowercase name used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
