// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Runtime values observed when a target method is entered.
//!
//! **DDD Context:** Observation
//!
//! The tracing layer hands the engine argument values it has no static schema
//! for. Scalars are carried inline; objects are reached only through the
//! [`Inspectable`] capability, which answers zero-argument inspector calls by
//! name.

use ecow::EcoString;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised while invoking an inspector on a live object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The object does not answer the requested inspector.
    #[error("`{type_name}` does not respond to `{method}`")]
    NotUnderstood {
        /// Runtime type of the receiver.
        type_name: EcoString,
        /// Inspector method name.
        method: EcoString,
    },

    /// The inspector ran but raised an error.
    #[error("`{method}` raised: {message}")]
    Raised {
        /// Inspector method name.
        method: EcoString,
        /// Message carried by the raised error.
        message: String,
    },

    /// The inspector did not return in time. The engine deactivates it for
    /// the receiver's type afterwards.
    #[error("`{method}` timed out")]
    Timeout {
        /// Inspector method name.
        method: EcoString,
    },
}

/// Capability to answer inspector calls on a live object.
pub trait Inspectable: fmt::Debug + Send + Sync {
    /// Runtime type name of the object.
    fn type_name(&self) -> &str;

    /// Invokes the zero-argument method `method` and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError`] when the call cannot be made or fails.
    fn invoke(&self, method: &str) -> Result<Value, InvokeError>;
}

/// Shared handle to a live object.
pub type ObjectRef = Arc<dyn Inspectable>;

/// A value of an enum type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Declared enum type name.
    pub type_name: EcoString,
    /// Variant (constant) name; this is the textual form compared by the engine.
    pub variant: EcoString,
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(EcoString),
    /// Raw bytes; decoded as ISO-8859-1 whenever a textual form is needed.
    Bytes(Vec<u8>),
    Chars(Vec<char>),
    Enum(EnumValue),
    Object(ObjectRef),
}

impl Value {
    /// Wraps an inspectable object.
    pub fn object(object: impl Inspectable + 'static) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Creates an enum value.
    pub fn enumeration(type_name: impl Into<EcoString>, variant: impl Into<EcoString>) -> Self {
        Self::Enum(EnumValue {
            type_name: type_name.into(),
            variant: variant.into(),
        })
    }

    /// Creates a text value.
    pub fn text(text: impl Into<EcoString>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for text, byte arrays and char arrays.
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Bytes(_) | Self::Chars(_))
    }

    /// Returns the normalized text of a string-like value.
    #[must_use]
    pub fn as_text(&self) -> Option<EcoString> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Bytes(bytes) => Some(decode_latin1(bytes)),
            Self::Chars(chars) => Some(chars.iter().collect::<String>().into()),
            _ => None,
        }
    }

    /// Returns the textual form of an enum constant.
    #[must_use]
    pub fn enum_text(&self) -> Option<EcoString> {
        match self {
            Self::Enum(value) => Some(value.variant.clone()),
            Self::Text(text) => Some(text.clone()),
            _ => None,
        }
    }

    /// Returns the runtime type name used for inspector lookup.
    ///
    /// `None` for null, which has no type.
    #[must_use]
    pub fn runtime_type(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some("Boolean"),
            Self::Int(_) => Some("Long"),
            Self::Float(_) => Some("Double"),
            Self::Char(_) => Some("Character"),
            Self::Text(_) => Some("String"),
            Self::Bytes(_) => Some("Bytes"),
            Self::Chars(_) => Some("Chars"),
            Self::Enum(value) => Some(value.type_name.as_str()),
            Self::Object(object) => Some(object.type_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Char(c) => write!(f, "'{c}'"),
            Self::Text(_) | Self::Bytes(_) | Self::Chars(_) => {
                write!(f, "{:?}", self.as_text().unwrap_or_default().as_str())
            }
            Self::Enum(value) => write!(f, "{}.{}", value.type_name, value.variant),
            Self::Object(object) => write!(f, "<{}>", object.type_name()),
        }
    }
}

/// Decodes bytes with the fixed ISO-8859-1 mapping (each byte is one char).
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> EcoString {
    bytes.iter().map(|&b| char::from(b)).collect::<String>().into()
}

/// A plain object whose inspector outputs are known up front.
///
/// This is how the CLI and tests describe object graphs: each entry maps an
/// inspector method name to the value it returns.
#[derive(Debug, Clone)]
pub struct Record {
    type_name: EcoString,
    outputs: HashMap<EcoString, Value>,
}

impl Record {
    /// Creates an empty record of the given runtime type.
    pub fn new(type_name: impl Into<EcoString>) -> Self {
        Self {
            type_name: type_name.into(),
            outputs: HashMap::new(),
        }
    }

    /// Builder-style variant of [`Record::insert`].
    #[must_use]
    pub fn with(mut self, method: impl Into<EcoString>, value: Value) -> Self {
        self.insert(method, value);
        self
    }

    /// Sets the value returned by `method`.
    pub fn insert(&mut self, method: impl Into<EcoString>, value: Value) {
        self.outputs.insert(method.into(), value);
    }

    /// Wraps the record as a [`Value::Object`].
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::object(self)
    }
}

impl Inspectable for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn invoke(&self, method: &str) -> Result<Value, InvokeError> {
        self.outputs
            .get(method)
            .cloned()
            .ok_or_else(|| InvokeError::NotUnderstood {
                type_name: self.type_name.clone(),
                method: method.into(),
            })
    }
}
