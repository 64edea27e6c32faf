// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Target configuration parsing and validation.
//!
//! **DDD Context:** Configuration
//!
//! Parses `reachspec.toml`, which names the target call site and tunes
//! inference. The configuration is read once at startup and passed by
//! reference to everything that needs it.
//!
//! ```toml
//! [target]
//! type = "com.acme.OrderService"
//! method = "process(com.acme.Order, java.lang.String)"
//! static = false
//! caller = "com.acme.Checkout:42"
//! tests = ["test0", "test1"]
//!
//! [inference]
//! max_depth = 2
//! max_string_length = 1000
//! nested_checks = true
//! ```

use crate::introspection::{DEFAULT_MOCK_MARKERS, canonical_name};
use ecow::EcoString;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default nesting cap for object-like inspector expansion.
pub const MAX_DEPTH: usize = 2;

/// Default longest string an inspector output may have to be recorded.
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1000;

/// Hard cap on recorded literal length, independent of configuration.
pub const MAX_LITERAL_LENGTH: usize = 32767;

/// Name used for constructors in method signatures.
pub const CONSTRUCTOR_NAME: &str = "<init>";

/// Failure loading the target configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target configuration '{}' not found", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read target configuration '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed target configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("target configuration is missing `{0}`")]
    MissingField(&'static str),

    #[error("invalid target configuration: {0}")]
    Invalid(String),
}

/// The full `reachspec.toml` document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetConfig {
    pub target: TargetSection,
    #[serde(default)]
    pub inference: InferenceOptions,
}

/// The `[target]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetSection {
    /// Declaring type of the target method.
    #[serde(rename = "type", default)]
    pub type_name: String,
    /// Target method signature, `name(param, ...)`.
    #[serde(default)]
    pub method: String,
    /// The target is a static method (no receiver at index 0).
    #[serde(rename = "static", default)]
    pub is_static: bool,
    /// Location of the call site that reaches the target, if known.
    #[serde(default)]
    pub caller: Option<String>,
    /// Test names; one reachability goal each.
    #[serde(default)]
    pub tests: Vec<String>,
}

/// The `[inference]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InferenceOptions {
    /// Nesting cap for object-like inspectors.
    pub max_depth: usize,
    /// Longest inspector output text that is recorded.
    pub max_string_length: usize,
    /// Record and compare object-like inspector outputs. Forced off for
    /// constructor targets.
    pub nested_checks: bool,
    /// Substrings identifying mock-framework proxy types.
    pub mock_markers: Vec<String>,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            nested_checks: true,
            mock_markers: DEFAULT_MOCK_MARKERS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

impl InferenceOptions {
    /// Returns true if a recorded text is short enough to keep.
    #[must_use]
    pub fn admits_length(&self, text: &str) -> bool {
        let length = text.chars().count();
        length <= self.max_string_length && length < MAX_LITERAL_LENGTH
    }
}

impl TargetConfig {
    /// Builds a configuration for an instance method with default options.
    pub fn new(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        let mut config = Self {
            target: TargetSection {
                type_name: type_name.into(),
                method: method.into(),
                is_static: false,
                caller: None,
                tests: Vec::new(),
            },
            inference: InferenceOptions::default(),
        };
        config.disable_nested_checks_for_constructor();
        config
    }

    /// Parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is absent, unreadable, malformed
    /// or incomplete.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), target = %config.target.type_name, "Loaded target configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is malformed or incomplete.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.validate()?;
        config.disable_nested_checks_for_constructor();
        Ok(config)
    }

    /// Checks required fields and option ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] or [`ConfigError::Invalid`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.type_name.trim().is_empty() {
            return Err(ConfigError::MissingField("target.type"));
        }
        if self.target.method.trim().is_empty() {
            return Err(ConfigError::MissingField("target.method"));
        }
        let signature = self.signature()?;
        if signature.is_constructor() && self.target.is_static {
            return Err(ConfigError::Invalid(
                "a constructor cannot be static".to_string(),
            ));
        }
        if self.inference.max_string_length == 0 {
            return Err(ConfigError::Invalid(
                "inference.max_string_length must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed target signature.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `target.method` is not `name(...)`.
    pub fn signature(&self) -> Result<MethodSignature, ConfigError> {
        MethodSignature::parse(&self.target.method).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "target.method `{}` is not of the form `name(param, ...)`",
                self.target.method
            ))
        })
    }

    /// Returns true if the target is a constructor.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.signature().is_ok_and(|s| s.is_constructor())
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.target.is_static
    }

    /// Constructor arguments are not expanded through object-like inspectors.
    fn disable_nested_checks_for_constructor(&mut self) {
        if self.inference.nested_checks && self.is_constructor() {
            debug!(method = %self.target.method, "Constructor target; nested checks disabled");
            self.inference.nested_checks = false;
        }
    }

    /// Declared parameter types of the target, canonicalized.
    #[must_use]
    pub fn declared_parameter_types(&self) -> Vec<EcoString> {
        self.signature().map(|s| s.params).unwrap_or_default()
    }

    /// Returns true if an entry event for `declaring_type` and `signature`
    /// is the configured target.
    #[must_use]
    pub fn matches(&self, declaring_type: &str, signature: &str) -> bool {
        if canonical_name(declaring_type) != canonical_name(&self.target.type_name) {
            return false;
        }
        match (MethodSignature::parse(signature), self.signature()) {
            (Some(observed), Ok(expected)) => observed == expected,
            _ => false,
        }
    }
}

/// A method name with its parameter types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: EcoString,
    pub params: Vec<EcoString>,
}

impl MethodSignature {
    /// Parses `name(type, ...)`. Whitespace is ignored and type names are
    /// folded onto their canonical spelling.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let open = text.find('(')?;
        let inner = text.get(open + 1..)?.strip_suffix(')')?;
        let name = text[..open].trim();
        if name.is_empty() || inner.contains('(') || inner.contains(')') {
            return None;
        }
        let params = inner
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| EcoString::from(canonical_name(p)))
            .collect();
        Some(Self {
            name: name.into(),
            params,
        })
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}
