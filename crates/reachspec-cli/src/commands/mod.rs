// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! CLI command implementations.

pub mod check;
pub mod record;
pub mod score;

use camino::Utf8Path;
use ecow::EcoString;
use miette::{Context, IntoDiagnostic, Result};
use reachspec_core::config::TargetConfig;
use reachspec_core::introspection::{Introspector, TypeRegistry};
use reachspec_core::persist;
use reachspec_core::spec::ReachingSpec;
use std::fs;
use tracing::debug;

/// Configuration and introspector shared by every command.
#[derive(Debug)]
pub struct Session {
    pub config: TargetConfig,
    pub introspector: Introspector,
}

impl Session {
    /// Load the target configuration and the type registry.
    pub fn load(config: &Utf8Path, types: &Utf8Path) -> Result<Self> {
        let config = TargetConfig::from_file(config.as_std_path())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load target configuration '{config}'"))?;

        let json = fs::read_to_string(types)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read type registry '{types}'"))?;
        let registry = TypeRegistry::from_json(&json)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to parse type registry '{types}'"))?;
        debug!(types = registry.type_names().count(), "Loaded type registry");

        let markers = config
            .inference
            .mock_markers
            .iter()
            .map(|m| EcoString::from(m.as_str()));
        let introspector = Introspector::new(registry).with_mock_markers(markers);
        Ok(Self {
            config,
            introspector,
        })
    }

    /// Load a saved spec against this session's types.
    pub fn load_spec(&self, path: &Utf8Path) -> Result<ReachingSpec> {
        persist::load(path.as_std_path(), &self.introspector)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load spec '{path}'"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    pub const TYPES: &str = r#"[
        {"name": "com.acme.Currency", "kind": "enum"},
        {"name": "com.acme.Order", "methods": [
            {"name": "getId", "returns": "java.lang.String"},
            {"name": "getCurrency", "returns": "com.acme.Currency"},
            {"name": "getTotal", "returns": "long"},
            {"name": "isPaid", "returns": "boolean"}
        ]}
    ]"#;

    pub const CONFIG: &str = r#"
[target]
type = "com.acme.OrderService"
method = "process(com.acme.Order, java.lang.String)"
tests = ["checkoutTest"]
"#;

    /// A temporary directory holding `reachspec.toml` and `types.json`.
    pub struct Fixture {
        dir: TempDir,
        pub config: Utf8PathBuf,
        pub types: Utf8PathBuf,
    }

    impl Fixture {
        pub fn path(&self, name: &str) -> Utf8PathBuf {
            Utf8PathBuf::from_path_buf(self.dir.path().join(name)).unwrap()
        }

        pub fn write(&self, name: &str, content: &str) -> Utf8PathBuf {
            let path = self.path(name);
            fs::write(&path, content).unwrap();
            path
        }
    }

    pub fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let mut fixture = Fixture {
            dir,
            config: Utf8PathBuf::new(),
            types: Utf8PathBuf::new(),
        };
        fixture.config = fixture.write("reachspec.toml", CONFIG);
        fixture.types = fixture.write("types.json", TYPES);
        fixture
    }

    #[test]
    fn session_loads_config_and_types() {
        let fixture = fixture();
        let session = super::Session::load(&fixture.config, &fixture.types).unwrap();
        assert_eq!(session.config.target.type_name, "com.acme.OrderService");
        assert!(session.introspector.registry().is_enum("com.acme.Currency"));
    }

    #[test]
    fn session_reports_missing_registry() {
        let fixture = fixture();
        let missing = fixture.path("absent.json");
        let err = super::Session::load(&fixture.config, &missing).unwrap_err();
        assert!(format!("{err:?}").contains("Failed to read type registry"));
    }

    #[test]
    fn session_reports_malformed_config() {
        let fixture = fixture();
        let config = fixture.write("broken.toml", "[target]\ntype = \"X\"\n");
        let err = super::Session::load(&config, &fixture.types).unwrap_err();
        assert!(format!("{err:?}").contains("Failed to load target configuration"));
    }
}
