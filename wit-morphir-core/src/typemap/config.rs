//! User-supplied overrides for a binding's type mappings.
//!
//! The same shape is read from JSON here and from TOML by the CLI:
//!
//! ```toml
//! [[primitives]]
//! external = "u32"
//! morphir = "Morphir.SDK:Int:Int32"
//! priority = 100
//!
//! [[containers]]
//! external_pattern = "list"
//! morphir_pattern = "Morphir.SDK:Array:Array"
//! type_params = 1
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMappingConfig {
    #[serde(default)]
    pub primitives: Vec<PrimitiveOverride>,
    #[serde(default)]
    pub containers: Vec<ContainerOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveOverride {
    pub external: String,
    pub morphir: String,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOverride {
    pub external_pattern: String,
    pub morphir_pattern: String,
    /// `-1` for variadic containers.
    #[serde(default = "default_type_params")]
    pub type_params: i32,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_true() -> bool {
    true
}

fn default_type_params() -> i32 {
    1
}

impl TypeMappingConfig {
    pub fn from_json(text: &str) -> Result<TypeMappingConfig, CoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty() && self.containers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_defaults() {
        let config = TypeMappingConfig::from_json(
            r#"{"primitives": [{"external": "u32", "morphir": "Int64"}],
                "containers": [{"external_pattern": "tuple", "morphir_pattern": "tuple", "type_params": -1, "bidirectional": false}]}"#,
        )
        .expect("config");
        assert!(config.primitives[0].bidirectional);
        assert_eq!(config.primitives[0].priority, 0);
        assert_eq!(config.containers[0].type_params, -1);
        assert!(!config.containers[0].bidirectional);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = TypeMappingConfig::from_json("{\"primitives\": 3}").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
