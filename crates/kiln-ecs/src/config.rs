//! World configuration.
//!
//! ```
//! use kiln_ecs::config::WorldConfig;
//!
//! let config = WorldConfig::from_json_str(r#"{ "entity_capacity": 4096 }"#).unwrap();
//! assert_eq!(config.entity_capacity, 4096);
//! assert_eq!(config.component_capacity, WorldConfig::default().component_capacity);
//! ```

use serde::{Deserialize, Serialize};

use crate::EcsError;

/// Sizing hints for a [`World`](crate::world::World).
///
/// Capacities are initial allocations only; every store grows on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Initial capacity of the entity registry.
    pub entity_capacity: usize,
    /// Initial capacity of each component store.
    pub component_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            component_capacity: 256,
        }
    }
}

impl WorldConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the JSON is malformed or the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self, EcsError> {
        let config: Self = serde_json::from_str(json).map_err(|e| EcsError::InvalidConfig {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every capacity is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), EcsError> {
        if self.entity_capacity == 0 {
            return Err(EcsError::InvalidConfig {
                details: "entity_capacity must be non-zero".to_owned(),
            });
        }
        if self.component_capacity == 0 {
            return Err(EcsError::InvalidConfig {
                details: "component_capacity must be non-zero".to_owned(),
            });
        }
        Ok(())
    }
}
