// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Logical database bindings
//!
//! A binding maps a friendly name used by callers to the physical database
//! known to the query service and to the location where the service writes
//! result files.

use crate::error::{BdaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One logical database entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseBinding {
    /// Logical name used by callers
    pub name: String,

    /// Physical database name on the query service
    pub database: String,

    /// URI where the service stores result files (e.g. `s3://results/`)
    pub output_location: String,

    /// Blob store prefix holding the source data of this database
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<String>,
}

impl DatabaseBinding {
    pub fn new(
        name: impl Into<String>,
        database: impl Into<String>,
        output_location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            database: database.into(),
            output_location: output_location.into(),
            source_location: None,
        }
    }

    pub fn with_source_location(mut self, location: impl Into<String>) -> Self {
        self.source_location = Some(location.into());
        self
    }
}

/// Immutable set of bindings keyed by logical name
#[derive(Debug, Clone, Default)]
pub struct DatabaseBindings {
    bindings: HashMap<String, DatabaseBinding>,
}

impl DatabaseBindings {
    /// Register all bindings; a repeated logical name is rejected
    pub fn new(bindings: impl IntoIterator<Item = DatabaseBinding>) -> Result<Self> {
        let mut map = HashMap::new();
        for binding in bindings {
            if binding.name.trim().is_empty() {
                return Err(BdaError::Configuration(
                    "database binding name cannot be empty".to_string(),
                ));
            }
            if map.contains_key(&binding.name) {
                return Err(BdaError::Configuration(format!(
                    "database binding {} is registered twice",
                    binding.name
                )));
            }
            map.insert(binding.name.clone(), binding);
        }
        Ok(Self { bindings: map })
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseBinding> {
        self.bindings.get(name)
    }

    /// Look up a binding, failing with a configuration error when absent
    pub fn resolve(&self, name: &str) -> Result<&DatabaseBinding> {
        if self.bindings.is_empty() {
            return Err(BdaError::Configuration(
                "no database bindings are configured".to_string(),
            ));
        }
        self.bindings.get(name).ok_or_else(|| {
            BdaError::Configuration(format!("no database binding named {}", name))
        })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart() -> DatabaseBinding {
        DatabaseBinding::new("cart", "cart", "s3://results/")
    }

    #[test]
    fn test_resolve_registered_binding() {
        let bindings = DatabaseBindings::new(vec![cart()]).unwrap();
        let binding = bindings.resolve("cart").unwrap();
        assert_eq!(binding.database, "cart");
        assert_eq!(binding.output_location, "s3://results/");
    }

    #[test]
    fn test_resolve_unknown_binding() {
        let bindings = DatabaseBindings::new(vec![cart()]).unwrap();
        let err = bindings.resolve("orders").unwrap_err();
        assert!(matches!(err, BdaError::Configuration(_)));
    }

    #[test]
    fn test_resolve_without_bindings() {
        let bindings = DatabaseBindings::default();
        assert!(matches!(
            bindings.resolve("cart"),
            Err(BdaError::Configuration(_))
        ));
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let result = DatabaseBindings::new(vec![cart(), cart()]);
        assert!(matches!(result, Err(BdaError::Configuration(_))));
    }

    #[test]
    fn test_names_sorted() {
        let bindings = DatabaseBindings::new(vec![
            DatabaseBinding::new("orders", "orders_db", "s3://results/orders/"),
            cart().with_source_location("tokopedia/cart/"),
        ])
        .unwrap();
        assert_eq!(bindings.names(), vec!["cart", "orders"]);
        assert_eq!(
            bindings.get("cart").unwrap().source_location.as_deref(),
            Some("tokopedia/cart/")
        );
    }
}
