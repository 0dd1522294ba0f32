// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Common foundations for the BDA query client
//!
//! This crate provides:
//! - Error types and result handling
//! - Configuration management
//! - Logical database bindings
//! - Types exchanged with the query service

pub mod error;
pub mod config;
pub mod binding;
pub mod types;

pub use error::{BdaError, Result};
pub use config::{CoercionMode, Config, PollConfig, StoreBackend, StoreConfig};
pub use binding::{DatabaseBinding, DatabaseBindings};
pub use types::{ColumnDescriptor, QueryHandle, QueryState, RawRow, ResultPage};
