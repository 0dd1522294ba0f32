// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Query Execution Engine
//!
//! Submits SQL to a remote query service, waits for completion and turns
//! the paginated textual results into typed rows.

pub mod coerce;
pub mod decoder;
pub mod engine;
pub mod paginator;
pub mod poller;
pub mod result;
pub mod submitter;

pub use coerce::ColumnType;
pub use decoder::{decode_row, RowDecoder};
pub use engine::{EngineOptions, QueryEngine};
pub use paginator::ResultPaginator;
pub use poller::CompletionPoller;
pub use result::{ResultRow, Value};
pub use submitter::QuerySubmitter;
