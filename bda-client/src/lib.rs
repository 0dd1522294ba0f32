// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Clients for the two remote capabilities BDA depends on
//!
//! The query service accepts SQL, runs it asynchronously and serves the
//! results page by page. The blob store holds raw objects addressed by
//! bucket and key. Both are traits so the engine can run against any
//! implementation, including the scripted [`MockQueryService`].

use async_trait::async_trait;
use bda_common::{QueryHandle, QueryState, ResultPage, Result};
use bytes::Bytes;

pub mod mock;
pub mod store;
pub mod transfer;

pub use mock::{MockQueryService, MockScript};
pub use store::ObjectStoreBlobStore;

/// Remote asynchronous query service.
///
/// Implementations report transport failures as
/// [`BdaError::Transport`](bda_common::BdaError::Transport); the engine
/// turns them into phase specific errors.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Start executing `sql` against `database`, writing results under `output_location`
    async fn submit_query(
        &self,
        database: &str,
        sql: &str,
        output_location: &str,
    ) -> Result<QueryHandle>;

    /// Current execution state
    async fn get_status(&self, handle: &QueryHandle) -> Result<QueryState>;

    /// Fetch one result page; `token` is the previous page's continuation token
    async fn get_result_page(
        &self,
        handle: &QueryHandle,
        token: Option<&str>,
    ) -> Result<ResultPage>;

    /// Ask the service to stop an execution
    async fn cancel_query(&self, handle: &QueryHandle) -> Result<()>;
}

/// Remote object store addressed by bucket and key
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a whole object, failing with `BlobNotFound` when absent
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes>;

    /// Create or replace an object
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<()>;
}
