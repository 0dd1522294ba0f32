// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Query Execution Engine
//!
//! Single entry point for callers: submit a query, wait for it, collect
//! its rows. Flow: submit → await completion → paginate → typed rows.

use bda_client::QueryService;
use bda_common::{CoercionMode, Config, DatabaseBindings, PollConfig, QueryHandle, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::paginator::ResultPaginator;
use crate::poller::CompletionPoller;
use crate::result::ResultRow;
use crate::submitter::QuerySubmitter;

/// Tunables applied to every execution
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub poll: PollConfig,
    pub coercion: CoercionMode,
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll: config.poll.clone(),
            coercion: config.coercion,
        }
    }
}

/// Composes submission, polling and pagination.
///
/// Holds only immutable settings and a shared service client, so one engine
/// can serve concurrent executions.
#[derive(Clone)]
pub struct QueryEngine {
    submitter: QuerySubmitter,
    poller: CompletionPoller,
    paginator: ResultPaginator,
}

impl QueryEngine {
    pub fn new(
        service: Arc<dyn QueryService>,
        bindings: DatabaseBindings,
        options: EngineOptions,
    ) -> Result<Self> {
        Ok(Self {
            submitter: QuerySubmitter::new(service.clone(), Arc::new(bindings)),
            poller: CompletionPoller::new(service.clone(), options.poll)?,
            paginator: ResultPaginator::new(service, options.coercion),
        })
    }

    pub fn from_config(service: Arc<dyn QueryService>, config: &Config) -> Result<Self> {
        config.validate()?;
        Self::new(
            service,
            config.bindings()?,
            EngineOptions::from_config(config),
        )
    }

    pub fn bindings(&self) -> &DatabaseBindings {
        self.submitter.bindings()
    }

    /// Submit `sql` against a logical database without waiting for it
    pub async fn submit(&self, logical_db: &str, sql: &str) -> Result<QueryHandle> {
        self.submit_with_cancel(logical_db, sql, &CancellationToken::new())
            .await
    }

    pub async fn submit_with_cancel(
        &self,
        logical_db: &str,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryHandle> {
        log::debug!("Submitting to {}: {}", logical_db, sql.trim());
        self.submitter.submit(logical_db, sql, cancel).await
    }

    /// Wait for a submitted query and return all of its rows
    pub async fn fetch(&self, handle: &QueryHandle) -> Result<Vec<ResultRow>> {
        self.fetch_with_cancel(handle, &CancellationToken::new()).await
    }

    pub async fn fetch_with_cancel(
        &self,
        handle: &QueryHandle,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRow>> {
        self.poller.await_completion(handle, cancel).await?;
        self.paginator.collect_rows(handle, cancel).await
    }

    /// Submit, wait and collect in one call
    pub async fn execute(&self, logical_db: &str, sql: &str) -> Result<Vec<ResultRow>> {
        self.execute_with_cancel(logical_db, sql, &CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancel(
        &self,
        logical_db: &str,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRow>> {
        let started = Instant::now();
        log::info!("Executing on {}: {}", logical_db, sql.trim());

        let handle = self.submit_with_cancel(logical_db, sql, cancel).await?;
        let result = self.fetch_with_cancel(&handle, cancel).await;

        match &result {
            Ok(rows) => log::info!(
                "Query {} completed with {} rows in {:?}",
                handle,
                rows.len(),
                started.elapsed()
            ),
            Err(e) => log::error!("Query {} failed: {}", handle, e),
        }
        result
    }
}
