// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Query submission

use bda_client::QueryService;
use bda_common::{BdaError, DatabaseBindings, QueryHandle, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Resolves the logical database and hands the query to the service
#[derive(Clone)]
pub struct QuerySubmitter {
    service: Arc<dyn QueryService>,
    bindings: Arc<DatabaseBindings>,
}

impl QuerySubmitter {
    pub fn new(service: Arc<dyn QueryService>, bindings: Arc<DatabaseBindings>) -> Self {
        Self { service, bindings }
    }

    pub fn bindings(&self) -> &DatabaseBindings {
        &self.bindings
    }

    pub async fn submit(
        &self,
        logical_db: &str,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryHandle> {
        let binding = self.bindings.resolve(logical_db)?;

        if cancel.is_cancelled() {
            return Err(BdaError::Cancelled(format!(
                "submission to {} aborted",
                logical_db
            )));
        }

        // Not raced against cancellation: an abandoned submit would leave an
        // execution running that we hold no handle for.
        let handle = self
            .service
            .submit_query(&binding.database, sql, &binding.output_location)
            .await
            .map_err(|e| BdaError::Submission(e.into_detail()))?;

        log::info!(
            "Submitted query {} to database {} (logical {})",
            handle,
            binding.database,
            logical_db
        );
        Ok(handle)
    }
}
