// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Result pagination
//!
//! Pages are fetched one after another, following continuation tokens until
//! the service stops returning one. The first row of the first page echoes
//! the column names and is never decoded.

use bda_client::QueryService;
use bda_common::{BdaError, CoercionMode, QueryHandle, ResultPage, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::decoder::RowDecoder;
use crate::result::ResultRow;

/// Rows skipped at the start of the first page
const HEADER_ROWS: usize = 1;

#[derive(Clone)]
pub struct ResultPaginator {
    service: Arc<dyn QueryService>,
    mode: CoercionMode,
}

impl ResultPaginator {
    pub fn new(service: Arc<dyn QueryService>, mode: CoercionMode) -> Self {
        Self { service, mode }
    }

    /// Fetch and decode every result row of a finished query
    pub async fn collect_rows(
        &self,
        handle: &QueryHandle,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResultRow>> {
        let mut page = self.fetch_page(handle, None, cancel).await?;
        if page.columns.is_empty() {
            return Err(BdaError::EmptyMetadata(handle.to_string()));
        }

        // The first page's metadata describes the whole result set
        let decoder = RowDecoder::new(std::mem::take(&mut page.columns), self.mode);
        let mut rows = Vec::new();
        let mut skip = HEADER_ROWS;
        let mut pages = 1usize;

        loop {
            for raw in page.rows.iter().skip(skip) {
                rows.push(decoder.decode(raw)?);
            }
            skip = 0;

            let Some(token) = page.next_token.take() else {
                break;
            };
            page = self.fetch_page(handle, Some(&token), cancel).await?;
            pages += 1;
        }

        log::info!(
            "Collected {} rows in {} pages for query {}",
            rows.len(),
            pages,
            handle
        );
        Ok(rows)
    }

    async fn fetch_page(
        &self,
        handle: &QueryHandle,
        token: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ResultPage> {
        if cancel.is_cancelled() {
            return Err(BdaError::Cancelled(format!(
                "result collection for query {} was cancelled",
                handle
            )));
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(BdaError::Cancelled(format!(
                    "result collection for query {} was cancelled",
                    handle
                )));
            }
            page = self.service.get_result_page(handle, token) => page,
        };

        let page = fetched.map_err(|e| {
            BdaError::Pagination(format!(
                "query {} page {}: {}",
                handle,
                token.unwrap_or("<first>"),
                e.into_detail()
            ))
        })?;

        log::debug!(
            "Fetched {} rows for query {} (more: {})",
            page.rows.len(),
            handle,
            page.next_token.is_some()
        );
        Ok(page)
    }
}
