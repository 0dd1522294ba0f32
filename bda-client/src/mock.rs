// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Mock Query Service for Testing
//!
//! Replays a scripted sequence of execution states and result pages so the
//! engine can be exercised without a real query service. It also records
//! every call for assertions and can inject transport failures.

use async_trait::async_trait;
use bda_common::{BdaError, QueryHandle, QueryState, ResultPage, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::QueryService;

/// What the mock answers, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockScript {
    /// States returned by successive status calls; the last one repeats.
    /// Empty means the query succeeds immediately.
    #[serde(default)]
    pub statuses: Vec<QueryState>,

    /// Result pages chained through their continuation tokens
    #[serde(default)]
    pub pages: Vec<ResultPage>,
}

/// One recorded `submit_query` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub database: String,
    pub sql: String,
    pub output_location: String,
    pub handle: QueryHandle,
}

#[derive(Debug, Default)]
struct MockState {
    status_cursor: usize,
    status_calls: usize,
    submissions: Vec<Submission>,
    page_requests: Vec<Option<String>>,
    cancelled: Vec<QueryHandle>,
    submit_failure: Option<String>,
    status_failure: Option<String>,
    page_failure: Option<(Option<String>, String)>,
}

/// Mock service that replays a [`MockScript`]
#[derive(Debug)]
pub struct MockQueryService {
    script: MockScript,
    state: Mutex<MockState>,
}

impl MockQueryService {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_statuses(statuses: Vec<QueryState>, pages: Vec<ResultPage>) -> Self {
        Self::new(MockScript { statuses, pages })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let script: MockScript = serde_json::from_str(&content)
            .map_err(|e| BdaError::Serialization(format!("{}: {}", path.display(), e)))?;
        Ok(Self::new(script))
    }

    /// Make every submission fail with a transport error
    pub fn fail_submit(&self, message: impl Into<String>) {
        self.state.lock().submit_failure = Some(message.into());
    }

    /// Make every status call fail with a transport error
    pub fn fail_status(&self, message: impl Into<String>) {
        self.state.lock().status_failure = Some(message.into());
    }

    /// Fail the page request made with `token` (`None` is the first page)
    pub fn fail_page(&self, token: Option<&str>, message: impl Into<String>) {
        self.state.lock().page_failure = Some((token.map(str::to_string), message.into()));
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().submissions.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().status_calls
    }

    /// Continuation tokens of all page requests, in request order
    pub fn page_requests(&self) -> Vec<Option<String>> {
        self.state.lock().page_requests.clone()
    }

    pub fn cancelled(&self) -> Vec<QueryHandle> {
        self.state.lock().cancelled.clone()
    }

    /// Total number of remote calls of any kind
    pub fn call_count(&self) -> usize {
        let state = self.state.lock();
        state.submissions.len() + state.status_calls + state.page_requests.len() + state.cancelled.len()
    }

    fn page_for(&self, token: Option<&str>) -> Result<ResultPage> {
        let Some(token) = token else {
            return Ok(self.script.pages.first().cloned().unwrap_or_default());
        };

        let previous = self
            .script
            .pages
            .iter()
            .position(|page| page.next_token.as_deref() == Some(token));

        match previous.and_then(|idx| self.script.pages.get(idx + 1)) {
            Some(page) => Ok(page.clone()),
            None => Err(BdaError::Transport(format!(
                "unknown continuation token {}",
                token
            ))),
        }
    }
}

impl Default for MockQueryService {
    fn default() -> Self {
        Self::new(MockScript::default())
    }
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn submit_query(
        &self,
        database: &str,
        sql: &str,
        output_location: &str,
    ) -> Result<QueryHandle> {
        let mut state = self.state.lock();
        if let Some(message) = &state.submit_failure {
            return Err(BdaError::Transport(message.clone()));
        }

        let handle = QueryHandle::new(Uuid::new_v4().to_string());
        state.submissions.push(Submission {
            database: database.to_string(),
            sql: sql.to_string(),
            output_location: output_location.to_string(),
            handle: handle.clone(),
        });
        Ok(handle)
    }

    async fn get_status(&self, _handle: &QueryHandle) -> Result<QueryState> {
        let mut state = self.state.lock();
        state.status_calls += 1;
        if let Some(message) = &state.status_failure {
            return Err(BdaError::Transport(message.clone()));
        }

        let Some(last) = self.script.statuses.len().checked_sub(1) else {
            return Ok(QueryState::Succeeded);
        };
        let current = self.script.statuses[state.status_cursor.min(last)];
        state.status_cursor += 1;
        Ok(current)
    }

    async fn get_result_page(
        &self,
        _handle: &QueryHandle,
        token: Option<&str>,
    ) -> Result<ResultPage> {
        {
            let mut state = self.state.lock();
            state.page_requests.push(token.map(str::to_string));
            if let Some((failing_token, message)) = &state.page_failure {
                if failing_token.as_deref() == token {
                    return Err(BdaError::Transport(message.clone()));
                }
            }
        }
        self.page_for(token)
    }

    async fn cancel_query(&self, handle: &QueryHandle) -> Result<()> {
        self.state.lock().cancelled.push(handle.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bda_common::{ColumnDescriptor, RawRow};

    fn pages() -> Vec<ResultPage> {
        let columns = vec![ColumnDescriptor::new("id", "integer")];
        vec![
            ResultPage::new(columns.clone(), vec![RawRow::from_texts(["id"]), RawRow::from_texts(["1"])])
                .with_next_token("p2"),
            ResultPage::new(columns, vec![RawRow::from_texts(["2"])]),
        ]
    }

    #[tokio::test]
    async fn test_submit_records_call() {
        let service = MockQueryService::default();
        let handle = service
            .submit_query("cart", "select 1", "s3://results/")
            .await
            .unwrap();

        let submissions = service.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].handle, handle);
        assert_eq!(submissions[0].database, "cart");
    }

    #[tokio::test]
    async fn test_status_sequence_repeats_last() {
        let service = MockQueryService::with_statuses(
            vec![QueryState::Queued, QueryState::Succeeded],
            Vec::new(),
        );
        let handle = QueryHandle::new("h");

        assert_eq!(service.get_status(&handle).await.unwrap(), QueryState::Queued);
        assert_eq!(service.get_status(&handle).await.unwrap(), QueryState::Succeeded);
        assert_eq!(service.get_status(&handle).await.unwrap(), QueryState::Succeeded);
        assert_eq!(service.status_calls(), 3);
    }

    #[tokio::test]
    async fn test_pages_follow_tokens() {
        let service = MockQueryService::with_statuses(Vec::new(), pages());
        let handle = QueryHandle::new("h");

        let first = service.get_result_page(&handle, None).await.unwrap();
        assert_eq!(first.next_token.as_deref(), Some("p2"));

        let second = service.get_result_page(&handle, Some("p2")).await.unwrap();
        assert_eq!(second.rows, vec![RawRow::from_texts(["2"])]);
        assert!(second.next_token.is_none());

        assert!(service.get_result_page(&handle, Some("p9")).await.is_err());
        assert_eq!(service.page_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let service = MockQueryService::with_statuses(Vec::new(), pages());
        service.fail_submit("connection reset");
        service.fail_page(Some("p2"), "throttled");

        let err = service.submit_query("cart", "select 1", "s3://r/").await.unwrap_err();
        assert!(matches!(err, BdaError::Transport(_)));

        let handle = QueryHandle::new("h");
        assert!(service.get_result_page(&handle, None).await.is_ok());
        assert!(service.get_result_page(&handle, Some("p2")).await.is_err());
    }

    #[test]
    fn test_script_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.json");
        std::fs::write(
            &path,
            r#"{
                "statuses": ["RUNNING", "SUCCEEDED"],
                "pages": [{
                    "columns": [{"name": "id", "data_type": "integer"}],
                    "rows": [["id"], ["1"], [null]]
                }]
            }"#,
        )
        .unwrap();

        let service = MockQueryService::from_json_file(&path).unwrap();
        assert_eq!(service.script.statuses.len(), 2);
        assert_eq!(service.script.pages[0].rows[2], RawRow::new(vec![None]));
    }
}
