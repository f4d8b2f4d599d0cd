use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{domain::LookupItem, task::DebouncedTask};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::ClientError,
    http::JsonClient,
    services::{BasicInfoApi, DetailsApi, NAME_LIKE_PARAM},
};

pub const DEFAULT_LOOKUP_DEBOUNCE: Duration = Duration::from_millis(300);

/// Something an [`Autocomplete`] can ask for suggestions.
#[async_trait]
pub trait LookupSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<LookupItem>, ClientError>;
}

/// A bare lookup endpoint filtered by one query parameter.
#[derive(Debug, Clone)]
pub struct LookupEndpoint {
    client: JsonClient,
    path: String,
    query_param: String,
}

impl LookupEndpoint {
    pub fn new(client: JsonClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            query_param: NAME_LIKE_PARAM.to_string(),
        }
    }

    pub fn with_query_param(mut self, query_param: impl Into<String>) -> Self {
        self.query_param = query_param.into();
        self
    }
}

#[async_trait]
impl LookupSource for LookupEndpoint {
    async fn search(&self, query: &str) -> Result<Vec<LookupItem>, ClientError> {
        self.client
            .get_with_query(&self.path, &[(self.query_param.as_str(), query)])
            .await
    }
}

pub struct DepartmentLookup(pub Arc<dyn BasicInfoApi>);

#[async_trait]
impl LookupSource for DepartmentLookup {
    async fn search(&self, query: &str) -> Result<Vec<LookupItem>, ClientError> {
        self.0.get_departments(Some(query)).await
    }
}

pub struct LocationLookup(pub Arc<dyn DetailsApi>);

#[async_trait]
impl LookupSource for LocationLookup {
    async fn search(&self, query: &str) -> Result<Vec<LookupItem>, ClientError> {
        self.0.get_locations(Some(query)).await
    }
}

/// What an autocomplete input shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    /// Query the items answer.
    pub query: String,
    pub items: Vec<LookupItem>,
    pub loading: bool,
    pub open: bool,
}

/// Debounced lookup with cancel-on-supersede.
///
/// Every keystroke cancels the pending or in-flight lookup and arms a new
/// one. A superseded lookup never publishes. Failures publish an empty list.
pub struct Autocomplete {
    source: Arc<dyn LookupSource>,
    debounce: Duration,
    input: String,
    task: DebouncedTask,
    state: Arc<watch::Sender<Suggestions>>,
}

impl Autocomplete {
    pub fn new(source: Arc<dyn LookupSource>, debounce: Duration) -> Self {
        let (state, _) = watch::channel(Suggestions::default());
        Self {
            source,
            debounce,
            input: String::new(),
            task: DebouncedTask::new(),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Suggestions> {
        self.state.subscribe()
    }

    pub fn suggestions(&self) -> Suggestions {
        self.state.borrow().clone()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
        self.task.cancel();

        if self.input.is_empty() {
            self.state.send_replace(Suggestions::default());
            return;
        }
        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading, false));

        let query = self.input.clone();
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        self.task.schedule(self.debounce, move |generation| async move {
            // The generation is checked under the channel's write lock, so a
            // superseding `set_input` always publishes after a stale run.
            state.send_if_modified(|s| {
                if !generation.is_current() {
                    return false;
                }
                s.loading = true;
                true
            });
            let result = source.search(&query).await;
            let items = result.unwrap_or_else(|err| {
                warn!(%query, error = %err, "lookup failed");
                Vec::new()
            });
            let published = state.send_if_modified(|s| {
                if !generation.is_current() {
                    return false;
                }
                *s = Suggestions {
                    open: !items.is_empty(),
                    query: query.clone(),
                    items,
                    loading: false,
                };
                true
            });
            if !published {
                debug!(%query, "lookup superseded");
            }
        });
    }

    /// Accepts a suggestion: the input takes its name and the list closes.
    pub fn select(&mut self, item: &LookupItem) {
        self.task.cancel();
        self.input = item.name.clone();
        self.close();
    }

    pub fn close(&mut self) {
        self.state.send_modify(|s| {
            s.open = false;
            s.loading = false;
        });
    }

    /// Waits for the pending lookup, if any, to publish.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.task.take_handle() {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;
