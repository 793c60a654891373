//! Parallel collection of prompt context from external collaborators.
//!
//! Every fetch settles independently: a failing or missing collaborator
//! contributes an empty value and a warning, never an error. Gathered facts
//! can be reused for a short TTL; the planning token is always fresh.

use crate::context::sources::{
    AccountSource, ConnectedAccount, ContextSources, EnvironmentSource, ExecutorStatusSource,
    IntegrationSource, NoteStore, TokenSource,
};
use futures::future::join_all;
use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// New opaque correlation id for one context build.
pub fn new_planning_token() -> String {
    format!("plan_{}", uuid::Uuid::new_v4().simple())
}

#[derive(Default)]
pub struct ContextGatherer {
    tokens: Option<Arc<dyn TokenSource>>,
    environment: Option<Arc<dyn EnvironmentSource>>,
    executor: Option<Arc<dyn ExecutorStatusSource>>,
    accounts: Vec<Arc<dyn AccountSource>>,
    notes: Option<Arc<dyn NoteStore>>,
    cache_ttl: Duration,
    cache: Mutex<Option<(Instant, ContextSources)>>,
    /// Bumped by `invalidate`; a gather only caches if it is unchanged.
    generation: AtomicU64,
}

impl ContextGatherer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(source);
        self
    }

    pub fn with_environment(mut self, source: Arc<dyn EnvironmentSource>) -> Self {
        self.environment = Some(source);
        self
    }

    pub fn with_executor(mut self, source: Arc<dyn ExecutorStatusSource>) -> Self {
        self.executor = Some(source);
        self
    }

    pub fn with_account_source(mut self, source: Arc<dyn AccountSource>) -> Self {
        self.accounts.push(source);
        self
    }

    pub fn with_notes(mut self, notes: Arc<dyn NoteStore>) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Reuse gathered facts for `ttl`. Zero disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Drop any cached facts so the next gather refetches everything.
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *cache = None;
    }

    /// Fetch all context concurrently and join, tolerating partial failure.
    pub async fn gather(&self) -> ContextSources {
        if let Some(mut cached) = self.cached() {
            tracing::debug!("Using cached prompt context");
            cached.planning_token = Some(new_planning_token());
            return cached;
        }

        let start = Instant::now();
        let generation = self.generation.load(Ordering::SeqCst);

        let tokens_fut = async {
            match &self.tokens {
                Some(source) => settle("tokens", source.available_tokens()).await,
                None => Vec::new(),
            }
        };
        let environment_fut = async {
            match &self.environment {
                Some(source) => settle("environment", source.environment()).await,
                None => None,
            }
        };
        let executor_fut = async {
            match &self.executor {
                Some(source) => {
                    settle("executor_status", async {
                        source.executor_status().await.map(Some)
                    })
                    .await
                }
                None => None,
            }
        };
        let accounts_fut = join_all(self.accounts.iter().map(|source| async move {
            let accounts: Vec<ConnectedAccount> =
                settle(source.source().as_str(), source.connected_accounts()).await;
            (source.source(), accounts)
        }));
        let notes_fut = async {
            match &self.notes {
                Some(store) => settle("account_notes", store.all_notes()).await,
                None => Default::default(),
            }
        };

        let (user_tokens, codespace_info, executor_connection, account_lists, account_notes) =
            tokio::join!(tokens_fut, environment_fut, executor_fut, accounts_fut, notes_fut);

        let mut sources = ContextSources {
            user_tokens,
            codespace_info,
            executor_connection,
            account_notes,
            ..Default::default()
        };
        for (source, accounts) in account_lists {
            if !accounts.is_empty() {
                merge_accounts(&mut sources, source, accounts);
            }
        }

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            tokens = sources.user_tokens.len(),
            account_sources = sources.accounts.len(),
            "Prompt context gathered"
        );

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.lock();
            if self.generation.load(Ordering::SeqCst) == generation {
                *cache = Some((Instant::now(), sources.clone()));
            } else {
                tracing::debug!("Context invalidated during gather, not caching");
            }
        }

        sources.planning_token = Some(new_planning_token());
        sources
    }

    fn cached(&self) -> Option<ContextSources> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let guard = self.cache.lock();
        match guard.as_ref() {
            Some((at, sources)) if at.elapsed() < self.cache_ttl => Some(sources.clone()),
            _ => None,
        }
    }
}

fn merge_accounts(
    sources: &mut ContextSources,
    source: IntegrationSource,
    accounts: Vec<ConnectedAccount>,
) {
    sources.accounts.entry(source).or_default().extend(accounts);
}

/// Await a fetch, turning failure into the type's empty value.
async fn settle<T, E, F>(label: &str, fetch: F) -> T
where
    T: Default,
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match fetch.await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(source = label, error = %e, "Context fetch failed, omitting section");
            T::default()
        }
    }
}
