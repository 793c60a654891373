use crate::abilities::{load_abilities_file, Ability, AbilityCatalog, AbilityIndex};
use crate::config::Config;
use crate::context::{gatherer_from_endpoints, ContextAssembler, ContextGatherer, NoteStore};
use crate::error::{AppError, Result};
use crate::persistence::FileNoteStore;
use crate::results::ResultStore;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Searchable index and browsable catalog over the same corpus.
pub struct AbilityRegistry {
    pub index: AbilityIndex,
    pub catalog: AbilityCatalog,
}

impl AbilityRegistry {
    /// Build both views, augmenting the corpus with built-in abilities.
    pub fn build(abilities: Vec<Ability>) -> Self {
        let mut index = AbilityIndex::with_builtins(vec![Ability::web_search()]);
        index.update_abilities(abilities);

        let corpus: Vec<Ability> = index.abilities().cloned().collect();
        let mut catalog = AbilityCatalog::new();
        catalog.organize_abilities(&corpus);

        Self { index, catalog }
    }
}

/// Application state shared across all request handlers.
pub struct AppState {
    pub abilities: RwLock<AbilityRegistry>,
    pub results: Mutex<ResultStore>,
    pub assembler: ContextAssembler,
    pub gatherer: ContextGatherer,
    pub notes: Arc<dyn NoteStore>,
    /// Set once startup loading has finished.
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Initialize state from configuration: load connector notes, wire the
    /// HTTP collaborators and load the initial ability corpus if configured.
    pub async fn new(config: Config) -> Result<Self> {
        let notes: Arc<dyn NoteStore> = Arc::new(FileNoteStore::load(&config.notes_path).await?);

        let gatherer = gatherer_from_endpoints(&config.endpoints, config.fetch_timeout)
            .map_err(|e| AppError::FetchError(e.to_string()))?;

        let abilities = match &config.abilities_path {
            Some(path) => load_abilities_file(path)?,
            None => {
                tracing::info!("ABILITIES_PATH not set, starting with built-in abilities only");
                Vec::new()
            }
        };

        let state = Self::from_parts(config, gatherer, notes);
        state.replace_abilities(abilities);
        state.mark_ready();

        Ok(state)
    }

    /// Assemble state from pre-built collaborators. The gatherer is given
    /// the note store and the configured cache TTL.
    pub fn from_parts(config: Config, gatherer: ContextGatherer, notes: Arc<dyn NoteStore>) -> Self {
        let gatherer = gatherer
            .with_notes(Arc::clone(&notes))
            .with_cache_ttl(config.context_cache_ttl);

        Self {
            abilities: RwLock::new(AbilityRegistry::build(Vec::new())),
            results: Mutex::new(ResultStore::new(
                config.max_stored_results,
                config.summarize_threshold,
                config.max_context_tokens,
            )),
            assembler: ContextAssembler::new(),
            gatherer,
            notes,
            ready: AtomicBool::new(false),
            config: Arc::new(config),
        }
    }

    /// Rebuild index and catalog off-lock, then swap them in.
    pub fn replace_abilities(&self, abilities: Vec<Ability>) -> usize {
        let start = std::time::Instant::now();
        let registry = AbilityRegistry::build(abilities);
        let total = registry.index.len();
        let categories = registry.catalog.categories().len();

        *self.abilities.write() = registry;

        tracing::info!(
            abilities = total,
            categories,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Ability registry rebuilt"
        );
        total
    }

    /// Gather live context and render the planner prompt.
    pub async fn build_prompt(&self, message: &str, selected_scripts: Option<String>) -> String {
        let mut sources = self.gatherer.gather().await;

        sources.selected_scripts = selected_scripts;
        sources.additional_tools = self.abilities.read().index.abilities().cloned().collect();

        let previous = self.results.lock().extracted_data_summary();
        sources.previous_results = (!previous.is_empty()).then_some(previous);

        self.assembler.build_prompt(message, &sources)
    }

    /// Check if the service is ready to handle requests.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::from_parts(
            Config::default(),
            ContextGatherer::new(),
            Arc::new(FileNoteStore::in_memory()),
        )
    }

    #[test]
    fn test_registry_always_has_web_search() {
        let state = state();
        assert_eq!(state.abilities.read().index.len(), 1);

        state.replace_abilities(vec![Ability::new("github-list-repos", "List repositories")]);
        let registry = state.abilities.read();
        assert_eq!(registry.index.len(), 2);
        assert!(registry.catalog.find_ability("web-search").is_some());
    }

    #[test]
    fn test_web_search_not_duplicated() {
        let state = state();
        state.replace_abilities(vec![Ability::web_search()]);
        state.replace_abilities(vec![Ability::web_search()]);
        assert_eq!(state.abilities.read().index.len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_includes_previous_results_and_tools() {
        let state = state();
        state.replace_abilities(vec![Ability::new("create-issue", "Open a GitHub issue")]);
        state
            .results
            .lock()
            .store_result("fetch-url", r#"{"id": "550e8400-e29b-41d4-a716-446655440000"}"#);

        let prompt = state
            .build_prompt("file a bug", Some("triage.sh: labels issues".into()))
            .await;

        assert!(prompt.contains("PLANNING TOKEN: plan_"));
        assert!(prompt.contains("- create-issue: Open a GitHub issue"));
        assert!(prompt.contains("PREVIOUS EXECUTION DATA:"));
        assert!(prompt.contains("550e8400-e29b-41d4-a716-446655440000"));
        assert!(prompt.contains("SELECTED SCRIPTS:\ntriage.sh: labels issues"));
        assert!(prompt.ends_with("USER REQUEST:\nfile a bug"));
    }

    #[tokio::test]
    async fn test_prompt_without_results_omits_previous_data() {
        let prompt = state().build_prompt("hello", None).await;
        assert!(!prompt.contains("PREVIOUS EXECUTION DATA"));
        assert!(!prompt.contains("ADDITIONAL TOOLS"));
    }
}
