//! Startup wiring - builds the catalogue, the interpretation stack and the
//! HTTP state from configuration and already-constructed adapters.
//!
//! Kept in the library so integration tests assemble the service exactly
//! the way the binary does.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::adapters::ai::{OpenAIConfig, OpenAIOracle};
use crate::adapters::http::{HttpState, SessionHandlers};
use crate::application::{
    AbandonSessionHandler, CreateSessionHandler, GetSessionHandler, ListWorkflowsHandler,
    ProcessMessageHandler, SessionLocks,
};
use crate::config::{AiConfig, EngineConfig, InterpretationMode};
use crate::domain::foundation::DomainError;
use crate::domain::interpretation::{OracleStepInterpreter, RuleStepInterpreter, StepInterpreter};
use crate::domain::matching::{IntentMatcher, KeywordIntentMatcher, OracleIntentMatcher};
use crate::domain::workflow::{builtin_workflows, WorkflowCatalogue, WorkflowError};
use crate::ports::{LanguageOracle, OracleError, SessionStore, WorkflowSource};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Failed to load workflows: {0}")]
    WorkflowSource(#[from] DomainError),

    #[error("Invalid workflow library: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Oracle interpretation is enabled but no API key is configured")]
    MissingOracleKey,

    #[error("Failed to initialize language oracle: {0}")]
    Oracle(#[from] OracleError),
}

/// Matcher and interpreter selected for the configured mode.
#[derive(Clone)]
pub struct Interpretation {
    pub matcher: Arc<dyn IntentMatcher>,
    pub interpreter: Arc<dyn StepInterpreter>,
}

impl Interpretation {
    /// Deterministic keyword matching and rule interpretation.
    pub fn keyword(engine: &EngineConfig) -> Self {
        Self {
            matcher: Arc::new(keyword_matcher(engine)),
            interpreter: Arc::new(RuleStepInterpreter::new()),
        }
    }

    /// Deterministic first, with `oracle` consulted when inconclusive.
    ///
    /// `window` bounds each consultation, retries included.
    pub fn with_oracle(
        engine: &EngineConfig,
        oracle: Arc<dyn LanguageOracle>,
        window: Duration,
    ) -> Self {
        Self {
            matcher: Arc::new(OracleIntentMatcher::new(
                keyword_matcher(engine),
                oracle.clone(),
                engine.oracle_confidence_cutoff,
                window,
            )),
            interpreter: Arc::new(OracleStepInterpreter::new(
                RuleStepInterpreter::new(),
                oracle,
                window,
            )),
        }
    }

    /// Builds the stack for the configured mode, creating the OpenAI oracle
    /// when needed.
    pub fn from_config(engine: &EngineConfig, ai: &AiConfig) -> Result<Self, BootstrapError> {
        match engine.interpretation_mode {
            InterpretationMode::Keyword => Ok(Self::keyword(engine)),
            InterpretationMode::Oracle => {
                let api_key = ai
                    .openai_api_key
                    .clone()
                    .filter(|_| ai.has_openai())
                    .ok_or(BootstrapError::MissingOracleKey)?;

                let config = OpenAIConfig::from_secret(api_key)
                    .with_model(ai.model.clone())
                    .with_base_url(ai.base_url.clone())
                    .with_timeout(ai.timeout())
                    .with_max_retries(ai.max_retries)
                    .with_max_retry_wait(ai.max_retry_wait());
                let oracle = OpenAIOracle::new(config)?;

                let oracle_info = oracle.oracle_info();
                info!(
                    provider = %oracle_info.name,
                    model = %oracle_info.model,
                    window_ms = ai.consult_window().as_millis() as u64,
                    "Language oracle enabled"
                );
                Ok(Self::with_oracle(engine, Arc::new(oracle), ai.consult_window()))
            }
        }
    }
}

fn keyword_matcher(engine: &EngineConfig) -> KeywordIntentMatcher {
    KeywordIntentMatcher::new(engine.min_keyword_score, engine.min_shared_keywords)
}

/// Loads the workflow library, seeding the builtins into an empty source.
pub async fn load_catalogue(
    source: &dyn WorkflowSource,
    seed_builtin: bool,
) -> Result<WorkflowCatalogue, BootstrapError> {
    let mut workflows = source.load_all().await?;

    if workflows.is_empty() && seed_builtin {
        let builtins = builtin_workflows()?;
        source.seed(&builtins).await?;
        info!(count = builtins.len(), "Seeded builtin workflows");
        workflows = source.load_all().await?;
    }

    let catalogue = WorkflowCatalogue::new(workflows)?;
    info!(count = catalogue.len(), "Workflow catalogue loaded");
    Ok(catalogue)
}

/// Wires every application handler into the HTTP state.
pub fn build_http_state(
    store: Arc<dyn SessionStore>,
    catalogue: Arc<WorkflowCatalogue>,
    interpretation: Interpretation,
    max_message_chars: usize,
) -> HttpState {
    let locks = SessionLocks::new();

    let message_handler = ProcessMessageHandler::new(
        store.clone(),
        catalogue.clone(),
        interpretation.matcher,
        interpretation.interpreter,
        locks.clone(),
    )
    .with_max_message_chars(max_message_chars);

    let sessions = SessionHandlers::new(
        Arc::new(CreateSessionHandler::new(store.clone())),
        Arc::new(message_handler),
        Arc::new(GetSessionHandler::new(store.clone(), catalogue.clone())),
        Arc::new(AbandonSessionHandler::new(store, locks)),
    );

    HttpState {
        sessions,
        workflows: Arc::new(ListWorkflowsHandler::new(catalogue)),
    }
}
