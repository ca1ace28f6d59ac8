use crate::application::history::{ErrorLog, HistoryStore};
use crate::application::orchestrator::{OrchestratorDeps, RequestOrchestrator};
use crate::application::providers::ProviderRegistry;
use crate::domain::error::MtError;
use crate::domain::traits::KeyValueStore;
use crate::infrastructure::config::{Config, ConfigSettings};
use crate::infrastructure::network::gemini::GeminiClient;
use crate::infrastructure::network::google::GoogleWebClient;
use crate::infrastructure::network::http::create_client;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub config: Arc<RwLock<Config>>,
    pub http_client: Client,
    pub history: Arc<HistoryStore>,
    pub errors: Arc<ErrorLog>,
    pub orchestrator: RequestOrchestrator,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, config: Config) -> Result<Self, MtError> {
        let http_client = create_client(config.http_proxy.as_deref())?;
        let google = Arc::new(GoogleWebClient::new(http_client.clone()));
        let gemini = Arc::new(GeminiClient::new(http_client.clone()));

        let history = Arc::new(HistoryStore::history(store.clone(), config.history_limit));
        let errors = Arc::new(ErrorLog::errors(store.clone(), config.error_log_limit));
        let timeout = config.timeout();
        let config = Arc::new(RwLock::new(config));

        let orchestrator = RequestOrchestrator::new(OrchestratorDeps {
            providers: ProviderRegistry::standard(google.clone(), gemini),
            detector: google,
            settings: Arc::new(ConfigSettings::new(config.clone())),
            history: history.clone(),
            errors: errors.clone(),
            timeout,
        });

        Ok(Self {
            store,
            config,
            http_client,
            history,
            errors,
            orchestrator,
        })
    }
}
