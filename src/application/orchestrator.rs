//! Request orchestration: one generation per submission, fanned out to every
//! enabled provider, fenced by generation, completed by join-with-timeout.

use crate::application::aggregator::ResultAggregator;
use crate::application::completion::{Completion, CompletionDetector, CompletionWaiter, PendingSet};
use crate::application::history::{ErrorLog, HistoryStore};
use crate::application::providers::ProviderRegistry;
use crate::domain::language::{DetectedLanguage, LanguageCode, LanguageResolver};
use crate::domain::model::{
    redact, Generation, HistoryEntry, OutcomeStatus, ProviderId, ProviderOutcome, Settings,
    TranslationItem, TranslationRequest,
};
use crate::domain::traits::{LanguageDetector, ProviderAdapter, SettingsSource};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestratorEvent {
    Started {
        generation: Generation,
        text: String,
    },
    LanguageResolved {
        generation: Generation,
        detected: DetectedLanguage,
        target: LanguageCode,
    },
    ResultsUpdated {
        generation: Generation,
        results: Vec<TranslationItem>,
    },
    /// Sent after the history write (if any) has finished.
    Completed {
        generation: Generation,
        detected: DetectedLanguage,
        target: LanguageCode,
        completion: Completion,
        results: Vec<TranslationItem>,
    },
}

impl OrchestratorEvent {
    pub fn generation(&self) -> Generation {
        match self {
            OrchestratorEvent::Started { generation, .. }
            | OrchestratorEvent::LanguageResolved { generation, .. }
            | OrchestratorEvent::ResultsUpdated { generation, .. }
            | OrchestratorEvent::Completed { generation, .. } => *generation,
        }
    }
}

/// What the presentation layer currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub generation: Generation,
    pub original_text: String,
    pub detected: DetectedLanguage,
    pub target: Option<LanguageCode>,
    pub manual_override: Option<LanguageCode>,
    pub results: Vec<TranslationItem>,
    pub loading: bool,
    pub pending: Vec<ProviderId>,
}

/// Collaborators of the orchestrator.
pub struct OrchestratorDeps {
    pub providers: ProviderRegistry,
    pub detector: Arc<dyn LanguageDetector>,
    pub settings: Arc<dyn SettingsSource>,
    pub history: Arc<HistoryStore>,
    pub errors: Arc<ErrorLog>,
    pub timeout: Duration,
}

// 当前代的共享状态；所有修改都先检查代号
#[derive(Default)]
struct InFlight {
    generation: Generation,
    original_text: String,
    detected: DetectedLanguage,
    target: Option<LanguageCode>,
    configured_default: LanguageCode,
    manual_override: Option<LanguageCode>,
    aggregator: ResultAggregator,
    pending: Option<PendingSet>,
    loading: bool,
}

struct Inner {
    providers: ProviderRegistry,
    detector: Arc<dyn LanguageDetector>,
    settings: Arc<dyn SettingsSource>,
    history: Arc<HistoryStore>,
    errors: Arc<ErrorLog>,
    completion: CompletionDetector,
    state: Mutex<InFlight>,
    events: broadcast::Sender<OrchestratorEvent>,
}

struct Dispatch {
    request: TranslationRequest,
    providers: Vec<Arc<dyn ProviderAdapter>>,
    pending: PendingSet,
    waiter: CompletionWaiter,
}

enum Settlement {
    Stale,
    Shown(Vec<TranslationItem>),
    Failed(String),
}

#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Inner>,
}

impl RequestOrchestrator {
    pub fn new(deps: OrchestratorDeps) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                providers: deps.providers,
                detector: deps.detector,
                settings: deps.settings,
                history: deps.history,
                errors: deps.errors,
                completion: CompletionDetector::new(deps.timeout),
                state: Mutex::new(InFlight::default()),
                events,
            }),
        }
    }

    /// Starts a new generation for `text` and returns its id, or `None` when
    /// the trimmed text is empty. Returns immediately; the work runs on the
    /// tokio runtime, so this must be called from within one.
    pub fn submit(&self, text: &str) -> Option<Generation> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let generation = {
            let mut state = self.lock_state();
            state.generation += 1;
            let generation = state.generation;
            // detected and target keep the previous values until dispatch
            state.original_text = text.to_string();
            state.aggregator.reset(generation);
            state.pending = None;
            state.loading = true;
            generation
        };

        debug!(generation, text = %redact(text), "submitted");
        self.emit(OrchestratorEvent::Started {
            generation,
            text: text.to_string(),
        });

        let this = self.clone();
        let text = text.to_string();
        tokio::spawn(async move { this.run(generation, text).await });

        Some(generation)
    }

    /// Toggles the sticky target between the detected language and its
    /// automatic target, then re-submits the current text. Returns the new
    /// override, or `None` when there is nothing to swap.
    pub fn swap_languages(&self) -> Option<LanguageCode> {
        let (next, text) = {
            let mut state = self.lock_state();
            let current = state.target.clone()?;
            let next = LanguageResolver::swap(&state.detected, &current, &state.configured_default)?;
            state.manual_override = Some(next.clone());
            (next, state.original_text.clone())
        };

        info!(target_language = %next, "manual target set");
        self.submit(&text);
        Some(next)
    }

    pub fn clear_override(&self) {
        self.lock_state().manual_override = None;
    }

    pub fn manual_override(&self) -> Option<LanguageCode> {
        self.lock_state().manual_override.clone()
    }

    pub fn current_generation(&self) -> Generation {
        self.lock_state().generation
    }

    pub fn snapshot(&self) -> ViewState {
        let state = self.lock_state();
        ViewState {
            generation: state.generation,
            original_text: state.original_text.clone(),
            detected: state.detected.clone(),
            target: state.target.clone(),
            manual_override: state.manual_override.clone(),
            results: state.aggregator.results(),
            loading: state.loading,
            pending: state.pending.as_ref().map(PendingSet::pending).unwrap_or_default(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.inner.events.subscribe()
    }

    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.inner.history
    }

    pub fn errors(&self) -> &Arc<ErrorLog> {
        &self.inner.errors
    }

    async fn run(&self, generation: Generation, text: String) {
        let settings = self.inner.settings.get_settings().await;

        let detected = match self.inner.detector.detect_language(&text).await {
            Ok(detected) => detected,
            Err(e) => {
                if !self.is_current(generation) {
                    debug!(generation, "detection failed for a stale generation");
                    return;
                }
                self.inner
                    .errors
                    .record("Language Detection", &e.describe())
                    .await;
                DetectedLanguage::Unknown
            }
        };

        let Some(Dispatch {
            request,
            providers,
            pending,
            waiter,
        }) = self.dispatch_plan(generation, text, detected, &settings)
        else {
            debug!(generation, "superseded before dispatch");
            return;
        };

        self.emit(OrchestratorEvent::LanguageResolved {
            generation,
            detected: request.detected_language.clone(),
            target: request.effective_target_language.clone(),
        });

        for provider in providers {
            let this = self.clone();
            let request = request.clone();
            let settings = settings.clone();
            let pending = pending.clone();
            tokio::spawn(async move {
                let outcome = provider.attempt(&request, &settings).await;
                this.settle(provider.as_ref(), outcome, &pending).await;
            });
        }

        let completion = waiter.wait().await;
        self.finish(request, completion).await;
    }

    /// Resolves the target and registers the providers, all under the state
    /// lock so a concurrent `submit` cannot interleave.
    fn dispatch_plan(
        &self,
        generation: Generation,
        text: String,
        detected: DetectedLanguage,
        settings: &Settings,
    ) -> Option<Dispatch> {
        let mut state = self.lock_state();
        if state.generation != generation {
            return None;
        }

        let target = LanguageResolver::resolve(
            &detected,
            &settings.default_target_language,
            state.manual_override.as_ref(),
        );
        let providers = self.inner.providers.enabled(settings);
        let (pending, waiter) = self
            .inner
            .completion
            .register(providers.iter().map(|p| p.id(settings)));

        state.detected = detected.clone();
        state.target = Some(target.clone());
        state.configured_default = settings.default_target_language.clone();
        state.pending = Some(pending.clone());

        debug!(
            generation,
            detected = %detected,
            target = %target,
            providers = providers.len(),
            "dispatching"
        );

        let request = TranslationRequest {
            generation,
            source_text: text,
            detected_language: detected,
            effective_target_language: target,
        };
        Some(Dispatch {
            request,
            providers,
            pending,
            waiter,
        })
    }

    async fn settle(&self, provider: &dyn ProviderAdapter, outcome: ProviderOutcome, pending: &PendingSet) {
        let id = outcome.provider.clone();
        let settlement = {
            let mut state = self.lock_state();
            if state.generation != outcome.generation || !pending.is_pending(&id) {
                Settlement::Stale
            } else {
                match &outcome.status {
                    // settle before recording: a forced clear that already took
                    // this provider wins, so it is never both abandoned and shown
                    OutcomeStatus::Succeeded(_) if pending.settle(&id) => {
                        state.aggregator.record(&outcome);
                        Settlement::Shown(state.aggregator.results())
                    }
                    OutcomeStatus::Succeeded(_) => Settlement::Stale,
                    OutcomeStatus::Failed(error) => Settlement::Failed(error.clone()),
                }
            }
        };

        match settlement {
            Settlement::Stale => {
                debug!(generation = outcome.generation, provider = %id, "discarding stale outcome");
            }
            Settlement::Shown(results) => {
                debug!(generation = outcome.generation, provider = %id, "provider succeeded");
                self.emit(OrchestratorEvent::ResultsUpdated {
                    generation: outcome.generation,
                    results,
                });
            }
            Settlement::Failed(error) => {
                self.inner.errors.record(provider.error_context(), &error).await;
            }
        }

        pending.settle(&id);
    }

    async fn finish(&self, request: TranslationRequest, completion: Completion) {
        let generation = request.generation;
        let results = {
            let mut state = self.lock_state();
            if state.generation != generation {
                debug!(generation, "completion fired for a stale generation");
                return;
            }
            state.loading = false;
            state.pending = None;
            state.aggregator.results()
        };

        match &completion {
            Completion::Completed => {
                info!(generation, results = results.len(), "translation complete");
            }
            Completion::ForcedCompleted { abandoned } => {
                let abandoned: Vec<&str> = abandoned.iter().map(ProviderId::as_str).collect();
                warn!(generation, ?abandoned, "providers timed out, completing anyway");
            }
        }

        if !results.is_empty() {
            let entry = HistoryEntry::new(&request, results.clone());
            match self.inner.history.add(entry.clone()).await {
                Ok(()) => self.inner.settings.notify_history_added(&entry),
                Err(e) => warn!(error = %e, "failed to save translation history"),
            }
        }

        self.emit(OrchestratorEvent::Completed {
            generation,
            detected: request.detected_language,
            target: request.effective_target_language,
            completion,
            results,
        });
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.lock_state().generation == generation
    }

    fn emit(&self, event: OrchestratorEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, InFlight> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
