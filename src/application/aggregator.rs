use crate::domain::model::{Generation, OutcomeStatus, ProviderId, ProviderOutcome, TranslationItem};

/// Display rank of a service label: Gemini family first, then Google,
/// then everything else.
pub fn service_rank(service: &str) -> u8 {
    if service.starts_with("Gemini") {
        0
    } else if service.starts_with("Google") {
        1
    } else {
        2
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    provider: ProviderId,
    item: TranslationItem,
}

/// Successful outcomes of one generation, kept in display order.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    generation: Generation,
    results: Vec<Recorded>,
}

impl ResultAggregator {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            results: Vec::new(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Starts over for a new generation.
    pub fn reset(&mut self, generation: Generation) {
        self.generation = generation;
        self.results.clear();
    }

    /// Appends a successful outcome and re-sorts by rank. Arrival order is
    /// kept within a rank. Returns `false` when nothing was appended
    /// (failure, pending, another generation, or a provider that already
    /// settled).
    pub fn record(&mut self, outcome: &ProviderOutcome) -> bool {
        if outcome.generation != self.generation {
            return false;
        }
        let OutcomeStatus::Succeeded(translated) = &outcome.status else {
            return false;
        };
        if self.results.iter().any(|r| r.provider == outcome.provider) {
            return false;
        }

        self.results.push(Recorded {
            provider: outcome.provider.clone(),
            item: TranslationItem {
                service: translated.service.clone(),
                result: translated.text.clone(),
            },
        });
        // sort_by_key is stable
        self.results.sort_by_key(|r| service_rank(&r.item.service));
        true
    }

    pub fn results(&self) -> Vec<TranslationItem> {
        self.results.iter().map(|r| r.item.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TranslatedText;

    fn ok(provider: &str, service: &str, text: &str) -> ProviderOutcome {
        ProviderOutcome::succeeded(
            ProviderId::new(provider),
            1,
            TranslatedText {
                text: text.to_string(),
                service: service.to_string(),
            },
        )
    }

    fn services(agg: &ResultAggregator) -> Vec<String> {
        agg.results().into_iter().map(|i| i.service).collect()
    }

    #[test]
    fn test_rank_order_independent_of_arrival() {
        let mut agg = ResultAggregator::new(1);
        agg.record(&ok("deepl", "DeepL", "a"));
        agg.record(&ok("google", "Google (Free)", "b"));
        agg.record(&ok("gemini:auto", "Gemini (auto)", "c"));
        assert_eq!(services(&agg), vec!["Gemini (auto)", "Google (Free)", "DeepL"]);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let mut agg = ResultAggregator::new(1);
        agg.record(&ok("other-b", "Beta", "1"));
        agg.record(&ok("gemini:pro", "Gemini (pro)", "2"));
        agg.record(&ok("other-a", "Alpha", "3"));
        agg.record(&ok("gemini:flash", "Gemini (flash)", "4"));
        assert_eq!(
            services(&agg),
            vec!["Gemini (pro)", "Gemini (flash)", "Beta", "Alpha"]
        );
    }

    #[test]
    fn test_failures_and_stale_outcomes_are_not_shown() {
        let mut agg = ResultAggregator::new(2);
        assert!(!agg.record(&ProviderOutcome::failed(ProviderId::new("google"), 2, "boom")));
        // generation 1 outcome against a generation 2 aggregator
        assert!(!agg.record(&ok("google", "Google (Free)", "old")));
        assert!(agg.is_empty());
    }

    #[test]
    fn test_provider_settles_once() {
        let mut agg = ResultAggregator::new(1);
        assert!(agg.record(&ok("google", "Google (Free)", "first")));
        assert!(!agg.record(&ok("google", "Google (Free)", "second")));
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.results()[0].result, "first");
    }

    #[test]
    fn test_reset_clears() {
        let mut agg = ResultAggregator::new(1);
        agg.record(&ok("google", "Google (Free)", "x"));
        agg.reset(5);
        assert!(agg.is_empty());
        assert_eq!(agg.generation(), 5);
    }
}
