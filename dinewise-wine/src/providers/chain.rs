//! Provider escalation
//!
//! Attempt `n` goes to provider `min(n / escalate_after, len - 1)`: the
//! primary source gets the first `escalate_after` attempts, then each
//! fallback in turn, and the last provider absorbs any remaining attempts.
//! Exactly one provider is called per attempt.

use std::sync::Arc;

use super::ResearchProvider;

#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn ResearchProvider>>,
    escalate_after: u32,
}

impl ProviderChain {
    /// Returns `None` for an empty provider list
    pub fn new(providers: Vec<Arc<dyn ResearchProvider>>, escalate_after: u32) -> Option<Self> {
        if providers.is_empty() {
            return None;
        }
        Some(Self {
            providers,
            escalate_after: escalate_after.max(1),
        })
    }

    pub fn single(provider: Arc<dyn ResearchProvider>) -> Self {
        Self {
            providers: vec![provider],
            escalate_after: 1,
        }
    }

    /// Provider responsible for a 0-based attempt index
    pub fn select(&self, attempt: u32) -> &Arc<dyn ResearchProvider> {
        let index = (attempt / self.escalate_after) as usize;
        &self.providers[index.min(self.providers.len() - 1)]
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
