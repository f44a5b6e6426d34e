//! Evaluation context held by a client.

use parking_lot::RwLock;

use crate::types::EvaluationContext;

/// Holds the construction-time base context and the context in use.
///
/// Updates never accumulate: each one starts again from the base
/// (`appName` and `environment` only) and overlays the new fragment.
pub struct ContextManager {
    base: EvaluationContext,
    current: RwLock<EvaluationContext>,
}

impl ContextManager {
    pub fn new(app_name: Option<String>, environment: Option<String>) -> Self {
        let base = EvaluationContext::new(app_name, environment);
        Self {
            current: RwLock::new(base.clone()),
            base,
        }
    }

    pub fn base(&self) -> &EvaluationContext {
        &self.base
    }

    pub fn current(&self) -> EvaluationContext {
        self.current.read().clone()
    }

    /// Replace the current context with `base + fragment` and return it.
    ///
    /// Keys in the fragment win, including `appName` and `environment`.
    pub fn update<I, K, V>(&self, fragment: I) -> EvaluationContext
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let merged = self.base.rebase(fragment);
        *self.current.write() = merged.clone();
        tracing::debug!("Context updated ({} properties)", merged.properties.len());
        merged
    }
}
