//! Completion provider descriptors.

use serde::Deserialize;

/// A named remote completion backend.
///
/// The fallback chain is an ordered list of descriptors consumed by a uniform
/// loop; adding a backend is a configuration change, not a code branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderDescriptor {
    /// Short name used in logs (`gemini`, `deepseek`, ...).
    pub name: String,
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier sent in the request body.
    pub model: String,
}

impl ProviderDescriptor {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}
