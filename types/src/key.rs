//! Secret API credential.

/// An authorization credential for a remote service.
///
/// The `Debug` impl redacts the value so keys cannot leak through error
/// formatting or log macros that capture whole structs.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw secret. Callers place it in request headers only, never logs.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let key = ApiKey::new("sk-or-secret");
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("secret"));
        assert_eq!(rendered, "ApiKey(<redacted>)");
    }
}
