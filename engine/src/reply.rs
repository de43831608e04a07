//! Pipeline outcomes.

/// Reply when every provider failed and the last failure was a rate limit.
pub const RATE_LIMIT_APOLOGY: &str =
    "Мур… Все лимиты бесплатных запросов исчерпаны. Попробуй снова через минуту.";

/// Reply when every provider failed for any other reason.
pub const GENERIC_APOLOGY: &str = "Мур… Не могу сейчас ответить. Попробуй позже!";

/// Why the completion chain produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outage {
    /// The last provider failure carried a quota/rate-limit signal.
    RateLimited,
    /// Any other terminal failure.
    Upstream,
}

/// The single reply produced for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A pre-authored response picked from the trigger map.
    Scripted(String),
    /// Text generated by a completion provider.
    Generated(String),
    /// Every provider failed; the user gets a fixed apology.
    Unavailable(Outage),
}

impl Reply {
    /// The user-visible text of this reply.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Reply::Scripted(text) | Reply::Generated(text) => text,
            Reply::Unavailable(Outage::RateLimited) => RATE_LIMIT_APOLOGY,
            Reply::Unavailable(Outage::Upstream) => GENERIC_APOLOGY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_maps_outages_to_fixed_apologies() {
        assert_eq!(Reply::Scripted("Мур-мур!".into()).text(), "Мур-мур!");
        assert_eq!(Reply::Generated("мяу".into()).text(), "мяу");
        assert_eq!(
            Reply::Unavailable(Outage::RateLimited).text(),
            RATE_LIMIT_APOLOGY
        );
        assert_eq!(Reply::Unavailable(Outage::Upstream).text(), GENERIC_APOLOGY);
    }
}
