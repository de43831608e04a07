//! The per-message resolution state machine.

use std::collections::HashMap;

use rand::seq::IndexedRandom;

use kotik_memory::ConversationMemory;
use kotik_providers::{CompletionClient, CompletionError};
use kotik_triggers::{TriggerSource, TriggerStore};
use kotik_types::{ProviderDescriptor, Turn, UserId};

use crate::reply::{Outage, Reply};

/// Pipeline tuning that comes from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Ordered completion fallback chain; tried first to last.
    pub chain: Vec<ProviderDescriptor>,
    /// Persona directive injected as the leading system turn.
    pub persona_prompt: String,
    /// Short-command → canonical trigger phrase substitutions.
    pub aliases: HashMap<String, String>,
    /// Turns of history included in a completion request.
    pub history_window: usize,
}

/// Resolves one inbound message to one reply.
///
/// A trigger match always short-circuits before any memory mutation or
/// provider call: scripted replies must never consume a paid completion
/// request. Only a miss builds context and walks the provider chain.
pub struct ResolutionPipeline<S> {
    triggers: TriggerStore<S>,
    memory: ConversationMemory,
    client: CompletionClient,
    settings: PipelineSettings,
}

impl<S: TriggerSource> ResolutionPipeline<S> {
    pub fn new(
        triggers: TriggerStore<S>,
        memory: ConversationMemory,
        client: CompletionClient,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            triggers,
            memory,
            client,
            settings,
        }
    }

    /// Handle one inbound message and produce its reply.
    ///
    /// Never fails: every remote error is recovered into a reply here, so one
    /// message's trouble stays contained to that message.
    pub async fn handle_message(&self, user: UserId, raw: &str) -> Reply {
        let text = raw.trim();
        let normalized = text.to_lowercase();
        let candidate = self
            .settings
            .aliases
            .get(&normalized)
            .map_or(normalized.as_str(), String::as_str);

        match self.triggers.resolve(candidate).await {
            Ok(Some(responses)) => {
                if let Some(response) = responses.choose(&mut rand::rng()) {
                    tracing::info!(
                        user_id = %user,
                        trigger = candidate,
                        reply = %response,
                        "scripted reply"
                    );
                    return Reply::Scripted(response.clone());
                }
            }
            Ok(None) => {}
            Err(err) => {
                // No serviceable map; the message is still answered, just from
                // the generated branch.
                tracing::warn!(
                    user_id = %user,
                    error = %err,
                    "trigger store unavailable, falling back to generated reply"
                );
            }
        }

        self.generate(user, text).await
    }

    async fn generate(&self, user: UserId, text: &str) -> Reply {
        self.memory.append(user, Turn::user(text));

        let mut turns = Vec::with_capacity(self.settings.history_window + 1);
        turns.push(Turn::system(self.settings.persona_prompt.clone()));
        turns.extend(self.memory.window(user, self.settings.history_window));

        let mut last_error: Option<CompletionError> = None;
        for provider in &self.settings.chain {
            match self.client.complete(&turns, provider).await {
                Ok(answer) => {
                    self.memory.append(user, Turn::assistant(answer.clone()));
                    tracing::info!(
                        user_id = %user,
                        provider = %provider.name,
                        reply = %answer,
                        "generated reply"
                    );
                    return Reply::Generated(answer);
                }
                Err(err) => {
                    tracing::warn!(
                        user_id = %user,
                        provider = %provider.name,
                        error = %err,
                        "completion provider failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        // The failed turn leaves no assistant record; the user turn stays so a
        // later successful exchange still sees what was asked.
        match last_error {
            Some(err) if err.is_rate_limited() => {
                tracing::error!(
                    user_id = %user,
                    error = %err,
                    "all completion providers failed: rate limited"
                );
                Reply::Unavailable(Outage::RateLimited)
            }
            Some(err) => {
                tracing::error!(
                    user_id = %user,
                    error = %err,
                    "all completion providers failed"
                );
                Reply::Unavailable(Outage::Upstream)
            }
            None => {
                tracing::error!(user_id = %user, "completion provider chain is empty");
                Reply::Unavailable(Outage::Upstream)
            }
        }
    }
}
