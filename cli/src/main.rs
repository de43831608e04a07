//! Kotik - binary entry point.
//!
//! Bootstrap is deliberately thin: initialize tracing, load configuration
//! (fatal when incomplete), wire the trigger store, memory, completion client
//! and pipeline together, then long-poll Telegram forever. Each inbound
//! message is handled on its own task, so one slow or failing message never
//! blocks or crashes the rest.

mod telegram;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kotik_config::KotikConfig;
use kotik_engine::{PipelineSettings, ResolutionPipeline};
use kotik_memory::ConversationMemory;
use kotik_providers::CompletionClient;
use kotik_triggers::{SheetValuesSource, TriggerSource, TriggerStore};
use kotik_types::UserId;

use telegram::TelegramClient;

const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    let (log_file, init_warnings) = open_kotik_log_file();

    // Stdout always gets a copy; cloud hosts collect it as the primary log.
    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .init();
    }
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_kotik_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let candidates = kotik_log_file_candidates();
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn kotik_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Explicit override first
    if let Ok(dir) = std::env::var("KOTIK_LOG_DIR")
        && !dir.trim().is_empty()
    {
        candidates.push(PathBuf::from(dir).join("kotik.log"));
    }

    // Primary: ~/.kotik/logs/kotik.log
    if let Some(config_path) = KotikConfig::config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("kotik.log"));
    }

    // Fallback: ./.kotik/logs/kotik.log (useful in constrained environments)
    candidates.push(PathBuf::from(".kotik").join("logs").join("kotik.log"));

    candidates
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = KotikConfig::load().context("startup configuration is incomplete")?;

    let source = SheetValuesSource::new(
        config.sheets.spreadsheet_id.clone(),
        config.sheets.api_key.clone(),
        config.sheets.range.clone(),
    )
    .context("failed to build trigger source")?;
    let triggers = TriggerStore::new(source, config.sheets.cache_lifetime);

    let memory = ConversationMemory::new(config.memory.ring_capacity);

    let client = CompletionClient::new(
        config.completion.api_key.clone(),
        config.completion.request_timeout,
        config.completion.referer.clone(),
    )
    .context("failed to build completion client")?;

    let pipeline = Arc::new(ResolutionPipeline::new(
        triggers,
        memory,
        client,
        PipelineSettings {
            chain: config.completion.providers.clone(),
            persona_prompt: config.persona_prompt.clone(),
            aliases: config.aliases.clone(),
            history_window: config.memory.history_window,
        },
    ));

    let bot = TelegramClient::new(&config.bot_token).context("failed to build telegram client")?;

    tracing::info!(
        providers = config.completion.providers.len(),
        window = config.memory.history_window,
        "kotik started"
    );

    run_polling(bot, pipeline).await
}

async fn run_polling<S>(bot: TelegramClient, pipeline: Arc<ResolutionPipeline<S>>) -> Result<()>
where
    S: TriggerSource + 'static,
{
    let mut offset = None;

    loop {
        let updates = match bot.get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "update poll failed");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };
            let user = UserId::new(message.chat.id);

            let bot = bot.clone();
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let reply = pipeline.handle_message(user, &text).await;
                if let Err(err) = bot.send_message(user, reply.text()).await {
                    tracing::error!(user_id = %user, error = %err, "failed to deliver reply");
                }
            });
        }
    }
}
