use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, Level};

use docent::backend::{Backend, BackendConfig, HttpBackend};
use docent::commands;
use docent::docs::upload::UploadPipeline;
use docent::docs::DocumentRegistry;
use docent::health::{HealthMonitor, HealthSnapshot};
use docent::render;
use docent::state::{AppState, Conversations, QueryConfig};

fn online_status(h: &HealthSnapshot) -> serenity::OnlineStatus {
    if !h.backend_up {
        serenity::OnlineStatus::DoNotDisturb
    } else if !h.collaborator_up {
        serenity::OnlineStatus::Idle
    } else {
        serenity::OnlineStatus::Online
    }
}

/// Mirror each new health snapshot into the bot's presence.
async fn show_health(ctx: serenity::Context, mut health: watch::Receiver<Option<HealthSnapshot>>) {
    loop {
        let latest = health.borrow_and_update().clone();
        if let Some(h) = latest {
            let activity = serenity::ActivityData::custom(render::presence(&h));
            ctx.set_presence(Some(activity), online_status(&h));
        }
        if health.changed().await.is_err() {
            break;
        }
    }
    debug!("presence updates stopped");
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, AppState, anyhow::Error>,
    data: &AppState,
) -> Result<(), anyhow::Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        commands::on_attachment_drop(ctx, new_message, framework.bot_id, data).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load env
    let _ = dotenv::dotenv();
    let token = dotenv::var("DISCORD_TOKEN").expect("DISCORD_TOKEN required");
    let guild_id: Option<serenity::GuildId> = dotenv::var("DISCORD_GUILD_ID")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(serenity::GuildId::new);
    let health_period = dotenv::var("DOCENT_HEALTH_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(15));

    let config = BackendConfig::from_env();
    info!(base_url = config.base_url, "using RAG backend");
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(config)?);

    // Parse admin user IDs from env
    let admin_ids: HashSet<u64> = dotenv::var("ADMIN_USER_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect();
    if !admin_ids.is_empty() {
        info!(count = admin_ids.len(), "Admin users configured");
    }

    let monitor = HealthMonitor::activate(backend.clone(), health_period);

    // Library panel: uploads signal the registry to re-list.
    let (refresh_tx, refresh_rx) = watch::channel(0u64);
    let uploads = Arc::new(UploadPipeline::new(backend.clone(), refresh_tx));
    let registry = Arc::new(DocumentRegistry::new(backend.clone()));
    let follower = tokio::spawn(registry.clone().follow(refresh_rx));

    let app_state = AppState {
        uploads,
        registry,
        health: monitor.subscribe(),
        conversations: Conversations::new(backend),
        admin_ids,
        query_config: Arc::new(RwLock::new(QueryConfig::from_env())),
    };

    let intents =
        serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::docent()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                info!("Registering {} top-level command(s):", commands.len());
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(
                        ctx,
                        &framework.options().commands,
                        gid,
                    )
                    .await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    )
                    .await?;
                }

                tokio::spawn(show_health(ctx.clone(), app_state.health.clone()));

                Ok(app_state)
            })
        })
        .build();

    info!("Starting Docent Discord bot...");

    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shard_manager.shutdown_all().await;
        }
    });

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    monitor.deactivate();
    follower.abort();

    Ok(())
}
