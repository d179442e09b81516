use crate::state::Context;

/// View or set query parameters (admin only)
#[poise::command(slash_command, guild_only)]
pub async fn config(
    ctx: Context<'_>,
    #[description = "Chunks retrieved per question (0 = backend default)"] top_k: Option<u32>,
) -> Result<(), anyhow::Error> {
    let user_id = ctx.author().id.get();
    if !ctx.data().is_admin(user_id) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    match top_k {
        None => {
            let config = ctx.data().query_config.read().await;
            let current = config
                .top_k
                .map(|k| k.to_string())
                .unwrap_or_else(|| "backend default".to_string());
            ctx.say(format!("**Query configuration:**\n`top_k`: {}", current))
                .await?;
        }
        Some(0) => {
            ctx.data().query_config.write().await.top_k = None;
            ctx.say("`top_k` cleared; the backend default applies.").await?;
        }
        Some(k) => {
            ctx.data().query_config.write().await.top_k = Some(k);
            ctx.say(format!("`top_k` set to {}", k)).await?;
        }
    }

    Ok(())
}
