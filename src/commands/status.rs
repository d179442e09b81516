use crate::render;
use crate::state::Context;

/// Show backend and Ollama health
#[poise::command(slash_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let latest = ctx.data().health.borrow().clone();
    ctx.say(render::health(latest.as_ref())).await?;
    Ok(())
}
