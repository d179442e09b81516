use poise::CreateReply;
use tracing::{info, warn};

use crate::render;
use crate::state::Context;

/// Ask a question about the uploaded documents
#[poise::command(slash_command, guild_only)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"] question: String,
) -> Result<(), anyhow::Error> {
    let conversation = ctx.data().conversations.get(ctx.channel_id().get()).await;

    let Some(pending) = conversation.begin(&question).await else {
        let reason = if question.trim().is_empty() {
            "Ask me something first."
        } else {
            "Still answering the previous question in this channel, hang on."
        };
        ctx.send(CreateReply::default().content(reason).ephemeral(true))
            .await?;
        return Ok(());
    };

    info!(
        user = ctx.author().name,
        channel = ctx.channel_id().get(),
        "question accepted"
    );

    let user_turn = pending.user_turn.clone();
    let thinking = format!(
        "{}\n\n{}",
        render::turn(&user_turn),
        render::turn(&pending.placeholder)
    );
    // The placeholder must be completed even if Discord refused the message.
    let reply = ctx.say(render::fit(&thinking)).await;

    let top_k = ctx.data().query_config.read().await.top_k;
    let resolved = conversation.complete(pending, top_k).await;

    let text = render::fit(&format!(
        "{}\n\n{}",
        render::turn(&user_turn),
        render::turn(&resolved)
    ));
    match reply {
        Ok(handle) => {
            handle
                .edit(ctx, CreateReply::default().content(text))
                .await?;
        }
        Err(e) => {
            warn!(error = %e, "placeholder message was not posted");
            ctx.say(text).await?;
        }
    }
    Ok(())
}

/// Show this channel's conversation so far
#[poise::command(slash_command, guild_only)]
pub async fn transcript(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    let conversation = ctx.data().conversations.get(ctx.channel_id().get()).await;
    let turns = conversation.turns().await;

    let text = render::transcript(&turns);
    for piece in render::split(&text) {
        ctx.say(piece).await?;
    }
    Ok(())
}
