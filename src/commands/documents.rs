use std::time::Duration;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use poise::CreateReply;
use tracing::warn;

use crate::docs::DeleteOutcome;
use crate::prompt::Prompter;
use crate::render;
use crate::state::Context;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// Confirmation via Delete/Cancel buttons on the invoking interaction.
struct ButtonPrompter<'a> {
    ctx: Context<'a>,
}

#[async_trait]
impl Prompter for ButtonPrompter<'_> {
    async fn confirm(&self, message: &str) -> bool {
        let ctx = self.ctx;
        let confirm_id = format!("{}-confirm", ctx.id());
        let cancel_id = format!("{}-cancel", ctx.id());

        let buttons = serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new(&confirm_id)
                .label("Delete")
                .style(serenity::ButtonStyle::Danger),
            serenity::CreateButton::new(&cancel_id)
                .label("Cancel")
                .style(serenity::ButtonStyle::Secondary),
        ]);
        let reply = CreateReply::default()
            .content(message)
            .components(vec![buttons]);
        let handle = match ctx.send(reply).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "could not ask for confirmation");
                return false;
            }
        };

        let prefix = ctx.id().to_string();
        let press = serenity::ComponentInteractionCollector::new(ctx.serenity_context())
            .author_id(ctx.author().id)
            .channel_id(ctx.channel_id())
            .timeout(CONFIRM_TIMEOUT)
            .filter(move |press| press.data.custom_id.starts_with(&prefix))
            .await;

        let approved = press
            .as_ref()
            .is_some_and(|p| p.data.custom_id == confirm_id);
        let verdict = if approved { "Deleting…" } else { "Delete cancelled." };

        let cleared = CreateReply::default()
            .content(format!("{}\n{}", message, verdict))
            .components(Vec::new());
        if let Some(press) = press {
            let ack = press
                .create_response(
                    ctx.serenity_context(),
                    serenity::CreateInteractionResponse::Acknowledge,
                )
                .await;
            if let Err(e) = ack {
                warn!(error = %e, "button press not acknowledged");
            }
        }
        if let Err(e) = handle.edit(ctx, cleared).await {
            warn!(error = %e, "could not clear confirmation buttons");
        }

        approved
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.ctx.say(message).await {
            warn!(error = %e, "could not deliver notice");
        }
    }
}

/// List the documents in the library
#[poise::command(slash_command, guild_only)]
pub async fn documents(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let registry = &ctx.data().registry;
    registry.refresh().await;
    let snapshot = registry.snapshot().await;

    let mut text = render::library(&snapshot);
    if let Some(outcome) = ctx.data().uploads.state().await.outcome {
        text.push_str(&format!("\nLast upload: {}", render::upload_outcome(&outcome)));
    }

    for piece in render::split(&text) {
        ctx.say(piece).await?;
    }
    Ok(())
}

/// Delete a document from the library
#[poise::command(slash_command, guild_only)]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Document to delete"]
    #[autocomplete = "autocomplete_document"]
    document: String,
) -> Result<(), anyhow::Error> {
    let registry = &ctx.data().registry;
    let known = registry
        .documents()
        .await
        .into_iter()
        .find(|d| d.doc_id == document || d.filename == document);

    let Some(doc) = known else {
        ctx.send(
            CreateReply::default()
                .content(format!("No document `{}` in the library.", document))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    let prompter = ButtonPrompter { ctx };
    match registry.delete(&doc.doc_id, &doc.filename, &prompter).await {
        DeleteOutcome::Deleted(ack) => {
            let removed = ack
                .chunks_removed
                .map(|n| format!(" ({} chunks removed)", n))
                .unwrap_or_default();
            ctx.say(format!("🗑️ Deleted **{}**{}", doc.filename, removed))
                .await?;
        }
        DeleteOutcome::InFlight => {
            ctx.send(
                CreateReply::default()
                    .content(format!("**{}** is already being deleted.", doc.filename))
                    .ephemeral(true),
            )
            .await?;
        }
        // Declines are shown on the prompt; failures were already notified.
        DeleteOutcome::Declined | DeleteOutcome::Failed(_) => {}
    }
    Ok(())
}

/// Autocomplete over the cached document list; the value sent is the doc id.
async fn autocomplete_document(
    ctx: Context<'_>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    let partial = partial.to_lowercase();
    ctx.data()
        .registry
        .documents()
        .await
        .into_iter()
        .filter(|d| d.filename.to_lowercase().contains(&partial))
        .take(25)
        .map(|d| serenity::AutocompleteChoice::new(d.filename, d.doc_id))
        .collect()
}
