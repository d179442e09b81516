use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::info;

use crate::docs::upload::SourceFile;
use crate::render;
use crate::state::{AppState, Context};

const BUSY: &str = "Another upload is still being processed. Try again in a moment.";

#[async_trait]
impl SourceFile for serenity::Attachment {
    fn filename(&self) -> &str {
        &self.filename
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(self.download().await?)
    }
}

/// Upload a document (PDF, TXT or DOCX) to the library
#[poise::command(slash_command, guild_only)]
pub async fn upload(
    ctx: Context<'_>,
    #[description = "PDF, TXT or DOCX file"] file: serenity::Attachment,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    info!(
        user = ctx.author().name,
        filename = file.filename,
        size = file.size,
        "upload requested"
    );

    let text = match ctx.data().uploads.handle_file(&file).await {
        Some(outcome) => render::upload_outcome(&outcome),
        None => BUSY.to_string(),
    };
    ctx.say(text).await?;
    Ok(())
}

/// Messages that mention the bot with attachments are treated as a file drop.
pub async fn on_attachment_drop(
    ctx: &serenity::Context,
    message: &serenity::Message,
    bot_id: serenity::UserId,
    data: &AppState,
) -> Result<()> {
    if message.author.bot
        || message.attachments.is_empty()
        || !message.mentions_user_id(bot_id)
    {
        return Ok(());
    }

    info!(
        user = message.author.name,
        attachments = message.attachments.len(),
        "files dropped"
    );

    let text = match data.uploads.handle_drop(&message.attachments).await {
        Some(outcome) => render::upload_outcome(&outcome),
        None => BUSY.to_string(),
    };
    message.reply(ctx, text).await?;
    Ok(())
}
