mod ask;
mod config;
mod documents;
mod status;
mod upload;

pub use upload::on_attachment_drop;

use crate::state::Context;

/// Docent - document question answering over the shared library
#[poise::command(
    slash_command,
    subcommands(
        "ask::ask",
        "ask::transcript",
        "upload::upload",
        "documents::documents",
        "documents::delete",
        "status::status",
        "config::config"
    )
)]
pub async fn docent(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}
