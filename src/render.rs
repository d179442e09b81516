//! Discord text for turns, documents and health.

use crate::chat::{ChatTurn, Role};
use crate::docs::types::{DocKind, DocumentRecord, OutcomeKind, UploadOutcome};
use crate::docs::RegistrySnapshot;
use crate::health::HealthSnapshot;

/// Discord rejects messages over 2000 chars; leave room for markup.
pub const MESSAGE_LIMIT: usize = 1990;

pub fn turn(turn: &ChatTurn) -> String {
    match turn.role {
        Role::User => format!("👤 **You:** {}", turn.content),
        Role::Assistant if turn.pending => "🤖 _Thinking…_".to_string(),
        Role::Assistant => {
            let mut out = format!("🤖 {}", turn.content);
            if let Some(sources) = turn.sources.as_ref().filter(|s| !s.is_empty()) {
                out.push_str("\n\n📎 **Sources:**\n");
                for source in sources {
                    out.push_str(&format!(
                        "- `{}` — {}% match\n",
                        source.filename,
                        (source.score * 100.0).round() as i64
                    ));
                }
            }
            out
        }
    }
}

pub fn transcript(turns: &[ChatTurn]) -> String {
    if turns.is_empty() {
        return "Nothing asked in this channel yet.".to_string();
    }
    turns.iter().map(turn).collect::<Vec<_>>().join("\n\n")
}

fn doc_icon(filename: &str) -> &'static str {
    match DocKind::of(filename) {
        DocKind::Pdf => "📕",
        DocKind::Word => "📘",
        DocKind::Text => "📝",
    }
}

pub fn document(doc: &DocumentRecord, deleting: bool) -> String {
    let mut line = format!(
        "{} **{}** ({} chunks) — `{}`",
        doc_icon(&doc.filename),
        doc.filename,
        doc.num_chunks,
        doc.doc_id
    );
    if let Some(at) = &doc.upload_time {
        line.push_str(&format!(" · {}", at));
    }
    if deleting {
        line.push_str(" ⏳ deleting");
    }
    line
}

pub fn library(registry: &RegistrySnapshot) -> String {
    let mut out = format!("📚 **Documents** [{}]\n", registry.documents.len());
    if registry.loading && registry.documents.is_empty() {
        out.push_str("_Loading…_\n");
    } else if registry.documents.is_empty() {
        out.push_str("No documents uploaded yet. Use `/docent upload` to add some.\n");
    } else {
        for doc in &registry.documents {
            out.push_str("- ");
            out.push_str(&document(doc, registry.deleting.contains(&doc.doc_id)));
            out.push('\n');
        }
    }
    out
}

pub fn upload_outcome(outcome: &UploadOutcome) -> String {
    let icon = match outcome.kind {
        OutcomeKind::Success => "✅",
        OutcomeKind::Error => "❌",
    };
    format!("{} {}", icon, outcome.message)
}

fn indicator(up: bool) -> &'static str {
    if up {
        "🟢"
    } else {
        "⚫"
    }
}

pub fn health(snapshot: Option<&HealthSnapshot>) -> String {
    let Some(h) = snapshot else {
        return "Status unknown: no health probe has completed yet.".to_string();
    };

    let mut out = format!(
        "{} Backend · {} Ollama · **{}** documents · **{}** chunks\n_Checked {}_",
        indicator(h.backend_up),
        indicator(h.collaborator_up),
        h.total_documents,
        h.total_chunks,
        h.checked_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(err) = &h.error {
        out.push_str(&format!("\n⚠️ {}", err));
    }
    out
}

/// Short status line for the bot presence.
pub fn presence(h: &HealthSnapshot) -> String {
    if !h.backend_up {
        "Backend offline".to_string()
    } else if !h.collaborator_up {
        "Ollama offline".to_string()
    } else {
        format!("{} docs · {} chunks", h.total_documents, h.total_chunks)
    }
}

/// Cut `text` to one message, on a char boundary, marking the cut.
pub fn fit(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        return text.to_string();
    }
    let mut end = MESSAGE_LIMIT - '…'.len_utf8();
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

/// Split `text` into Discord-sized pieces, preferring line then word breaks.
pub fn split(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let mut limit = remaining.len().min(MESSAGE_LIMIT);
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        let split_at = if limit < remaining.len() {
            remaining[..limit]
                .rfind('\n')
                .or_else(|| remaining[..limit].rfind(' '))
                .map(|i| i + 1)
                .unwrap_or(limit)
        } else {
            limit
        };
        pieces.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    pieces
}
