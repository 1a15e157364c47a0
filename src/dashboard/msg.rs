use uuid::Uuid;

use crate::{genai::{PromptTemplate, TextGenerator}, include_res, res::escape_html, store::{Message, MessageStore, NewMessage, Sender}, AppResult, Markdown};

/// The two records one chat send leaves behind.
#[derive(Debug)]
pub struct Exchange {
    pub question: Message,
    pub reply: Message,
}

/// Persists `text` as the user's message, asks the generator, and persists
/// whatever comes back as the "ai" reply. A failed generation still yields a
/// reply: the template's fallback text. Blank input is ignored.
pub async fn send_prompt(
    store: &dyn MessageStore,
    generator: &dyn TextGenerator,
    prompts: &PromptTemplate,
    owner: &str,
    text: &str,
    client_id: Option<Uuid>,
) -> AppResult<Option<Exchange>> {
    if text.trim().is_empty() || owner.is_empty() {
        return Ok(None);
    }

    let question = store.append(owner, NewMessage::user(text, client_id)).await?;

    let reply_text = match generator.generate(&prompts.build(text)).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!(%owner, error = %err, "generation failed, sending fallback reply");
            prompts.fallback_reply.clone()
        }
    };

    let reply = store.append(owner, NewMessage::ai(reply_text, client_id)).await?;
    Ok(Some(Exchange { question, reply }))
}

pub(crate) fn msg_to_html(message: &Message) -> String {
    let content_html = match message.sender {
        Sender::User => escape_html(&message.text),
        Sender::Ai => Markdown(message.text.as_str()).to_html(),
    };

    include_res!(str, "/pages/dashboard/message.html")
        .replace("{sender}", message.sender.as_str())
        .replace("{id}", &message.id.to_string())
        .replace("{client_id}", &message.client_id.map(|id| id.to_string()).unwrap_or_default())
        .replace("{content}", &content_html)
}
