use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::Reply,
    Result,
};

/// Outbound side of the transport.
///
/// Implementations map "content unchanged" edit failures onto
/// `Error::MessageNotModified` so callers can ignore them.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageRef>;
    async fn edit_reply(&self, msg: MessageRef, reply: &Reply) -> Result<()>;

    /// Plain text, no markup and no keyboard.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// Stop the client-side loading indicator for a button press.
    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
