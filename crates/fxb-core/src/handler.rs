//! Turns incoming updates into delivered replies.
//!
//! Button presses are acknowledged exactly once, before rendering, so the
//! client-side spinner stops even when delivery later fails. Edits that the
//! transport rejects as "not modified" are not faults.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    domain::ChatId,
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, CommandMessage, IncomingUpdate, Reply},
    },
    router::{Event, Request, Router},
    views, Error, Result,
};

pub struct UpdateHandler {
    router: Arc<Router>,
    messenger: Arc<dyn MessagingPort>,
}

impl UpdateHandler {
    pub fn new(router: Arc<Router>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self { router, messenger }
    }

    /// Top of the dispatch loop: never fails, never panics on delivery errors.
    ///
    /// Faults are logged with context and answered with a generic message
    /// when a chat is known.
    pub async fn handle_update(&self, update: IncomingUpdate) {
        let (kind, chat_id, user_id) = match &update {
            IncomingUpdate::Command(m) => ("command", Some(m.chat_id), m.user_id),
            IncomingUpdate::Callback(q) => ("callback", q.chat_id, q.user_id),
        };

        let result = match update {
            IncomingUpdate::Command(m) => self.handle_command(m).await,
            IncomingUpdate::Callback(q) => self.handle_callback(q).await,
        };

        let Err(err) = result else {
            return;
        };

        error!(
            kind,
            chat_id = chat_id.map(|c| c.0),
            user_id = user_id.0,
            error = %err,
            "Update handling failed"
        );

        if let Some(chat_id) = chat_id {
            if let Err(e) = self.messenger.send_text(chat_id, views::INTERNAL_ERROR).await {
                warn!(chat_id = chat_id.0, error = %e, "Failed to send error notice");
            }
        }
    }

    async fn handle_command(&self, m: CommandMessage) -> Result<()> {
        let req = Request {
            user_id: m.user_id,
            username: m.username,
            first_name: m.first_name,
            event: Event::Command(m.command),
        };
        let reply = self.router.dispatch(&req).await;
        self.messenger.send_reply(m.chat_id, &reply).await?;
        Ok(())
    }

    async fn handle_callback(&self, q: CallbackQuery) -> Result<()> {
        // Acknowledge first and only once, whatever happens next.
        if let Err(e) = self.messenger.answer_callback_query(&q.callback_id, None).await {
            warn!(callback_id = %q.callback_id, error = %e, "Failed to answer callback query");
        }

        let req = Request {
            user_id: q.user_id,
            username: q.username,
            first_name: q.first_name,
            event: Event::Selection(q.data),
        };
        let reply = self.router.dispatch(&req).await;

        match (q.message, q.chat_id) {
            (Some(msg), _) => match self.messenger.edit_reply(msg, &reply).await {
                Ok(()) => Ok(()),
                Err(Error::MessageNotModified) => {
                    debug!(chat_id = msg.chat_id.0, "Menu already shows this content");
                    Ok(())
                }
                Err(e) => {
                    warn!(chat_id = msg.chat_id.0, error = %e, "Failed to update menu message");
                    Ok(())
                }
            },
            (None, Some(chat_id)) => self.send_fallback(chat_id, &reply).await,
            (None, None) => {
                debug!("Callback without a message or chat; nothing to render");
                Ok(())
            }
        }
    }

    async fn send_fallback(&self, chat_id: ChatId, reply: &Reply) -> Result<()> {
        self.messenger.send_reply(chat_id, reply).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::{
        catalog::PairCatalog,
        commands::Command,
        domain::{MessageId, MessageRef, UserId},
        security::{AccessGate, RateLimitPolicy, RateLimitScope},
    };

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum EditFailure {
        None,
        NotModifiedWhenSame,
        Always,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Call {
        Send(i64, String),
        Edit(i32, String),
        Text(i64, String),
        Ack(String),
    }

    struct FakeMessenger {
        calls: StdMutex<Vec<Call>>,
        shown: StdMutex<Option<Reply>>,
        edit_failure: EditFailure,
        fail_sends: bool,
    }

    impl FakeMessenger {
        fn new(edit_failure: EditFailure, fail_sends: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: StdMutex::new(Vec::new()),
                shown: StdMutex::new(None),
                edit_failure,
                fail_sends,
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn acks(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Ack(_)))
                .count()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<MessageRef> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Send(chat_id.0, reply.html.clone()));
            if self.fail_sends {
                return Err(Error::External("send failed".to_string()));
            }
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }

        async fn edit_reply(&self, msg: MessageRef, reply: &Reply) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Edit(msg.message_id.0, reply.html.clone()));
            let mut shown = self.shown.lock().unwrap();
            match self.edit_failure {
                EditFailure::Always => Err(Error::External("edit failed".to_string())),
                EditFailure::NotModifiedWhenSame if shown.as_ref() == Some(reply) => {
                    Err(Error::MessageNotModified)
                }
                _ => {
                    *shown = Some(reply.clone());
                    Ok(())
                }
            }
        }

        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Text(chat_id.0, text.to_string()));
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(2),
            })
        }

        async fn answer_callback_query(&self, callback_id: &str, _text: Option<&str>) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Ack(callback_id.to_string()));
            Ok(())
        }
    }

    fn handler(messenger: Arc<FakeMessenger>, allowed: Vec<i64>) -> UpdateHandler {
        let router = Router::new(
            Arc::new(PairCatalog::reference()),
            AccessGate::new(allowed),
            RateLimitPolicy::default(),
            RateLimitScope::Entry,
        );
        UpdateHandler::new(Arc::new(router), messenger)
    }

    fn command(command: Command) -> IncomingUpdate {
        IncomingUpdate::Command(CommandMessage {
            chat_id: ChatId(100),
            user_id: UserId(1),
            username: Some("trader".to_string()),
            first_name: Some("Ann".to_string()),
            command,
        })
    }

    fn callback(data: &str, with_message: bool) -> IncomingUpdate {
        IncomingUpdate::Callback(CallbackQuery {
            chat_id: Some(ChatId(100)),
            user_id: UserId(1),
            username: None,
            first_name: None,
            callback_id: format!("cb-{data}"),
            data: data.to_string(),
            message: with_message.then_some(MessageRef {
                chat_id: ChatId(100),
                message_id: MessageId(55),
            }),
        })
    }

    #[tokio::test]
    async fn command_sends_exactly_one_reply() {
        let m = FakeMessenger::new(EditFailure::None, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(command(Command::Major)).await;

        let calls = m.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], Call::Send(100, html) if html.contains("Major Currency Pairs")));
    }

    #[tokio::test]
    async fn denied_command_gets_denial_text() {
        let m = FakeMessenger::new(EditFailure::None, false);
        let h = handler(m.clone(), vec![999]);
        h.handle_update(command(Command::Start)).await;

        assert_eq!(
            m.calls(),
            vec![Call::Send(100, views::ACCESS_DENIED.to_string())]
        );
    }

    #[tokio::test]
    async fn selection_is_acked_once_then_edited() {
        let m = FakeMessenger::new(EditFailure::None, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("minor", true)).await;

        let calls = m.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Ack("cb-minor".to_string()));
        assert!(matches!(&calls[1], Call::Edit(55, html) if html.contains("Minor Currency Pairs")));
    }

    #[tokio::test]
    async fn repeated_selection_swallows_not_modified() {
        let m = FakeMessenger::new(EditFailure::NotModifiedWhenSame, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("major", true)).await;
        h.handle_update(callback("major", true)).await;

        assert_eq!(m.acks(), 2);
        // No error notice was sent.
        assert!(!m.calls().iter().any(|c| matches!(c, Call::Text(..))));
    }

    #[tokio::test]
    async fn failed_edit_is_logged_not_escalated() {
        let m = FakeMessenger::new(EditFailure::Always, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("all", true)).await;

        assert_eq!(m.acks(), 1);
        assert!(!m.calls().iter().any(|c| matches!(c, Call::Text(..))));
    }

    #[tokio::test]
    async fn unknown_option_still_acked_once() {
        let m = FakeMessenger::new(EditFailure::None, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("nope", true)).await;

        assert_eq!(m.acks(), 1);
        assert!(matches!(&m.calls()[1], Call::Edit(55, html) if html == views::UNKNOWN_OPTION));
    }

    #[tokio::test]
    async fn empty_callback_data_is_answered_as_unknown_option() {
        let m = FakeMessenger::new(EditFailure::None, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("", true)).await;

        let calls = m.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], Call::Ack("cb-".to_string()));
        assert!(matches!(&calls[1], Call::Edit(55, html) if html == views::UNKNOWN_OPTION));
    }

    #[tokio::test]
    async fn callback_without_message_falls_back_to_send() {
        let m = FakeMessenger::new(EditFailure::None, false);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("back_to_menu", false)).await;

        let calls = m.calls();
        assert_eq!(calls[0], Call::Ack("cb-back_to_menu".to_string()));
        assert_eq!(calls[1], Call::Send(100, "Select a category:".to_string()));
    }

    #[tokio::test]
    async fn send_failure_is_answered_with_generic_error() {
        let m = FakeMessenger::new(EditFailure::None, true);
        let h = handler(m.clone(), vec![]);
        h.handle_update(command(Command::Help)).await;

        let calls = m.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], Call::Text(100, views::INTERNAL_ERROR.to_string()));
    }

    #[tokio::test]
    async fn failed_fallback_send_still_acked_once() {
        let m = FakeMessenger::new(EditFailure::None, true);
        let h = handler(m.clone(), vec![]);
        h.handle_update(callback("random", false)).await;

        assert_eq!(m.acks(), 1);
        assert_eq!(
            m.calls().last(),
            Some(&Call::Text(100, views::INTERNAL_ERROR.to_string()))
        );
    }
}
