use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use log::{debug, warn};
use uuid::Uuid;

use crate::api::backend::Backend;
use crate::api::models::{Delivery, Message, OutgoingMessage, Session};
use crate::error::{ClientError, Result};

/// A send that has been appended locally but not yet accepted by the backend.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub chat_id: String,
    pub correlation: Uuid,
    pub payload: OutgoingMessage,
}

/// Checks a draft before anything is appended or sent. Returns the chat the
/// message is for.
pub fn validate_outgoing<'a>(text: &str, selected: Option<&'a str>) -> Result<&'a str> {
    let chat_id = selected.ok_or_else(|| ClientError::validation("Select a chat first."))?;
    if text.trim().is_empty() {
        return Err(ClientError::validation("Message is empty."));
    }
    Ok(chat_id)
}

/// Messages of the selected chat, oldest first.
///
/// Local sends stay in the thread until a backend snapshot contains them.
/// Each records how many messages with the same sender and text the thread
/// already held when it was appended; a snapshot holding more than that
/// includes the send.
#[derive(Debug, Default)]
pub struct Thread {
    messages: Vec<Message>,
    seen_before: HashMap<Uuid, usize>,
}

fn same_content(a: &Message, b: &Message) -> bool {
    a.sender_id == b.sender_id && a.text == b.text
}

impl Thread {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.seen_before.clear();
    }

    pub fn append_pending(&mut self, session: &Session, chat_id: &str, text: &str) -> PendingSend {
        let correlation = Uuid::new_v4();
        let message = Message {
            sender_id: session.user_id.clone(),
            sender_name: session.username.clone(),
            text: text.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            delivery: Delivery::Pending(correlation),
        };
        let before = self.messages.iter().filter(|m| same_content(m, &message)).count();
        self.seen_before.insert(correlation, before);
        self.messages.push(message);
        PendingSend {
            chat_id: chat_id.to_string(),
            correlation,
            payload: OutgoingMessage {
                sender_id: session.user_id.clone(),
                sender: session.username.clone(),
                text: text.to_string(),
            },
        }
    }

    /// Replaces the backend part of the thread with `snapshot`. Local sends
    /// the snapshot already contains are dropped; the rest follow it in
    /// their original order.
    pub fn apply_snapshot(&mut self, mut snapshot: Vec<Message>) {
        let local: Vec<Message> = self.messages.drain(..).filter(|m| m.correlation().is_some()).collect();
        let mut kept = Vec::new();
        for message in local {
            let Some(correlation) = message.correlation() else {
                continue;
            };
            let before = self.seen_before.get(&correlation).copied().unwrap_or(0);
            let on_backend = snapshot.iter().filter(|m| same_content(m, &message)).count();
            if on_backend > before {
                debug!("send {} is in the snapshot, dropping local copy", correlation);
                self.seen_before.remove(&correlation);
            } else {
                kept.push(message);
            }
        }
        snapshot.extend(kept);
        self.messages = snapshot;
    }

    /// Drops everything except local sends, after a failed load.
    pub fn keep_local(&mut self) {
        self.messages.retain(|m| m.correlation().is_some());
    }

    fn position(&self, correlation: Uuid) -> Option<usize> {
        self.messages.iter().position(|m| m.correlation() == Some(correlation))
    }

    /// Marks the send as accepted. False if it is no longer in this thread.
    pub fn confirm(&mut self, correlation: Uuid) -> bool {
        match self.position(correlation) {
            Some(idx) => {
                self.messages[idx].delivery = Delivery::Sent(correlation);
                true
            }
            None => false,
        }
    }

    /// Removes the local copy after a failed send.
    pub fn rollback(&mut self, correlation: Uuid) -> bool {
        self.seen_before.remove(&correlation);
        match self.position(correlation) {
            Some(idx) => {
                self.messages.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// No selection means no request and an empty thread.
pub async fn load_messages(backend: &dyn Backend, chat_id: Option<&str>) -> Result<Vec<Message>> {
    let Some(chat_id) = chat_id else {
        return Ok(Vec::new());
    };
    let wire = backend.messages(chat_id).await?;
    debug!("loaded {} messages for chat {}", wire.len(), chat_id);
    Ok(wire.into_iter().map(Message::from).collect())
}

pub async fn post_message(backend: &dyn Backend, pending: &PendingSend) -> Result<()> {
    backend
        .send_message(&pending.chat_id, &pending.payload)
        .await
        .inspect_err(|err| warn!("send to chat {} failed: {}", pending.chat_id, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_copy(sender: &str, text: &str) -> Message {
        Message {
            sender_id: sender.into(),
            sender_name: sender.into(),
            text: text.into(),
            timestamp: "2024-03-01T10:00:00".into(),
            delivery: Delivery::Delivered,
        }
    }

    fn texts(thread: &Thread) -> Vec<&str> {
        thread.messages().iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn validation_rejects_blank_text_and_missing_chat() {
        assert!(matches!(validate_outgoing("hi", None), Err(ClientError::Validation(_))));
        assert!(matches!(validate_outgoing(" \t\n", Some("c1")), Err(ClientError::Validation(_))));
        assert_eq!(validate_outgoing(" hi ", Some("c1")).unwrap(), "c1");
    }

    #[test]
    fn pending_message_can_be_confirmed_once() {
        let mut thread = Thread::default();
        let session = Session::new("u1", "alice");
        let pending = thread.append_pending(&session, "c1", "hello");
        assert_eq!(thread.messages().len(), 1);
        assert!(thread.messages()[0].is_pending());
        assert_eq!(pending.payload.sender, "alice");

        assert!(thread.confirm(pending.correlation));
        assert_eq!(thread.messages()[0].delivery, Delivery::Sent(pending.correlation));
        assert!(!thread.messages()[0].is_pending());
    }

    #[test]
    fn rollback_removes_only_the_failed_send() {
        let mut thread = Thread::default();
        let session = Session::new("u1", "alice");
        let first = thread.append_pending(&session, "c1", "one");
        let second = thread.append_pending(&session, "c1", "two");
        assert!(thread.rollback(first.correlation));
        assert_eq!(texts(&thread), ["two"]);
        assert!(thread.confirm(second.correlation));
        assert!(!thread.rollback(first.correlation));
    }

    #[test]
    fn snapshot_containing_the_send_replaces_local_copy() {
        let mut thread = Thread::default();
        let pending = thread.append_pending(&Session::new("u1", "alice"), "c1", "x");

        thread.apply_snapshot(vec![backend_copy("u2", "hi"), backend_copy("u1", "x")]);

        assert_eq!(texts(&thread), ["hi", "x"]);
        assert_eq!(thread.messages()[1].delivery, Delivery::Delivered);
        assert!(!thread.confirm(pending.correlation));
    }

    #[test]
    fn older_snapshot_keeps_confirmed_send() {
        let mut thread = Thread::default();
        let pending = thread.append_pending(&Session::new("u1", "alice"), "c1", "x");
        thread.confirm(pending.correlation);

        thread.apply_snapshot(vec![backend_copy("u2", "hi")]);

        assert_eq!(texts(&thread), ["hi", "x"]);
        assert_eq!(thread.messages()[1].delivery, Delivery::Sent(pending.correlation));
    }

    #[test]
    fn repeated_text_needs_a_new_backend_copy() {
        let mut thread = Thread::default();
        thread.apply_snapshot(vec![backend_copy("u1", "ok")]);
        let pending = thread.append_pending(&Session::new("u1", "alice"), "c1", "ok");

        thread.apply_snapshot(vec![backend_copy("u1", "ok")]);
        assert_eq!(thread.messages().len(), 2);
        assert_eq!(thread.messages()[1].correlation(), Some(pending.correlation));

        thread.apply_snapshot(vec![backend_copy("u1", "ok"), backend_copy("u1", "ok")]);
        assert_eq!(thread.messages().len(), 2);
        assert!(thread.messages().iter().all(|m| m.correlation().is_none()));
    }

    #[test]
    fn failed_load_keeps_only_local_sends() {
        let mut thread = Thread::default();
        thread.apply_snapshot(vec![backend_copy("u2", "hi")]);
        thread.append_pending(&Session::new("u1", "alice"), "c1", "x");

        thread.keep_local();

        assert_eq!(texts(&thread), ["x"]);
    }
}
