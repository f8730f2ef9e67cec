use crate::api::models::{Contact, Message};
use crate::chat::markup::expand_ansi;

pub struct ChatView;

impl ChatView {
    pub fn header(contact: Option<&Contact>) -> String {
        match contact {
            Some(c) => format!("== {} [{}] ==", c.display_name, c.profile_photo),
            None => "== no chat selected ==".to_string(),
        }
    }

    pub fn line(message: &Message, own: bool) -> String {
        let who = if own { "you" } else { message.sender_name.as_str() };
        let mut line = format!("{:>12}: {}", who, expand_ansi(&message.text));
        if message.is_pending() {
            line.push_str("  (sending...)");
        }
        line
    }

    /// Whole thread, oldest first. `is_own` decides which side a message is from.
    pub fn render<F>(contact: Option<&Contact>, messages: &[Message], loading: bool, is_own: F) -> String
    where
        F: Fn(&Message) -> bool,
    {
        let mut out = Self::header(contact);
        out.push('\n');
        if loading {
            out.push_str("  loading...\n");
        } else if messages.is_empty() {
            out.push_str("  no messages yet\n");
        }
        for message in messages {
            out.push_str(&Self::line(message, is_own(message)));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Delivery;
    use uuid::Uuid;

    fn message(sender: &str, text: &str, delivery: Delivery) -> Message {
        Message {
            sender_id: sender.into(),
            sender_name: sender.into(),
            text: text.into(),
            timestamp: String::new(),
            delivery,
        }
    }

    #[test]
    fn own_and_pending_messages_are_marked() {
        let m = message("alice", "hi", Delivery::Pending(Uuid::new_v4()));
        assert_eq!(ChatView::line(&m, true), "         you: hi  (sending...)");
    }

    #[test]
    fn markup_is_rendered() {
        let m = message("bob", "**hey**", Delivery::Delivered);
        assert!(ChatView::line(&m, false).ends_with("bob: \x1b[1mhey\x1b[22m"));
    }

    #[test]
    fn empty_thread_placeholder() {
        let text = ChatView::render(None, &[], false, |_| false);
        assert_eq!(text, "== no chat selected ==\n  no messages yet\n");
    }
}
