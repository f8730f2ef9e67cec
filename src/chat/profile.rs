use log::info;

use crate::api::backend::Backend;
use crate::api::models::{NewChatRequest, Session};
use crate::error::{ClientError, Result};

fn message_or(status: Option<String>, fallback: &str) -> String {
    status.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| fallback.to_string())
}

pub async fn update_username(backend: &dyn Backend, session: &Session, new_username: &str) -> Result<String> {
    let new_username = new_username.trim();
    if new_username.is_empty() {
        return Err(ClientError::validation("Username cannot be empty."));
    }
    let status = backend.update_username(&session.user_id, new_username).await?;
    info!("username changed from {} to {}", session.username, new_username);
    Ok(message_or(status.message, "Username updated."))
}

pub async fn update_password(
    backend: &dyn Backend,
    session: &Session,
    new_password: &str,
    confirm: &str,
) -> Result<String> {
    if new_password.is_empty() {
        return Err(ClientError::validation("Password cannot be empty."));
    }
    if new_password != confirm {
        return Err(ClientError::validation("Passwords do not match!"));
    }
    let status = backend.update_password(&session.user_id, new_password).await?;
    Ok(message_or(status.message, "Password updated."))
}

/// Splits a comma-separated list of usernames or emails, dropping blanks,
/// duplicates and the current user.
pub fn parse_targets(input: &str, session: &Session) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for target in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if target.eq_ignore_ascii_case(&session.username) {
            continue;
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(target)) {
            out.push(target.to_string());
        }
    }
    out
}

/// Returns the usernames the backend created the chat with.
pub async fn create_chat(backend: &dyn Backend, session: &Session, targets: Vec<String>) -> Result<Vec<String>> {
    if targets.is_empty() {
        return Err(ClientError::validation("Enter at least one username or email."));
    }
    let request = NewChatRequest {
        current_user_id: session.user_id.clone(),
        current_username: session.username.clone(),
        targets,
    };
    let resp = backend.new_chat(&request).await?;
    info!("created chat with {:?}", resp.created_with);
    Ok(resp.created_with)
}

/// Removes the current user from the chat; other members keep it.
pub async fn leave_chat(backend: &dyn Backend, session: &Session, chat_id: &str) -> Result<String> {
    let status = backend.delete_participant(&session.user_id, chat_id).await?;
    info!("left chat {}", chat_id);
    Ok(message_or(status.message, "Chat deleted."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_trimmed_deduplicated_and_exclude_self() {
        let me = Session::new("u1", "alice");
        assert_eq!(
            parse_targets(" bob , carol@example.com,, Bob, ALICE ", &me),
            vec!["bob".to_string(), "carol@example.com".to_string()]
        );
        assert!(parse_targets(" , ", &me).is_empty());
    }

    #[test]
    fn blank_backend_message_uses_fallback() {
        assert_eq!(message_or(Some("  ".into()), "ok"), "ok");
        assert_eq!(message_or(Some("done".into()), "ok"), "done");
        assert_eq!(message_or(None, "ok"), "ok");
    }
}
