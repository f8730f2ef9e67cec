use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Backends disagree on whether ids are strings or integers.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

/// Display-ready projection of a backend chat record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub chat_id: String,
    pub display_name: String,
    pub profile_photo: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Part of a thread snapshot from the backend.
    Delivered,
    /// Appended locally, waiting for the backend to accept it.
    Pending(Uuid),
    /// Accepted by the backend but not yet seen in a thread snapshot.
    Sent(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub timestamp: String,
    pub delivery: Delivery,
}

impl Message {
    pub fn is_pending(&self) -> bool {
        matches!(self.delivery, Delivery::Pending(_))
    }

    /// Correlation id of a locally sent message; `None` for backend copies.
    pub fn correlation(&self) -> Option<Uuid> {
        match self.delivery {
            Delivery::Pending(id) | Delivery::Sent(id) => Some(id),
            Delivery::Delivered => None,
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        Self {
            sender_id: wire.sender_id,
            sender_name: wire.sender,
            text: wire.text,
            timestamp: wire.timestamp,
            delivery: Delivery::Delivered,
        }
    }
}

// Requests
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateUsernameRequest {
    pub user_id: String,
    pub new_username: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatePasswordRequest {
    pub user_id: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMessage {
    pub sender_id: String,
    pub sender: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct NewChatRequest {
    #[serde(rename = "currentUserId")]
    pub current_user_id: String,
    #[serde(rename = "currentUsername")]
    pub current_username: String,
    pub targets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteParticipantRequest {
    pub user_id: String,
    pub chat_id: String,
}

// Responses
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(rename = "profilePhoto", default)]
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParticipant {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub username: String,
    #[serde(rename = "profilePhoto", default)]
    pub profile_photo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChat {
    #[serde(deserialize_with = "id_string")]
    pub chat_id: String,
    #[serde(default)]
    pub participants: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
pub struct ContactsResponse {
    #[serde(default)]
    pub contacts: Vec<RawChat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    #[serde(deserialize_with = "id_string")]
    pub sender_id: String,
    #[serde(default)]
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChatResponse {
    #[serde(default)]
    pub created_with: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusMessage {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contacts_accept_numeric_ids_and_missing_photos() {
        let body = r#"{"contacts":[{"chat_id":7,"participants":[
            {"id":1,"username":"alice"},
            {"id":"u2","username":"bob","profilePhoto":"bob.png"}]}]}"#;
        let parsed: ContactsResponse = serde_json::from_str(body).unwrap();
        let chat = &parsed.contacts[0];
        assert_eq!(chat.chat_id, "7");
        assert_eq!(chat.participants[0].id, "1");
        assert_eq!(chat.participants[0].profile_photo, None);
        assert_eq!(chat.participants[1].profile_photo.as_deref(), Some("bob.png"));
    }

    #[test]
    fn login_response_without_token() {
        let parsed: LoginResponse =
            serde_json::from_str(r#"{"user_id":"u1","username":"alice"}"#).unwrap();
        assert_eq!(parsed.user_id, "u1");
        assert_eq!(parsed.username.as_deref(), Some("alice"));
        assert!(parsed.token.is_none());
    }

    #[test]
    fn new_chat_request_uses_camel_case_keys() {
        let req = NewChatRequest {
            current_user_id: "u1".into(),
            current_username: "alice".into(),
            targets: vec!["bob".into()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["currentUserId"], "u1");
        assert_eq!(json["currentUsername"], "alice");
        assert_eq!(json["targets"][0], "bob");
    }

    #[test]
    fn wire_message_becomes_delivered() {
        let wire: WireMessage = serde_json::from_str(
            r#"{"sender_id":"u2","sender":"bob","text":"hi","timestamp":"2024-03-01T10:00:00"}"#,
        )
        .unwrap();
        let msg = Message::from(wire);
        assert_eq!(msg.sender_name, "bob");
        assert_eq!(msg.delivery, Delivery::Delivered);
        assert!(!msg.is_pending());
    }
}
