#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

use carrier_client::api::backend::Backend;
use carrier_client::api::models::{
    LoginRequest, LoginResponse, NewChatRequest, NewChatResponse, OutgoingMessage, Profile,
    RawChat, RawParticipant, SignupRequest, SignupResponse, StatusMessage, WireMessage,
};
use carrier_client::chat::Event;
use carrier_client::error::{ClientError, Result};
use carrier_client::storage::SessionStore;

pub const DEFAULT_PHOTO: &str = "default.png";

struct User {
    id: String,
    password: String,
}

/// In-memory stand-in for the messenger backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    users: Mutex<HashMap<String, User>>,
    chats: Mutex<Vec<RawChat>>,
    threads: Mutex<HashMap<String, Vec<WireMessage>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    token: Mutex<Option<String>>,
    pub fail_sends: AtomicBool,
    pub fail_contacts: AtomicBool,
    pub fail_messages: AtomicBool,
}

fn not_ok(status: u16, message: &str) -> ClientError {
    ClientError::Backend {
        status,
        message: message.to_string(),
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_user(&self, id: &str, username: &str, password: &str) -> &Self {
        self.users.lock().unwrap().insert(
            username.to_string(),
            User {
                id: id.to_string(),
                password: password.to_string(),
            },
        );
        self
    }

    pub fn with_chat(&self, chat_id: &str, members: &[(&str, &str)]) -> &Self {
        self.chats.lock().unwrap().push(RawChat {
            chat_id: chat_id.to_string(),
            participants: members
                .iter()
                .map(|(id, name)| RawParticipant {
                    id: id.to_string(),
                    username: name.to_string(),
                    profile_photo: None,
                })
                .collect(),
        });
        self
    }

    pub fn with_message(&self, chat_id: &str, sender_id: &str, sender: &str, text: &str) -> &Self {
        self.threads
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push(WireMessage {
                sender_id: sender_id.to_string(),
                sender: sender.to_string(),
                text: text.to_string(),
                timestamp: "2024-03-01T10:00:00".to_string(),
            });
        self
    }

    /// Holds message loads for `chat_id` until the returned handle is notified.
    pub fn gate(&self, chat_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(chat_id.to_string(), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn ping(&self) -> Result<Value> {
        self.record("ping".into());
        Ok(json!({"status": "ok"}))
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.record(format!("login {}", request.username));
        let users = self.users.lock().unwrap();
        match users.get(&request.username) {
            Some(user) if user.password == request.password => Ok(LoginResponse {
                token: Some(format!("tok-{}", user.id)),
                user_id: user.id.clone(),
                username: Some(request.username.clone()),
            }),
            _ => Err(not_ok(401, "Invalid credentials")),
        }
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        self.record(format!("signup {}", request.username));
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&request.username) {
            return Err(not_ok(409, "Username already exists"));
        }
        let id = format!("u{}", users.len() + 1);
        users.insert(
            request.username.clone(),
            User {
                id: id.clone(),
                password: request.password.clone(),
            },
        );
        Ok(SignupResponse {
            token: Some(format!("tok-{}", id)),
            user_id: id,
        })
    }

    async fn profile(&self, user_id: &str) -> Result<Profile> {
        self.record(format!("profile {}", user_id));
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|(_, u)| u.id == user_id)
            .map(|(name, _)| Profile {
                username: name.clone(),
                profile_photo: None,
            })
            .ok_or_else(|| not_ok(404, "User not found"))
    }

    async fn update_username(&self, user_id: &str, new_username: &str) -> Result<StatusMessage> {
        self.record(format!("update-username {} {}", user_id, new_username));
        if self.users.lock().unwrap().contains_key(new_username) {
            return Err(not_ok(409, "Username already taken"));
        }
        Ok(StatusMessage {
            message: Some("Username updated successfully".into()),
        })
    }

    async fn update_password(&self, user_id: &str, _new_password: &str) -> Result<StatusMessage> {
        self.record(format!("update-password {}", user_id));
        Ok(StatusMessage::default())
    }

    async fn contacts(&self, user_id: &str) -> Result<Vec<RawChat>> {
        self.record(format!("contacts {}", user_id));
        if self.fail_contacts.load(Ordering::SeqCst) {
            return Err(ClientError::Transport("connection refused".into()));
        }
        let chats = self.chats.lock().unwrap();
        Ok(chats
            .iter()
            .filter(|c| c.participants.iter().any(|p| p.id == user_id))
            .cloned()
            .collect())
    }

    async fn messages(&self, chat_id: &str) -> Result<Vec<WireMessage>> {
        self.record(format!("messages {}", chat_id));
        let gate = self.gates.lock().unwrap().get(chat_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_messages.load(Ordering::SeqCst) {
            return Err(not_ok(503, "Service unavailable"));
        }
        Ok(self.threads.lock().unwrap().get(chat_id).cloned().unwrap_or_default())
    }

    async fn send_message(&self, chat_id: &str, message: &OutgoingMessage) -> Result<()> {
        self.record(format!("send {} {}", chat_id, message.text));
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(not_ok(400, "Missing fields"));
        }
        self.threads
            .lock()
            .unwrap()
            .entry(chat_id.to_string())
            .or_default()
            .push(WireMessage {
                sender_id: message.sender_id.clone(),
                sender: message.sender.clone(),
                text: message.text.clone(),
                timestamp: "2024-03-01T10:05:00".to_string(),
            });
        Ok(())
    }

    async fn new_chat(&self, request: &NewChatRequest) -> Result<NewChatResponse> {
        self.record(format!("new-chat {}", request.targets.join(",")));
        let mut chats = self.chats.lock().unwrap();
        let chat_id = format!("c{}", chats.len() + 100);
        let mut participants = vec![RawParticipant {
            id: request.current_user_id.clone(),
            username: request.current_username.clone(),
            profile_photo: None,
        }];
        participants.extend(request.targets.iter().map(|t| RawParticipant {
            id: format!("id-{}", t),
            username: t.clone(),
            profile_photo: None,
        }));
        chats.push(RawChat { chat_id, participants });
        Ok(NewChatResponse {
            created_with: request.targets.clone(),
        })
    }

    async fn delete_participant(&self, user_id: &str, chat_id: &str) -> Result<StatusMessage> {
        self.record(format!("delete-participant {} {}", user_id, chat_id));
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .iter_mut()
            .find(|c| c.chat_id == chat_id)
            .ok_or_else(|| not_ok(404, "Chat not found"))?;
        chat.participants.retain(|p| p.id != user_id);
        Ok(StatusMessage {
            message: Some("Participant removed".into()),
        })
    }
}

pub fn temp_store() -> (tempfile::TempDir, SessionStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SessionStore::open(dir.path().join("session.sqlite")).expect("session store");
    (dir, store)
}

pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
