use async_trait::async_trait;
use serde_json::Value;

use crate::api::models::{
    LoginRequest, LoginResponse, NewChatRequest, NewChatResponse, OutgoingMessage, Profile,
    RawChat, SignupRequest, SignupResponse, StatusMessage, WireMessage,
};
use crate::error::Result;

/// The REST surface of the messenger backend.
///
/// [`crate::api::client::ApiClient`] talks to a real server; tests plug in
/// an in-memory implementation.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Attach (or drop) the bearer token used on subsequent requests.
    fn set_token(&self, _token: Option<String>) {}

    async fn ping(&self) -> Result<Value>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse>;

    async fn profile(&self, user_id: &str) -> Result<Profile>;

    async fn update_username(&self, user_id: &str, new_username: &str) -> Result<StatusMessage>;

    async fn update_password(&self, user_id: &str, new_password: &str) -> Result<StatusMessage>;

    async fn contacts(&self, user_id: &str) -> Result<Vec<RawChat>>;

    async fn messages(&self, chat_id: &str) -> Result<Vec<WireMessage>>;

    async fn send_message(&self, chat_id: &str, message: &OutgoingMessage) -> Result<()>;

    async fn new_chat(&self, request: &NewChatRequest) -> Result<NewChatResponse>;

    async fn delete_participant(&self, user_id: &str, chat_id: &str) -> Result<StatusMessage>;
}
