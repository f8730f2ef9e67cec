use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::api::backend::Backend;
use crate::api::models::{
    ContactsResponse, DeleteParticipantRequest, LoginRequest, LoginResponse, MessagesResponse,
    NewChatRequest, NewChatResponse, OutgoingMessage, Profile, RawChat, SignupRequest,
    SignupResponse, StatusMessage, UpdatePasswordRequest, UpdateUsernameRequest, WireMessage,
};
use crate::app::AppConfig;
use crate::error::{ClientError, Result};

pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
    token: RwLock<Option<String>>,
    get_retries: u32,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let base_url = Url::parse(&crate::utils::normalize_url(&config.base_url))
            .map_err(|e| ClientError::Config(format!("invalid base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!("base_url {} cannot hold paths", base_url)));
        }
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
            get_retries: config.get_retries,
        })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn with_auth(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.token.read().ok().and_then(|t| t.clone());
        if let Some(t) = token {
            req = req.header("Authorization", format!("Bearer {}", t));
        }
        req
    }

    async fn read_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::from_body(status.as_u16(), &text));
        }
        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// GETs are idempotent, so transport failures and 5xx responses get
    /// `get_retries` further attempts.
    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        let mut attempt = 0;
        loop {
            debug!("GET {}", url);
            let outcome = match self.with_auth(self.http.get(url.clone())).send().await {
                Ok(resp) => Self::read_body(resp).await,
                Err(e) => Err(e.into()),
            };
            match outcome {
                Err(err) if err.is_retryable() && attempt < self.get_retries => {
                    attempt += 1;
                    warn!("GET {} failed ({}), retrying", url, err);
                }
                other => return other,
            }
        }
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        debug!("POST {}", url);
        let resp = self.with_auth(self.http.post(url)).json(body).send().await?;
        Self::read_body(resp).await
    }
}

#[async_trait]
impl Backend for ApiClient {
    fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }

    async fn ping(&self) -> Result<Value> {
        self.get_json(&["user", "ping"]).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.post_json(&["user", "login"], request).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        self.post_json(&["user", "signup"], request).await
    }

    async fn profile(&self, user_id: &str) -> Result<Profile> {
        self.get_json(&["user", "profile", user_id]).await
    }

    async fn update_username(&self, user_id: &str, new_username: &str) -> Result<StatusMessage> {
        let body = UpdateUsernameRequest {
            user_id: user_id.to_string(),
            new_username: new_username.to_string(),
        };
        self.post_json(&["user", "update-username"], &body).await
    }

    async fn update_password(&self, user_id: &str, new_password: &str) -> Result<StatusMessage> {
        let body = UpdatePasswordRequest {
            user_id: user_id.to_string(),
            new_password: new_password.to_string(),
        };
        self.post_json(&["user", "update-password"], &body).await
    }

    async fn contacts(&self, user_id: &str) -> Result<Vec<RawChat>> {
        let resp: ContactsResponse = self.get_json(&["user", "contacts", user_id]).await?;
        Ok(resp.contacts)
    }

    async fn messages(&self, chat_id: &str) -> Result<Vec<WireMessage>> {
        let resp: MessagesResponse = self.get_json(&["messages", chat_id]).await?;
        Ok(resp.messages)
    }

    async fn send_message(&self, chat_id: &str, message: &OutgoingMessage) -> Result<()> {
        // The body is either an echo or a status object; neither is needed.
        let _: Value = self.post_json(&["messages", chat_id], message).await?;
        Ok(())
    }

    async fn new_chat(&self, request: &NewChatRequest) -> Result<NewChatResponse> {
        self.post_json(&["messages", "new-chat"], request).await
    }

    async fn delete_participant(&self, user_id: &str, chat_id: &str) -> Result<StatusMessage> {
        let body = DeleteParticipantRequest {
            user_id: user_id.to_string(),
            chat_id: chat_id.to_string(),
        };
        self.post_json(&["messages", "delete-participant"], &body).await
    }
}
