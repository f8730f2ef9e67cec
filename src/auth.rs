use log::info;

use crate::api::backend::Backend;
use crate::api::models::{LoginRequest, Session, SignupRequest};
use crate::error::{ClientError, Result};
use crate::storage::SessionStore;

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ClientError::validation("Username, email and password are required."));
        }
        if !self.email.contains('@') {
            return Err(ClientError::validation("Enter a valid email address."));
        }
        if self.password != self.confirm_password {
            return Err(ClientError::validation("Passwords do not match!"));
        }
        Ok(())
    }
}

fn establish(backend: &dyn Backend, store: &SessionStore, session: Session) -> Result<Session> {
    backend.set_token(session.token.clone());
    store.set(&session)?;
    info!("signed in as {} ({})", session.username, session.user_id);
    Ok(session)
}

pub async fn login(backend: &dyn Backend, store: &SessionStore, username: &str, password: &str) -> Result<Session> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ClientError::validation("Enter your username and password."));
    }
    let resp = backend
        .login(&LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;
    let name = resp.username.unwrap_or_else(|| username.to_string());
    establish(backend, store, Session::new(resp.user_id, name).with_token(resp.token))
}

pub async fn signup(backend: &dyn Backend, store: &SessionStore, form: &SignupForm) -> Result<Session> {
    form.validate()?;
    let username = form.username.trim().to_string();
    let resp = backend
        .signup(&SignupRequest {
            username: username.clone(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            confirm_password: form.confirm_password.clone(),
        })
        .await?;
    establish(backend, store, Session::new(resp.user_id, username).with_token(resp.token))
}

pub fn logout(backend: &dyn Backend, store: &SessionStore) -> Result<()> {
    backend.set_token(None);
    store.clear()
}
