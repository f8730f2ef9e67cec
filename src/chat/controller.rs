use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::backend::Backend;
use crate::api::models::{Contact, Message, Profile, Session};
use crate::chat::contacts::{derive_contacts, load_contacts};
use crate::chat::export::{write_transcript, DateRange};
use crate::chat::profile;
use crate::chat::selection::{LoadTicket, SelectionController};
use crate::chat::thread::{load_messages, post_message, validate_outgoing, Thread};
use crate::error::{ClientError, Result};
use crate::storage::SessionStore;
use crate::utils::run_async_to_main;

/// Completion of background work, delivered back to the owning loop.
#[derive(Debug)]
pub enum Event {
    MessagesLoaded {
        ticket: LoadTicket,
        result: Result<Vec<Message>>,
    },
    SendFinished {
        chat_id: String,
        correlation: Uuid,
        result: Result<()>,
    },
}

/// What applying an [`Event`] changed, for the front end to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ThreadLoaded { chat_id: String, count: usize },
    ThreadFailed { chat_id: String, message: String },
    /// Load result for a chat that is no longer selected.
    Discarded { chat_id: String },
    Sent { chat_id: String },
    SendFailed { chat_id: String, message: String },
}

/// In-memory model of the messaging view: identity, contact list, selected
/// chat and its thread.
pub struct ChatController {
    backend: Arc<dyn Backend>,
    store: SessionStore,
    session: Session,
    default_photo: String,
    contacts: Vec<Contact>,
    selection: SelectionController,
    thread: Thread,
    loading: bool,
    events: mpsc::UnboundedSender<Event>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: SessionStore,
        session: Session,
        default_photo: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            store,
            session,
            default_photo: default_photo.into(),
            contacts: Vec::new(),
            selection: SelectionController::new(),
            thread: Thread::default(),
            loading: false,
            events,
        };
        (controller, rx)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn selected(&self) -> Option<&str> {
        self.selection.selected()
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        let id = self.selection.selected()?;
        self.contacts.iter().find(|c| c.chat_id == id)
    }

    pub fn messages(&self) -> &[Message] {
        self.thread.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_own(&self, message: &Message) -> bool {
        message.sender_id == self.session.user_id
    }

    /// First load when the view opens; a failure leaves the list empty.
    pub async fn mount(&mut self) {
        self.contacts = load_contacts(self.backend.as_ref(), &self.session.user_id, &self.default_photo).await;
        self.reconcile_selection();
    }

    /// Re-fetches the contact list, keeping the previous one on failure.
    pub async fn refresh_contacts(&mut self) -> Result<()> {
        let chats = self
            .backend
            .contacts(&self.session.user_id)
            .await
            .inspect_err(|err| warn!("contact refresh failed: {}", err))?;
        self.contacts = derive_contacts(&chats, &self.session.user_id, &self.default_photo);
        self.reconcile_selection();
        Ok(())
    }

    fn reconcile_selection(&mut self) {
        let gone = match self.selection.selected() {
            Some(id) => !self.contacts.iter().any(|c| c.chat_id == id),
            None => false,
        };
        if gone {
            info!("selected chat is no longer listed, clearing selection");
            self.clear_selection();
        }
    }

    /// Opens a chat and starts loading its messages in the background. Any
    /// load still outstanding for a previous selection will be discarded.
    pub fn select(&mut self, chat_id: &str) {
        let ticket = self.selection.select(chat_id);
        self.thread.clear();
        self.loading = true;
        debug!("selected chat {}", chat_id);

        let backend = self.backend.clone();
        let id = ticket.chat_id.clone();
        run_async_to_main(
            &self.events,
            async move { load_messages(backend.as_ref(), Some(id.as_str())).await },
            move |result| Event::MessagesLoaded { ticket, result },
        );
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.thread.clear();
        self.loading = false;
    }

    /// Appends `text` as a pending message and posts it in the background.
    /// Blank text or no open chat is rejected without a request.
    pub fn send(&mut self, text: &str) -> Result<()> {
        let chat_id = validate_outgoing(text, self.selection.selected())?.to_string();
        let pending = self.thread.append_pending(&self.session, &chat_id, text);

        let backend = self.backend.clone();
        let correlation = pending.correlation;
        run_async_to_main(
            &self.events,
            async move { post_message(backend.as_ref(), &pending).await },
            move |result| Event::SendFinished {
                chat_id,
                correlation,
                result,
            },
        );
        Ok(())
    }

    pub fn handle(&mut self, event: Event) -> Notice {
        match event {
            Event::MessagesLoaded { ticket, result } => {
                if !self.selection.is_current(&ticket) {
                    debug!("discarding stale load for chat {}", ticket.chat_id);
                    return Notice::Discarded { chat_id: ticket.chat_id };
                }
                self.loading = false;
                match result {
                    Ok(messages) => {
                        let count = messages.len();
                        self.thread.apply_snapshot(messages);
                        Notice::ThreadLoaded { chat_id: ticket.chat_id, count }
                    }
                    Err(err) => {
                        warn!("failed to load messages for chat {}: {}", ticket.chat_id, err);
                        self.thread.keep_local();
                        Notice::ThreadFailed {
                            chat_id: ticket.chat_id,
                            message: err.user_message(),
                        }
                    }
                }
            }
            Event::SendFinished { chat_id, correlation, result } => match result {
                Ok(()) => {
                    if !self.thread.confirm(correlation) {
                        debug!("send to chat {} is no longer shown as local", chat_id);
                    }
                    Notice::Sent { chat_id }
                }
                Err(err) => {
                    self.thread.rollback(correlation);
                    Notice::SendFailed {
                        chat_id,
                        message: err.user_message(),
                    }
                }
            },
        }
    }

    pub async fn profile(&self) -> Result<Profile> {
        let mut profile = self.backend.profile(&self.session.user_id).await?;
        if profile.profile_photo.as_deref().is_none_or(str::is_empty) {
            profile.profile_photo = Some(self.default_photo.clone());
        }
        Ok(profile)
    }

    pub async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        self.backend.ping().await?;
        Ok(started.elapsed())
    }

    pub async fn update_username(&mut self, new_username: &str) -> Result<String> {
        let message = profile::update_username(self.backend.as_ref(), &self.session, new_username).await?;
        self.session.username = new_username.trim().to_string();
        // The rename already happened on the backend; a local write failure
        // only means the old name comes back on the next start.
        if let Err(err) = self.store.set(&self.session) {
            warn!("username changed but session was not saved: {}", err);
            return Ok(format!("{} ({})", message, err.user_message()));
        }
        Ok(message)
    }

    pub async fn update_password(&self, new_password: &str, confirm: &str) -> Result<String> {
        profile::update_password(self.backend.as_ref(), &self.session, new_password, confirm).await
    }

    /// Creates a chat with the comma-separated `targets`, then re-fetches the
    /// contact list so the new chat shows up with its backend id.
    pub async fn create_chat(&mut self, targets: &str) -> Result<Vec<String>> {
        let targets = profile::parse_targets(targets, &self.session);
        let created_with = profile::create_chat(self.backend.as_ref(), &self.session, targets).await?;
        if let Err(err) = self.refresh_contacts().await {
            warn!("chat created but contact list is stale: {}", err);
        }
        Ok(created_with)
    }

    /// Leaves `chat_id`, re-syncs the contact list and closes the chat if it
    /// was open.
    pub async fn leave_chat(&mut self, chat_id: &str) -> Result<String> {
        let message = profile::leave_chat(self.backend.as_ref(), &self.session, chat_id).await?;
        if self.refresh_contacts().await.is_err() {
            self.contacts.retain(|c| c.chat_id != chat_id);
            self.reconcile_selection();
        }
        Ok(message)
    }

    pub fn export(&self, range: &DateRange, path: &Path) -> Result<usize> {
        if self.selection.selected().is_none() {
            return Err(ClientError::validation("Select a chat first."));
        }
        write_transcript(self.thread.messages(), range, path)
    }

    /// Forgets the stored session. The controller is consumed.
    pub fn logout(self) -> Result<()> {
        crate::auth::logout(self.backend.as_ref(), &self.store)?;
        info!("{} logged out", self.session.username);
        Ok(())
    }
}
