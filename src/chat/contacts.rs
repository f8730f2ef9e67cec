use log::{debug, warn};

use crate::api::backend::Backend;
use crate::api::models::{Contact, RawChat};

/// Projects backend chats into sidebar entries from `self_id`'s point of view.
///
/// The current user is dropped from each participant list; the rest are
/// joined with `", "`, and the first remaining participant's photo is used
/// when present.
pub fn derive_contacts(chats: &[RawChat], self_id: &str, default_photo: &str) -> Vec<Contact> {
    chats
        .iter()
        .map(|chat| {
            let others: Vec<_> = chat.participants.iter().filter(|p| p.id != self_id).collect();
            let display_name = others
                .iter()
                .map(|p| p.username.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let profile_photo = others
                .first()
                .and_then(|p| p.profile_photo.clone())
                .filter(|photo| !photo.is_empty())
                .unwrap_or_else(|| default_photo.to_string());
            Contact {
                chat_id: chat.chat_id.clone(),
                display_name,
                profile_photo,
            }
        })
        .collect()
}

/// Fetches and projects the user's chats. Failures are logged and yield an
/// empty list.
pub async fn load_contacts(backend: &dyn Backend, user_id: &str, default_photo: &str) -> Vec<Contact> {
    match backend.contacts(user_id).await {
        Ok(chats) => {
            debug!("loaded {} chats for {}", chats.len(), user_id);
            derive_contacts(&chats, user_id, default_photo)
        }
        Err(err) => {
            warn!("failed to load contacts for {}: {}", user_id, err);
            Vec::new()
        }
    }
}

/// Case-insensitive substring match on display names. An empty query keeps
/// everything.
pub fn filter_contacts<'a>(contacts: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    let needle = query.trim().to_lowercase();
    contacts
        .iter()
        .filter(|c| needle.is_empty() || c.display_name.to_lowercase().contains(&needle))
        .collect()
}
