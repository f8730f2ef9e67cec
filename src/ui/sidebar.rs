use crate::api::models::Contact;
use crate::chat::contacts::filter_contacts;

/// Contact list with an optional search filter. Indices shown to the user
/// are 1-based positions in the filtered view.
#[derive(Debug, Default)]
pub struct Sidebar {
    items: Vec<Contact>,
    query: String,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_items(&mut self, items: Vec<Contact>) {
        self.items = items;
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_string();
    }

    pub fn visible(&self) -> Vec<&Contact> {
        filter_contacts(&self.items, &self.query)
    }

    /// Accepts a 1-based index into the visible list or a raw chat id.
    pub fn resolve(&self, arg: &str) -> Option<String> {
        let arg = arg.trim();
        let visible = self.visible();
        if let Ok(n) = arg.parse::<usize>() {
            if n >= 1 && n <= visible.len() {
                return Some(visible[n - 1].chat_id.clone());
            }
        }
        self.items.iter().find(|c| c.chat_id == arg).map(|c| c.chat_id.clone())
    }

    pub fn render(&self, selected: Option<&str>) -> String {
        let mut out = String::from("Contacts");
        if !self.query.is_empty() {
            out.push_str(&format!(" (matching {:?})", self.query));
        }
        out.push('\n');
        let visible = self.visible();
        if visible.is_empty() {
            out.push_str("  (none)\n");
        }
        for (idx, contact) in visible.iter().enumerate() {
            let marker = if Some(contact.chat_id.as_str()) == selected { '>' } else { ' ' };
            let name = if contact.display_name.is_empty() { "(just you)" } else { contact.display_name.as_str() };
            out.push_str(&format!("{} {:>2}. {}\n", marker, idx + 1, name));
        }
        out
    }
}
