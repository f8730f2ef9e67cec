/// Monotonic counter bumped on every selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Issued when a chat is selected; a load result is only applied if its
/// ticket is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub chat_id: String,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoneSelected,
    ChatSelected(String),
}

#[derive(Debug, Default)]
pub struct SelectionController {
    state: Selection,
    generation: u64,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.state {
            Selection::ChatSelected(id) => Some(id),
            Selection::NoneSelected => None,
        }
    }

    /// Re-selecting the open chat also issues a fresh ticket so it reloads.
    pub fn select(&mut self, chat_id: &str) -> LoadTicket {
        self.generation += 1;
        self.state = Selection::ChatSelected(chat_id.to_string());
        LoadTicket {
            chat_id: chat_id.to_string(),
            generation: Generation(self.generation),
        }
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.state = Selection::NoneSelected;
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == Generation(self.generation) && self.selected() == Some(ticket.chat_id.as_str())
    }
}
