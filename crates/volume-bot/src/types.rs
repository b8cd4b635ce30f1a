//! Transport-neutral update and reply types.
//!
//! Chat network adapters translate their native events into an
//! [`IncomingUpdate`] and render the returned [`Reply`]; they hold no wizard
//! logic of their own.

use serde::{Deserialize, Serialize};

/// One event from a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingUpdate {
    pub conversation_id: String,
    #[serde(flatten)]
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateKind {
    /// Free text typed by the user.
    Message { text: String },
    /// A pressed inline button.
    Callback { data: String },
}

impl IncomingUpdate {
    pub fn message(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            kind: UpdateKind::Message { text: text.into() },
        }
    }

    pub fn callback(conversation_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            kind: UpdateKind::Callback { data: data.into() },
        }
    }

    /// Trimmed message text, if this is a message.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Message { text } => Some(text.trim()),
            UpdateKind::Callback { .. } => None,
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Callback { data } => Some(data.as_str()),
            UpdateKind::Message { .. } => None,
        }
    }
}

/// An inline button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Markdown reply with an optional inline keyboard, one `Vec` per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Vec<Button>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Vec<Button>>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Callback data of every button, row by row.
    pub fn callbacks(&self) -> Vec<&str> {
        self.buttons
            .iter()
            .flatten()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}
