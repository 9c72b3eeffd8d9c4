//! Inbound events, action tokens and the reply model.
//!
//! The core never talks to Telegram. It receives [`InboundEvent`]s and
//! answers with [`Reply`] values that the bot crate renders.

use sha2::{Digest, Sha256};

use crate::core::error::{AppError, AppResult};
use crate::quiz::field::ClassificationField;
use crate::quiz::model::ClassificationRecord;

/// Telegram rejects callback data longer than this many bytes.
pub const CALLBACK_DATA_MAX_BYTES: usize = 64;

/// Short digest identifying a value inside a `pick_` token: the first four
/// SHA-256 bytes, hex encoded.
pub fn value_fingerprint(value: &str) -> String {
    hex::encode(&Sha256::digest(value.as_bytes())[..4])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Free text typed by the user
    TextInput { user_id: i64, text: String },
    /// A button press or a command mapped to a token
    Action { user_id: i64, token: String },
}

impl InboundEvent {
    pub fn text(user_id: i64, text: impl Into<String>) -> Self {
        Self::TextInput {
            user_id,
            text: text.into(),
        }
    }

    pub fn action(user_id: i64, token: impl Into<String>) -> Self {
        Self::Action {
            user_id,
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> i64 {
        match self {
            Self::TextInput { user_id, .. } | Self::Action { user_id, .. } => *user_id,
        }
    }
}

/// Parsed action token. Grammar: `verb` or `verb:literal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `menu`
    ShowMenu,
    /// `admin`
    AdminPanel,
    /// `addq`
    StartWizard,
    /// `addq_save`
    Save,
    /// `addq_cancel`
    Cancel,
    /// `choose_<field>`
    Choose(ClassificationField),
    /// `set_<field>:<value>`; an empty literal clears the field
    Set(ClassificationField, Option<String>),
    /// `pick_<field>:<index>:<fingerprint>` into the current enumeration of
    /// `field`; the fingerprint must match the value found at `index`
    Pick(ClassificationField, usize, String),
    /// `generate_quiz`
    Generate,
    /// `reset_filters`
    Reset,
    /// `back_to_main`
    Back,
}

impl Action {
    pub fn parse(token: &str) -> AppResult<Self> {
        let invalid = || AppError::InvalidAction(token.to_string());
        let (verb, literal) = match token.split_once(':') {
            Some((verb, literal)) => (verb, Some(literal)),
            None => (token, None),
        };

        let action = match (verb, literal) {
            ("menu", None) => Self::ShowMenu,
            ("admin", None) => Self::AdminPanel,
            ("addq", None) => Self::StartWizard,
            ("addq_save", None) => Self::Save,
            ("addq_cancel", None) => Self::Cancel,
            ("generate_quiz", None) => Self::Generate,
            ("reset_filters", None) => Self::Reset,
            ("back_to_main", None) => Self::Back,
            (verb, None) if verb.starts_with("choose_") => {
                Self::Choose(ClassificationField::parse(&verb["choose_".len()..])?)
            }
            (verb, Some(value)) if verb.starts_with("set_") => {
                let field = ClassificationField::parse(&verb["set_".len()..])?;
                let value = (!value.is_empty()).then(|| value.to_string());
                Self::Set(field, value)
            }
            (verb, Some(literal)) if verb.starts_with("pick_") => {
                let field = ClassificationField::parse(&verb["pick_".len()..])?;
                let (index, fingerprint) = literal.split_once(':').ok_or_else(invalid)?;
                if fingerprint.is_empty() {
                    return Err(invalid());
                }
                Self::Pick(field, index.parse().map_err(|_| invalid())?, fingerprint.to_string())
            }
            _ => return Err(invalid()),
        };
        Ok(action)
    }

    pub fn token(&self) -> String {
        match self {
            Self::ShowMenu => "menu".to_string(),
            Self::AdminPanel => "admin".to_string(),
            Self::StartWizard => "addq".to_string(),
            Self::Save => "addq_save".to_string(),
            Self::Cancel => "addq_cancel".to_string(),
            Self::Choose(field) => format!("choose_{field}"),
            Self::Set(field, value) => format!("set_{field}:{}", value.as_deref().unwrap_or_default()),
            Self::Pick(field, index, fingerprint) => format!("pick_{field}:{index}:{fingerprint}"),
            Self::Generate => "generate_quiz".to_string(),
            Self::Reset => "reset_filters".to_string(),
            Self::Back => "back_to_main".to_string(),
        }
    }
}

/// How a text reply is shown relative to the event that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// A new message
    Send,
    /// Edit the message whose button was pressed, or send when there is none
    Replace,
    /// Short callback notification
    Toast,
    /// Callback notification that needs dismissing
    Alert,
}

/// One inline button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOption {
    pub label: String,
    pub token: String,
}

impl ReplyOption {
    pub fn new(label: impl Into<String>, action: &Action) -> Self {
        Self {
            label: label.into(),
            token: action.token(),
        }
    }
}

/// Rows of buttons
pub type Keyboard = Vec<Vec<ReplyOption>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReply {
    /// Telegram HTML
    pub body: String,
    pub options: Option<Keyboard>,
    pub presentation: Presentation,
}

impl TextReply {
    pub fn new(body: impl Into<String>, presentation: Presentation) -> Self {
        Self {
            body: body.into(),
            options: None,
            presentation,
        }
    }

    pub fn send(body: impl Into<String>) -> Self {
        Self::new(body, Presentation::Send)
    }

    pub fn replace(body: impl Into<String>) -> Self {
        Self::new(body, Presentation::Replace)
    }

    pub fn toast(body: impl Into<String>) -> Self {
        Self::new(body, Presentation::Toast)
    }

    pub fn alert(body: impl Into<String>) -> Self {
        Self::new(body, Presentation::Alert)
    }

    pub fn with_options(mut self, options: Keyboard) -> Self {
        self.options = Some(options);
        self
    }
}

/// A quiz poll for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub question_text: String,
    pub options: [String; 4],
    /// 0-based
    pub correct_index: u8,
    pub explanation: Option<String>,
}

impl From<&ClassificationRecord> for PollRequest {
    fn from(record: &ClassificationRecord) -> Self {
        Self {
            question_text: record.question_text.clone(),
            options: record.options.clone(),
            correct_index: record.correct_index(),
            explanation: record.explanation.clone().filter(|e| !e.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(TextReply),
    Poll(PollRequest),
}

impl From<TextReply> for Reply {
    fn from(reply: TextReply) -> Self {
        Self::Text(reply)
    }
}
