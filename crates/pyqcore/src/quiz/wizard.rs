//! Add-question wizard.
//!
//! [`transition`] is a pure function from the current [`ConversationState`]
//! and one [`WizardInput`] to the next state plus the effects to perform.
//! [`Wizard`] drives it against a [`SessionStore`] and the record table.

use indoc::formatdoc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumString};

use crate::core::config::admin::AdminList;
use crate::core::error::{AppError, AppResult};
use crate::core::text::escape_html;
use crate::quiz::events::{Action, Keyboard, ReplyOption, TextReply};
use crate::quiz::model::{Classification, NewRecord};
use crate::storage::db::{get_connection, DbPool};
use crate::storage::records::insert_record;
use crate::storage::sessions::SessionStore;

/// Literal that stands for "no value" at the subtopic and explanation steps
pub const SKIP_SENTINEL: &str = "-";

/// Wizard steps in their linear order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum WizardStep {
    #[default]
    Idle,
    WaitingBoard,
    WaitingYear,
    WaitingExam,
    WaitingSubject,
    WaitingTopic,
    WaitingSubtopic,
    WaitingQuestionText,
    WaitingOption1,
    WaitingOption2,
    WaitingOption3,
    WaitingOption4,
    WaitingCorrectOption,
    WaitingExplanation,
    WaitingConfirm,
}

impl WizardStep {
    /// Step that follows a successful text input; `None` for Idle and WaitingConfirm
    pub fn next(self) -> Option<Self> {
        use WizardStep::*;
        let next = match self {
            WaitingBoard => WaitingYear,
            WaitingYear => WaitingExam,
            WaitingExam => WaitingSubject,
            WaitingSubject => WaitingTopic,
            WaitingTopic => WaitingSubtopic,
            WaitingSubtopic => WaitingQuestionText,
            WaitingQuestionText => WaitingOption1,
            WaitingOption1 => WaitingOption2,
            WaitingOption2 => WaitingOption3,
            WaitingOption3 => WaitingOption4,
            WaitingOption4 => WaitingCorrectOption,
            WaitingCorrectOption => WaitingExplanation,
            WaitingExplanation => WaitingConfirm,
            Idle | WaitingConfirm => return None,
        };
        Some(next)
    }

    pub fn is_active(self) -> bool {
        self != WizardStep::Idle
    }

    fn prompt(self) -> &'static str {
        use WizardStep::*;
        match self {
            WaitingBoard => "Send <b>Board</b> (e.g. GSEB, CBSE):",
            WaitingYear => "Send <b>Year</b> (e.g. 2023). If not applicable, send 0:",
            WaitingExam => "Send <b>Exam name</b> (e.g. Talati, DYSO):",
            WaitingSubject => "Send <b>Subject</b> (e.g. Polity, Science):",
            WaitingTopic => "Send <b>Topic</b>:",
            WaitingSubtopic => "Send <b>Subtopic</b> (or '-' if not used):",
            WaitingQuestionText => "Send the <b>Question text</b>:",
            WaitingOption1 => "Send <b>Option 1</b>:",
            WaitingOption2 => "Send <b>Option 2</b>:",
            WaitingOption3 => "Send <b>Option 3</b>:",
            WaitingOption4 => "Send <b>Option 4</b>:",
            WaitingCorrectOption => "Send <b>correct option number</b> (1–4):",
            WaitingExplanation => "Send <b>Explanation</b> (or '-' to skip):",
            Idle | WaitingConfirm => "",
        }
    }
}

/// Values collected so far. Every field is filled by exactly one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub classification: Classification,
    pub question_text: Option<String>,
    pub options: [Option<String>; 4],
    pub correct_option: Option<u8>,
    pub explanation: Option<String>,
}

impl RecordDraft {
    /// Converts a completed draft into an insertable record.
    pub fn to_record(&self) -> AppResult<NewRecord> {
        let missing = |what: &str| AppError::Validation(format!("draft has no {what}"));
        let [o1, o2, o3, o4] = &self.options;
        let option = |o: &Option<String>, n: u8| o.clone().ok_or_else(|| missing(&format!("option {n}")));

        let record = NewRecord {
            classification: self.classification.clone(),
            question_text: self.question_text.clone().ok_or_else(|| missing("question text"))?,
            options: [option(o1, 1)?, option(o2, 2)?, option(o3, 3)?, option(o4, 4)?],
            correct_option: self.correct_option.ok_or_else(|| missing("correct option"))?,
            explanation: self.explanation.clone(),
        };
        record.validate()?;
        Ok(record)
    }

    fn preview(&self) -> String {
        let show = |v: Option<&str>| escape_html(v.unwrap_or_default());
        let c = &self.classification;
        let explanation = match self.explanation.as_deref() {
            Some(e) if !e.is_empty() => escape_html(e),
            _ => "(none)".to_string(),
        };
        formatdoc!(
            "
                <b>Preview:</b>
                Board: {}
                Year: {}
                Exam: {}
                Subject: {}
                Topic: {}
                Subtopic: {}

                <b>Q:</b> {}
                1️⃣ {}
                2️⃣ {}
                3️⃣ {}
                4️⃣ {}
                ✅ Correct: {}

                Explanation: {}",
            show(c.board.as_deref()),
            show(c.year.as_deref()),
            show(c.exam.as_deref()),
            show(c.subject.as_deref()),
            show(c.topic.as_deref()),
            show(c.subtopic.as_deref()),
            show(self.question_text.as_deref()),
            show(self.options[0].as_deref()),
            show(self.options[1].as_deref()),
            show(self.options[2].as_deref()),
            show(self.options[3].as_deref()),
            self.correct_option.map(|n| n.to_string()).unwrap_or_default(),
            explanation,
        )
    }
}

/// One user's wizard slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub step: WizardStep,
    pub draft: RecordDraft,
}

impl ConversationState {
    pub fn at(step: WizardStep) -> Self {
        Self {
            step,
            draft: RecordDraft::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardInput {
    /// Begin a new draft, discarding any previous one
    Start,
    Text(String),
    Save,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardEffect {
    Reply(TextReply),
    /// Insert the record; the driver reports the generated id
    Commit(NewRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConversationState,
    pub effects: Vec<WizardEffect>,
}

impl Transition {
    fn to(state: ConversationState, reply: TextReply) -> Self {
        Self {
            state,
            effects: vec![WizardEffect::Reply(reply)],
        }
    }

    fn stay(state: &ConversationState, reply: TextReply) -> Self {
        Self::to(state.clone(), reply)
    }

    fn silent(state: &ConversationState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }
}

pub fn confirm_keyboard() -> Keyboard {
    vec![vec![
        ReplyOption::new("✅ Save", &Action::Save),
        ReplyOption::new("❌ Cancel", &Action::Cancel),
    ]]
}

/// Pure transition function of the wizard.
pub fn transition(state: &ConversationState, input: WizardInput) -> Transition {
    match input {
        WizardInput::Start => Transition::to(
            ConversationState::at(WizardStep::WaitingBoard),
            TextReply::send(format!(
                "📝 Adding new question.\n\n{}",
                WizardStep::WaitingBoard.prompt()
            )),
        ),
        WizardInput::Text(text) => accept_text(state, &text),
        WizardInput::Save if state.step == WizardStep::WaitingConfirm => match state.draft.to_record() {
            Ok(record) => Transition {
                state: ConversationState::default(),
                effects: vec![WizardEffect::Commit(record)],
            },
            Err(e) => {
                log::warn!("Discarding incomplete wizard draft on save: {}", e);
                Transition::to(
                    ConversationState::default(),
                    TextReply::replace("❌ This draft is incomplete. Start again with /addquestion."),
                )
            }
        },
        WizardInput::Cancel if state.step == WizardStep::WaitingConfirm => Transition::to(
            ConversationState::default(),
            TextReply::replace("❌ Question creation cancelled."),
        ),
        // Stale confirm buttons outside the confirm step
        WizardInput::Save | WizardInput::Cancel => Transition::silent(state),
    }
}

fn accept_text(state: &ConversationState, raw: &str) -> Transition {
    use WizardStep::*;

    let step = state.step;
    // Idle text is not ours, and the confirm step only takes buttons
    let Some(next) = step.next() else {
        return Transition::silent(state);
    };

    let text = raw.trim();
    let retry = |message: &str| Transition::stay(state, TextReply::send(message));

    if text.is_empty() {
        return retry(&format!("❌ This value cannot be empty.\n\n{}", step.prompt()));
    }

    let mut draft = state.draft.clone();
    let skip_or = |text: &str| if text == SKIP_SENTINEL { String::new() } else { text.to_string() };

    match step {
        WaitingBoard => draft.classification.board = Some(text.to_string()),
        WaitingYear => match normalize_year(text) {
            Some(year) => draft.classification.year = Some(year),
            None => return retry("❌ Please send a valid number for year (e.g. 2023 or 0)."),
        },
        WaitingExam => draft.classification.exam = Some(text.to_string()),
        WaitingSubject => draft.classification.subject = Some(text.to_string()),
        WaitingTopic => draft.classification.topic = Some(text.to_string()),
        WaitingSubtopic => draft.classification.subtopic = Some(skip_or(text)),
        WaitingQuestionText => draft.question_text = Some(text.to_string()),
        WaitingOption1 => draft.options[0] = Some(text.to_string()),
        WaitingOption2 => draft.options[1] = Some(text.to_string()),
        WaitingOption3 => draft.options[2] = Some(text.to_string()),
        WaitingOption4 => draft.options[3] = Some(text.to_string()),
        WaitingCorrectOption => match text {
            "1" | "2" | "3" | "4" => draft.correct_option = text.parse().ok(),
            _ => return retry("❌ Please send a number between 1 and 4."),
        },
        WaitingExplanation => draft.explanation = Some(skip_or(text)),
        Idle | WaitingConfirm => return Transition::silent(state),
    }

    let reply = if next == WaitingConfirm {
        TextReply::send(draft.preview()).with_options(confirm_keyboard())
    } else {
        TextReply::send(next.prompt())
    };
    Transition::to(ConversationState { step: next, draft }, reply)
}

/// Canonical decimal form of an integer of any width: an optional sign, then
/// digits without leading zeros. `None` unless `text` is a plain integer.
fn normalize_year(text: &str) -> Option<String> {
    let (negative, digits) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.trim_start_matches('0');
    Some(match (negative, magnitude.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{magnitude}"),
        (false, false) => magnitude.to_string(),
    })
}

/// Outcome of feeding one input to the stored wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardOutcome {
    pub replies: Vec<TextReply>,
    /// Id of the record committed by this input, if any
    pub committed: Option<i64>,
}

/// Runs [`transition`] against persisted state.
#[derive(Clone)]
pub struct Wizard {
    sessions: Arc<dyn SessionStore>,
    pool: Arc<DbPool>,
    admins: AdminList,
}

impl Wizard {
    pub fn new(sessions: Arc<dyn SessionStore>, pool: Arc<DbPool>, admins: AdminList) -> Self {
        Self { sessions, pool, admins }
    }

    pub fn state(&self, user_id: i64) -> AppResult<ConversationState> {
        Ok(self.sessions.get(user_id)?.unwrap_or_default())
    }

    /// Whether `user_id` has a wizard waiting for input
    pub fn is_active(&self, user_id: i64) -> AppResult<bool> {
        Ok(self.state(user_id)?.step.is_active())
    }

    /// Starts a fresh wizard for a privileged user.
    ///
    /// Non-admins get a denial and no session slot is written.
    pub fn start(&self, user_id: i64) -> AppResult<WizardOutcome> {
        if !self.admins.contains(user_id) {
            log::warn!("User {} tried to start the add-question wizard without admin rights", user_id);
            return Ok(WizardOutcome {
                replies: vec![TextReply::send("❌ You are not an admin.")],
                committed: None,
            });
        }

        let previous = self.state(user_id)?;
        if previous.step.is_active() {
            // TODO: ask before dropping a half-finished draft once product decides on the flow
            log::info!(
                "User {} restarted the wizard, discarding draft at step {}",
                user_id,
                previous.step
            );
        } else {
            log::info!("User {} started the add-question wizard", user_id);
        }
        self.apply(user_id, &previous, WizardInput::Start)
    }

    /// Feeds free text, a Save or a Cancel to the user's wizard.
    pub fn feed(&self, user_id: i64, input: WizardInput) -> AppResult<WizardOutcome> {
        let state = self.state(user_id)?;
        self.apply(user_id, &state, input)
    }

    fn apply(&self, user_id: i64, state: &ConversationState, input: WizardInput) -> AppResult<WizardOutcome> {
        let Transition { state: next, effects } = transition(state, input);

        let mut replies = Vec::new();
        let mut committed = None;
        for effect in effects {
            match effect {
                WizardEffect::Reply(reply) => replies.push(reply),
                WizardEffect::Commit(record) => {
                    let conn = get_connection(&self.pool)?;
                    let id = insert_record(&conn, &record)?;
                    log::info!("User {} saved question {}", user_id, id);
                    replies.push(TextReply::replace(format!("✅ Question saved with ID <b>{id}</b>.")));
                    committed = Some(id);
                }
            }
        }

        if next != *state {
            if next.step.is_active() {
                self.sessions.put(user_id, &next)?;
            } else {
                if state.step == WizardStep::WaitingConfirm && committed.is_none() {
                    log::info!("User {} cancelled the add-question wizard", user_id);
                }
                self.sessions.delete(user_id)?;
            }
        }

        Ok(WizardOutcome { replies, committed })
    }
}
