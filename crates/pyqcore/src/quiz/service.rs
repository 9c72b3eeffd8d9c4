//! Inbound event router.
//!
//! One [`QuizService`] is shared by every handler. Each event is processed
//! while holding the sender's [`SessionLocks`] guard.

use indoc::formatdoc;
use rand::Rng;
use std::sync::Arc;

use crate::core::config::admin::AdminList;
use crate::core::config::{quiz, Config};
use crate::core::error::{AppError, AppResult};
use crate::core::locks::SessionLocks;
use crate::quiz::enumeration::enumerate;
use crate::quiz::events::{
    value_fingerprint, Action, InboundEvent, Keyboard, PollRequest, Reply, ReplyOption, TextReply,
    CALLBACK_DATA_MAX_BYTES,
};
use crate::quiz::field::ClassificationField;
use crate::quiz::filters::FilterSessionManager;
use crate::quiz::model::FilterState;
use crate::quiz::sampler::sample;
use crate::quiz::wizard::{Wizard, WizardInput, WizardOutcome};
use crate::storage::db::{get_connection, DbPool};
use crate::storage::records::count_records;
use crate::storage::sessions::SessionStore;

const WELCOME: &str = "👋 Welcome!\nUse the buttons below to set filters and generate PYQ quizzes.";
const MAIN_MENU: &str = "Use the buttons below to set filters and generate PYQ quizzes:";

#[derive(Clone)]
pub struct QuizService {
    pool: Arc<DbPool>,
    filters: FilterSessionManager,
    wizard: Wizard,
    locks: SessionLocks,
    admins: AdminList,
    quiz_size: usize,
}

impl QuizService {
    pub fn new(pool: Arc<DbPool>, sessions: Arc<dyn SessionStore>, config: &Config) -> Self {
        Self::with_admins(pool, sessions, config.admins.clone(), config.quiz_size)
    }

    pub fn with_admins(
        pool: Arc<DbPool>,
        sessions: Arc<dyn SessionStore>,
        admins: AdminList,
        quiz_size: u32,
    ) -> Self {
        Self {
            filters: FilterSessionManager::new(Arc::clone(&pool)),
            wizard: Wizard::new(sessions, Arc::clone(&pool), admins.clone()),
            pool,
            locks: SessionLocks::new(),
            admins,
            quiz_size: quiz::clamp_size(quiz_size) as usize,
        }
    }

    pub fn filters(&self) -> &FilterSessionManager {
        &self.filters
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn locks(&self) -> &SessionLocks {
        &self.locks
    }

    /// Handles one event and returns the replies to deliver, in order.
    pub async fn handle(&self, event: InboundEvent) -> AppResult<Vec<Reply>> {
        let _guard = self.locks.acquire(event.user_id()).await;
        let mut rng = rand::thread_rng();
        self.dispatch(event, &mut rng)
    }

    /// [`handle`](Self::handle) with a caller-provided random source for sampling.
    pub async fn handle_with_rng<R: Rng + Send + ?Sized>(&self, event: InboundEvent, rng: &mut R) -> AppResult<Vec<Reply>> {
        let _guard = self.locks.acquire(event.user_id()).await;
        self.dispatch(event, rng)
    }

    fn dispatch<R: Rng + ?Sized>(&self, event: InboundEvent, rng: &mut R) -> AppResult<Vec<Reply>> {
        match event {
            InboundEvent::TextInput { user_id, text } => self.on_text(user_id, text),
            InboundEvent::Action { user_id, token } => match Action::parse(&token) {
                Ok(action) => self.on_action(user_id, action, rng),
                Err(AppError::UnknownField(name)) => {
                    log::warn!("User {} sent token {:?} with unknown field {:?}", user_id, token, name);
                    Ok(Vec::new())
                }
                Err(e) => {
                    log::debug!("Ignoring token from user {}: {}", user_id, e);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn on_text(&self, user_id: i64, text: String) -> AppResult<Vec<Reply>> {
        if !self.wizard.is_active(user_id)? {
            log::debug!("Ignoring free text from user {} outside the wizard", user_id);
            return Ok(Vec::new());
        }
        Ok(wizard_replies(self.wizard.feed(user_id, WizardInput::Text(text))?))
    }

    fn on_action<R: Rng + ?Sized>(&self, user_id: i64, action: Action, rng: &mut R) -> AppResult<Vec<Reply>> {
        match action {
            Action::ShowMenu => {
                let filters = self.filters.get_or_create(user_id)?;
                Ok(vec![TextReply::send(WELCOME).with_options(main_menu(&filters)).into()])
            }
            Action::Back => {
                let filters = self.filters.get_or_create(user_id)?;
                Ok(vec![TextReply::replace(MAIN_MENU).with_options(main_menu(&filters)).into()])
            }
            Action::AdminPanel => self.admin_panel(user_id),
            Action::StartWizard => Ok(wizard_replies(self.wizard.start(user_id)?)),
            Action::Save => Ok(wizard_replies(self.wizard.feed(user_id, WizardInput::Save)?)),
            Action::Cancel => Ok(wizard_replies(self.wizard.feed(user_id, WizardInput::Cancel)?)),
            Action::Choose(field) => self.choose(user_id, field),
            Action::Set(field, value) => self.set(user_id, field, value),
            Action::Pick(field, index, fingerprint) => {
                let filters = self.filters.get_or_create(user_id)?;
                let values = {
                    let conn = get_connection(&self.pool)?;
                    enumerate(&conn, field, &filters)?
                };
                match values.into_iter().nth(index) {
                    Some(value) if value_fingerprint(&value) == fingerprint => {
                        self.set(user_id, field, Some(value))
                    }
                    _ => {
                        log::debug!("Stale {} pick {} from user {}", field, index, user_id);
                        Ok(vec![TextReply::alert("This option is no longer available.").into()])
                    }
                }
            }
            Action::Generate => self.generate(user_id, rng),
            Action::Reset => {
                let filters = self.filters.reset(user_id)?;
                Ok(vec![
                    TextReply::toast("Filters cleared.").into(),
                    TextReply::replace("♻️ Filters reset.\n\nUse buttons to set filters:")
                        .with_options(main_menu(&filters))
                        .into(),
                ])
            }
        }
    }

    fn admin_panel(&self, user_id: i64) -> AppResult<Vec<Reply>> {
        if !self.admins.contains(user_id) {
            log::warn!("User {} opened the admin panel without admin rights", user_id);
            return Ok(vec![TextReply::send("❌ You are not an admin.").into()]);
        }
        let stored = {
            let conn = get_connection(&self.pool)?;
            count_records(&conn)?
        };
        let body = formatdoc! {"
            👑 Admin panel:
            /addquestion – add new PYQ

            Questions stored: <b>{}</b>",
            stored
        };
        let options = vec![vec![ReplyOption::new("➕ Add question", &Action::StartWizard)]];
        Ok(vec![TextReply::send(body).with_options(options).into()])
    }

    fn choose(&self, user_id: i64, field: ClassificationField) -> AppResult<Vec<Reply>> {
        let filters = self.filters.get_or_create(user_id)?;
        let values = {
            let conn = get_connection(&self.pool)?;
            enumerate(&conn, field, &filters)?
        };

        if values.is_empty() {
            let message = if field == ClassificationField::Board && filters.is_unconstrained() {
                "No boards in database yet.".to_string()
            } else {
                format!("No {} for current filters.", field.plural())
            };
            return Ok(vec![TextReply::alert(message).into()]);
        }

        Ok(vec![TextReply::replace(format!("Select <b>{}</b>:", field.label()))
            .with_options(values_keyboard(field, &values))
            .into()])
    }

    fn set(&self, user_id: i64, field: ClassificationField, value: Option<String>) -> AppResult<Vec<Reply>> {
        let cleared = value.is_none();
        let filters = self.filters.update(user_id, field, value)?;
        let notice = if cleared {
            format!("{} cleared.", field.label())
        } else {
            format!("{} set.", field.label())
        };
        Ok(vec![
            TextReply::toast(notice).into(),
            TextReply::replace("Filters updated:").with_options(main_menu(&filters)).into(),
        ])
    }

    fn generate<R: Rng + ?Sized>(&self, user_id: i64, rng: &mut R) -> AppResult<Vec<Reply>> {
        let filters = self.filters.get_or_create(user_id)?;
        let records = {
            let conn = get_connection(&self.pool)?;
            sample(&conn, &filters, self.quiz_size, rng)?
        };

        if records.is_empty() {
            log::debug!("No questions match the filters of user {}", user_id);
            return Ok(vec![TextReply::alert("No questions for these filters.").into()]);
        }

        log::info!(
            "Sending {} quiz poll(s) to user {} for [{}]",
            records.len(),
            user_id,
            describe_filters(&filters)
        );
        let mut replies: Vec<Reply> = vec![
            TextReply::toast("Sending questions...").into(),
            TextReply::send(format!(
                "🎯 Found <b>{}</b> questions. Sending as quiz polls...",
                records.len()
            ))
            .into(),
        ];
        replies.extend(records.iter().map(|record| Reply::Poll(PollRequest::from(record))));
        Ok(replies)
    }
}

fn wizard_replies(outcome: WizardOutcome) -> Vec<Reply> {
    outcome.replies.into_iter().map(Reply::from).collect()
}

/// One button per field showing its current value, then generate and reset.
pub fn main_menu(filters: &FilterState) -> Keyboard {
    let mut rows: Keyboard = ClassificationField::all()
        .map(|field| {
            let current = filters.constraint(field).unwrap_or("All");
            vec![ReplyOption::new(
                format!("{} {}: {}", field.emoji(), field.label(), current),
                &Action::Choose(field),
            )]
        })
        .collect();
    rows.push(vec![ReplyOption::new("🎯 Generate quiz", &Action::Generate)]);
    rows.push(vec![ReplyOption::new("♻️ Reset filters", &Action::Reset)]);
    rows
}

/// One button per value, then a back button.
///
/// Values whose `set_` token would not fit in callback data are addressed by
/// their position in the enumeration instead.
pub fn values_keyboard(field: ClassificationField, values: &[String]) -> Keyboard {
    let mut rows: Keyboard = values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let set = Action::Set(field, Some(value.clone()));
            let action = if set.token().len() <= CALLBACK_DATA_MAX_BYTES {
                set
            } else {
                Action::Pick(field, index, value_fingerprint(value))
            };
            vec![ReplyOption::new(value.clone(), &action)]
        })
        .collect();
    rows.push(vec![ReplyOption::new("🔙 Back", &Action::Back)]);
    rows
}

/// One-line summary of a filter tuple for logs
pub fn describe_filters(filters: &FilterState) -> String {
    ClassificationField::all()
        .map(|field| format!("{}={}", field.column(), filters.constraint(field).unwrap_or("*")))
        .collect::<Vec<_>>()
        .join(", ")
}
