//! Turns core replies into Bot API calls

use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputPollOption, MessageId, PollType,
};
use teloxide::{ApiError, RequestError};

use pyqcore::core::text::truncate_chars;
use pyqcore::quiz::events::{Keyboard, PollRequest, Presentation, Reply, TextReply};

use super::Bot;

/// Telegram limit for a poll question
pub const POLL_QUESTION_MAX_CHARS: usize = 300;
/// Telegram limit for one poll option
pub const POLL_OPTION_MAX_CHARS: usize = 100;
/// Telegram limit for a quiz explanation
pub const POLL_EXPLANATION_MAX_CHARS: usize = 200;

/// Where replies to one update go
#[derive(Debug, Clone)]
pub struct ReplyTarget {
    pub chat_id: ChatId,
    /// Message carrying the pressed button, edited by `Replace` replies
    pub message_id: Option<MessageId>,
    /// Pending callback query, answered exactly once
    pub callback_id: Option<CallbackQueryId>,
}

impl ReplyTarget {
    pub fn message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id,
            message_id: None,
            callback_id: None,
        }
    }

    pub fn callback(q: &CallbackQuery) -> Self {
        let message = q.regular_message();
        Self {
            chat_id: message.map(|m| m.chat.id).unwrap_or_else(|| ChatId::from(q.from.id)),
            message_id: message.map(|m| m.id),
            callback_id: Some(q.id.clone()),
        }
    }
}

pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.iter().map(|row| {
        row.iter()
            .map(|option| InlineKeyboardButton::callback(option.label.clone(), option.token.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Delivers `replies` in order.
///
/// Only the first toast or alert answers the callback query; a callback that
/// produced none is answered empty so the client stops its spinner.
pub async fn deliver(bot: &Bot, target: &ReplyTarget, replies: Vec<Reply>) -> Result<(), RequestError> {
    let mut answered = false;

    for reply in replies {
        match reply {
            Reply::Text(text) => match text.presentation {
                Presentation::Send => send_text(bot, target.chat_id, &text).await?,
                Presentation::Replace => replace_text(bot, target, &text).await?,
                Presentation::Toast | Presentation::Alert => {
                    let Some(callback_id) = &target.callback_id else {
                        // Notifications only exist for button presses
                        send_text(bot, target.chat_id, &text).await?;
                        continue;
                    };
                    if answered {
                        log::debug!("Dropping extra callback notice: {}", text.body);
                        continue;
                    }
                    bot.answer_callback_query(callback_id.clone())
                        .text(text.body.clone())
                        .show_alert(text.presentation == Presentation::Alert)
                        .await?;
                    answered = true;
                }
            },
            Reply::Poll(poll) => send_poll(bot, target.chat_id, &poll).await?,
        }
    }

    if let (Some(callback_id), false) = (&target.callback_id, answered) {
        bot.answer_callback_query(callback_id.clone()).await?;
    }
    Ok(())
}

async fn send_text(bot: &Bot, chat_id: ChatId, text: &TextReply) -> Result<(), RequestError> {
    let request = bot.send_message(chat_id, text.body.clone());
    match &text.options {
        Some(keyboard) => request.reply_markup(inline_keyboard(keyboard)).await?,
        None => request.await?,
    };
    Ok(())
}

async fn replace_text(bot: &Bot, target: &ReplyTarget, text: &TextReply) -> Result<(), RequestError> {
    let Some(message_id) = target.message_id else {
        return send_text(bot, target.chat_id, text).await;
    };

    let request = bot.edit_message_text(target.chat_id, message_id, text.body.clone());
    let result = match &text.options {
        Some(keyboard) => request.reply_markup(inline_keyboard(keyboard)).await,
        None => request.await,
    };
    match result {
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}

async fn send_poll(bot: &Bot, chat_id: ChatId, poll: &PollRequest) -> Result<(), RequestError> {
    let (question, options, explanation) = poll_payload(poll);
    // Poll text is plain, so bypass the HTML default
    let request = bot
        .inner()
        .send_poll(chat_id, question, options)
        .type_(PollType::Quiz)
        .correct_option_id(poll.correct_index)
        .is_anonymous(false);
    match explanation {
        Some(explanation) => request.explanation(explanation).await?,
        None => request.await?,
    };
    Ok(())
}

/// Question, options and explanation cut to Telegram's poll limits
pub fn poll_payload(poll: &PollRequest) -> (String, Vec<InputPollOption>, Option<String>) {
    let question = truncate_chars(&poll.question_text, POLL_QUESTION_MAX_CHARS);
    let options = poll
        .options
        .iter()
        .map(|option| InputPollOption::new(truncate_chars(option, POLL_OPTION_MAX_CHARS)))
        .collect();
    let explanation = poll
        .explanation
        .as_deref()
        .map(|text| truncate_chars(text, POLL_EXPLANATION_MAX_CHARS));
    (question, options, explanation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pyqcore::quiz::events::{Action, ReplyOption};

    #[test]
    fn test_poll_payload_truncates_to_limits() {
        let poll = PollRequest {
            question_text: "q".repeat(400),
            options: ["a".repeat(150), "b".to_string(), "c".to_string(), "d".to_string()],
            correct_index: 1,
            explanation: Some("e".repeat(250)),
        };
        let (question, options, explanation) = poll_payload(&poll);
        assert_eq!(question.chars().count(), POLL_QUESTION_MAX_CHARS);
        assert!(question.ends_with('…'));
        assert_eq!(options.len(), 4);
        assert_eq!(options[0].text.chars().count(), POLL_OPTION_MAX_CHARS);
        assert_eq!(options[1].text, "b");
        assert_eq!(explanation.map(|e| e.chars().count()), Some(POLL_EXPLANATION_MAX_CHARS));
    }

    #[test]
    fn test_inline_keyboard_keeps_rows() {
        let keyboard = vec![
            vec![ReplyOption::new("✅ Save", &Action::Save), ReplyOption::new("❌ Cancel", &Action::Cancel)],
            vec![ReplyOption::new("🔙 Back", &Action::Back)],
        ];
        let markup = inline_keyboard(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
        assert_eq!(markup.inline_keyboard[1][0].text, "🔙 Back");
    }
}
