//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Message, User};

use pyqcore::InboundEvent;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::render::{deliver, ReplyTarget};
use crate::telegram::Bot;

const GENERIC_FAILURE: &str = "⚠️ Something went wrong. Please try again later.";

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands are matched before free text so `/addquestion` typed in the
/// middle of a wizard restarts it instead of being stored as a value.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(text_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn user_id(user: Option<&User>) -> Option<i64> {
    user.and_then(|u| i64::try_from(u.id.0).ok())
}

/// Runs one event through the core and delivers the replies.
///
/// Infrastructure failures are logged and answered with a generic notice.
async fn process(bot: &Bot, deps: &HandlerDeps, target: ReplyTarget, event: InboundEvent) -> Result<(), HandlerError> {
    let user_id = event.user_id();
    match deps.service.handle(event).await {
        Ok(replies) => deliver(bot, &target, replies).await?,
        Err(e) => {
            log::error!("Failed to handle update from user {}: {}", user_id, e);
            if let Some(callback_id) = &target.callback_id {
                if let Err(e) = bot.answer_callback_query(callback_id.clone()).await {
                    log::debug!("Failed to answer callback {} after error: {}", callback_id, e);
                }
            }
            bot.send_message(target.chat_id, GENERIC_FAILURE).await?;
        }
    }
    Ok(())
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let Some(user_id) = user_id(msg.from.as_ref()) else {
                    return Ok(());
                };
                log::info!("🎯 Received command: {:?} from user {}", cmd, user_id);
                let event = InboundEvent::action(user_id, cmd.token());
                process(&bot, &deps, ReplyTarget::message(&msg), event).await
            }
        },
    ))
}

fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().map(str::to_owned))
        .endpoint(move |bot: Bot, msg: Message, text: String| {
            let deps = deps.clone();
            async move {
                let Some(user_id) = user_id(msg.from.as_ref()) else {
                    return Ok(());
                };
                process(&bot, &deps, ReplyTarget::message(&msg), InboundEvent::text(user_id, text)).await
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let target = ReplyTarget::callback(&q);
            let (Some(user_id), Some(token)) = (user_id(Some(&q.from)), q.data.clone()) else {
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            };
            log::debug!("Callback {:?} from user {}", token, user_id);
            process(&bot, &deps, target, InboundEvent::action(user_id, token)).await
        }
    })
}
