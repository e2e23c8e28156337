//! Handling of received messages.

use rand::RngCore;
use tracing::{info, instrument, warn};

use crate::base::{
    config::Config,
    types::{ChatEvent, IncomingMessage, LogRecord},
};

use super::{
    actions::Action,
    link_title,
    router::{self, LookupRequest, Route},
    trigger,
};

/// Turn a received message into the actions it calls for.
///
/// A command and a link in the same message do not both get answered: the link title
/// replaces the command reply, though a package search the command started still runs.
#[instrument(skip_all)]
pub fn on_message(event: &ChatEvent, config: &Config, rng: &mut dyn RngCore) -> Vec<Action> {
    let ChatEvent::Message(message) = event else {
        return Vec::new();
    };

    let target = message.reply_target(&config.bot_nick).to_string();
    let mut actions = Vec::new();

    // Commands.

    let mut reply = None;

    if let Some(command) = trigger::parse(&message.text, &config.trigger) {
        match router::route(&command, config, rng) {
            Route::Reply(lines) => reply = Some(Action::Send { target: target.clone(), lines }),
            Route::Lookup(request) => reply = Some(Action::Lookup { target: target.clone(), request }),
            Route::Dispatch(task) => actions.push(Action::Dispatch { target: target.clone(), task }),
            Route::Quit | Route::Nothing => {}
        }
    }

    // Links.

    if let Some(url) = link_title::detect_link(&message.text) {
        reply = Some(Action::Lookup {
            target: target.clone(),
            request: LookupRequest::LinkTitle(url),
        });
    }

    actions.extend(reply);

    // Brain.

    actions.extend(converse(message, config, &target));

    // Log.

    if !message.is_self_originated && !message.is_private(&config.bot_nick) {
        actions.push(Action::Log {
            channel: message.target.clone(),
            record: LogRecord::Message {
                identity: message.sender.clone(),
                text: message.text.clone(),
            },
        });
    }

    // Shutdown.

    if message.text == format!("{}quit", config.trigger) {
        if config.is_admin(&message.sender) {
            info!("{} asked the bot to quit.", message.sender);
            actions.push(Action::Shutdown { code: 0 });
        } else {
            warn!("Ignoring quit from non-admin {}.", message.sender);
        }
    }

    actions
}

/// The brain exchange for `message`, if it should have one.
fn converse(message: &IncomingMessage, config: &Config, target: &str) -> Option<Action> {
    if !config.markov_enabled || message.text.chars().count() < config.markov_order {
        return None;
    }

    let text = message.text.replace(config.bot_nick.as_str(), "");
    let addressed = text != message.text;

    let deliver = if message.text.starts_with(&config.trigger) {
        false
    } else if config.markov_reply_when_addressed {
        addressed
    } else {
        !addressed
    };

    Some(Action::Converse {
        target: target.to_string(),
        text,
        deliver,
    })
}
