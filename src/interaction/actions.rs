//! Side effects requested by event handlers.
//!
//! Handlers decide *what* should happen and return [`Action`]s; the [`Executor`]
//! performs them. Everything that may wait on the network or the brain runs on its
//! own task, so executing a batch never blocks the event loop.

use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::{
    base::types::LogRecord,
    service::{brain::BrainClient, chat::ChatClient, lookup::LookupClient},
};

use super::{
    channel_log::ChannelLogger,
    commands,
    dispatch,
    router::{LookupRequest, PackageTask},
};

/// Something an event handler wants done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Join a channel.
    Join { channel: String },
    /// Send these lines, in order.
    Send { target: String, lines: Vec<String> },
    /// Run a lookup and send its reply.
    Lookup { target: String, request: LookupRequest },
    /// Hand a package query to the dispatcher.
    Dispatch { target: String, task: PackageTask },
    /// Feed `text` to the brain, sending the reply only when `deliver` is set.
    Converse { target: String, text: String, deliver: bool },
    /// Make sure a channel's log exists.
    EnsureLog { channel: String },
    /// Append a record to a channel's log.
    Log { channel: String, record: LogRecord },
    /// Stop the bot with the given exit code.
    Shutdown { code: i32 },
}

/// Performs actions against the bot's services.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Executor {
    chat: ChatClient,
    lookup: LookupClient,
    brain: Option<BrainClient>,
    logger: ChannelLogger,
}

impl Executor {
    pub fn new(chat: ChatClient, lookup: LookupClient, brain: Option<BrainClient>, logger: ChannelLogger) -> Self {
        Self { chat, lookup, brain, logger }
    }

    /// Perform `actions` in order.
    ///
    /// Returns the exit code when one of the actions asked the bot to stop.
    #[instrument(skip_all)]
    pub fn execute(&self, actions: Vec<Action>) -> Option<i32> {
        let mut shutdown = None;

        for action in coalesce_sends(actions) {
            match action {
                Action::Join { channel } => self.join(channel),
                Action::Send { target, lines } => self.send(target, lines),
                Action::Lookup { target, request } => self.lookup(target, request),
                Action::Dispatch { target, task } => dispatch::dispatch(task, target, self.chat.clone(), self.lookup.clone()),
                Action::Converse { target, text, deliver } => self.converse(target, text, deliver),
                Action::EnsureLog { channel } => self.logger.ensure_channel(&channel),
                Action::Log { channel, record } => self.logger.append(&channel, record),
                Action::Shutdown { code } => {
                    info!("Shutdown requested with exit code {}.", code);
                    shutdown = Some(code);
                }
            }
        }

        shutdown
    }

    /// The logger actions are handed to.
    pub fn logger(&self) -> &ChannelLogger {
        &self.logger
    }

    fn join(&self, channel: String) {
        let chat = self.chat.clone();

        tokio::spawn(
            async move {
                info!("Joining {} ...", channel);

                if let Err(err) = chat.join_channel(&channel).await {
                    error!("Error while joining {}: {}", channel, err);
                }
            }
            .in_current_span(),
        );
    }

    fn send(&self, target: String, lines: Vec<String>) {
        let chat = self.chat.clone();

        tokio::spawn(
            async move {
                for line in lines {
                    if let Err(err) = chat.send_message(&target, &line).await {
                        error!("Error while sending to {}: {}", target, err);
                        return;
                    }
                }
            }
            .in_current_span(),
        );
    }

    fn lookup(&self, target: String, request: LookupRequest) {
        let chat = self.chat.clone();
        let lookup = self.lookup.clone();

        tokio::spawn(
            async move {
                let reply = commands::run_lookup(&request, &lookup).await;

                if let Err(err) = chat.send_message(&target, &reply).await {
                    error!("Error while sending to {}: {}", target, err);
                }
            }
            .in_current_span(),
        );
    }

    fn converse(&self, target: String, text: String, deliver: bool) {
        let Some(brain) = &self.brain else {
            warn!("Brain is not running; ignoring the exchange.");
            return;
        };

        // Queue now so exchanges reach the brain in event order.
        let Some(pending) = brain.submit(text) else {
            return;
        };

        if !deliver {
            debug!("Brain reply for {} will be discarded.", target);
            return;
        }

        let chat = self.chat.clone();

        tokio::spawn(
            async move {
                let Some(reply) = pending.wait().await else {
                    return;
                };

                if reply.trim().is_empty() {
                    return;
                }

                if let Err(err) = chat.send_message(&target, &reply).await {
                    error!("Error while sending to {}: {}", target, err);
                }
            }
            .in_current_span(),
        );
    }
}

/// Merge runs of sends to the same target so their lines go out on one task, in order.
fn coalesce_sends(actions: Vec<Action>) -> Vec<Action> {
    let mut merged: Vec<Action> = Vec::with_capacity(actions.len());

    for action in actions {
        if let (Some(Action::Send { target: last, lines: pending }), Action::Send { target, lines }) = (merged.last_mut(), &action) {
            if last == target {
                pending.extend(lines.iter().cloned());
                continue;
            }
        }

        merged.push(action);
    }

    merged
}
