//! The conversational core.
//!
//! A brain is owned by exactly one task. Everything else talks to it through a
//! [`BrainClient`], which queues requests on a bounded channel and waits a bounded
//! time for each reply. Requests are serviced one at a time in the order they were
//! queued, so the brain's state never needs a lock.

pub mod markov;

use std::{path::PathBuf, time::Duration};

use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::base::{config::Config, types::Res};

use self::markov::MarkovBrain;

// Traits.

/// Generic brain trait that conversational models must implement.
pub trait GenericBrain: Send + 'static {
    /// Learn from `input` and produce a reply to it, if the model has one.
    fn learn_and_reply(&mut self, input: &str) -> Option<String>;

    /// Serialize the model state for persistence.
    fn to_json(&self) -> Res<String>;
}

// Types.

/// A single queued exchange.
pub struct BrainRequest {
    pub text: String,
    pub reply: oneshot::Sender<Option<String>>,
}

/// How the brain task is run.
#[derive(Debug, Clone)]
pub struct BrainOptions {
    /// Number of exchanges that may be queued before new ones are dropped.
    pub queue_capacity: usize,
    /// How long a caller waits for a reply.
    pub reply_timeout: Duration,
    /// Where to persist the brain, if anywhere.
    pub save_path: Option<PathBuf>,
    /// How often a changed brain is persisted.
    pub save_interval: Duration,
}

impl BrainOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue_capacity: config.markov_queue_capacity,
            reply_timeout: Duration::from_secs(config.markov_reply_timeout_secs),
            save_path: config.markov_brain_file.clone(),
            save_interval: Duration::from_secs(config.markov_save_interval_secs.max(1)),
        }
    }
}

// Structs.

/// Handle to the brain task.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct BrainClient {
    requests: mpsc::Sender<BrainRequest>,
    reply_timeout: Duration,
}

/// A reply that has been requested but not yet received.
pub struct PendingReply {
    reply: oneshot::Receiver<Option<String>>,
    timeout: Duration,
}

impl PendingReply {
    /// Wait for the reply; an expired wait or a dropped request counts as no reply.
    pub async fn wait(self) -> Option<String> {
        match tokio::time::timeout(self.timeout, self.reply).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                warn!("Brain dropped a request without replying.");
                None
            }
            Err(_) => {
                warn!("Timed out after {:?} waiting for the brain.", self.timeout);
                None
            }
        }
    }
}

impl BrainClient {
    /// Load (or create) the Markov brain described by `config` and start its task.
    #[instrument(name = "BrainClient::markov", skip_all)]
    pub fn markov(config: &Config) -> Res<Self> {
        let brain = match &config.markov_brain_file {
            Some(path) if path.exists() => {
                info!("Loading brain from {} ...", path.display());
                MarkovBrain::from_json(&std::fs::read_to_string(path)?)?
            }
            _ => MarkovBrain::new(config.markov_order, config.markov_max_words),
        };

        Ok(Self::spawn(Box::new(brain), BrainOptions::from_config(config)))
    }

    /// Start a task owning `brain` and return a handle to it.
    pub fn spawn(brain: Box<dyn GenericBrain>, options: BrainOptions) -> Self {
        let (requests, receiver) = mpsc::channel(options.queue_capacity);
        let reply_timeout = options.reply_timeout;

        tokio::spawn(run_brain(brain, receiver, options).in_current_span());

        Self { requests, reply_timeout }
    }

    /// Build a handle around an existing request channel.
    pub fn from_sender(requests: mpsc::Sender<BrainRequest>, reply_timeout: Duration) -> Self {
        Self { requests, reply_timeout }
    }

    /// Queue an exchange without waiting.
    ///
    /// Returns `None` when the queue is full or the brain has stopped; the exchange is
    /// then dropped.
    pub fn submit(&self, text: String) -> Option<PendingReply> {
        let (reply, receiver) = oneshot::channel();

        match self.requests.try_send(BrainRequest { text, reply }) {
            Ok(()) => Some(PendingReply {
                reply: receiver,
                timeout: self.reply_timeout,
            }),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Brain queue is full; dropping the exchange.");
                None
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Brain has stopped; dropping the exchange.");
                None
            }
        }
    }

    /// Queue an exchange and wait for its reply.
    pub async fn exchange(&self, text: impl Into<String>) -> Option<String> {
        self.submit(text.into())?.wait().await
    }
}

// Task.

/// Service requests one at a time, persisting the brain periodically when it changed.
async fn run_brain(mut brain: Box<dyn GenericBrain>, mut receiver: mpsc::Receiver<BrainRequest>, options: BrainOptions) {
    let mut dirty = false;
    let mut ticker = tokio::time::interval(options.save_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            request = receiver.recv() => {
                let Some(request) = request else {
                    break;
                };

                let reply = brain.learn_and_reply(&request.text);
                dirty = true;

                if request.reply.send(reply).is_err() {
                    debug!("Brain reply receiver went away.");
                }
            }
            _ = ticker.tick(), if dirty && options.save_path.is_some() => {
                let json = brain.to_json();
                save_brain(json, options.save_path.as_deref()).await;
                dirty = false;
            }
        }
    }

    if dirty {
        let json = brain.to_json();
        save_brain(json, options.save_path.as_deref()).await;
    }

    info!("Brain stopped.");
}

async fn save_brain(json: Res<String>, path: Option<&std::path::Path>) {
    let Some(path) = path else {
        return;
    };

    let result = async {
        tokio::fs::write(path, json?).await?;
        Res::Ok(())
    }
    .await;

    match result {
        Ok(()) => debug!("Saved brain to {}", path.display()),
        Err(err) => error!("Failed to save brain to {}: {}", path.display(), err),
    }
}

// Tests.
