//! Runtime services and shared state for chanbot.

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{ChatEvent, Res},
    },
    interaction::{actions::Executor, channel_log::ChannelLogger, events::EventRegistry},
    service::{brain::BrainClient, chat::ChatClient, lookup::LookupClient},
};

/// Number of transport events buffered ahead of the event loop.
const EVENT_QUEUE_CAPACITY: usize = 1024;

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration and every service client the event loop
/// needs. It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    /// The lookup client instance.
    pub lookup: LookupClient,
    /// The brain, when the Markov brain is enabled.
    pub brain: Option<BrainClient>,
    /// The handlers bound to transport events.
    pub registry: EventRegistry,
    /// Performs the actions handlers ask for.
    pub executor: Executor,
}

impl Runtime {
    /// Create a new runtime instance backed by IRC and HTTP lookups.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the lookup client.
        let lookup = LookupClient::http(&config)?;

        // Initialize the chat client.
        let chat = ChatClient::irc(&config);

        // Initialize the brain.
        let brain = if config.markov_enabled { Some(BrainClient::markov(&config)?) } else { None };

        Ok(Self::from_parts(config, chat, lookup, brain))
    }

    /// Assemble a runtime from existing clients.
    pub fn from_parts(config: Config, chat: ChatClient, lookup: LookupClient, brain: Option<BrainClient>) -> Self {
        let logger = ChannelLogger::spawn(config.log_dir.clone());
        let executor = Executor::new(chat.clone(), lookup.clone(), brain.clone(), logger);

        Self {
            config,
            chat,
            lookup,
            brain,
            registry: EventRegistry::new(),
            executor,
        }
    }

    /// Run the event loop until shutdown is requested, the connection closes, or the
    /// process is interrupted.
    ///
    /// Returns the exit code the process should end with.
    #[instrument(skip_all)]
    pub async fn start(&self) -> Res<i32> {
        let (events, mut receiver) = mpsc::channel::<ChatEvent>(EVENT_QUEUE_CAPACITY);

        // Start the transport.

        let chat = self.chat.clone();
        let transport = tokio::spawn(async move { chat.start(events).await }.in_current_span());

        // Run the loop.

        let mut rng = StdRng::from_entropy();
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        let code = loop {
            tokio::select! {
                event = receiver.recv() => {
                    let Some(event) = event else {
                        break None;
                    };

                    let actions = self.registry.dispatch(&event, &self.config, &mut rng);

                    if let Some(code) = self.executor.execute(actions) {
                        break Some(code);
                    }
                }
                _ = &mut interrupt => {
                    info!("Interrupted; stopping ...");
                    break Some(0);
                }
            }
        };

        // Make sure everything logged so far is on disk.

        self.executor.logger().flush().await;

        if let Some(code) = code {
            transport.abort();
            return Ok(code);
        }

        // The transport hung up; report why.

        match transport.await {
            Ok(Ok(())) => {
                info!("Connection closed.");
                Ok(0)
            }
            Ok(Err(err)) => {
                error!("Connection failed: {}", err);
                Err(err)
            }
            Err(err) => Err(err.into()),
        }
    }
}
