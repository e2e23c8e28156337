pub mod irc;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::base::types::{ChatEvent, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with a chat network.
/// Implementations must allow `send_message` and `join_channel` to be called from
/// many tasks at once.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Get the nick the bot is using.
    fn bot_nick(&self) -> &str;

    /// Connect and forward transport events into `events` until the connection closes.
    async fn start(&self, events: mpsc::Sender<ChatEvent>) -> Void;

    /// Send a (possibly multi-line) message to a channel or nick.
    ///
    /// Each non-empty line is delivered as its own message.
    async fn send_message(&self, target: &str, text: &str) -> Void;

    /// Join a channel.
    async fn join_channel(&self, channel: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
