use serde::{Deserialize, Serialize};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// A single text message received from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// The raw message text.
    pub text: String,
    /// The nick of the sender.
    pub sender: String,
    /// The channel (or, for private messages, the bot's nick) the message was sent to.
    pub target: String,
    /// Whether the bot itself sent this message.
    pub is_self_originated: bool,
}

impl IncomingMessage {
    /// Whether this message was sent directly to the bot rather than to a channel.
    pub fn is_private(&self, bot_nick: &str) -> bool {
        self.target == bot_nick
    }

    /// Where replies to this message should go.
    ///
    /// Channel messages are answered in the channel; private messages are answered
    /// to the sender.
    pub fn reply_target(&self, bot_nick: &str) -> &str {
        if self.is_private(bot_nick) { &self.sender } else { &self.target }
    }
}

/// A transport lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Registration with the server completed.
    Connected,
    /// `nick` joined `channel`.
    Join { nick: String, channel: String },
    /// `nick` left `channel`.
    Part { nick: String, host: String, channel: String, reason: String },
    /// `nick` disconnected from the server.
    Quit { nick: String, host: String, reason: String },
    /// A message was received.
    Message(IncomingMessage),
}

/// The discriminant of a [`ChatEvent`], used to key the event registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connected,
    Join,
    Part,
    Quit,
    Message,
}

impl ChatEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChatEvent::Connected => EventKind::Connected,
            ChatEvent::Join { .. } => EventKind::Join,
            ChatEvent::Part { .. } => EventKind::Part,
            ChatEvent::Quit { .. } => EventKind::Quit,
            ChatEvent::Message(_) => EventKind::Message,
        }
    }
}

/// A trigger-prefixed command split into its verb and argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// The lowercased verb.
    pub verb: String,
    /// The verb as it was typed.
    pub token: String,
    /// Everything after the verb, trimmed. May be empty.
    pub argument: String,
}

/// One record returned by the package search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl std::fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} - {}", self.name, self.description)
        }
    }
}

/// A topic (or external result) returned by the web search collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchTopic {
    #[serde(rename = "FirstURL", default)]
    pub first_url: String,
    #[serde(rename = "Text", default)]
    pub text: String,
}

/// The answer returned by the web search collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchAnswer {
    pub related_topics: Vec<SearchTopic>,
    pub results: Vec<SearchTopic>,
    pub redirect: String,
}

/// Temperature scale of a value handed to the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// A line written to a channel log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// Something somebody said.
    Message { identity: String, text: String },
    /// A synthetic record (join, part, quit).
    System { text: String },
}

impl LogRecord {
    pub fn render(&self) -> String {
        match self {
            LogRecord::Message { identity, text } => format!("{identity}: {text}"),
            LogRecord::System { text } => format!("*** {text}"),
        }
    }
}
