//! The event callback registry.
//!
//! Handlers are plain functions from an event to the actions it calls for. They never
//! perform I/O themselves, which keeps them cheap enough to run on the event loop.

use std::collections::HashMap;

use rand::RngCore;
use tracing::debug;

use crate::base::{
    config::Config,
    types::{ChatEvent, EventKind, LogRecord},
};

use super::{actions::Action, message};

/// A stateless event handler.
pub type Handler = fn(&ChatEvent, &Config, &mut dyn RngCore) -> Vec<Action>;

/// Dispatch table from event kind to the handlers bound to it.
#[derive(Clone)]
pub struct EventRegistry {
    handlers: HashMap<EventKind, Vec<Handler>>,
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRegistry {
    /// A registry with the bot's standard handlers bound.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register(EventKind::Connected, on_connected);
        registry.register(EventKind::Join, on_join);
        registry.register(EventKind::Part, on_part);
        registry.register(EventKind::Quit, on_quit);
        registry.register(EventKind::Message, message::on_message);

        registry
    }

    /// A registry with nothing bound.
    pub fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Bind `handler` to `kind`; handlers run in registration order.
    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Run every handler bound to the event's kind and collect their actions.
    pub fn dispatch(&self, event: &ChatEvent, config: &Config, rng: &mut dyn RngCore) -> Vec<Action> {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            debug!("No handlers for {:?}", event.kind());
            return Vec::new();
        };

        handlers.iter().flat_map(|handler| handler(event, config, rng)).collect()
    }
}

fn system(text: String) -> LogRecord {
    LogRecord::System { text }
}

/// Join every configured channel.
pub fn on_connected(_event: &ChatEvent, config: &Config, _rng: &mut dyn RngCore) -> Vec<Action> {
    config.channels.iter().map(|channel| Action::Join { channel: channel.clone() }).collect()
}

pub fn on_join(event: &ChatEvent, config: &Config, _rng: &mut dyn RngCore) -> Vec<Action> {
    let ChatEvent::Join { nick, channel } = event else {
        return Vec::new();
    };

    let mut actions = Vec::new();

    if *nick == config.bot_nick {
        actions.push(Action::EnsureLog { channel: channel.clone() });

        if config.message_on_join && !config.join_message.is_empty() {
            actions.push(Action::Send {
                target: channel.clone(),
                lines: vec![config.join_message.clone()],
            });
        }
    }

    if config.welcome_enabled && !config.welcome_message.is_empty() {
        actions.push(Action::Send {
            target: channel.clone(),
            lines: vec![config.welcome_message.clone()],
        });
    }

    actions.push(Action::Log {
        channel: channel.clone(),
        record: system(format!("{nick} has joined")),
    });

    actions
}

pub fn on_part(event: &ChatEvent, _config: &Config, _rng: &mut dyn RngCore) -> Vec<Action> {
    let ChatEvent::Part { nick, host, channel, reason } = event else {
        return Vec::new();
    };

    vec![Action::Log {
        channel: channel.clone(),
        record: system(format!("{nick}@{host} has parted ({reason})")),
    }]
}

/// A quit carries no channel, so it is recorded in every configured channel.
pub fn on_quit(event: &ChatEvent, config: &Config, _rng: &mut dyn RngCore) -> Vec<Action> {
    let ChatEvent::Quit { nick, host, reason } = event else {
        return Vec::new();
    };

    config
        .channels
        .iter()
        .map(|channel| Action::Log {
            channel: channel.clone(),
            record: system(format!("{nick}@{host} has quit ({reason})")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::base::config::ConfigInner;

    fn config() -> Config {
        Config::from(ConfigInner {
            bot_nick: "chanbot".to_string(),
            trigger: "!".to_string(),
            channels: vec!["#one".to_string(), "#two".to_string()],
            ..Default::default()
        })
    }

    fn join(nick: &str) -> ChatEvent {
        ChatEvent::Join {
            nick: nick.to_string(),
            channel: "#one".to_string(),
        }
    }

    fn dispatch(registry: &EventRegistry, event: &ChatEvent, config: &Config) -> Vec<Action> {
        registry.dispatch(event, config, &mut StepRng::new(0, 0))
    }

    #[test]
    fn test_connected_joins_channels() {
        let actions = dispatch(&EventRegistry::new(), &ChatEvent::Connected, &config());

        assert_eq!(
            actions,
            vec![Action::Join { channel: "#one".to_string() }, Action::Join { channel: "#two".to_string() }]
        );
    }

    #[test]
    fn test_own_join_ensures_log_first() {
        let config = Config::from(ConfigInner {
            message_on_join: true,
            join_message: "Hello, I am chanbot".to_string(),
            ..(*config()).clone()
        });

        let actions = dispatch(&EventRegistry::new(), &join("chanbot"), &config);

        assert_eq!(
            actions,
            vec![
                Action::EnsureLog { channel: "#one".to_string() },
                Action::Send {
                    target: "#one".to_string(),
                    lines: vec!["Hello, I am chanbot".to_string()]
                },
                Action::Log {
                    channel: "#one".to_string(),
                    record: system("chanbot has joined".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_other_join_is_welcomed_when_enabled() {
        let quiet = dispatch(&EventRegistry::new(), &join("alice"), &config());
        assert_eq!(
            quiet,
            vec![Action::Log {
                channel: "#one".to_string(),
                record: system("alice has joined".to_string())
            }]
        );

        let welcoming = Config::from(ConfigInner {
            welcome_enabled: true,
            welcome_message: "Welcome!".to_string(),
            ..(*config()).clone()
        });
        let actions = dispatch(&EventRegistry::new(), &join("alice"), &welcoming);

        assert_eq!(
            actions[0],
            Action::Send {
                target: "#one".to_string(),
                lines: vec!["Welcome!".to_string()]
            }
        );
        assert!(!actions.iter().any(|a| matches!(a, Action::EnsureLog { .. })));
    }

    #[test]
    fn test_part_and_quit_records() {
        let registry = EventRegistry::new();

        let part = ChatEvent::Part {
            nick: "alice".to_string(),
            host: "example.org".to_string(),
            channel: "#two".to_string(),
            reason: "bye".to_string(),
        };
        assert_eq!(
            dispatch(&registry, &part, &config()),
            vec![Action::Log {
                channel: "#two".to_string(),
                record: system("alice@example.org has parted (bye)".to_string())
            }]
        );

        let quit = ChatEvent::Quit {
            nick: "alice".to_string(),
            host: "example.org".to_string(),
            reason: "Ping timeout".to_string(),
        };
        let actions = dispatch(&registry, &quit, &config());
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| matches!(
            a,
            Action::Log { record: LogRecord::System { text }, .. } if text == "alice@example.org has quit (Ping timeout)"
        )));
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        fn first(_: &ChatEvent, _: &Config, _: &mut dyn RngCore) -> Vec<Action> {
            vec![Action::Shutdown { code: 1 }]
        }

        fn second(_: &ChatEvent, _: &Config, _: &mut dyn RngCore) -> Vec<Action> {
            vec![Action::Shutdown { code: 2 }]
        }

        let mut registry = EventRegistry::empty();
        registry.register(EventKind::Connected, first);
        registry.register(EventKind::Connected, second);

        assert_eq!(
            dispatch(&registry, &ChatEvent::Connected, &config()),
            vec![Action::Shutdown { code: 1 }, Action::Shutdown { code: 2 }]
        );
        assert!(dispatch(&registry, &join("alice"), &config()).is_empty());
    }
}
