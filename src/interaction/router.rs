//! Mapping parsed commands onto handlers.
//!
//! Verbs are matched as whole tokens. Immediate handlers produce their reply here;
//! lookups and package searches are described and handed back to the caller, which
//! runs them off the event loop.

use rand::Rng;

use crate::base::{config::Config, types::ParsedCommand};

use super::commands;

/// Every verb the bot recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Help,
    Wiki,
    Homepage,
    Forum,
    Bugs,
    Cakeday,
    Search,
    ConvertTemperature,
    PackageSearch,
    ReverseDependencies,
    LatestPackages,
    Quit,
}

impl Verb {
    /// Look up a (lowercased) verb token.
    pub fn from_token(token: &str) -> Option<Self> {
        let verb = match token {
            "help" => Verb::Help,
            "wiki" => Verb::Wiki,
            "homepage" => Verb::Homepage,
            "forum" => Verb::Forum,
            "bugs" => Verb::Bugs,
            "cakeday" => Verb::Cakeday,
            "ddg" | "search" => Verb::Search,
            "convtemp" => Verb::ConvertTemperature,
            "pkg" => Verb::PackageSearch,
            "rdep" => Verb::ReverseDependencies,
            "latestpkgs" => Verb::LatestPackages,
            "quit" => Verb::Quit,
            _ => return None,
        };

        Some(verb)
    }
}

/// A lookup answered with a single reply once it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    Cakeday(String),
    WebSearch(String),
    ConvertTemperature(String),
    LinkTitle(String),
}

/// Which package query a dispatched task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageTaskKind {
    Search,
    ReverseDependencies,
}

/// A package query run by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTask {
    pub kind: PackageTaskKind,
    pub query: String,
}

/// What to do about a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Reply right away with these lines.
    Reply(Vec<String>),
    /// Run a lookup and reply with its result.
    Lookup(LookupRequest),
    /// Hand a package query to the dispatcher.
    Dispatch(PackageTask),
    /// The admin shutdown command; handled by the message handler.
    Quit,
    /// Nothing to say.
    Nothing,
}

/// Select the handler for `command`.
pub fn route<R: Rng + ?Sized>(command: &ParsedCommand, config: &Config, rng: &mut R) -> Route {
    let argument = command.argument.as_str();

    let Some(verb) = Verb::from_token(&command.verb) else {
        if argument.is_empty() {
            return Route::Nothing;
        }

        return Route::Reply(vec![commands::generic_action(&command.token, argument, rng)]);
    };

    match verb {
        Verb::Help => Route::Reply(commands::help(&config.trigger)),
        Verb::Wiki => Route::Reply(vec![commands::link("Wiki", &config.links.wiki)]),
        Verb::Homepage => Route::Reply(vec![commands::link("Homepage", &config.links.homepage)]),
        Verb::Forum => Route::Reply(vec![commands::link("Forums", &config.links.forum)]),
        Verb::Bugs => Route::Reply(vec![commands::link("Bugs", &config.links.bugs)]),
        Verb::Cakeday | Verb::Search | Verb::ConvertTemperature if argument.is_empty() => {
            Route::Reply(vec![commands::usage(&config.trigger, &command.verb, verb)])
        }
        Verb::Cakeday => Route::Lookup(LookupRequest::Cakeday(argument.to_string())),
        Verb::Search => Route::Lookup(LookupRequest::WebSearch(argument.to_string())),
        Verb::ConvertTemperature => Route::Lookup(LookupRequest::ConvertTemperature(argument.to_string())),
        Verb::PackageSearch => Route::Dispatch(PackageTask {
            kind: PackageTaskKind::Search,
            query: argument.to_string(),
        }),
        Verb::ReverseDependencies => Route::Dispatch(PackageTask {
            kind: PackageTaskKind::ReverseDependencies,
            query: argument.to_string(),
        }),
        Verb::LatestPackages => Route::Dispatch(PackageTask {
            kind: PackageTaskKind::Search,
            query: String::new(),
        }),
        Verb::Quit => Route::Quit,
    }
}
