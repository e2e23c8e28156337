//! Splitting trigger-prefixed messages into commands.

use crate::base::types::ParsedCommand;

/// Parse `text` as a command if it starts with `trigger`.
///
/// The remainder is split on the first whitespace into a lowercased verb and a
/// trimmed argument. A bare trigger, or a trigger followed by whitespace, is not a
/// command.
pub fn parse(text: &str, trigger: &str) -> Option<ParsedCommand> {
    if trigger.is_empty() {
        return None;
    }

    let rest = text.strip_prefix(trigger)?;

    let (verb, argument) = match rest.split_once(char::is_whitespace) {
        Some((verb, argument)) => (verb, argument.trim()),
        None => (rest.trim_end(), ""),
    };

    if verb.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        verb: verb.to_lowercase(),
        token: verb.to_string(),
        argument: argument.to_string(),
    })
}
