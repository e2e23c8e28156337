//! Command handlers.
//!
//! Immediate handlers are plain functions returning reply text. Lookup handlers take
//! the lookup client and always produce exactly one reply; collaborator failures
//! become the reply rather than an error.

use rand::Rng;
use tracing::{instrument, warn};

use crate::{
    base::{quips, types::TemperatureUnit},
    service::lookup::LookupClient,
};

use super::{
    link_title,
    router::{LookupRequest, Verb},
};

/// The help text, one line per message.
pub fn help(trigger: &str) -> Vec<String> {
    let t = trigger;

    vec![
        "Available commands:".to_string(),
        format!("General info: {t}forum,  {t}homepage,  {t}wiki,  {t}bugs"),
        format!(
            "Package search: {t}latestpkgs (show you latest packages), {t}pkg <package> (search for a package), {t}rdep <package> (reverse dependency of a package)"
        ),
        format!("Various utils: {t}ddg/search <whatever>, {t}convtemp <27C>, {t}cakeday <someone>, {t}random <whatever>"),
    ]
}

/// A labelled informational link.
pub fn link(label: &str, url: &str) -> String {
    format!("({label})[ {url} ]\n")
}

/// Usage hint for a verb that needs an argument.
pub fn usage(trigger: &str, token: &str, verb: Verb) -> String {
    let what = match verb {
        Verb::Cakeday => "<someone>",
        Verb::ConvertTemperature => "<value><C|F>",
        _ => "<query>",
    };

    format!("Usage: {trigger}{token} {what}")
}

/// The action-style reply for verbs the bot does not know.
pub fn generic_action<R: Rng + ?Sized>(verb: &str, argument: &str, rng: &mut R) -> String {
    let quip = quips::select_quip(rng);
    format!("\x01ACTION {verb}s {argument}, {quip}\x01")
}

/// Run a lookup and produce its reply.
pub async fn run_lookup(request: &LookupRequest, lookup: &LookupClient) -> String {
    match request {
        LookupRequest::Cakeday(user) => cakeday(user, lookup).await,
        LookupRequest::WebSearch(query) => web_search(query, lookup).await,
        LookupRequest::ConvertTemperature(query) => convert_temperature(query, lookup),
        LookupRequest::LinkTitle(url) => link_title::resolve(url, lookup).await,
    }
}

#[instrument(skip(lookup))]
pub async fn cakeday(user: &str, lookup: &LookupClient) -> String {
    match lookup.cakeday(user).await {
        Ok(response) => format!("{response}\n"),
        Err(err) => {
            warn!("Cakeday lookup failed: {}", err);
            format!("I caught an error: {err}\n")
        }
    }
}

/// Search, preferring a related topic, then an external result, then a redirect.
#[instrument(skip(lookup))]
pub async fn web_search(query: &str, lookup: &LookupClient) -> String {
    let answer = match lookup.web_search(query).await {
        Ok(answer) => answer,
        Err(err) => {
            warn!("Web search failed: {}", err);
            return format!("DDG Error: {err}\n");
        }
    };

    if let Some(topic) = answer.related_topics.first() {
        return format!("First Topical Result: [ {} ]( {} )\n", topic.first_url, topic.text);
    }

    if let Some(result) = answer.results.first() {
        return format!("First External result: [ {} ]( {} )\n", result.first_url, result.text);
    }

    if !answer.redirect.is_empty() {
        let title = link_title::resolve(&answer.redirect, lookup).await;
        return format!("Redirect result: {}\n", title.trim_end());
    }

    format!("Query: '{query}' returned no results.\n")
}

/// Convert inputs like `27C` or `80f`.
///
/// The first `c` (else `f`) in the input selects the unit, and everything before it
/// must parse as a number.
pub fn convert_temperature(query: &str, lookup: &LookupClient) -> String {
    let input = query.trim().to_lowercase();

    let (marker, unit) = if input.contains('c') {
        ('c', TemperatureUnit::Celsius)
    } else if input.contains('f') {
        ('f', TemperatureUnit::Fahrenheit)
    } else {
        return "Invalid unit input, please use either 'F' or 'C'.\n".to_string();
    };

    let number = input.split(marker).next().unwrap_or_default().trim();

    match number.parse::<f64>() {
        Ok(value) => {
            let converted = lookup.convert_temperature(value, unit);
            format!("{} is {}.\n", input.to_uppercase(), converted)
        }
        Err(err) => format!("Caught error '{err}' trying to convert '{query}'.\n"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mockall::predicate::eq;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::{
        base::{
            error::FetchError,
            types::{SearchAnswer, SearchTopic},
        },
        service::lookup::MockGenericLookupClient,
    };

    fn client(mock: MockGenericLookupClient) -> LookupClient {
        LookupClient::new(Arc::new(mock))
    }

    fn topic(url: &str, text: &str) -> SearchTopic {
        SearchTopic {
            first_url: url.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_help_names_trigger() {
        let lines = help("~");

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("~forum"));
        assert!(lines[3].contains("~convtemp <27C>"));
    }

    #[test]
    fn test_generic_action() {
        let mut rng = StepRng::new(0, 0);
        assert_eq!(generic_action("hug", "bob", &mut rng), "\x01ACTION hugs bob, FOR SCIENCE!\x01");
    }

    #[tokio::test]
    async fn test_web_search_prefers_related_topic() {
        let mut mock = MockGenericLookupClient::new();
        mock.expect_web_search().with(eq("golang")).returning(|_| {
            Ok(SearchAnswer {
                related_topics: vec![topic("http://x", "Go")],
                results: vec![topic("http://y", "Other")],
                redirect: String::new(),
            })
        });

        assert_eq!(web_search("golang", &client(mock)).await, "First Topical Result: [ http://x ]( Go )\n");
    }

    #[tokio::test]
    async fn test_web_search_falls_back_to_external_result() {
        let mut mock = MockGenericLookupClient::new();
        mock.expect_web_search().returning(|_| {
            Ok(SearchAnswer {
                results: vec![topic("http://y", "Other")],
                ..Default::default()
            })
        });

        assert_eq!(web_search("q", &client(mock)).await, "First External result: [ http://y ]( Other )\n");
    }

    #[tokio::test]
    async fn test_web_search_resolves_redirect() {
        let mut mock = MockGenericLookupClient::new();
        mock.expect_web_search().returning(|_| {
            Ok(SearchAnswer {
                redirect: "https://golang.org".to_string(),
                ..Default::default()
            })
        });
        mock.expect_fetch_page()
            .with(eq("https://golang.org"))
            .returning(|_| Ok("<html><head><title>The Go Programming Language</title></head></html>".to_string()));

        assert_eq!(
            web_search("!go", &client(mock)).await,
            "Redirect result: [ The Go Programming Language ]( https://golang.org )\n"
        );
    }

    #[tokio::test]
    async fn test_web_search_no_results_and_errors() {
        let mut empty = MockGenericLookupClient::new();
        empty.expect_web_search().returning(|_| Ok(SearchAnswer::default()));
        assert_eq!(web_search("zzz", &client(empty)).await, "Query: 'zzz' returned no results.\n");

        let mut failing = MockGenericLookupClient::new();
        failing.expect_web_search().returning(|_| Err(anyhow::anyhow!("service unavailable")));
        assert_eq!(web_search("zzz", &client(failing)).await, "DDG Error: service unavailable\n");
    }

    #[tokio::test]
    async fn test_cakeday() {
        let mut mock = MockGenericLookupClient::new();
        mock.expect_cakeday().with(eq("spez")).returning(|_| Ok("spez's cakeday is June 6 (since 2005)".to_string()));
        mock.expect_cakeday().with(eq("ghost")).returning(|_| Err(anyhow::anyhow!("no such user: ghost")));
        let lookup = client(mock);

        assert_eq!(cakeday("spez", &lookup).await, "spez's cakeday is June 6 (since 2005)\n");
        assert_eq!(cakeday("ghost", &lookup).await, "I caught an error: no such user: ghost\n");
    }

    #[test]
    fn test_convert_temperature() {
        let mut mock = MockGenericLookupClient::new();
        mock.expect_convert_temperature()
            .with(eq(0.0), eq(TemperatureUnit::Celsius))
            .return_const("32.00F".to_string());
        mock.expect_convert_temperature()
            .with(eq(80.5), eq(TemperatureUnit::Fahrenheit))
            .return_const("26.94C".to_string());
        let lookup = client(mock);

        assert_eq!(convert_temperature("0C", &lookup), "0C is 32.00F.\n");
        assert_eq!(convert_temperature("0c", &lookup), "0C is 32.00F.\n");
        assert_eq!(convert_temperature("80.5f", &lookup), "80.5F is 26.94C.\n");
    }

    #[test]
    fn test_convert_temperature_rejects_bad_input() {
        let lookup = client(MockGenericLookupClient::new());

        assert_eq!(convert_temperature("42K", &lookup), "Invalid unit input, please use either 'F' or 'C'.\n");
        assert!(convert_temperature("hotc", &lookup).starts_with("Caught error '"));
        assert!(convert_temperature("c", &lookup).ends_with("trying to convert 'c'.\n"));
    }

    #[tokio::test]
    async fn test_run_lookup_link_title_failure() {
        let mut mock = MockGenericLookupClient::new();
        mock.expect_fetch_page().returning(|url| {
            Err(FetchError::Unreachable {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
        });

        let reply = run_lookup(&LookupRequest::LinkTitle("http://example.com".to_string()), &client(mock)).await;

        assert_eq!(reply, "Could not resolve URL http://example.com, beware...\n");
    }
}
