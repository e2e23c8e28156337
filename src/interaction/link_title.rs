//! Resolving the titles of links pasted into a channel.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{instrument, warn};

use crate::{base::error::FetchError, service::lookup::LookupClient};

static TITLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<title>(.*?)</title>").expect("title pattern is valid"));

/// Placeholder used when a page has no title tag.
pub const NO_TITLE: &str = "Title Resolution Failure";

/// Find the first link in `text`.
///
/// A link is the first token that contains a scheme or starts with `www.`; bare
/// `www.` tokens are given an `http://` scheme.
pub fn detect_link(text: &str) -> Option<String> {
    text.split_whitespace().find_map(|token| {
        if token.contains("http://") || token.contains("https://") {
            Some(token.to_string())
        } else if token.starts_with("www.") {
            Some(format!("http://{token}"))
        } else {
            None
        }
    })
}

/// Pull the first title out of an HTML body.
pub fn extract_title(body: &str) -> Option<String> {
    let flattened = body.replace(['\n', '\r'], "");

    TITLE.captures(&flattened).map(|captures| captures[1].trim().to_string())
}

/// Fetch `url` and describe it for the channel.
#[instrument(skip(lookup))]
pub async fn resolve(url: &str, lookup: &LookupClient) -> String {
    match lookup.fetch_page(url).await {
        Ok(body) => {
            let title = extract_title(&body).unwrap_or_else(|| NO_TITLE.to_string());
            format!("[ {title} ]( {url} )\n")
        }
        Err(err @ FetchError::Unreachable { .. }) => {
            warn!("{}", err);
            format!("Could not resolve URL {url}, beware...\n")
        }
        Err(err @ FetchError::UnreadableBody { .. }) => {
            warn!("{}", err);
            format!("Could not read response Body of {url} ...\n")
        }
    }
}
