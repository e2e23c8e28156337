//! Background package searches.
//!
//! A dispatched search acknowledges right away, runs its lookup on its own task, and
//! then replies with at most [`RESULT_CAP`] results spaced [`PACING_DELAY`] apart.

use std::time::Duration;

use tracing::{Instrument, error, info, instrument, warn};

use crate::{
    base::types::Void,
    service::{chat::ChatClient, lookup::LookupClient},
};

use super::router::{PackageTask, PackageTaskKind};

/// Maximum number of per-result messages.
pub const RESULT_CAP: usize = 3;

/// Delay between per-result messages.
pub const PACING_DELAY: Duration = Duration::from_secs(1);

/// Shortest query accepted by a search.
pub const MIN_QUERY_LENGTH: usize = 2;

pub const ACKNOWLEDGEMENT: &str = "Searching, be patient boy";
pub const CLARIFICATION: &str = "Please, be more specific next time";

/// Run `task` in the background, replying to `target`.
#[instrument(skip(chat, lookup))]
pub fn dispatch(task: PackageTask, target: String, chat: ChatClient, lookup: LookupClient) {
    tokio::spawn(
        async move {
            // Process the task.
            let result = run_package_task(&task, &target, &chat, &lookup).await;

            // Log any errors.
            if let Err(err) = &result {
                error!("Error while dispatching: {}", err);
            }
        }
        .in_current_span(),
    );
}

/// Run `task` to completion on the current task.
#[instrument(skip(chat, lookup))]
pub async fn run_package_task(task: &PackageTask, target: &str, chat: &ChatClient, lookup: &LookupClient) -> Void {
    chat.send_message(target, ACKNOWLEDGEMENT).await?;

    let long_enough = task.query.chars().count() >= MIN_QUERY_LENGTH;

    let (name, results) = match task.kind {
        PackageTaskKind::Search if long_enough => (task.query.clone(), lookup.search_packages(&task.query).await),
        PackageTaskKind::Search => ("latest packages".to_string(), lookup.search_packages("").await),
        PackageTaskKind::ReverseDependencies if long_enough => (task.query.clone(), lookup.reverse_dependencies(&task.query).await),
        PackageTaskKind::ReverseDependencies => {
            chat.send_message(target, CLARIFICATION).await?;
            return Ok(());
        }
    };

    let results = match results {
        Ok(results) => results,
        Err(err) => {
            warn!("Package lookup for {} failed: {}", name, err);
            chat.send_message(target, &format!("Package search failed: {err}")).await?;
            return Ok(());
        }
    };

    if results.is_empty() {
        chat.send_message(target, &format!("No results for {name} limited to {RESULT_CAP} results")).await?;
        return Ok(());
    }

    info!("Sending {} of {} results for {}", results.len().min(RESULT_CAP), results.len(), name);
    chat.send_message(target, &format!("Showing the results limited to {RESULT_CAP} for {name}")).await?;

    for (i, record) in results.iter().take(RESULT_CAP).enumerate() {
        if i > 0 {
            tokio::time::sleep(PACING_DELAY).await;
        }

        chat.send_message(target, &record.to_string()).await?;
    }

    Ok(())
}
