pub mod http;
pub mod units;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::{
    error::FetchError,
    types::{PackageRecord, Res, SearchAnswer, TemperatureUnit},
};

// Traits.

/// Generic lookup trait that clients must implement.
///
/// Each method is a narrow call into an external collaborator. Failures are
/// returned to the caller, which turns them into a chat reply.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenericLookupClient: Send + Sync + 'static {
    /// Describe the account anniversary ("cakeday") of `user`.
    async fn cakeday(&self, user: &str) -> Res<String>;

    /// Run a web search for `query`.
    async fn web_search(&self, query: &str) -> Res<SearchAnswer>;

    /// Convert `value` from `unit` into the other scale, returning display text.
    fn convert_temperature(&self, value: f64, unit: TemperatureUnit) -> String;

    /// Search packages; an empty query lists the latest packages.
    async fn search_packages(&self, query: &str) -> Res<Vec<PackageRecord>>;

    /// List the packages depending on `package`.
    async fn reverse_dependencies(&self, package: &str) -> Res<Vec<PackageRecord>>;

    /// Fetch the body of `url` as text.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

// Structs.

/// Lookup client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct LookupClient {
    inner: Arc<dyn GenericLookupClient>,
}

impl Deref for LookupClient {
    type Target = dyn GenericLookupClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl LookupClient {
    pub fn new(inner: Arc<dyn GenericLookupClient>) -> Self {
        Self { inner }
    }
}
