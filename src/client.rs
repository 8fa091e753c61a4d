//! ABR XML Search API client implementation.

use crate::error::{AbnLookupError, Result};
use crate::request::{
    AbnSearch, AbnStatusSearch, AsicSearch, CharitySearch, NameAdvancedSearch, NameSearch,
    PostcodeSearch, QuerySpec, RegistrationEventSearch, Search, SearchRequest, UpdateEventSearch,
};
use crate::response::{self, SearchResults};
use crate::types::{AuthenticationGuid, Record, ResponseFormat};
use crate::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Configuration for the ABN Lookup client
#[derive(Debug, Clone)]
pub struct AbnLookupClientConfig {
    /// Base URL of the ABR XML search service; method names are appended to it
    pub base_url: String,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// How response bodies are decoded; `Json` needs a `base_url` serving JSON
    pub response_format: ResponseFormat,
}

impl Default for AbnLookupClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
            response_format: ResponseFormat::Xml,
        }
    }
}

/// Client for the ABR XML Search API
///
/// Holds no mutable state: every search is one independent GET request.
#[derive(Debug, Clone)]
pub struct AbnLookupClient {
    /// HTTP client
    http_client: Client,
    /// Token sent as `authenticationGuid` on every request
    guid: AuthenticationGuid,
    /// Client configuration
    config: AbnLookupClientConfig,
}

impl AbnLookupClient {
    /// Create a new client with default configuration
    pub fn new(guid: impl Into<String>) -> Result<Self> {
        Self::with_config(guid, AbnLookupClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(guid: impl Into<String>, config: AbnLookupClientConfig) -> Result<Self> {
        Self::with_guid(AuthenticationGuid::new(guid), config)
    }

    /// Create a client using the GUID from `ABN_LOOKUP_GUID`
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(AbnLookupClientConfig::default())
    }

    /// Create a client with custom configuration using the GUID from `ABN_LOOKUP_GUID`
    pub fn from_env_with_config(config: AbnLookupClientConfig) -> Result<Self> {
        Self::with_guid(AuthenticationGuid::from_env()?, config)
    }

    /// Create a client from an already resolved GUID
    pub fn with_guid(guid: AuthenticationGuid, config: AbnLookupClientConfig) -> Result<Self> {
        // Fail on a bad base URL here rather than on the first search
        Url::parse(&config.base_url)?;

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            guid,
            config,
        })
    }

    pub fn config(&self) -> &AbnLookupClientConfig {
        &self.config
    }

    /// Run any search and return its records
    pub async fn search(&self, search: &Search) -> Result<SearchResults> {
        let query = search.query()?;
        let url = self.build_url(&query)?;

        let names: Vec<&str> = query.params.iter().map(|(name, _)| *name).collect();
        debug!("Calling {} with parameters {:?}", query.method(), names);

        let body = self.fetch(url).await?;
        let results = response::normalize(query.kind, self.config.response_format, &body)?;

        info!("{} returned {} record(s)", query.kind, results.len());
        Ok(results)
    }

    /// Run a loosely typed request, validating its parameters first
    pub async fn execute(&self, request: SearchRequest) -> Result<SearchResults> {
        let search = request.into_search()?;
        self.search(&search).await
    }

    /// Look up one entity by ABN
    pub async fn search_by_abn(&self, abn: &str, include_historical_details: bool) -> Result<Record> {
        let search = Search::Abn(AbnSearch {
            abn: abn.to_string(),
            include_historical_details,
        });
        self.single(&search).await
    }

    /// Look up one entity by ASIC number (ACN, ARBN, ARSN or ARFN)
    pub async fn search_by_asic(
        &self,
        asic: &str,
        include_historical_details: bool,
    ) -> Result<Record> {
        let search = Search::Asic(AsicSearch {
            asic: asic.to_string(),
            include_historical_details,
        });
        self.single(&search).await
    }

    pub async fn search_by_name(&self, search: NameSearch) -> Result<SearchResults> {
        self.search(&Search::Name(search)).await
    }

    pub async fn search_by_name_advanced(
        &self,
        search: NameAdvancedSearch,
    ) -> Result<SearchResults> {
        self.search(&Search::NameAdvanced(search)).await
    }

    pub async fn search_by_postcode(&self, search: PostcodeSearch) -> Result<SearchResults> {
        self.search(&Search::Postcode(search)).await
    }

    pub async fn search_by_abn_status(&self, search: AbnStatusSearch) -> Result<SearchResults> {
        self.search(&Search::AbnStatus(search)).await
    }

    pub async fn search_by_charity(&self, search: CharitySearch) -> Result<SearchResults> {
        self.search(&Search::Charity(search)).await
    }

    pub async fn search_by_registration_event(
        &self,
        search: RegistrationEventSearch,
    ) -> Result<SearchResults> {
        self.search(&Search::RegistrationEvent(search)).await
    }

    pub async fn search_by_update_event(
        &self,
        search: UpdateEventSearch,
    ) -> Result<SearchResults> {
        self.search(&Search::UpdateEvent(search)).await
    }

    /// Build the full request URL, including the authentication GUID
    pub fn build_url(&self, query: &QuerySpec) -> Result<Url> {
        let mut base = self.config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let mut url = Url::parse(&base)?.join(query.method())?;
        url.query_pairs_mut()
            .extend_pairs(query.params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("authenticationGuid", self.guid.as_str());
        Ok(url)
    }

    async fn single(&self, search: &Search) -> Result<Record> {
        self.search(search)
            .await?
            .next()
            .ok_or_else(|| AbnLookupError::malformed("no business entity in response"))
    }

    /// Make the HTTP request and return the body text
    async fn fetch(&self, url: Url) -> Result<String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        debug!("Received {} byte response", body.len());
        Ok(body)
    }
}
