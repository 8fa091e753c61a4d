//! # ABN Lookup
//!
//! An async Rust client for the Australian Business Register (ABR) XML Search API.
//!
//! Each of the nine ABR search operations is a variant of [`Search`]. The
//! client validates the search, sends one GET request carrying the
//! authentication GUID, and returns the matching records as a
//! [`SearchResults`] iterator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use abn_lookup::{AbnLookupClient, Search};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AbnLookupClient::new("your-authentication-guid")?;
//!
//!     // Look up a single entity
//!     let entity = client.search_by_abn("53004085616", false).await?;
//!     println!("{:?}", entity.organisation_name());
//!
//!     // Search by name
//!     for record in client.search(&Search::name("Telstra")).await? {
//!         println!("{:?} {:?}", record.identifier(), record.organisation_name());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Authentication
//!
//! The ABR issues a GUID to registered users. Pass it to
//! [`AbnLookupClient::new`] or set `ABN_LOOKUP_GUID` and use
//! [`AbnLookupClient::from_env`].

pub mod cli;
pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod types;

pub use client::{AbnLookupClient, AbnLookupClientConfig};
pub use error::{AbnLookupError, Result};
pub use request::{
    AbnSearch, AbnStatusSearch, AsicSearch, CharitySearch, EventWindow, Filters,
    NameAdvancedSearch, NameFilters, NameSearch, PostcodeSearch, QuerySpec,
    RegistrationEventSearch, Search, SearchKind, SearchRequest, SearchWidth, UpdateEventSearch,
};
pub use response::SearchResults;
pub use types::{AuthenticationGuid, Record, ResponseFormat, State, StateFilter};

/// Re-export of the date type used by event searches
pub use chrono::NaiveDate;

/// The default base URL of the ABR XML search service
pub const DEFAULT_BASE_URL: &str = "https://abr.business.gov.au/abrxmlsearchRPC/AbrXmlSearch.asmx";

/// Default user agent string for requests
pub const DEFAULT_USER_AGENT: &str = concat!("abn-lookup-rs/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding the default authentication GUID
pub const GUID_ENV_VAR: &str = "ABN_LOOKUP_GUID";
