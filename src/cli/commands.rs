//! CLI command and subcommand definitions

use clap::{Args, Parser, Subcommand};

use crate::client::AbnLookupClientConfig;
use crate::error::Result;
use crate::request::{
    parse_flag, yes_no, AbnSearch, AbnStatusSearch, AsicSearch, CharitySearch, Filters,
    NameAdvancedSearch, NameFilters, NameSearch, PostcodeSearch, Search, SearchKind,
    SearchRequest, SearchWidth,
};
use crate::types::{ResponseFormat, State, StateFilter};
use crate::DEFAULT_BASE_URL;

/// Australian Business Register search CLI
#[derive(Parser, Debug)]
#[command(name = "abn-lookup")]
#[command(version, about = "Search the Australian Business Register", long_about = None)]
pub struct Cli {
    /// Authentication GUID (overrides ABN_LOOKUP_GUID)
    #[arg(long, global = true)]
    pub guid: Option<String>,

    /// Base URL of the ABR XML search service
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Encoding of the service response (xml or json)
    #[arg(long, global = true, default_value = "xml")]
    pub response_format: ResponseFormat,

    /// Stop after printing this many records
    #[arg(long, global = true)]
    pub limit: Option<usize>,

    /// Pretty-print each record
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Client configuration from the global flags
    pub fn client_config(&self) -> AbnLookupClientConfig {
        AbnLookupClientConfig {
            base_url: self.base_url.clone(),
            timeout_seconds: self.timeout,
            response_format: self.response_format,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search by ABN
    Abn {
        /// ABN to search for
        #[arg(long)]
        abn: String,

        /// Include historical details
        #[arg(long)]
        include_historical_details: bool,
    },

    /// Search by ASIC number (ACN, ARBN, ARSN or ARFN)
    Asic {
        /// ASIC number to search for
        #[arg(long)]
        asic: String,

        /// Include historical details
        #[arg(long)]
        include_historical_details: bool,
    },

    /// Search by name
    Name {
        #[command(flatten)]
        name: NameArgs,
    },

    /// Advanced search by name
    NameAdvanced {
        #[command(flatten)]
        name: NameArgs,

        /// Match width: narrow or typical
        #[arg(long, default_value = "typical")]
        search_width: SearchWidth,

        /// Minimum match score (0-100)
        #[arg(long)]
        minimum_score: Option<u32>,

        /// Maximum number of results the service should return
        #[arg(long)]
        max_search_results: Option<u32>,

        /// Only return active ABNs
        #[arg(long)]
        active_abns_only: bool,
    },

    /// Search by postcode
    Postcode {
        /// Postcode to search for
        #[arg(long)]
        postcode: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Search by ABN status
    AbnStatus {
        /// Entity status code
        #[arg(long)]
        entity_status_code: String,

        /// Postcode
        #[arg(long)]
        postcode: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Search for charities
    Charity {
        /// Postcode
        #[arg(long)]
        postcode: Option<String>,

        /// Charity type code
        #[arg(long)]
        charity_type_code: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Search by registration event (event type with a date range, or month and year)
    RegistrationEvent {
        #[command(flatten)]
        event: EventArgs,

        /// Month of registration (1-12)
        #[arg(long)]
        month: Option<u32>,

        /// Year of registration
        #[arg(long)]
        year: Option<i32>,
    },

    /// Search by update event (event type with a date range, or an update date)
    UpdateEvent {
        #[command(flatten)]
        event: EventArgs,

        /// Return entities updated since this date (YYYY-MM-DD)
        #[arg(long)]
        update_date: Option<String>,
    },
}

/// Options shared by the name searches
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Name to search for
    #[arg(long)]
    pub name: String,

    /// State or territory to restrict results to
    #[arg(long)]
    pub state: Option<State>,

    /// Postcode
    #[arg(long)]
    pub postcode: Option<String>,

    /// Search legal names (Y or N)
    #[arg(long, value_parser = parse_yes_no)]
    pub legal_name: Option<bool>,

    /// Search trading names (Y or N)
    #[arg(long, value_parser = parse_yes_no)]
    pub trading_name: Option<bool>,

    /// Search business names (Y or N)
    #[arg(long, value_parser = parse_yes_no)]
    pub business_name: Option<bool>,
}

impl NameArgs {
    fn filters(self) -> (String, NameFilters) {
        let filters = NameFilters {
            postcode: self.postcode,
            legal_name: self.legal_name,
            trading_name: self.trading_name,
            business_name: self.business_name,
            state: StateFilter::from(self.state),
        };
        (self.name, filters)
    }
}

/// Filters shared by the postcode, status, charity and event searches
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// State or territory to restrict results to
    #[arg(long)]
    pub state: Option<State>,

    /// Only return active ABNs
    #[arg(long)]
    pub active_abns_only: bool,

    /// Only return entities currently registered for GST
    #[arg(long)]
    pub current_gst_registration_only: bool,

    /// Entity type code
    #[arg(long)]
    pub entity_type_code: Option<String>,

    /// Concession type code
    #[arg(long)]
    pub concession_type_code: Option<String>,
}

impl FilterArgs {
    fn into_filters(self, postcode: Option<String>) -> Filters {
        Filters {
            postcode,
            state: StateFilter::from(self.state),
            active_abns_only: self.active_abns_only,
            current_gst_registration_only: self.current_gst_registration_only,
            entity_type_code: self.entity_type_code,
            concession_type_code: self.concession_type_code,
        }
    }

    fn append_to(self, mut request: SearchRequest) -> SearchRequest {
        if let Some(state) = self.state {
            request = request.param("state", state);
        }
        request = request
            .param("activeABNsOnly", yes_no(self.active_abns_only))
            .param(
                "currentGSTRegistrationOnly",
                yes_no(self.current_gst_registration_only),
            );
        if let Some(code) = self.entity_type_code {
            request = request.param("entityTypeCode", code);
        }
        if let Some(code) = self.concession_type_code {
            request = request.param("concessionTypeCode", code);
        }
        request
    }
}

/// Options shared by the event searches
#[derive(Args, Debug)]
pub struct EventArgs {
    /// Event type
    #[arg(long)]
    pub event_type: Option<String>,

    /// Start of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<String>,

    /// End of the date range (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<String>,

    /// Postcode
    #[arg(long)]
    pub postcode: Option<String>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

impl EventArgs {
    fn into_request(self, kind: SearchKind) -> SearchRequest {
        let mut request = SearchRequest::new(kind);
        for (name, value) in [
            ("eventType", self.event_type),
            ("fromDate", self.from_date),
            ("toDate", self.to_date),
            ("postcode", self.postcode),
        ] {
            if let Some(value) = value {
                request = request.param(name, value);
            }
        }
        self.filters.append_to(request)
    }
}

impl Commands {
    pub fn kind(&self) -> SearchKind {
        match self {
            Commands::Abn { .. } => SearchKind::Abn,
            Commands::Asic { .. } => SearchKind::Asic,
            Commands::Name { .. } => SearchKind::Name,
            Commands::NameAdvanced { .. } => SearchKind::NameAdvanced,
            Commands::Postcode { .. } => SearchKind::Postcode,
            Commands::AbnStatus { .. } => SearchKind::AbnStatus,
            Commands::Charity { .. } => SearchKind::Charity,
            Commands::RegistrationEvent { .. } => SearchKind::RegistrationEvent,
            Commands::UpdateEvent { .. } => SearchKind::UpdateEvent,
        }
    }

    /// Convert the parsed arguments into a search
    pub fn into_search(self) -> Result<Search> {
        let kind = self.kind();
        let search = match self {
            Commands::Abn {
                abn,
                include_historical_details,
            } => Search::Abn(AbnSearch {
                abn,
                include_historical_details,
            }),
            Commands::Asic {
                asic,
                include_historical_details,
            } => Search::Asic(AsicSearch {
                asic,
                include_historical_details,
            }),
            Commands::Name { name } => {
                let (name, filters) = name.filters();
                Search::Name(NameSearch { name, filters })
            }
            Commands::NameAdvanced {
                name,
                search_width,
                minimum_score,
                max_search_results,
                active_abns_only,
            } => {
                let (name, filters) = name.filters();
                Search::NameAdvanced(NameAdvancedSearch {
                    name,
                    filters,
                    search_width,
                    minimum_score,
                    max_search_results,
                    active_abns_only,
                })
            }
            Commands::Postcode { postcode, filters } => Search::Postcode(PostcodeSearch {
                postcode,
                filters: filters.into_filters(None),
            }),
            Commands::AbnStatus {
                entity_status_code,
                postcode,
                filters,
            } => Search::AbnStatus(AbnStatusSearch {
                entity_status_code,
                filters: filters.into_filters(postcode),
            }),
            Commands::Charity {
                postcode,
                charity_type_code,
                filters,
            } => Search::Charity(CharitySearch {
                charity_type_code,
                filters: filters.into_filters(postcode),
            }),
            Commands::RegistrationEvent { event, month, year } => {
                let mut request = event.into_request(kind);
                if let Some(month) = month {
                    request = request.param("month", month);
                }
                if let Some(year) = year {
                    request = request.param("year", year);
                }
                request.into_search()?
            }
            Commands::UpdateEvent { event, update_date } => {
                let mut request = event.into_request(kind);
                if let Some(date) = update_date {
                    request = request.param("updatedate", date);
                }
                request.into_search()?
            }
        };
        Ok(search)
    }
}

fn parse_yes_no(value: &str) -> std::result::Result<bool, String> {
    parse_flag("flag", value).map_err(|e| e.to_string())
}
