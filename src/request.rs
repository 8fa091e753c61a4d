//! Request building: maps each search operation onto its ABR method and query parameters.
//!
//! Nothing in this module performs I/O. A [`Search`] is validated and turned
//! into a [`QuerySpec`]; the client appends the authentication GUID and sends it.

use crate::error::{AbnLookupError, Result};
use crate::types::{State, StateFilter};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The nine ABR search operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Abn,
    Asic,
    Name,
    NameAdvanced,
    Postcode,
    AbnStatus,
    Charity,
    RegistrationEvent,
    UpdateEvent,
}

impl SearchKind {
    pub const ALL: [SearchKind; 9] = [
        SearchKind::Abn,
        SearchKind::Asic,
        SearchKind::Name,
        SearchKind::NameAdvanced,
        SearchKind::Postcode,
        SearchKind::AbnStatus,
        SearchKind::Charity,
        SearchKind::RegistrationEvent,
        SearchKind::UpdateEvent,
    ];

    /// Web service method appended to the base URL
    pub fn method(&self) -> &'static str {
        match self {
            SearchKind::Abn => "ABRSearchByABN",
            SearchKind::Asic => "ABRSearchByASIC",
            SearchKind::Name => "ABRSearchByNameSimpleProtocol",
            SearchKind::NameAdvanced => "ABRSearchByNameAdvancedSimpleProtocol",
            SearchKind::Postcode => "SearchByPostcode",
            SearchKind::AbnStatus => "SearchByABNStatus",
            SearchKind::Charity => "SearchByCharity",
            SearchKind::RegistrationEvent => "SearchByRegistrationEvent",
            SearchKind::UpdateEvent => "SearchByUpdateEvent",
        }
    }

    /// Subcommand name used by the CLI
    pub fn command(&self) -> &'static str {
        match self {
            SearchKind::Abn => "abn",
            SearchKind::Asic => "asic",
            SearchKind::Name => "name",
            SearchKind::NameAdvanced => "name-advanced",
            SearchKind::Postcode => "postcode",
            SearchKind::AbnStatus => "abn-status",
            SearchKind::Charity => "charity",
            SearchKind::RegistrationEvent => "registration-event",
            SearchKind::UpdateEvent => "update-event",
        }
    }

    /// Human readable operation name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            SearchKind::Abn => "search by ABN",
            SearchKind::Asic => "search by ASIC number",
            SearchKind::Name => "search by name",
            SearchKind::NameAdvanced => "advanced search by name",
            SearchKind::Postcode => "search by postcode",
            SearchKind::AbnStatus => "search by ABN status",
            SearchKind::Charity => "search by charity",
            SearchKind::RegistrationEvent => "search by registration event",
            SearchKind::UpdateEvent => "search by update event",
        }
    }

    /// Lookups by identifier return one business entity rather than a result list
    pub fn is_single_result(&self) -> bool {
        matches!(self, SearchKind::Abn | SearchKind::Asic)
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fully built request: the method to call and its ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub kind: SearchKind,
    pub params: Vec<(&'static str, String)>,
}

impl QuerySpec {
    fn new(kind: SearchKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    pub fn method(&self) -> &'static str {
        self.kind.method()
    }

    /// Value of the first parameter named `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.params.push((name, value.into()));
    }

    fn push_opt(&mut self, name: &'static str, value: Option<&str>) {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.push(name, value);
        }
    }

    fn push_flag(&mut self, name: &'static str, value: bool) {
        self.push(name, yes_no(value));
    }
}

/// Optional filters shared by the postcode, status, charity and event searches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub postcode: Option<String>,
    pub state: StateFilter,
    pub active_abns_only: bool,
    pub current_gst_registration_only: bool,
    pub entity_type_code: Option<String>,
    pub concession_type_code: Option<String>,
}

impl Filters {
    pub fn postcode(mut self, postcode: impl Into<String>) -> Self {
        self.postcode = Some(postcode.into());
        self
    }

    pub fn state(mut self, state: impl Into<StateFilter>) -> Self {
        self.state = state.into();
        self
    }

    pub fn active_abns_only(mut self, value: bool) -> Self {
        self.active_abns_only = value;
        self
    }

    pub fn current_gst_registration_only(mut self, value: bool) -> Self {
        self.current_gst_registration_only = value;
        self
    }

    pub fn entity_type_code(mut self, code: impl Into<String>) -> Self {
        self.entity_type_code = Some(code.into());
        self
    }

    pub fn concession_type_code(mut self, code: impl Into<String>) -> Self {
        self.concession_type_code = Some(code.into());
        self
    }

    fn append_to(&self, query: &mut QuerySpec, postcode: Option<&str>) {
        query.push_opt("postcode", postcode.or(self.postcode.as_deref()));
        query.push("state", self.state.code());
        query.push_flag("activeABNsOnly", self.active_abns_only);
        query.push_flag("currentGSTRegistrationOnly", self.current_gst_registration_only);
        query.push_opt("entityTypeCode", self.entity_type_code.as_deref());
        query.push_opt("concessionTypeCode", self.concession_type_code.as_deref());
    }
}

/// Optional filters for the name searches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameFilters {
    pub postcode: Option<String>,
    pub legal_name: Option<bool>,
    pub trading_name: Option<bool>,
    pub business_name: Option<bool>,
    pub state: StateFilter,
}

impl NameFilters {
    fn append_to(&self, query: &mut QuerySpec) {
        query.push_opt("postcode", self.postcode.as_deref());
        if let Some(value) = self.legal_name {
            query.push_flag("legalName", value);
        }
        if let Some(value) = self.trading_name {
            query.push_flag("tradingName", value);
        }
        if let Some(value) = self.business_name {
            query.push_flag("businessName", value);
        }
        for state in State::ALL {
            query.push_flag(state.code(), self.state.includes(state));
        }
    }
}

/// How loosely the advanced name search matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchWidth {
    Narrow,
    #[default]
    Typical,
}

impl SearchWidth {
    pub fn code(&self) -> &'static str {
        match self {
            SearchWidth::Narrow => "narrow",
            SearchWidth::Typical => "typical",
        }
    }
}

impl std::str::FromStr for SearchWidth {
    type Err = AbnLookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "narrow" => Ok(SearchWidth::Narrow),
            "typical" => Ok(SearchWidth::Typical),
            other => Err(AbnLookupError::invalid(
                "searchWidth",
                format!("expected `narrow` or `typical`, got `{}`", other),
            )),
        }
    }
}

/// Time window of an event search
///
/// The ABR has documented both an event-type/date-range form and a
/// month/year (registration) or update-date (update) form; both are sent as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventWindow {
    Range {
        event_type: String,
        from_date: NaiveDate,
        to_date: NaiveDate,
    },
    Month {
        month: u32,
        year: i32,
    },
    UpdatedSince {
        date: NaiveDate,
    },
}

impl EventWindow {
    fn append_to(&self, kind: SearchKind, query: &mut QuerySpec) -> Result<()> {
        match self {
            EventWindow::Range {
                event_type,
                from_date,
                to_date,
            } => {
                let event_type = required(kind, "eventType", event_type)?;
                if from_date > to_date {
                    return Err(AbnLookupError::invalid(
                        "fromDate",
                        format!("{} is after toDate {}", from_date, to_date),
                    ));
                }
                query.push("eventType", event_type);
                query.push("fromDate", from_date.format(DATE_FORMAT).to_string());
                query.push("toDate", to_date.format(DATE_FORMAT).to_string());
            }
            EventWindow::Month { month, year } if kind == SearchKind::RegistrationEvent => {
                if !(1..=12).contains(month) {
                    return Err(AbnLookupError::invalid(
                        "month",
                        format!("{} is not between 1 and 12", month),
                    ));
                }
                query.push("month", month.to_string());
                query.push("year", year.to_string());
            }
            EventWindow::UpdatedSince { date } if kind == SearchKind::UpdateEvent => {
                query.push("updatedate", date.format(DATE_FORMAT).to_string());
            }
            other => {
                return Err(AbnLookupError::invalid(
                    "eventWindow",
                    format!("{:?} is not accepted by {}", other, kind),
                ))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbnSearch {
    pub abn: String,
    pub include_historical_details: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsicSearch {
    pub asic: String,
    pub include_historical_details: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSearch {
    pub name: String,
    pub filters: NameFilters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameAdvancedSearch {
    pub name: String,
    pub filters: NameFilters,
    pub search_width: SearchWidth,
    /// Minimum match score, 0 to 100
    pub minimum_score: Option<u32>,
    pub max_search_results: Option<u32>,
    pub active_abns_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostcodeSearch {
    pub postcode: String,
    pub filters: Filters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbnStatusSearch {
    pub entity_status_code: String,
    pub filters: Filters,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharitySearch {
    pub charity_type_code: Option<String>,
    pub filters: Filters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEventSearch {
    pub window: EventWindow,
    pub filters: Filters,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEventSearch {
    pub window: EventWindow,
    pub filters: Filters,
}

/// A search operation with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Search {
    Abn(AbnSearch),
    Asic(AsicSearch),
    Name(NameSearch),
    NameAdvanced(NameAdvancedSearch),
    Postcode(PostcodeSearch),
    AbnStatus(AbnStatusSearch),
    Charity(CharitySearch),
    RegistrationEvent(RegistrationEventSearch),
    UpdateEvent(UpdateEventSearch),
}

impl Search {
    /// Search by ABN without historical details
    pub fn abn(abn: impl Into<String>) -> Self {
        Search::Abn(AbnSearch {
            abn: abn.into(),
            include_historical_details: false,
        })
    }

    /// Search by ASIC number without historical details
    pub fn asic(asic: impl Into<String>) -> Self {
        Search::Asic(AsicSearch {
            asic: asic.into(),
            include_historical_details: false,
        })
    }

    /// Simple name search across all states
    pub fn name(name: impl Into<String>) -> Self {
        Search::Name(NameSearch {
            name: name.into(),
            filters: NameFilters::default(),
        })
    }

    pub fn postcode(postcode: impl Into<String>) -> Self {
        Search::Postcode(PostcodeSearch {
            postcode: postcode.into(),
            filters: Filters::default(),
        })
    }

    pub fn abn_status(entity_status_code: impl Into<String>) -> Self {
        Search::AbnStatus(AbnStatusSearch {
            entity_status_code: entity_status_code.into(),
            filters: Filters::default(),
        })
    }

    pub fn kind(&self) -> SearchKind {
        match self {
            Search::Abn(_) => SearchKind::Abn,
            Search::Asic(_) => SearchKind::Asic,
            Search::Name(_) => SearchKind::Name,
            Search::NameAdvanced(_) => SearchKind::NameAdvanced,
            Search::Postcode(_) => SearchKind::Postcode,
            Search::AbnStatus(_) => SearchKind::AbnStatus,
            Search::Charity(_) => SearchKind::Charity,
            Search::RegistrationEvent(_) => SearchKind::RegistrationEvent,
            Search::UpdateEvent(_) => SearchKind::UpdateEvent,
        }
    }

    /// Validate the search and build its query, applying defaults for unset options
    pub fn query(&self) -> Result<QuerySpec> {
        let kind = self.kind();
        let mut query = QuerySpec::new(kind);

        match self {
            Search::Abn(search) => {
                query.push("searchString", required(kind, "searchString", &search.abn)?);
                query.push_flag("includeHistoricalDetails", search.include_historical_details);
            }
            Search::Asic(search) => {
                query.push("searchString", required(kind, "searchString", &search.asic)?);
                query.push_flag("includeHistoricalDetails", search.include_historical_details);
            }
            Search::Name(search) => {
                query.push("name", required(kind, "name", &search.name)?);
                search.filters.append_to(&mut query);
            }
            Search::NameAdvanced(search) => {
                query.push("name", required(kind, "name", &search.name)?);
                search.filters.append_to(&mut query);
                query.push("searchWidth", search.search_width.code());
                if let Some(score) = search.minimum_score {
                    if score > 100 {
                        return Err(AbnLookupError::invalid(
                            "minimumScore",
                            format!("{} is not between 0 and 100", score),
                        ));
                    }
                    query.push("minimumScore", score.to_string());
                }
                if let Some(max) = search.max_search_results.filter(|max| *max > 0) {
                    query.push("maxSearchResults", max.to_string());
                }
                query.push_flag("activeABNsOnly", search.active_abns_only);
            }
            Search::Postcode(search) => {
                let postcode = required(kind, "postcode", &search.postcode)?;
                search.filters.append_to(&mut query, Some(&postcode));
            }
            Search::AbnStatus(search) => {
                query.push(
                    "entityStatusCode",
                    required(kind, "entityStatusCode", &search.entity_status_code)?,
                );
                search.filters.append_to(&mut query, None);
            }
            Search::Charity(search) => {
                search.filters.append_to(&mut query, None);
                query.push_opt("charityTypeCode", search.charity_type_code.as_deref());
            }
            Search::RegistrationEvent(search) => {
                search.window.append_to(kind, &mut query)?;
                search.filters.append_to(&mut query, None);
            }
            Search::UpdateEvent(search) => {
                search.window.append_to(kind, &mut query)?;
                search.filters.append_to(&mut query, None);
            }
        }

        Ok(query)
    }

    /// Build a typed search from loosely typed parameters
    ///
    /// Keys are the ABR parameter names (`name`, `postcode`, `eventType`,
    /// `fromDate`, ...); `abn`/`asic` are accepted in place of `searchString`.
    pub fn from_params(kind: SearchKind, params: &HashMap<String, String>) -> Result<Self> {
        let p = Params { kind, params };

        let search = match kind {
            SearchKind::Abn => Search::Abn(AbnSearch {
                abn: p.require(&["abn", "searchString"])?,
                include_historical_details: p.flag("includeHistoricalDetails")?.unwrap_or(false),
            }),
            SearchKind::Asic => Search::Asic(AsicSearch {
                asic: p.require(&["asic", "searchString"])?,
                include_historical_details: p.flag("includeHistoricalDetails")?.unwrap_or(false),
            }),
            SearchKind::Name => Search::Name(NameSearch {
                name: p.require(&["name"])?,
                filters: p.name_filters()?,
            }),
            SearchKind::NameAdvanced => Search::NameAdvanced(NameAdvancedSearch {
                name: p.require(&["name"])?,
                filters: p.name_filters()?,
                search_width: p
                    .get("searchWidth")
                    .map(str::parse::<SearchWidth>)
                    .transpose()?
                    .unwrap_or_default(),
                minimum_score: p.number("minimumScore")?,
                max_search_results: p.number("maxSearchResults")?,
                active_abns_only: p.flag("activeABNsOnly")?.unwrap_or(false),
            }),
            SearchKind::Postcode => Search::Postcode(PostcodeSearch {
                postcode: p.require(&["postcode"])?,
                filters: p.filters()?,
            }),
            SearchKind::AbnStatus => Search::AbnStatus(AbnStatusSearch {
                entity_status_code: p.require(&["entityStatusCode"])?,
                filters: p.filters()?,
            }),
            SearchKind::Charity => Search::Charity(CharitySearch {
                charity_type_code: p.get("charityTypeCode").map(str::to_string),
                filters: p.filters()?,
            }),
            SearchKind::RegistrationEvent => Search::RegistrationEvent(RegistrationEventSearch {
                window: p.window()?,
                filters: p.filters()?,
            }),
            SearchKind::UpdateEvent => Search::UpdateEvent(UpdateEventSearch {
                window: p.window()?,
                filters: p.filters()?,
            }),
        };

        Ok(search)
    }
}

/// Loosely typed request: an operation plus named parameter values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub kind: SearchKind,
    pub params: HashMap<String, String>,
}

impl SearchRequest {
    pub fn new(kind: SearchKind) -> Self {
        Self {
            kind,
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn into_search(self) -> Result<Search> {
        Search::from_params(self.kind, &self.params)
    }
}

impl TryFrom<SearchRequest> for Search {
    type Error = AbnLookupError;

    fn try_from(request: SearchRequest) -> Result<Self> {
        request.into_search()
    }
}

struct Params<'a> {
    kind: SearchKind,
    params: &'a HashMap<String, String>,
}

impl Params<'_> {
    fn get(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, names: &[&'static str]) -> Result<String> {
        names
            .iter()
            .find_map(|name| self.get(name))
            .map(str::to_string)
            .ok_or_else(|| AbnLookupError::missing(self.kind.label(), names[0]))
    }

    fn flag(&self, name: &str) -> Result<Option<bool>> {
        self.get(name).map(|v| parse_flag(name, v)).transpose()
    }

    fn number(&self, name: &str) -> Result<Option<u32>> {
        self.get(name)
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|e| AbnLookupError::invalid(name, e.to_string()))
            })
            .transpose()
    }

    fn date(&self, name: &str) -> Result<Option<NaiveDate>> {
        self.get(name).map(|v| parse_date(name, v)).transpose()
    }

    fn state(&self) -> Result<StateFilter> {
        Ok(self
            .get("state")
            .map(str::parse::<StateFilter>)
            .transpose()?
            .unwrap_or_default())
    }

    fn filters(&self) -> Result<Filters> {
        Ok(Filters {
            postcode: self.get("postcode").map(str::to_string),
            state: self.state()?,
            active_abns_only: self.flag("activeABNsOnly")?.unwrap_or(false),
            current_gst_registration_only: self
                .flag("currentGSTRegistrationOnly")?
                .unwrap_or(false),
            entity_type_code: self.get("entityTypeCode").map(str::to_string),
            concession_type_code: self.get("concessionTypeCode").map(str::to_string),
        })
    }

    fn name_filters(&self) -> Result<NameFilters> {
        Ok(NameFilters {
            postcode: self.get("postcode").map(str::to_string),
            legal_name: self.flag("legalName")?,
            trading_name: self.flag("tradingName")?,
            business_name: self.flag("businessName")?,
            state: self.state()?,
        })
    }

    fn window(&self) -> Result<EventWindow> {
        if self.kind == SearchKind::RegistrationEvent
            && (self.get("month").is_some() || self.get("year").is_some())
        {
            let month = self.require(&["month"])?;
            let year = self.require(&["year"])?;
            return Ok(EventWindow::Month {
                month: month
                    .parse()
                    .map_err(|_| AbnLookupError::invalid("month", format!("`{}`", month)))?,
                year: year
                    .parse()
                    .map_err(|_| AbnLookupError::invalid("year", format!("`{}`", year)))?,
            });
        }

        if self.kind == SearchKind::UpdateEvent && self.get("eventType").is_none() {
            if let Some(date) = self.date("updatedate")? {
                return Ok(EventWindow::UpdatedSince { date });
            }
        }

        let event_type = self.require(&["eventType"])?;
        let from_date = self
            .date("fromDate")?
            .ok_or_else(|| AbnLookupError::missing(self.kind.label(), "fromDate"))?;
        let to_date = self
            .date("toDate")?
            .ok_or_else(|| AbnLookupError::missing(self.kind.label(), "toDate"))?;

        Ok(EventWindow::Range {
            event_type,
            from_date,
            to_date,
        })
    }
}

fn required(kind: SearchKind, name: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AbnLookupError::missing(kind.label(), name));
    }
    Ok(value.to_string())
}

/// Encode a flag the way the ABR expects it
pub(crate) fn yes_no(value: bool) -> &'static str {
    if value {
        "Y"
    } else {
        "N"
    }
}

/// Parse a Y/N style flag
pub fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Ok(true),
        "n" | "no" | "false" | "0" => Ok(false),
        other => Err(AbnLookupError::invalid(
            name,
            format!("expected Y or N, got `{}`", other),
        )),
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        AbnLookupError::invalid(name, format!("`{}` is not a YYYY-MM-DD date: {}", value, e))
    })
}
