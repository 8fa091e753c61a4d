//! Shared types: states, response formats, the authentication GUID and result records.

use crate::error::{AbnLookupError, Result};
use crate::GUID_ENV_VAR;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Australian states and territories understood by the ABR filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Nsw,
    Act,
    Vic,
    Qld,
    Sa,
    Wa,
    Tas,
    Nt,
}

impl State {
    /// Every state, in the order the ABR documents its name-search flags
    pub const ALL: [State; 8] = [
        State::Nsw,
        State::Act,
        State::Vic,
        State::Qld,
        State::Sa,
        State::Wa,
        State::Tas,
        State::Nt,
    ];

    /// Upper-case code as sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            State::Nsw => "NSW",
            State::Act => "ACT",
            State::Vic => "VIC",
            State::Qld => "QLD",
            State::Sa => "SA",
            State::Wa => "WA",
            State::Tas => "TAS",
            State::Nt => "NT",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for State {
    type Err = AbnLookupError;

    fn from_str(s: &str) -> Result<Self> {
        State::ALL
            .iter()
            .copied()
            .find(|state| state.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AbnLookupError::invalid("state", format!("unknown state or territory `{}`", s))
            })
    }
}

/// State filter applied to a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateFilter {
    /// No restriction
    #[default]
    All,
    /// Restrict to a single state or territory
    Only(State),
}

impl StateFilter {
    /// Value of the `state` query parameter
    pub fn code(&self) -> &'static str {
        match self {
            StateFilter::All => "ALL",
            StateFilter::Only(state) => state.code(),
        }
    }

    /// Whether records from `state` are included
    pub fn includes(&self, state: State) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Only(only) => *only == state,
        }
    }
}

impl From<State> for StateFilter {
    fn from(state: State) -> Self {
        StateFilter::Only(state)
    }
}

impl From<Option<State>> for StateFilter {
    fn from(state: Option<State>) -> Self {
        state.map(StateFilter::Only).unwrap_or_default()
    }
}

impl FromStr for StateFilter {
    type Err = AbnLookupError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("ALL") {
            Ok(StateFilter::All)
        } else {
            s.parse::<State>().map(StateFilter::Only)
        }
    }
}

/// Encoding of the response body
///
/// Only the decoder changes: requests still go to `{base_url}/{method}`.
/// The default `.asmx` endpoint always answers in XML, so `Json` is for a
/// `base_url` that serves the same `ABRPayloadSearchResults` tree as JSON
/// (optionally JSONP-wrapped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Xml,
    Json,
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Xml => write!(f, "xml"),
            ResponseFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ResponseFormat {
    type Err = AbnLookupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" => Ok(ResponseFormat::Xml),
            "json" => Ok(ResponseFormat::Json),
            other => Err(AbnLookupError::invalid(
                "response format",
                format!("expected `xml` or `json`, got `{}`", other),
            )),
        }
    }
}

/// Opaque authentication token issued by the ABR
///
/// It is forwarded as-is on every request and never validated locally.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticationGuid(String);

impl AuthenticationGuid {
    /// Wrap an explicit token
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    /// Use `explicit` when given and non-empty, otherwise read `ABN_LOOKUP_GUID`
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        if let Some(guid) = explicit.map(str::trim).filter(|g| !g.is_empty()) {
            return Ok(Self::new(guid));
        }
        Self::from_env()
    }

    /// Read the token from `ABN_LOOKUP_GUID`
    pub fn from_env() -> Result<Self> {
        match std::env::var(GUID_ENV_VAR) {
            Ok(guid) if !guid.trim().is_empty() => Ok(Self::new(guid.trim())),
            _ => Err(AbnLookupError::missing(
                "client construction",
                format!("authenticationGuid (set {})", GUID_ENV_VAR),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthenticationGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthenticationGuid(****)")
    }
}

/// One search result, mirroring the upstream schema
///
/// Records are left unstructured: element names become keys, repeated
/// elements become arrays, and text-only elements become strings. The
/// accessors below cover the fields most callers want.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying nested value
    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Top-level field lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Follow `keys` through nested mappings, taking the first element of any array on the way
    pub fn path(&self, keys: &[&str]) -> Option<&Value> {
        let mut current = first(&self.0);
        for key in keys {
            current = first(current.get(key)?);
        }
        Some(current)
    }

    /// Like [`Record::path`], but only for text values
    pub fn text(&self, keys: &[&str]) -> Option<&str> {
        self.path(keys).and_then(Value::as_str)
    }

    /// The ABN (or other identifier) of the entity
    pub fn identifier(&self) -> Option<&str> {
        if let Value::String(value) = &self.0 {
            return Some(value.as_str());
        }
        self.text(&["ABN", "identifierValue"])
            .or_else(|| self.text(&["ABN"]))
            .or_else(|| self.text(&["identifierValue"]))
            .or_else(|| self.text(&["value"]))
    }

    /// Status of the identifier, e.g. `Active` or `Cancelled`
    pub fn identifier_status(&self) -> Option<&str> {
        self.text(&["ABN", "identifierStatus"])
            .or_else(|| self.text(&["identifierStatus"]))
            .or_else(|| self.text(&["entityStatus", "entityStatusCode"]))
    }

    /// Organisation name from the first name block that carries one
    pub fn organisation_name(&self) -> Option<&str> {
        const NAME_BLOCKS: [&str; 5] = [
            "mainName",
            "legalName",
            "businessName",
            "mainTradingName",
            "otherTradingName",
        ];
        NAME_BLOCKS.iter().find_map(|block| {
            self.text(&[block, "organisationName"])
                .or_else(|| self.text(&[block, "fullName"]))
        })
    }

    pub fn state_code(&self) -> Option<&str> {
        self.text(&["mainBusinessPhysicalAddress", "stateCode"])
            .or_else(|| self.text(&["stateCode"]))
    }

    pub fn postcode(&self) -> Option<&str> {
        self.text(&["mainBusinessPhysicalAddress", "postcode"])
            .or_else(|| self.text(&["postcode"]))
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

fn first(value: &Value) -> &Value {
    match value {
        Value::Array(items) => items.first().unwrap_or(value),
        other => other,
    }
}
