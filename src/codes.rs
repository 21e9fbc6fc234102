//! Code table lookups against the Water Quality Portal
//!
//! Builds `/Codes/{type}code` URLs for country, state, and county tables and
//! resolves them through the shared [`ContentCache`]. The raw XML is returned
//! as-is; turning it into code/description pairs is left to the caller.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

use crate::cache::{Clock, Content, ContentCache, SystemClock};
use crate::fetch::Fetcher;

/// Errors from code lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodesError {
    /// The requested code table does not exist
    #[error("Unknown code type: '{0}'. Valid code types: country, state, county")]
    UnknownCodeType(String),
}

/// The code tables served by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeType {
    Country,
    State,
    County,
}

impl CodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeType::Country => "country",
            CodeType::State => "state",
            CodeType::County => "county",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeType {
    type Err = CodesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "country" => Ok(CodeType::Country),
            "state" => Ok(CodeType::State),
            "county" => Ok(CodeType::County),
            _ => Err(CodesError::UnknownCodeType(s.to_string())),
        }
    }
}

/// Builds the lookup URL for a code table
///
/// A filter becomes `?text={filter}:`; the trailing colon anchors the match on
/// a code. Only the first two colons are percent-encoded, matching what the
/// portal expects for `country:state` county filters.
pub fn codes_url(host: &str, code_type: CodeType, filter_text: Option<&str>) -> String {
    let filter = match filter_text {
        Some(text) => format!("?text={}:", urlencoded(text)).replacen(':', "%3A", 2),
        None => String::new(),
    };
    format!(
        "{}/Codes/{}code{}",
        host.trim_end_matches('/'),
        code_type,
        filter
    )
}

/// Composes the county filter from optional country and state parts
///
/// Returns `"{country}:{state}"` when either part is given and an empty filter
/// otherwise.
pub fn county_filter(country: Option<&str>, state: Option<&str>) -> String {
    if country.is_none() && state.is_none() {
        return String::new();
    }
    format!("{}:{}", country.unwrap_or_default(), state.unwrap_or_default())
}

/// Everything but unreserved characters and `:`, which `codes_url` rewrites itself
const FILTER_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':');

/// Percent-encodes filter text for use in the `text` query parameter
fn urlencoded(s: &str) -> String {
    utf8_percent_encode(s, FILTER_ENCODE_SET).to_string()
}

/// Looks up code tables through the content cache
pub struct CodesClient<F, C = SystemClock> {
    cache: Arc<ContentCache<F, C>>,
    host: String,
}

impl<F, C> Clone for CodesClient<F, C> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            host: self.host.clone(),
        }
    }
}

impl<F: Fetcher, C: Clock> CodesClient<F, C> {
    /// Creates a client for the service at `host`, e.g. `https://www.waterqualitydata.us`
    pub fn new(cache: Arc<ContentCache<F, C>>, host: impl Into<String>) -> Self {
        let host: String = host.into();
        Self {
            cache,
            host: host.trim_end_matches('/').to_string(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn cache(&self) -> &Arc<ContentCache<F, C>> {
        &self.cache
    }

    /// General lookup for any code table
    pub async fn codes(&self, code_type: CodeType, filter_text: Option<&str>) -> Content {
        let url = codes_url(&self.host, code_type, filter_text);
        self.cache.fetch(&url).await
    }

    /// Country codes, optionally narrowed by any text
    pub async fn country_codes(&self, filter_text: Option<&str>) -> Content {
        self.codes(CodeType::Country, filter_text).await
    }

    /// State codes, most usefully narrowed by a country code
    pub async fn state_codes(&self, filter_text: Option<&str>) -> Content {
        self.codes(CodeType::State, filter_text).await
    }

    /// County codes narrowed by country and/or state
    pub async fn county_codes(&self, country: Option<&str>, state: Option<&str>) -> Content {
        let filter = county_filter(country, state);
        self.codes(CodeType::County, Some(filter.as_str())).await
    }
}
