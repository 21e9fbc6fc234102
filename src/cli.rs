//! Command-line interface parsing for wqcodes
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a [`LookupPlan`]: which code tables to fetch, with which filters, and how
//! long to cache the results.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;
use serde_json::{json, Value};
use thiserror::Error;

use crate::cache::Content;
use crate::codes::{county_filter, CodeType, CodesError};

/// Error types for CLI argument parsing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The specified code table is not recognized
    #[error("Invalid code type: '{0}'. Valid code types: country, state, county")]
    InvalidCodeType(String),

    /// --country or --state given without a county lookup
    #[error("--country and --state only apply to county lookups")]
    CountyFilterWithoutCounty,

    /// --filter given without a country or state lookup
    #[error("--filter only applies to country and state lookups")]
    FilterWithoutTarget,
}

impl From<CodesError> for CliError {
    fn from(err: CodesError) -> Self {
        match err {
            CodesError::UnknownCodeType(s) => CliError::InvalidCodeType(s),
        }
    }
}

/// wqcodes - Look up Water Quality Portal code tables
#[derive(Parser, Debug)]
#[command(name = "wqcodes")]
#[command(about = "Cached country, state, and county code lookups")]
#[command(version)]
pub struct Cli {
    /// Code tables to fetch: country, state, county
    ///
    /// Examples:
    ///   wqcodes state --filter US
    ///   wqcodes county --country US --state 55
    ///   wqcodes country state
    #[arg(required = true, value_name = "CODE_TYPE")]
    pub code_types: Vec<String>,

    /// Text narrowing country or state results (e.g. a country code)
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Country narrowing county results
    #[arg(long, value_name = "CODE")]
    pub country: Option<String>,

    /// State narrowing county results
    #[arg(long, value_name = "CODE")]
    pub state: Option<String>,

    /// Seconds to keep results cached, overriding configuration
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,

    /// Codes service host, overriding configuration
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Print a JSON envelope per lookup instead of raw XML
    #[arg(long)]
    pub json: bool,
}

/// A single code table lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub code_type: CodeType,
    pub filter: Option<String>,
}

/// Lookups and settings derived from CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPlan {
    pub requests: Vec<LookupRequest>,
    pub duration: Option<Duration>,
    pub host: Option<String>,
    pub json: bool,
}

/// Parses a code type argument
pub fn parse_code_type_arg(s: &str) -> Result<CodeType, CliError> {
    s.parse::<CodeType>().map_err(CliError::from)
}

impl LookupPlan {
    /// Creates a LookupPlan from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(LookupPlan)` with one request per code type, in argument order
    /// * `Err(CliError)` if a code type is invalid or a filter has no target
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let code_types = cli
            .code_types
            .iter()
            .map(|s| parse_code_type_arg(s))
            .collect::<Result<Vec<_>, _>>()?;

        let has_county = code_types.contains(&CodeType::County);
        let has_filter_target = code_types
            .iter()
            .any(|t| matches!(t, CodeType::Country | CodeType::State));

        if (cli.country.is_some() || cli.state.is_some()) && !has_county {
            return Err(CliError::CountyFilterWithoutCounty);
        }
        if cli.filter.is_some() && !has_filter_target {
            return Err(CliError::FilterWithoutTarget);
        }

        let requests = code_types
            .into_iter()
            .map(|code_type| {
                let filter = match code_type {
                    CodeType::County => Some(county_filter(
                        cli.country.as_deref(),
                        cli.state.as_deref(),
                    )),
                    CodeType::Country | CodeType::State => cli.filter.clone(),
                };
                LookupRequest { code_type, filter }
            })
            .collect();

        Ok(LookupPlan {
            requests,
            duration: cli.duration.map(Duration::from_secs),
            host: cli.host.clone(),
            json: cli.json,
        })
    }
}

/// Builds the JSON envelope printed for one lookup in `--json` mode
pub fn render_json(
    code_type: CodeType,
    url: &str,
    content: &Content,
    expires_at: Option<DateTime<Utc>>,
) -> Value {
    json!({
        "code_type": code_type.as_str(),
        "url": url,
        "source": content.source(),
        "expires_at": expires_at,
        "content": content
            .is_available()
            .then(|| String::from_utf8_lossy(content.bytes()).into_owned()),
    })
}
