//! Per-source profiles, loaded from RON files.
//!
//! Everything that used to live as module-level constants in the one-off
//! acquisition scripts (endpoint URL, headers, rate-limit interval, page
//! cap, retry bound) is explicit per-source configuration here.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use collector_core::{Query, RetryPolicy};
use collector_engine::{EndpointConfig, PageShape, PagingStyle, RunSettings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PagingSpec {
    /// DataTables-style offset paging via URL query parameters.
    QueryParams { offset: String, length: String },
    /// Offset paging via fields of a JSON POST body.
    JsonBody { offset: String, length: String },
}

/// One collectable source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProfile {
    pub name: String,
    pub url: String,
    pub paging: PagingSpec,
    /// Key of the record array in the response body.
    pub records_key: String,
    #[serde(default)]
    pub total_key: Option<String>,
    /// Field carrying each record's unique key, e.g. `unique_id`.
    pub identity_key: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Known hard cap on page size for this source, if any.
    #[serde(default)]
    pub page_cap: Option<usize>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Minimum gap between requests, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base retry delay, in milliseconds; grows linearly per attempt.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Fixed filter parameters sent with every request.
    #[serde(default)]
    pub params: Vec<(String, String)>,
}

fn default_page_size() -> usize {
    50
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl SourceProfile {
    pub fn endpoint(&self) -> EndpointConfig {
        let paging = match &self.paging {
            PagingSpec::QueryParams { offset, length } => PagingStyle::QueryParams {
                offset_param: offset.clone(),
                length_param: length.clone(),
            },
            PagingSpec::JsonBody { offset, length } => PagingStyle::JsonBody {
                offset_field: offset.clone(),
                length_field: length.clone(),
            },
        };
        EndpointConfig {
            url: self.url.clone(),
            paging,
            headers: self.headers.clone(),
            page_cap: self.page_cap,
            shape: PageShape {
                records_key: self.records_key.clone(),
                total_key: self.total_key.clone(),
            },
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            min_interval: Duration::from_millis(self.min_interval_ms),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                base_delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }

    /// Builds the run query: the profile's fixed filters first, then any
    /// extra filters given on the command line.
    pub fn query(&self, extra_params: &[(String, String)]) -> Query {
        let mut query = Query::new(self.page_size);
        for (key, value) in self.params.iter().chain(extra_params) {
            query = query.with_param(key, value);
        }
        query
    }
}

pub fn load_profile(path: &Path) -> Result<SourceProfile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source profile {}", path.display()))?;
    ron::from_str(&content)
        .with_context(|| format!("parsing source profile {}", path.display()))
}
