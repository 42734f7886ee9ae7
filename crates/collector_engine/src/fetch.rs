use std::time::Duration;

use async_trait::async_trait;
use collector_core::{Cursor, Page, Query};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::types::{FetchError, FetchErrorKind, RawRecord};

/// HTTP-level knobs shared by all endpoints.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request timeout. Observed sources need anywhere from 15s to
    /// 60s; slow municipal backends are the norm, not the exception.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "collector/0.1".to_string(),
        }
    }
}

/// How the endpoint expects the paging window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagingStyle {
    /// Offset and length as URL query parameters, DataTables style
    /// (`?start=0&length=50`). Filters travel as query parameters too.
    QueryParams {
        offset_param: String,
        length_param: String,
    },
    /// Offset and length as fields of a JSON POST body; filters become
    /// string fields of the same body.
    JsonBody {
        offset_field: String,
        length_field: String,
    },
}

/// Where the records and the optional total live in the response JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageShape {
    /// Key of the record array, e.g. `data` or `notices`.
    pub records_key: String,
    /// Key of the reported total count, for sources that have one. The
    /// value is advisory; a missing key is not an error.
    pub total_key: Option<String>,
}

/// One paged endpoint: where to call and how to read the reply.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: String,
    pub paging: PagingStyle,
    pub headers: Vec<(String, String)>,
    /// Hard page-size cap observed for this source, if any. Some servers
    /// silently truncate a page to a lower maximum (observed: 51 rows)
    /// instead of erroring, so the requested length is a hint.
    pub page_cap: Option<usize>,
    pub shape: PageShape,
}

/// One network call for one page of results.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// No internal retry: the driver owns the retry policy, which keeps
    /// fetchers composable and testable in isolation.
    async fn fetch_page(&self, query: &Query, cursor: Cursor)
        -> Result<Page<RawRecord>, FetchError>;
}

/// [`PageFetcher`] over a reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestPageFetcher {
    endpoint: EndpointConfig,
    url: Url,
    client: reqwest::Client,
}

impl ReqwestPageFetcher {
    /// Validates the endpoint URL and headers and builds the client.
    pub fn new(endpoint: EndpointConfig, settings: FetchSettings) -> Result<Self, FetchError> {
        let url = Url::parse(&endpoint.url)
            .map_err(|err| FetchError::new(FetchErrorKind::InvalidUrl, err.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| FetchError::new(FetchErrorKind::InvalidUrl, err.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| FetchError::new(FetchErrorKind::InvalidUrl, err.to_string()))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|err| FetchError::new(FetchErrorKind::Network, err.to_string()))?;

        Ok(Self {
            endpoint,
            url,
            client,
        })
    }

    fn parse_page(&self, mut body: Value) -> Result<Page<RawRecord>, FetchError> {
        let shape = &self.endpoint.shape;
        let records = match body.get_mut(&shape.records_key).map(Value::take) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(FetchError::new(
                    FetchErrorKind::MalformedPage,
                    format!("`{}` is not an array", shape.records_key),
                ))
            }
            None => {
                return Err(FetchError::new(
                    FetchErrorKind::MalformedPage,
                    format!("response has no `{}` key", shape.records_key),
                ))
            }
        };

        let total = match &shape.total_key {
            Some(key) => match body.get(key) {
                Some(value) => Some(value.as_u64().ok_or_else(|| {
                    FetchError::new(
                        FetchErrorKind::MalformedPage,
                        format!("`{key}` is not an unsigned integer"),
                    )
                })?),
                None => None,
            },
            None => None,
        };

        Ok(Page::new(records, total))
    }
}

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    async fn fetch_page(
        &self,
        query: &Query,
        cursor: Cursor,
    ) -> Result<Page<RawRecord>, FetchError> {
        let length = query.effective_page_size(self.endpoint.page_cap);

        let request = match &self.endpoint.paging {
            PagingStyle::QueryParams {
                offset_param,
                length_param,
            } => {
                let mut url = self.url.clone();
                {
                    let mut pairs = url.query_pairs_mut();
                    for (key, value) in query.params() {
                        pairs.append_pair(key, value);
                    }
                    pairs.append_pair(offset_param, &cursor.offset().to_string());
                    pairs.append_pair(length_param, &length.to_string());
                }
                self.client.get(url)
            }
            PagingStyle::JsonBody {
                offset_field,
                length_field,
            } => {
                let mut body = serde_json::Map::new();
                for (key, value) in query.params() {
                    body.insert(key.clone(), Value::String(value.clone()));
                }
                body.insert(offset_field.clone(), Value::from(cursor.offset()));
                body.insert(length_field.clone(), Value::from(length as u64));
                self.client.post(self.url.clone()).json(&Value::Object(body))
            }
        };

        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body: Value = response.json().await.map_err(|err| {
            if err.is_timeout() {
                FetchError::new(FetchErrorKind::Timeout, err.to_string())
            } else {
                FetchError::new(FetchErrorKind::MalformedPage, err.to_string())
            }
        })?;

        self.parse_page(body)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FetchErrorKind::Timeout, err.to_string());
    }
    FetchError::new(FetchErrorKind::Network, err.to_string())
}
