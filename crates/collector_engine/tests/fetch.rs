use std::time::Duration;

use collector_core::{Cursor, Query};
use collector_engine::{
    EndpointConfig, FetchErrorKind, FetchSettings, PageFetcher, PageShape, PagingStyle,
    ReqwestPageFetcher,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn datatables_endpoint(server_uri: &str, page_cap: Option<usize>) -> EndpointConfig {
    EndpointConfig {
        url: format!("{server_uri}/data_pagination_search"),
        paging: PagingStyle::QueryParams {
            offset_param: "start".to_string(),
            length_param: "length".to_string(),
        },
        headers: vec![("X-Requested-With".to_string(), "XMLHttpRequest".to_string())],
        page_cap,
        shape: PageShape {
            records_key: "data".to_string(),
            total_key: Some("recordsTotal".to_string()),
        },
    }
}

fn fetcher(endpoint: EndpointConfig) -> ReqwestPageFetcher {
    ReqwestPageFetcher::new(endpoint, FetchSettings::default()).expect("fetcher")
}

#[tokio::test]
async fn get_request_carries_filters_and_paging_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data_pagination_search"))
        .and(query_param("org_id", "1401"))
        .and(query_param("start", "0"))
        .and(query_param("length", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"unique_id": "a", "invoice_amount": "1200"},
                {"unique_id": "b", "invoice_amount": "900"},
            ],
            "recordsTotal": 2,
        })))
        .mount(&server)
        .await;

    let fetcher = fetcher(datatables_endpoint(&server.uri(), None));
    let query = Query::new(50).with_param("org_id", "1401");

    let page = fetcher.fetch_page(&query, Cursor::START).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.total, Some(2));
    assert_eq!(page.records[0]["unique_id"], "a");
}

#[tokio::test]
async fn requested_length_is_clamped_to_the_source_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("start", "0"))
        .and(query_param("length", "51"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "recordsTotal": 0,
        })))
        .mount(&server)
        .await;

    let fetcher = fetcher(datatables_endpoint(&server.uri(), Some(51)));
    let query = Query::new(500);

    let page = fetcher.fetch_page(&query, Cursor::START).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn post_body_paging_sends_filters_as_body_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/notices/search"))
        .and(body_partial_json(json!({
            "query": "organisation-country-buyer=ISL",
            "start": 100,
            "limit": 50,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notices": [{"publication-number": "00123-2025"}],
            "totalNoticeCount": 101,
        })))
        .mount(&server)
        .await;

    let endpoint = EndpointConfig {
        url: format!("{}/v3/notices/search", server.uri()),
        paging: PagingStyle::JsonBody {
            offset_field: "start".to_string(),
            length_field: "limit".to_string(),
        },
        headers: Vec::new(),
        page_cap: None,
        shape: PageShape {
            records_key: "notices".to_string(),
            total_key: Some("totalNoticeCount".to_string()),
        },
    };
    let fetcher = fetcher(endpoint);
    let query = Query::new(50).with_param("query", "organisation-country-buyer=ISL");

    let page = fetcher
        .fetch_page(&query, Cursor::START.advanced_by(100))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.total, Some(101));
}

#[tokio::test]
async fn non_2xx_status_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = fetcher(datatables_endpoint(&server.uri(), None));
    let err = fetcher
        .fetch_page(&Query::new(50), Cursor::START)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::HttpStatus(503));
    assert!(err.kind.is_retryable());
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({"data": [], "recordsTotal": 0})),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher =
        ReqwestPageFetcher::new(datatables_endpoint(&server.uri(), None), settings).unwrap();

    let err = fetcher
        .fetch_page(&Query::new(50), Cursor::START)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Timeout);
}

#[tokio::test]
async fn body_without_record_key_is_malformed_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "oops"})))
        .mount(&server)
        .await;

    let fetcher = fetcher(datatables_endpoint(&server.uri(), None));
    let err = fetcher
        .fetch_page(&Query::new(50), Cursor::START)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::MalformedPage);
    assert!(!err.kind.is_retryable());
}

#[tokio::test]
async fn non_array_record_key_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": "not an array"})),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(datatables_endpoint(&server.uri(), None));
    let err = fetcher
        .fetch_page(&Query::new(50), Cursor::START)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::MalformedPage);
}

#[tokio::test]
async fn missing_total_key_is_advisory_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"unique_id": "a"}]})),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher(datatables_endpoint(&server.uri(), None));
    let page = fetcher
        .fetch_page(&Query::new(50), Cursor::START)
        .await
        .unwrap();
    assert_eq!(page.total, None);
    assert_eq!(page.len(), 1);
}

#[test]
fn bad_endpoint_url_is_rejected_at_construction() {
    let endpoint = EndpointConfig {
        url: "not a url".to_string(),
        paging: PagingStyle::QueryParams {
            offset_param: "start".to_string(),
            length_param: "length".to_string(),
        },
        headers: Vec::new(),
        page_cap: None,
        shape: PageShape {
            records_key: "data".to_string(),
            total_key: None,
        },
    };
    let err = ReqwestPageFetcher::new(endpoint, FetchSettings::default()).unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::InvalidUrl);
}
