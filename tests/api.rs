use axum::body::Body;
use axum::http::header::{
    CONTENT_TYPE, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_UNMODIFIED_SINCE, LAST_MODIFIED,
};
use axum::http::{HeaderMap, HeaderName, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use static_dns::api::{router, AppState};
use static_dns::conditional::{format_http_date, parse_http_date};
use static_dns::entry_store::DynEntryStore;
use static_dns::{Config, InMemoryEntryStore};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tower::ServiceExt;

const ENTRIES: &str = "/api/4.0/staticdnsentries";

struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn app() -> Router {
    let config: Config = serde_json::from_value(json!({
        "api_bind_addr": "127.0.0.1:0",
        "api_timeout": 5,
        "cache_groups": ["cachegroup1", "cachegroup2"],
        "delivery_services": ["ds1", "ds2"],
    }))
    .unwrap();
    let entry_store: DynEntryStore = Arc::new(RwLock::new(InMemoryEntryStore::default()));
    router(AppState::new(Arc::new(config), entry_store))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Response {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, query: &str, headers: &[(&str, &str)]) -> Response {
    let mut request = Request::builder().uri(format!("{ENTRIES}{query}"));
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    send(app, request.body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, body: &Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(ENTRIES)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn put(app: &Router, id: u64, body: &Value, headers: &[(&str, &str)]) -> Response {
    let mut request = Request::builder()
        .method(Method::PUT)
        .uri(format!("{ENTRIES}?id={id}"))
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    send(app, request.body(Body::from(body.to_string())).unwrap()).await
}

async fn delete(app: &Router, id: u64) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("{ENTRIES}?id={id}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn entry(
    host: &str,
    record_type: &str,
    address: &str,
    cachegroup: &str,
    ds: &str,
    ttl: u32,
) -> Value {
    json!({
        "host": host,
        "type": record_type,
        "address": address,
        "cachegroup": cachegroup,
        "deliveryservice": ds,
        "ttl": ttl,
    })
}

/// Create the fixture entries and return the app.
async fn seeded() -> Router {
    let app = app();
    for body in [
        entry("host3", "AAAA_RECORD", "2001:db8::3", "cachegroup2", "ds1", 10),
        entry("host1", "CNAME_RECORD", "cdn.test.com.", "cachegroup1", "ds1", 0),
        entry("host2", "A_RECORD", "192.168.0.1", "cachegroup2", "ds2", 10),
    ] {
        let created = post(&app, &body).await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    }
    app
}

async fn id_of(app: &Router, host: &str) -> u64 {
    let found = get(app, &format!("?host={host}"), &[]).await;
    let entries = found.body["response"].as_array().unwrap();
    assert_eq!(entries.len(), 1, "expected exactly one entry for {host}");
    entries[0]["id"].as_u64().unwrap()
}

fn header(response: &Response, name: HeaderName) -> &str {
    response.headers.get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn healthcheck() {
    let app = app();
    let request = Request::builder()
        .uri("/healthcheck")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"ok": "healthy"}));
}

#[tokio::test]
async fn list_is_sorted_by_host() {
    let app = seeded().await;
    let response = get(&app, "", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.contains_key(LAST_MODIFIED));

    let hosts: Vec<&str> = response.body["response"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["host"].as_str().unwrap())
        .collect();
    assert_eq!(hosts, vec!["host1", "host2", "host3"]);
}

#[tokio::test]
async fn list_filters_and_pages() {
    let app = seeded().await;

    let host1 = get(&app, "?host=host1", &[]).await;
    let entries = host1.body["response"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["host"], "host1");
    assert_eq!(entries[0]["type"], "CNAME_RECORD");

    let ds1 = get(&app, "?deliveryservice=ds1&type=AAAA_RECORD", &[]).await;
    assert_eq!(ds1.body["response"].as_array().unwrap().len(), 1);

    let page = get(&app, "?limit=1&offset=1", &[]).await;
    let entries = page.body["response"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["host"], "host2");

    let none = get(&app, "?host=nope", &[]).await;
    assert_eq!(none.status, StatusCode::OK);
    assert_eq!(none.body["response"], json!([]));

    let bad = get(&app, "?ttl=minus-one", &[]).await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn not_modified_when_no_changes() {
    let app = seeded().await;
    let tomorrow = format_http_date(OffsetDateTime::now_utc() + Duration::DAY).unwrap();
    let response = get(&app, "", &[(IF_MODIFIED_SINCE.as_str(), &tomorrow)]).await;
    assert_eq!(response.status, StatusCode::NOT_MODIFIED);
    assert_eq!(response.body, Value::Null);

    // Some clients send the zone as "UTC".
    let tomorrow_utc = tomorrow.replace("GMT", "UTC");
    let response = get(&app, "", &[(IF_MODIFIED_SINCE.as_str(), &tomorrow_utc)]).await;
    assert_eq!(response.status, StatusCode::NOT_MODIFIED);

    let yesterday = format_http_date(OffsetDateTime::now_utc() - Duration::DAY).unwrap();
    let response = get(&app, "", &[(IF_MODIFIED_SINCE.as_str(), &yesterday)]).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn update_valid_a_record() {
    let app = seeded().await;
    let id = id_of(&app, "host2").await;
    let body = entry("host2", "A_RECORD", "192.168.0.2", "cachegroup2", "ds2", 10);
    let response = put(&app, id, &body, &[]).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["alerts"][0]["level"], "success");
    assert!(response.headers.contains_key(ETAG));

    let updated = get(&app, "?host=host2", &[]).await;
    let entries = updated.body["response"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["address"], "192.168.0.2");
    assert_eq!(entries[0]["id"].as_u64(), Some(id));
}

#[tokio::test]
async fn invalid_addresses_are_bad_requests() {
    let app = seeded().await;
    let host1 = id_of(&app, "host1").await;
    let host2 = id_of(&app, "host2").await;
    let host3 = id_of(&app, "host3").await;

    let cases = [
        (
            host2,
            entry("host2", "A_RECORD", "test.testdomain.net.", "cachegroup2", "ds2", 10),
        ),
        (
            host1,
            entry(
                "host1",
                "CNAME_RECORD",
                "2001:0db8:85a3:0000:0000:8a2e:0370:7334",
                "cachegroup1",
                "ds1",
                0,
            ),
        ),
        (
            host1,
            entry("host1", "CNAME_RECORD", "cdn.test.com", "cachegroup1", "ds1", 0),
        ),
        (
            host3,
            entry("host3", "AAAA_RECORD", "192.168.0.1", "cachegroup2", "ds1", 10),
        ),
    ];
    for (id, body) in cases {
        let response = put(&app, id, &body, &[]).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response.body["alerts"][0]["level"], "error");
    }

    let without_period = entry("host1", "CNAME_RECORD", "cdn.test.com", "cachegroup1", "ds1", 0);
    let missing_period = put(&app, host1, &without_period, &[]).await;
    let text = missing_period.body["alerts"][0]["text"].as_str().unwrap();
    assert!(text.contains("trailing period"), "{text}");

    // Nothing was changed by the rejected updates.
    let host2_entry = get(&app, "?host=host2", &[]).await;
    assert_eq!(host2_entry.body["response"][0]["address"], "192.168.0.1");
}

#[tokio::test]
async fn if_unmodified_since_before_last_update_fails() {
    let app = seeded().await;
    let id = id_of(&app, "host3").await;
    let body = entry(
        "host3",
        "AAAA_RECORD",
        "2001:0db8:85a3:0000:0000:8a2e:0370:7334",
        "cachegroup2",
        "ds1",
        10,
    );

    let earlier = OffsetDateTime::now_utc() - Duration::seconds(15);
    let earlier = format_http_date(earlier).unwrap();
    let response = put(&app, id, &body, &[(IF_UNMODIFIED_SINCE.as_str(), &earlier)]).await;
    assert_eq!(response.status, StatusCode::PRECONDITION_FAILED);

    let later = format_http_date(OffsetDateTime::now_utc() + Duration::DAY).unwrap();
    let response = put(&app, id, &body, &[(IF_UNMODIFIED_SINCE.as_str(), &later)]).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
}

#[tokio::test]
async fn if_match_requires_current_etag() {
    let app = app();
    let created = post(
        &app,
        &entry("host3", "AAAA_RECORD", "2001:db8::3", "cachegroup2", "ds1", 10),
    )
    .await;
    let id = created.body["response"]["id"].as_u64().unwrap();
    let first_etag = header(&created, ETAG).to_string();

    let body = entry("host3", "AAAA_RECORD", "2001:db8::4", "cachegroup2", "ds1", 10);
    let stale = put(&app, id, &body, &[(IF_MATCH.as_str(), "\"v1-0\"")]).await;
    assert_eq!(stale.status, StatusCode::PRECONDITION_FAILED);

    let updated = put(&app, id, &body, &[(IF_MATCH.as_str(), &first_etag)]).await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    let second_etag = header(&updated, ETAG).to_string();
    assert_ne!(first_etag, second_etag);

    // The first tag no longer matches once the entry has changed.
    let replay = put(&app, id, &body, &[(IF_MATCH.as_str(), &first_etag)]).await;
    assert_eq!(replay.status, StatusCode::PRECONDITION_FAILED);

    let any = put(&app, id, &body, &[(IF_MATCH.as_str(), "*")]).await;
    assert_eq!(any.status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_if_match_fails() {
    let app = seeded().await;
    let id = id_of(&app, "host2").await;
    let body = entry("host2", "A_RECORD", "192.168.0.2", "cachegroup2", "ds2", 10);

    for value in ["v1-doesnotmatch", ", ,"] {
        let response = put(&app, id, &body, &[(IF_MATCH.as_str(), value)]).await;
        assert_eq!(response.status, StatusCode::PRECONDITION_FAILED, "{value}");
    }

    let unchanged = get(&app, "?host=host2", &[]).await;
    assert_eq!(unchanged.body["response"][0]["address"], "192.168.0.1");
}

#[tokio::test]
async fn burst_of_creates_keeps_timestamps_current() {
    let app = app();
    for n in 0..30 {
        let host = format!("host{n}");
        let body = entry(&host, "A_RECORD", "192.168.0.1", "cachegroup1", "ds1", 10);
        let created = post(&app, &body).await;
        assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    }

    let now = OffsetDateTime::now_utc();
    let listed = get(&app, "", &[]).await;
    for e in listed.body["response"].as_array().unwrap() {
        let last_updated =
            OffsetDateTime::parse(e["lastUpdated"].as_str().unwrap(), &Rfc3339).unwrap();
        assert!(last_updated <= now + Duration::SECOND, "{e} at {now}");
    }
    let last_modified = parse_http_date(header(&listed, LAST_MODIFIED)).unwrap();
    assert!(last_modified <= now, "{last_modified} at {now}");

    // A client clock slightly ahead of the last change may still write.
    let id = id_of(&app, "host0").await;
    let soon = format_http_date(now + Duration::seconds(2)).unwrap();
    let body = entry("host0", "A_RECORD", "192.168.0.2", "cachegroup1", "ds1", 10);
    let response = put(&app, id, &body, &[(IF_UNMODIFIED_SINCE.as_str(), &soon)]).await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
}

#[tokio::test]
async fn update_invalidates_previous_last_modified() {
    let app = seeded().await;
    let before = get(&app, "", &[]).await;
    let last_modified = header(&before, LAST_MODIFIED).to_string();

    let id = id_of(&app, "host2").await;
    let body = entry("host2", "A_RECORD", "192.168.0.2", "cachegroup2", "ds2", 10);
    let updated = put(&app, id, &body, &[]).await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);

    let after = get(&app, "", &[(IF_MODIFIED_SINCE.as_str(), &last_modified)]).await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["response"][1]["address"], "192.168.0.2");
}

#[tokio::test]
async fn precondition_failure_skips_validation() {
    let app = seeded().await;
    let id = id_of(&app, "host2").await;
    let invalid = entry("host2", "A_RECORD", "not-an-ip", "cachegroup2", "ds2", 10);
    let response = put(&app, id, &invalid, &[(IF_MATCH.as_str(), "\"v1-0\"")]).await;
    assert_eq!(response.status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn create_rejects_bad_entries() {
    let app = seeded().await;

    let unknown_ds = post(
        &app,
        &entry("host4", "A_RECORD", "192.168.0.4", "cachegroup1", "ds9", 10),
    )
    .await;
    assert_eq!(unknown_ds.status, StatusCode::BAD_REQUEST);

    let duplicate = post(
        &app,
        &entry("host1", "A_RECORD", "192.168.0.4", "cachegroup1", "ds1", 10),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);

    // The same host may exist in another delivery service.
    let other_ds = post(
        &app,
        &entry("host1", "A_RECORD", "192.168.0.4", "cachegroup1", "ds2", 10),
    )
    .await;
    assert_eq!(other_ds.status, StatusCode::CREATED, "{}", other_ds.body);
    assert!(other_ds.body["response"]["lastUpdated"].is_string());

    let unknown_type = post(
        &app,
        &entry("host5", "MX_RECORD", "mail.test.com.", "cachegroup1", "ds1", 10),
    )
    .await;
    assert_eq!(unknown_type.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let app = seeded().await;
    let body = entry("host9", "A_RECORD", "192.168.0.9", "cachegroup1", "ds1", 10);
    let response = put(&app, 999, &body, &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_entry_for_good() {
    let app = seeded().await;
    let before = get(&app, "", &[]).await;
    let last_modified = header(&before, LAST_MODIFIED).to_string();

    for host in ["host1", "host2", "host3"] {
        let id = id_of(&app, host).await;
        let deleted = delete(&app, id).await;
        assert_eq!(deleted.status, StatusCode::OK);
        assert_eq!(deleted.body["alerts"][0]["level"], "success");

        let found = get(&app, &format!("?host={host}"), &[]).await;
        assert_eq!(found.body["response"], json!([]));

        let again = delete(&app, id).await;
        assert_eq!(again.status, StatusCode::NOT_FOUND);
        let found = get(&app, &format!("?host={host}"), &[]).await;
        assert_eq!(found.body["response"], json!([]));
    }

    // Deletions count as modifications of the collection.
    let after = get(&app, "", &[(IF_MODIFIED_SINCE.as_str(), &last_modified)]).await;
    assert_eq!(after.status, StatusCode::OK);
}

#[tokio::test]
async fn id_parameter_is_required() {
    let app = seeded().await;
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(ENTRIES)
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
