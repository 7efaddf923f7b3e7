//! Integration test: gateway routes driven through `tower::ServiceExt::oneshot`,
//! with upstream sources served by mockito.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use dbz_catalog_core::{CatalogConfig, Screen};
use dbz_catalog_gateway::{router, AppState};
use mockito::Matcher;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const CHARACTERS_BODY: &str = r#"{
  "items": [
    {"id":1,"name":"Goku","ki":"60.000.000","maxKi":"90 Septillion","race":"Saiyan","gender":"Male",
     "description":"","image":"https://img/goku.webp","affiliation":"Z Fighter"},
    {"id":2,"name":"Vegeta","ki":"54.000.000","maxKi":"19.84 Septillion","race":"Saiyan","gender":"Male",
     "description":"","image":"https://img/vegeta.webp","affiliation":"Z Fighter"},
    {"id":3,"name":"Piccolo","ki":"2.000.000","maxKi":"500.000.000","race":"Namekian","gender":"Male",
     "description":"","image":"https://img/piccolo.webp","affiliation":""}
  ],
  "meta": {"totalItems":3,"itemCount":3,"itemsPerPage":1000,"totalPages":1,"currentPage":1}
}"#;

fn config_for(base: &str) -> CatalogConfig {
    CatalogConfig {
        public_api_url: base.to_string(),
        backend_url: format!("{}/backend", base),
        request_timeout_secs: 5,
        ..CatalogConfig::default()
    }
}

fn app_from(config: CatalogConfig) -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(config).unwrap());
    (state.clone(), router(state))
}

fn app_with(base: &str) -> (Arc<AppState>, Router) {
    app_from(config_for(base))
}

/// Transformations served from the backend's paginated listing.
fn backend_transformations_app(base: &str) -> (Arc<AppState>, Router) {
    app_from(CatalogConfig {
        use_backend_transformations: true,
        ..config_for(base)
    })
}

const TRANSFORMATIONS_PAGE_ONE: &str = r#"{
  "items": [{"id":1,"name":"Goku","race":"Saiyan","gender":"Male","image":"",
             "transformations":[{"id":11,"name":"Super Saiyan"}]}],
  "meta": {"totalItems":13,"itemCount":1,"itemsPerPage":12,"totalPages":2,"currentPage":1}
}"#;

const TRANSFORMATIONS_PAST_END: &str = r#"{
  "items": [],
  "meta": {"totalItems":13,"itemCount":0,"itemsPerPage":12,"totalPages":2,"currentPage":6}
}"#;

async fn mock_transformations_page(
    server: &mut mockito::ServerGuard,
    page: &str,
    body: &str,
    hits: usize,
) -> mockito::Mock {
    server
        .mock("GET", "/backend/api/personajes/with-transformations")
        .match_query(Matcher::UrlEncoded("page".into(), page.into()))
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

const BOUNDARY: &str = "catalog-test-boundary";

fn multipart_request(method: &str, uri: &str, fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"imagen\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

const BULMA_FIELDS: [(&str, &str); 7] = [
    ("nombre", "Bulma"),
    ("especie", "Human"),
    ("genero", "Female"),
    ("base_ki", "1500"),
    ("total_ki", "3000"),
    ("afiliacion", "Capsule Corp"),
    ("descripcion", "Inventora"),
];

/// Nothing listens on port 9; upstream calls fail fast.
fn offline_app() -> Router {
    app_with("http://127.0.0.1:9").1
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn mock_characters(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/characters")
        .match_query(Matcher::UrlEncoded("limit".into(), "1000".into()))
        .with_header("content-type", "application/json")
        .with_body(CHARACTERS_BODY)
        .expect_at_least(1)
        .create_async()
        .await
}

#[tokio::test]
async fn health_returns_ok() {
    let (status, body) = send(offline_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn sagas_last_page_holds_the_remainder() {
    let (status, body) = send(offline_app(), get("/api/sagas?page=2&page_size=12")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 25);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["loaded"], true);
}

#[tokio::test]
async fn sagas_overflowing_page_clamps_to_last() {
    let (_, body) = send(offline_app(), get("/api/sagas?page=9")).await;
    assert_eq!(body["page_index"], 2);
    assert_eq!(body["query"]["page_index"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn saga_detail_and_missing_saga() {
    let (status, body) = send(offline_app(), get("/api/sagas/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);

    let (status, _) = send(offline_app(), get("/api/sagas/9999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn paged_sagas_are_one_based() {
    let (status, body) = send(offline_app(), get("/api/sagas/paged?page=3&page_size=12&order=az")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalItems"], 25);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn view_events_reduce_into_stored_state() {
    let (state, app) = app_with("http://127.0.0.1:9");

    let (status, body) = send(
        app.clone(),
        post_json("/api/views/sagas/events", json!({"type": "search", "text": "super"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 6);
    assert_eq!(body["query"]["query"], "super");

    // Past the end of six results: sagas clamp to the last page.
    let (_, body) = send(
        app.clone(),
        post_json("/api/views/sagas/events", json!({"type": "page", "index": 4, "size": 12})),
    )
    .await;
    assert_eq!(body["page_index"], 0);
    assert_eq!(body["items"].as_array().unwrap().len(), 6);

    let (_, body) = send(app, get("/api/views/sagas")).await;
    assert_eq!(body["query"]["query"], "super");
    assert_eq!(state.views.get(&Screen::Sagas).unwrap().state().page_index, 0);
}

#[tokio::test]
async fn unknown_screen_is_rejected() {
    let (status, _) = send(offline_app(), get("/api/views/episodes")).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn characters_sorted_by_power() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_characters(&mut server).await;
    let (_, app) = app_with(&server.url());

    let (status, body) = send(app, get("/api/characters?sort=power_desc&page_size=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], true);
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["items"][0]["name"], "Goku");
    assert_eq!(body["items"][1]["name"], "Vegeta");
    mock.assert_async().await;
}

#[tokio::test]
async fn characters_search_matches_race() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_characters(&mut server).await;
    let (_, app) = app_with(&server.url());

    let (_, body) = send(app, get("/api/characters?q=%20namek%20")).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["name"], "Piccolo");
}

#[tokio::test]
async fn characters_upstream_failure_serves_empty_page() {
    let (status, body) = send(offline_app(), get("/api/characters")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], false);
    assert_eq!(body["total_count"], 0);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn transformations_group_by_race() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_characters(&mut server).await;
    let (_, app) = app_with(&server.url());

    let (_, body) = send(app, get("/api/transformations?group=Saiyan")).await;
    assert_eq!(body["total_count"], 2);
    let goku = &body["items"][0];
    assert_eq!(goku["transformations"].as_array().unwrap().len(), 3);
    assert_eq!(goku["transformations"][0]["id"], 11);
}

#[tokio::test]
async fn affiliation_charts_group_public_characters() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_characters(&mut server).await;
    let (_, app) = app_with(&server.url());

    let (status, body) = send(app, get("/api/stats/affiliations")).await;
    assert_eq!(status, StatusCode::OK);
    let panels = body["panels"].as_array().unwrap();
    assert_eq!(panels.len(), 2);
    assert_eq!(panels[0]["series"]["affiliation"], "Z Fighter");
    assert_eq!(panels[1]["series"]["affiliation"], "Sin afiliación");
}

#[tokio::test]
async fn affiliation_charts_reject_unknown_source() {
    let (status, _) = send(offline_app(), get("/api/stats/affiliations?source=ftp")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_draft_is_unprocessable() {
    let (status, body) = send(
        offline_app(),
        post_json("/api/personajes", json!({"nombre": "  ", "base_ki": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert!(fields.contains(&"nombre"));
    assert!(fields.contains(&"base_ki"));
}

#[tokio::test]
async fn compare_requires_two_ids() {
    let (status, _) = send(offline_app(), get("/api/personajes/compare?ids=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn personaje_detail_proxies_backend() {
    let mut server = mockito::Server::new_async().await;
    let _mock2 = server
        .mock("GET", "/backend/api/personajes/7/")
        .with_body(r#"{"id":7,"nombre":"Krilin","especie":"Human","base_ki":"1,000","total_ki":75000}"#)
        .create_async()
        .await;
    let _mock3 = server
        .mock("GET", "/backend/api/personajes/8/")
        .with_status(404)
        .create_async()
        .await;
    let (_, app) = app_with(&server.url());

    let (status, body) = send(app.clone(), get("/api/personajes/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["base_ki"], 1000);

    let (status, _) = send(app, get("/api/personajes/8")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_falls_back_to_zeros() {
    let (status, body) = send(offline_app(), get("/api/stats/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], false);
    assert_eq!(body["stats"]["sagas"], 0);
}

#[tokio::test]
async fn screen_path_is_case_insensitive() {
    let (status, body) = send(offline_app(), get("/api/views/Sagas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 25);
}

#[tokio::test]
async fn backend_transformations_out_of_range_page_starts_over() {
    let mut server = mockito::Server::new_async().await;
    let first = mock_transformations_page(&mut server, "1", TRANSFORMATIONS_PAGE_ONE, 2).await;
    let (_, app) = backend_transformations_app(&server.url());

    // u32::MAX as a 0-based index has no 1-based u32 page.
    let (status, body) = send(app.clone(), get("/api/transformations?page=4294967295")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], true);
    assert_eq!(body["page_index"], 0);
    assert_eq!(body["items"][0]["name"], "Goku");

    let (status, body) = send(
        app,
        get("/api/transformations?page=4294967296&page_size=4294967296"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], true);
    assert_eq!(body["page_index"], 0);
    assert_eq!(body["page_size"], 4294967295u64);
    assert_eq!(body["query"]["page_size"], 4294967295u64);
    first.assert_async().await;
}

#[tokio::test]
async fn backend_transformations_overflow_refetches_first_page() {
    let mut server = mockito::Server::new_async().await;
    let past_end = mock_transformations_page(&mut server, "6", TRANSFORMATIONS_PAST_END, 1).await;
    let first = mock_transformations_page(&mut server, "1", TRANSFORMATIONS_PAGE_ONE, 1).await;
    let (_, app) = backend_transformations_app(&server.url());

    let (_, body) = send(app, get("/api/transformations?page=5")).await;
    assert_eq!(body["loaded"], true);
    assert_eq!(body["page_index"], 0);
    assert_eq!(body["total_count"], 13);
    assert_eq!(body["page_count"], 2);
    assert_eq!(body["items"][0]["transformations"][0]["id"], 11);
    past_end.assert_async().await;
    first.assert_async().await;
}

#[tokio::test]
async fn backend_transformations_view_stores_corrected_page() {
    let mut server = mockito::Server::new_async().await;
    let past_end = mock_transformations_page(&mut server, "6", TRANSFORMATIONS_PAST_END, 1).await;
    let first = mock_transformations_page(&mut server, "1", TRANSFORMATIONS_PAGE_ONE, 1).await;
    let (state, app) = backend_transformations_app(&server.url());

    let (status, body) = send(
        app,
        post_json(
            "/api/views/transformations/events",
            json!({"type": "page", "index": 5, "size": 12}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page_index"], 0);
    assert_eq!(body["query"]["page_index"], 0);
    let stored = state.views.get(&Screen::Transformations).unwrap().state().clone();
    assert_eq!(stored.page_index, 0);
    assert_eq!(stored.page_size, 12);
    past_end.assert_async().await;
    first.assert_async().await;
}

#[tokio::test]
async fn multipart_draft_uploads_image_to_backend() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/backend/api/personajes/")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="imagen"; filename="bulma.png""#.into()),
            Matcher::Regex(r#"name="base_ki"\r\n\r\n1500"#.into()),
            Matcher::Regex("PNGDATA".into()),
        ]))
        .with_status(201)
        .with_body(r#"{"id":31,"nombre":"Bulma","especie":"Human","base_ki":1500,"total_ki":3000}"#)
        .create_async()
        .await;
    let (_, app) = app_with(&server.url());

    let request = multipart_request(
        "POST",
        "/api/personajes",
        &BULMA_FIELDS,
        Some(("bulma.png", &b"PNGDATA"[..])),
    );
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 31);
    mock.assert_async().await;
}

#[tokio::test]
async fn multipart_draft_rejects_non_numeric_ki() {
    let mut fields = BULMA_FIELDS;
    fields[4] = ("total_ki", "over 9000");
    let request = multipart_request("PATCH", "/api/personajes/31", &fields, None);

    let (status, body) = send(offline_app(), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["total_ki"]);
}

#[tokio::test]
async fn multipart_draft_without_image_fails_validation() {
    let request = multipart_request("POST", "/api/personajes", &BULMA_FIELDS, None);
    let (status, body) = send(offline_app(), request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "imagen");
}
