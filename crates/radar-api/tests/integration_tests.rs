//! # Integration Tests for radar-api
//!
//! Drives the assembled application through `tower::ServiceExt::oneshot`:
//! health probes, envelope and pagination, policy and company registries,
//! assessment recording and recomputation, predictions, market data,
//! analytics, reports and the authentication middleware.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use radar_api::state::{AppConfig, AppState};

/// Helper: build the test app with auth disabled.
fn test_app(state: &AppState) -> axum::Router {
    radar_api::app(state.clone())
}

/// Helper: build the test app with auth enabled.
fn test_app_with_auth(token: &str) -> axum::Router {
    let config = AppConfig {
        auth_token: Some(token.to_string()),
        ..AppConfig::default()
    };
    radar_api::app(AppState::with_config(config, None))
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(state: &AppState, uri: &str) -> axum::http::Response<Body> {
    test_app(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Value,
) -> axum::http::Response<Body> {
    test_app(state)
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

fn policy_body(number: &str) -> Value {
    json!({
        "title": "Data Localisation Act",
        "description": "Requires in-country storage of personal data",
        "policy_number": number,
        "jurisdiction": "us",
        "policy_type": "legislation",
        "status": "enacted",
        "enacted_date": "2025-01-15T00:00:00Z",
        "estimated_impact": -250.0,
        "impact_confidence": 0.8,
        "affected_industries": ["technology"]
    })
}

fn company_body(name: &str, ticker: &str) -> Value {
    json!({
        "name": name,
        "ticker": ticker,
        "industry": "technology",
        "headquarters_country": "US",
        "revenue": 5000.0,
        "market_cap": 20000.0,
        "employees": 12000,
        "primary_markets": ["US", "EU"]
    })
}

async fn create_policy(state: &AppState, number: &str) -> String {
    let response = send(state, "POST", "/api/v1/policies", policy_body(number)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn create_company(state: &AppState, name: &str, ticker: &str) -> String {
    let response = send(state, "POST", "/api/v1/companies", company_body(name, ticker)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}

// ── Health Probes ───────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_version() {
    let state = AppState::new();
    let response = get(&state, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "1.0.0");
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let state = AppState::new();
    let response = get(&state, "/health/liveness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");

    let response = get(&state, "/health/readiness").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_banner_reports_in_memory_storage() {
    let state = AppState::new();
    let body = body_json(get(&state, "/").await).await;
    assert_eq!(body["name"], "PolicyRadar");
    assert_eq!(body["storage"], "in-memory");
}

#[tokio::test]
async fn test_metrics_exposes_domain_gauges() {
    let state = AppState::new();
    create_policy(&state, "HR-1").await;
    let response = get(&state, "/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_string(response).await;
    assert!(text.contains("radar_policies_total 1"));
    assert!(text.contains("radar_http_requests_total"));
}

#[tokio::test]
async fn test_openapi_spec_served() {
    let state = AppState::new();
    let response = get(&state, "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/api/v1/impacts/assess"].is_object());
    assert!(body["components"]["schemas"]["ImpactAssessment"].is_object());
}

// ── Envelope and Pagination ─────────────────────────────────────────

#[tokio::test]
async fn test_empty_list_has_metadata() {
    let state = AppState::new();
    let response = get(&state, "/api/v1/policies").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["metadata"]["total_count"], 0);
    assert_eq!(body["metadata"]["page"], 1);
    assert_eq!(body["metadata"]["per_page"], 100);
    assert_eq!(body["metadata"]["has_next"], false);
}

#[tokio::test]
async fn test_pagination_bounds_rejected() {
    let state = AppState::new();
    for uri in [
        "/api/v1/policies?per_page=0",
        "/api/v1/policies?per_page=1001",
        "/api/v1/companies?page=0",
    ] {
        let response = get(&state, uri).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_pages_split_results() {
    let state = AppState::new();
    for n in 0..3 {
        create_policy(&state, &format!("HR-{n}")).await;
    }
    let body = body_json(get(&state, "/api/v1/policies?page=2&per_page=2").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["metadata"]["total_count"], 3);
    assert_eq!(body["metadata"]["has_next"], false);
}

// ── Policies ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_and_get_policy() {
    let state = AppState::new();
    let id = create_policy(&state, "HR-101").await;

    let response = get(&state, &format!("/api/v1/policies/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["policy_number"], "HR-101");
    assert_eq!(body["data"]["jurisdiction"], "US");
}

#[tokio::test]
async fn test_duplicate_policy_number_conflicts() {
    let state = AppState::new();
    create_policy(&state, "HR-7").await;
    let response = send(&state, "POST", "/api/v1/policies", policy_body("HR-7")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_policy_rejected() {
    let state = AppState::new();
    let mut body = policy_body("HR-8");
    body["jurisdiction"] = json!("not a code");
    let response = send(&state, "POST", "/api/v1/policies", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = policy_body("HR-9");
    body["affected_industries"] = json!(["alchemy"]);
    let response = send(&state, "POST", "/api/v1/policies", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_policy_not_found() {
    let state = AppState::new();
    let response = get(&state, "/api/v1/policies/00000000-0000-0000-0000-000000000000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_policy_search_and_summary() {
    let state = AppState::new();
    create_policy(&state, "HR-11").await;

    let body = body_json(get(&state, "/api/v1/policies/search?q=localisation").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let body = body_json(get(&state, "/api/v1/policies/search?q=tariff").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let body = body_json(get(&state, "/api/v1/policies/analytics/summary").await).await;
    assert_eq!(body["data"]["total_policies"], 1);

    let body = body_json(get(&state, "/api/v1/policies/high-risk").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

// ── Companies ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_company_and_profile() {
    let state = AppState::new();
    let id = create_company(&state, "Acme Cloud", "ACME").await;

    let response = get(&state, &format!("/api/v1/companies/{id}/profile")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &state,
        "PUT",
        &format!("/api/v1/companies/{id}/profile"),
        json!({"ceo": "J. Doe", "risk_tolerance": "low", "regulatory_risk_score": 0.4}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(get(&state, &format!("/api/v1/companies/{id}/profile")).await).await;
    assert_eq!(body["data"]["ceo"], "J. Doe");
}

#[tokio::test]
async fn test_duplicate_ticker_conflicts() {
    let state = AppState::new();
    create_company(&state, "Acme Cloud", "ACME").await;
    let response = send(
        &state,
        "POST",
        "/api/v1/companies",
        company_body("Acme Two", "ACME"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_cannot_take_another_ticker() {
    let state = AppState::new();
    create_company(&state, "Alpha", "AAA").await;
    let beta = create_company(&state, "Beta", "BBB").await;

    let uri = format!("/api/v1/companies/{beta}");
    let response = send(&state, "PUT", &uri, json!({"ticker": "aaa"})).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");

    let body = body_json(get(&state, &uri).await).await;
    assert_eq!(body["data"]["ticker"], "BBB");

    // Keeping its own ticker is not a clash.
    let response = send(&state, "PUT", &uri, json!({"ticker": "BBB", "name": "Beta Two"})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ── Impact Assessments ──────────────────────────────────────────────

#[tokio::test]
async fn test_assess_records_then_reports_unchanged() {
    let state = AppState::new();
    let policy_id = create_policy(&state, "HR-20").await;
    let company_id = create_company(&state, "Acme Cloud", "ACME").await;
    let request = json!({"policy_id": policy_id, "company_id": company_id, "period": "2025-2026"});

    let response = send(&state, "POST", "/api/v1/impacts/assess", request.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;
    assert_eq!(first["data"]["outcome"], "created");
    let lower = first["data"]["assessment"]["confidence_interval_lower"].as_f64().unwrap();
    let upper = first["data"]["assessment"]["confidence_interval_upper"].as_f64().unwrap();
    assert!(lower <= upper);

    let response = send(&state, "POST", "/api/v1/impacts/assess", request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_eq!(second["data"]["outcome"], "unchanged");
    assert_eq!(
        first["data"]["assessment"]["id"],
        second["data"]["assessment"]["id"]
    );

    let body = body_json(get(&state, "/api/v1/impacts").await).await;
    assert_eq!(body["metadata"]["total_count"], 1);
}

#[tokio::test]
async fn test_policy_amendment_supersedes_assessment() {
    let state = AppState::new();
    let policy_id = create_policy(&state, "HR-21").await;
    let company_id = create_company(&state, "Acme Cloud", "ACME").await;
    let response = send(
        &state,
        "POST",
        "/api/v1/impacts/assess",
        json!({"policy_id": policy_id, "company_id": company_id, "period": "2025-2026"}),
    )
    .await;
    let first_id = body_json(response).await["data"]["assessment"]["id"].clone();

    let response = send(
        &state,
        "PUT",
        &format!("/api/v1/policies/{policy_id}"),
        json!({"estimated_impact": -900.0, "impact_magnitude": -0.7}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["change"]["change_type"], "amendment");
    assert_eq!(body["data"]["reassessment"]["superseded"], 1);

    let history_uri = format!("/api/v1/impacts/{}/history", first_id.as_str().unwrap());
    let response = get(&state, &history_uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    let history = body_json(response).await;
    assert_eq!(history["data"].as_array().unwrap().len(), 2);

    let body = body_json(get(&state, "/api/v1/impacts").await).await;
    assert_eq!(body["metadata"]["total_count"], 1);
    let body = body_json(get(&state, "/api/v1/impacts?include_superseded=true").await).await;
    assert_eq!(body["metadata"]["total_count"], 2);

    let body = body_json(get(&state, &format!("/api/v1/policies/{policy_id}/changes")).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_repealed_policy_keeps_its_status() {
    let state = AppState::new();
    let policy_id = create_policy(&state, "HR-23").await;
    let uri = format!("/api/v1/policies/{policy_id}");

    let response = send(&state, "PUT", &uri, json!({"status": "repealed"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["change"]["change_type"], "repeal");

    let response = send(&state, "PUT", &uri, json!({"status": "draft"})).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let body = body_json(get(&state, &uri).await).await;
    assert_eq!(body["data"]["status"], "repealed");
    let body = body_json(get(&state, &format!("{uri}/changes")).await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Non-status fields stay editable.
    let response = send(&state, "PUT", &uri, json!({"content_summary": "Archived"})).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_assess_policy_reaches_affected_companies() {
    let state = AppState::new();
    let policy_id = create_policy(&state, "HR-22").await;
    create_company(&state, "Acme Cloud", "ACME").await;
    create_company(&state, "Beta Compute", "BETA").await;

    let response = send(
        &state,
        "POST",
        "/api/v1/impacts/assess-policy",
        json!({"policy_id": policy_id}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["created"], 2);
    assert_eq!(body["data"]["skipped"], 0);
}

#[tokio::test]
async fn test_assess_unknown_pair_not_found() {
    let state = AppState::new();
    let response = send(
        &state,
        "POST",
        "/api/v1/impacts/assess",
        json!({
            "policy_id": "00000000-0000-0000-0000-000000000001",
            "company_id": "00000000-0000-0000-0000-000000000002"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── Predictions ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_model_registry_and_performance() {
    let state = AppState::new();
    let body = body_json(get(&state, "/api/v1/predictions/models").await).await;
    let models = body["data"].as_array().unwrap();
    assert!(!models.is_empty());

    let model_id = models[0]["id"].as_str().unwrap();
    let response = get(&state, &format!("/api/v1/predictions/models/{model_id}/performance")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["predictions"], 0);

    let response = get(
        &state,
        "/api/v1/predictions/models/00000000-0000-0000-0000-000000000000/performance",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_timeline_prediction_requires_policy() {
    let state = AppState::new();
    let response = send(
        &state,
        "POST",
        "/api/v1/predictions/generate",
        json!({"prediction_type": "timeline_prediction", "jurisdiction": "US"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Market Data ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_market_data_append_and_duplicate() {
    let state = AppState::new();
    let bar = json!({
        "symbol": "acme",
        "asset_type": "stock",
        "date": "2025-03-03",
        "close_price": 101.5,
        "volume": 1200000
    });
    let response = send(&state, "POST", "/api/v1/market-data", bar.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["symbol"], "ACME");

    let response = send(&state, "POST", "/api/v1/market-data", bar).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(get(&state, "/api/v1/market-data?symbol=Acme").await).await;
    assert_eq!(body["metadata"]["total_count"], 1);
}

#[tokio::test]
async fn test_indicator_change_derived() {
    let state = AppState::new();
    let response = send(
        &state,
        "POST",
        "/api/v1/market-data/economic-indicators",
        json!({
            "indicator_name": "Consumer Price Index",
            "indicator_code": "cpi",
            "country": "us",
            "date": "2025-02-01",
            "frequency": "monthly",
            "value": 3.1,
            "previous_value": 2.9
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let change = body["data"]["change"].as_f64().unwrap();
    assert!((change - 0.2).abs() < 1e-9);
}

#[tokio::test]
async fn test_trade_flows_filter_and_reject_reused_id() {
    let state = AppState::new();
    let flow = |trade_id: &str, origin: &str, destination: &str, date: &str| {
        json!({
            "trade_id": trade_id,
            "trade_type": "export",
            "origin_country": origin,
            "destination_country": destination,
            "product_category": "Electronics",
            "date": date,
            "value_usd": 125000.0,
            "tariff_rate": 0.1
        })
    };
    for body in [
        flow("TRADE_000001", "cn", "us", "2025-01-10"),
        flow("TRADE_000002", "CN", "JP", "2025-02-10"),
        flow("TRADE_000003", "MX", "US", "2025-03-10"),
    ] {
        let response = send(&state, "POST", "/api/v1/market-data/trade-flows", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(
        &state,
        "POST",
        "/api/v1/market-data/trade-flows",
        flow("trade_000001", "UK", "US", "2025-04-01"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(
        &state,
        "POST",
        "/api/v1/market-data/trade-flows",
        flow("TRADE_000009", "US", "us", "2025-04-01"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let uri = "/api/v1/market-data/trade-flows?destination_country=us";
    let body = body_json(get(&state, uri).await).await;
    assert_eq!(body["metadata"]["total_count"], 2);
    assert_eq!(body["data"][0]["origin_country"], "CN");
    assert_eq!(body["data"][0]["product_category"], "electronics");

    let uri = "/api/v1/market-data/trade-flows?origin_country=CN&start_date=2025-02-01";
    let body = body_json(get(&state, uri).await).await;
    assert_eq!(body["metadata"]["total_count"], 1);
    assert_eq!(body["data"][0]["trade_id"], "TRADE_000002");
}

// ── Analytics and Dashboard ─────────────────────────────────────────

#[tokio::test]
async fn test_scenario_analysis_is_not_stored() {
    let state = AppState::new();
    let policy_id = create_policy(&state, "HR-30").await;
    create_company(&state, "Acme Cloud", "ACME").await;

    let response = send(
        &state,
        "POST",
        "/api/v1/analytics/scenario",
        json!({"policy_id": policy_id, "period": "2025-2026"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["companies"], 1);
    assert_eq!(body["data"]["scenarios"].as_array().unwrap().len(), 4);

    let body = body_json(get(&state, "/api/v1/impacts").await).await;
    assert_eq!(body["metadata"]["total_count"], 0);
}

#[tokio::test]
async fn test_dashboard_reflects_writes() {
    let state = AppState::new();
    let body = body_json(get(&state, "/api/v1/dashboard/summary").await).await;
    assert_eq!(body["data"]["total_policies"], 0);

    create_policy(&state, "HR-40").await;
    let body = body_json(get(&state, "/api/v1/dashboard/summary").await).await;
    assert_eq!(body["data"]["total_policies"], 1);
    assert_eq!(body["data"]["active_policies"], 1);
}

#[tokio::test]
async fn test_trends_and_risk_analysis() {
    let state = AppState::new();
    let response = get(&state, "/api/v1/analytics/trends?months=6").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["months"].as_array().unwrap().len(), 6);

    let response = get(&state, "/api/v1/analytics/risk-analysis").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_assessments"], 0);
}

// ── Reports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_report_generate_and_fetch() {
    let state = AppState::new();
    let response = send(
        &state,
        "POST",
        "/api/v1/reports/generate",
        json!({"report_type": "policy_overview"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let report_id = body["data"]["report_id"].as_str().unwrap().to_string();
    assert!(report_id.starts_with("REP_"));
    assert_eq!(body["data"]["format"], "json");

    let response = get(&state, &format!("/api/v1/reports/{report_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(&state, "/api/v1/reports/REP_19700101_000000").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_binary_format_rejected() {
    let state = AppState::new();
    let response = send(
        &state,
        "POST",
        "/api/v1/reports/generate",
        json!({"report_type": "impact_summary", "format": "pdf"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_auth_required_when_configured() {
    let app = test_app_with_auth("s3cret");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/policies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_open_when_auth_configured() {
    let app = test_app_with_auth("s3cret");
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_viewer_can_read_but_not_write() {
    let app = test_app_with_auth("s3cret");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/policies")
                .header("authorization", "Bearer viewer:s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/policies")
                .header("authorization", "Bearer viewer:s3cret")
                .header("content-type", "application/json")
                .body(Body::from(policy_body("HR-50").to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = test_app_with_auth("s3cret");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/companies")
                .header("authorization", "Bearer analyst:nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
