use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ride_compare::api::rest::router;
use ride_compare::config::Config;
use ride_compare::state::{AppState, SEARCH_LIMIT};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        simulate_latency: false,
        payment_success_rate: 1.0,
        ..Config::default()
    }
}

fn setup() -> axum::Router {
    setup_with(test_config()).0
}

fn setup_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::offline(config));
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    empty_request("GET", uri)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn search_body() -> Value {
    json!({
        "pickup": { "address": "MG Road", "secondary_address": "Bangalore, KA", "lat": 12.9716, "lng": 77.5946 },
        "drop": { "address": "Koramangala", "lat": 12.9352, "lng": 77.6146 }
    })
}

async fn run_search(app: &axum::Router) -> Value {
    let res = app
        .clone()
        .oneshot(json_request("POST", "/searches", search_body()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await
}

async fn sign_in(app: &axum::Router) {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/session/verify",
            json!({ "phone_number": "9876543210", "otp": "1234" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["searches"], 0);
    assert_eq!(body["active_bookings"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    run_search(&app).await;

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("searches_total 1"));
    assert!(body.contains("active_bookings"));
}

#[tokio::test]
async fn search_returns_sorted_offers_and_picks() {
    let app = setup();
    let body = run_search(&app).await;

    assert!(body["search_id"].as_str().is_some());
    assert_eq!(body["category"], "All");

    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 12);
    assert!(offers.iter().all(|o| o["price"].as_u64().unwrap() > 0));

    let prices: Vec<u64> = offers.iter().map(|o| o["price"].as_u64().unwrap()).collect();
    assert!(prices.windows(2).all(|pair| pair[0] <= pair[1]));

    assert_eq!(body["cheapest"]["price"].as_u64().unwrap(), prices[0]);
    assert!(body["fastest"]["id"].as_str().is_some());
    assert!(body["best_value"]["id"].as_str().is_some());

    assert!(offers
        .iter()
        .all(|o| !(o["provider"] == "Rapido" && o["category"] == "Cab")));
}

#[tokio::test]
async fn category_filter_narrows_view_but_not_picks() {
    let app = setup();
    let search = run_search(&app).await;
    let id = search["search_id"].as_str().unwrap();

    let res = app
        .oneshot(get_request(&format!("/searches/{id}?category=Bike")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    let offers = body["offers"].as_array().unwrap();
    assert_eq!(offers.len(), 3);
    assert!(offers.iter().all(|o| o["category"] == "Bike"));
    assert_eq!(body["cheapest"], search["cheapest"]);
    assert_eq!(body["best_value"], search["best_value"]);
}

#[tokio::test]
async fn search_with_invalid_coordinates_returns_400() {
    let app = setup();
    let res = app
        .oneshot(json_request(
            "POST",
            "/searches",
            json!({
                "pickup": { "address": "Nowhere", "lat": 123.0, "lng": 77.5 },
                "drop": { "address": "Koramangala", "lat": 12.9352, "lng": 77.6146 }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_search_returns_404() {
    let app = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/searches/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn redirect_returns_provider_links() {
    let app = setup();
    let search = run_search(&app).await;
    let id = search["search_id"].as_str().unwrap();
    let offer = &search["cheapest"];
    let offer_id = offer["id"].as_str().unwrap();

    let res = app
        .oneshot(get_request(&format!("/searches/{id}/offers/{offer_id}/redirect")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["provider"], offer["provider"]);
    assert_eq!(body["web_url"], offer["web_url"]);
    assert!(body["deep_link"].as_str().unwrap().contains("://book?pickup="));
}

#[tokio::test]
async fn searches_are_recorded_in_history_newest_first() {
    let app = setup();
    run_search(&app).await;
    run_search(&app).await;

    let res = app.oneshot(get_request("/history")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["pickup"]["address"], "MG Road");
    assert!(items[0]["selected_provider"].is_null());
    let timestamp = |item: &Value| {
        item["timestamp"]
            .as_str()
            .unwrap()
            .parse::<chrono::DateTime<chrono::Utc>>()
            .unwrap()
    };
    assert!(timestamp(&items[0]) >= timestamp(&items[1]));
}

#[tokio::test]
async fn session_sign_in_and_out() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(json_request("POST", "/session/otp", json!({ "phone_number": "12345" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/session/otp",
            json!({ "phone_number": "9876543210" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    sign_in(&app).await;

    let res = app.clone().oneshot(get_request("/session")).await.unwrap();
    let body = body_json(res).await;
    assert_eq!(body["user"]["name"], "Power User");
    assert_eq!(body["user"]["phone_number"], "9876543210");
    assert_eq!(body["token"], "mock-jwt-token");

    let res = app
        .clone()
        .oneshot(empty_request("DELETE", "/session"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = app.oneshot(get_request("/session")).await.unwrap();
    let body = body_json(res).await;
    assert!(body["user"].is_null());
    assert!(body["token"].is_null());
}

#[tokio::test]
async fn booking_requires_sign_in() {
    let app = setup();
    let search = run_search(&app).await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({ "search_id": search["search_id"], "offer_id": search["cheapest"]["id"] }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn declined_payment_creates_no_booking() {
    let (app, state) = setup_with(Config {
        payment_success_rate: 0.0,
        ..test_config()
    });
    let search = run_search(&app).await;
    sign_in(&app).await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({ "search_id": search["search_id"], "offer_id": search["cheapest"]["id"] }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    let body = body_json(res).await;
    assert_eq!(body["error"], "Payment failed. Please check your card or wallet.");
    assert!(state.bookings.is_empty());
}

#[tokio::test]
async fn provider_rejection_reports_refund() {
    let (app, state) = setup_with(Config {
        provider_failure_rate: 1.0,
        ..test_config()
    });
    let search = run_search(&app).await;
    sign_in(&app).await;

    let res = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({ "search_id": search["search_id"], "offer_id": search["cheapest"]["id"] }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(res).await;
    assert_eq!(
        body["error"],
        "Could not book with provider. Payment has been refunded."
    );
    assert!(state.bookings.is_empty());
}

#[tokio::test]
async fn full_booking_flow() {
    let (app, state) = setup_with(test_config());
    let search = run_search(&app).await;
    sign_in(&app).await;
    let offer = &search["best_value"];

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            json!({ "search_id": search["search_id"], "offer_id": offer["id"] }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let booking = body_json(res).await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["payment_status"], "captured");
    assert_eq!(booking["offer_id"], offer["id"]);
    assert_eq!(booking["price"], offer["price"]);
    assert!(booking["transaction_id"].as_str().unwrap().starts_with("txn_"));
    assert_eq!(booking["driver"]["otp"].as_str().unwrap().len(), 4);
    assert_eq!(state.metrics.active_bookings.get(), 1);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/bookings/{booking_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(empty_request("POST", &format!("/bookings/{booking_id}/cancel")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "cancelled");

    let res = app
        .clone()
        .oneshot(empty_request("POST", &format!("/bookings/{booking_id}/cancel")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/bookings/{booking_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.metrics.active_bookings.get(), 0);

    let res = app
        .oneshot(get_request(&format!("/bookings/{booking_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn insights_fall_back_to_static_summary() {
    let app = setup();
    let search = run_search(&app).await;
    let id = search["search_id"].as_str().unwrap();

    let res = app
        .oneshot(get_request(&format!("/searches/{id}/insights")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["summary"], "Comparison complete.");
    let cheapest = search["cheapest"]["provider"].as_str().unwrap();
    assert_eq!(
        body["recommendation"],
        format!("The cheapest option is {cheapest}.")
    );
}

#[tokio::test]
async fn chat_answers_in_basic_mode() {
    let app = setup();
    let res = app
        .oneshot(json_request(
            "POST",
            "/chat",
            json!({ "messages": [{ "role": "user", "text": "Which ride is cheapest?" }] }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert!(body["reply"].as_str().unwrap().contains("basic mode"));
}

#[tokio::test]
async fn location_suggestions_need_three_characters() {
    let app = setup();

    let res = app
        .clone()
        .oneshot(get_request("/locations/suggest?q=In"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 0);

    let res = app
        .clone()
        .oneshot(get_request("/locations/suggest?q=Indiranagar"))
        .await
        .unwrap();
    let suggestions = body_json(res).await;
    let suggestions = suggestions.as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions[0]["full_address"].as_str().is_some());

    let res = app
        .oneshot(get_request("/locations/reverse?lat=12.97&lng=77.59"))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["address"], "Near Current Location");
    assert_eq!(body["lat"], 12.97);
}

#[tokio::test]
async fn stored_searches_are_bounded() {
    let (app, state) = setup_with(test_config());
    let first = run_search(&app).await;
    let first_id = first["search_id"].as_str().unwrap().to_string();

    for _ in 0..SEARCH_LIMIT + 5 {
        run_search(&app).await;
    }
    assert_eq!(state.searches.len(), SEARCH_LIMIT);

    let res = app
        .clone()
        .oneshot(get_request(&format!("/searches/{first_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(body_json(res).await["searches"], SEARCH_LIMIT);
}
