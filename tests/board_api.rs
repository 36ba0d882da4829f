use std::net::SocketAddr;

use eywa_board::config::Config;
use eywa_board::drawer::Drawer;
use eywa_board::grid::{SlotKey, SlotStore, TimeGrid};
use eywa_board::models::{EventStatus, ScheduleBooking};
use eywa_board::{app, AppState};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_board(crm: &MockServer) -> SocketAddr {
    let builder = config::Config::builder()
        .set_override("crm_api_url", crm.uri())
        .unwrap()
        .set_override("crm_api_token", "service-token")
        .unwrap();
    let config = Config::from_builder(builder).unwrap();
    let state = AppState::new(&config).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state).into_make_service()).await.unwrap();
    });
    addr
}

fn day_bookings() -> Value {
    json!([
        {
            "id": "b1",
            "booking_date": "2025-12-17",
            "booking_time": "09:00",
            "booking_end_time": "10:00",
            "category": "Body Mind",
            "service_name": "Stretching",
            "trainer_name": "Севара",
            "clients": [{"client_id": "c1", "client_name": "Алексей М."}],
            "max_capacity": 10,
            "current_count": 4,
            "status": "Оплачено"
        },
        {
            "id": "b2",
            "booking_date": "2025-12-17",
            "booking_time": "11:00",
            "category": "Body Mind",
            "service_name": "Yoga",
            "status": "Бронь"
        }
    ])
}

async fn mount_day(crm: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/schedule/bookings"))
        .and(query_param("start_date", "2025-12-17"))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_bookings()))
        .mount(crm)
        .await;
}

#[tokio::test]
async fn health_and_banner() {
    let crm = MockServer::start().await;
    let addr = spawn_board(&crm).await;

    let body = reqwest::get(format!("http://{}/health", addr)).await.unwrap().text().await.unwrap();
    assert_eq!(body, "OK");
    let banner = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert!(banner.status().is_success());
}

#[tokio::test]
async fn overview_is_filtered_and_counted() {
    let crm = MockServer::start().await;
    mount_day(&crm).await;
    let addr = spawn_board(&crm).await;

    let view: Value = reqwest::get(format!(
        "http://{}/api/overview?date=2025-12-17&status=paid",
        addr
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    assert_eq!(view["date"], "2025-12-17");
    assert_eq!(view["counts"], json!({"reserved": 1, "paid": 1, "free": 0}));
    let body = &view["groups"][1]["columns"][0];
    assert_eq!(body["key"], "body");
    assert_eq!(body["cells"][2]["slot"], "bodymind__body__09:00");
    assert_eq!(body["cells"][2]["event"]["id"], "b1");
    assert_eq!(body["cells"][2]["span"], 2);
    assert_eq!(body["cells"][3]["continues"], true);
    assert!(body["cells"][4]["event"].is_null());
}

#[tokio::test]
async fn rejected_move_returns_conflict_without_patch() {
    let crm = MockServer::start().await;
    mount_day(&crm).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&crm)
        .await;
    let addr = spawn_board(&crm).await;

    // b1 занимает 09:00-10:00, на 10:00 он упрётся в b2 (11:00).
    let response = reqwest::Client::new()
        .post(format!("http://{}/api/overview/move", addr))
        .json(&json!({
            "date": "2025-12-17",
            "source": "bodymind__body__09:00",
            "target": "bodymind__body__10:00"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn drawer_action_is_forwarded_with_caller_token() {
    let crm = MockServer::start().await;
    mount_day(&crm).await;
    Mock::given(method("PATCH"))
        .and(path("/api/schedule/bookings/b2"))
        .and(header("authorization", "Bearer user-token"))
        .and(body_partial_json(json!({"status": "Оплачено"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(day_bookings()[1].clone()))
        .expect(1)
        .mount(&crm)
        .await;
    let addr = spawn_board(&crm).await;

    // Действие собирается панелью так же, как это делает клиент доски.
    let bookings: Vec<ScheduleBooking> = serde_json::from_value(day_bookings()).unwrap();
    let store = SlotStore::from_overview(TimeGrid::default(), &bookings);
    let mut drawer = Drawer::new();
    drawer
        .open_event(&store, &SlotKey::new("bodymind", "body", "11:00"))
        .unwrap();
    drawer.set_status(EventStatus::Paid).unwrap();
    let action = drawer.submit().unwrap().unwrap();

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/board/actions", addr))
        .bearer_auth("user-token")
        .json(&json!({"date": "2025-12-17", "action": action}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let view: Value = response.json().await.unwrap();
    assert!(view["groups"].is_array());
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let crm = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/trainers"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&crm)
        .await;
    let addr = spawn_board(&crm).await;

    let response = reqwest::get(format!("http://{}/api/trainers", addr)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    assert!(!response.text().await.unwrap().contains("boom"));
}

#[tokio::test]
async fn client_search_passes_query() {
    let crm = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clients"))
        .and(query_param("query", "ольга"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "c7",
            "name": "Ольга С.",
            "phone": "+998901234567"
        }])))
        .expect(1)
        .mount(&crm)
        .await;
    let addr = spawn_board(&crm).await;

    let clients: Value = reqwest::Client::new()
        .get(format!("http://{}/api/clients/search", addr))
        .query(&[("query", "ольга")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(clients[0]["id"], "c7");
}

#[tokio::test]
async fn delete_action_cannot_reach_other_resources() {
    let crm = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/clients/c42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&crm)
        .await;
    let addr = spawn_board(&crm).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("http://{}/api/board/actions", addr))
        .json(&json!({
            "date": "2025-12-17",
            "action": {"type": "delete", "id": "../../clients/c42"}
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = http
        .post(format!("http://{}/api/board/actions", addr))
        .json(&json!({"date": "2025-12-17", "action": {"type": "delete", "id": ".."}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
