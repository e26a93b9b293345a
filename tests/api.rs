mod common;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::TestServer;
use common::*;
use condo_reviews::api::create_router;
use serde_json::{json, Value};

struct Caller {
    user_id: i64,
    role: &'static str,
}

const ADMIN: Caller = Caller {
    user_id: 1,
    role: "admin",
};

fn student(user_id: i64) -> Caller {
    Caller {
        user_id,
        role: "user",
    }
}

async fn server() -> TestServer {
    let app = setup().await;
    TestServer::new(create_router(app.state)).unwrap()
}

async fn send(
    server: &TestServer,
    method: Method,
    uri: &str,
    caller: Option<&Caller>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = server.method(method, uri);
    if let Some(caller) = caller {
        request = request
            .add_header(
                HeaderName::from_static("x-user-id"),
                HeaderValue::from_str(&caller.user_id.to_string()).unwrap(),
            )
            .add_header(
                HeaderName::from_static("x-user-role"),
                HeaderValue::from_static(caller.role),
            );
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.await;
    let value = if response.as_bytes().is_empty() {
        Value::Null
    } else {
        response.json::<Value>()
    };
    (response.status_code(), value)
}

async fn create_condo(app: &TestServer, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/condos",
        Some(&ADMIN),
        Some(json!({
            "name": name,
            "address": "2401 Taft Avenue, Manila",
            "description": "Walking distance to campus",
            "price": 10000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = server().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_review_lifecycle_updates_condo_rating() {
    let app = server().await;
    let condo_id = create_condo(&app, "Archer Suites").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(11)),
        Some(json!({"condoId": condo_id, "rating": 5, "comment": "Great"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Review added successfully");
    let review_id = body["review"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(12)),
        Some(json!({"condoId": condo_id, "rating": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["review"]["comment"].is_null());

    let (_, condo) = send(&app, Method::GET, &format!("/api/condos/{}", condo_id), None, None).await;
    assert_eq!(condo["averageRating"], json!(3.5));
    assert_eq!(condo["reviewCount"], json!(2));

    // Submitting again rewrites the same review
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(11)),
        Some(json!({"condoId": condo_id, "rating": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Review updated successfully");
    assert_eq!(body["review"]["id"].as_i64(), Some(review_id));

    let (_, condo) = send(&app, Method::GET, &format!("/api/condos/{}", condo_id), None, None).await;
    assert_eq!(condo["averageRating"], json!(3.0));
    assert_eq!(condo["reviewCount"], json!(2));

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/reviews/{}", review_id),
        Some(&student(11)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedCondo"]["averageRating"], json!(2.0));
    assert_eq!(body["updatedCondo"]["reviewCount"], json!(1));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/reviews/condo/{}", condo_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_submit_requires_identity_and_fields() {
    let app = server().await;
    let condo_id = create_condo(&app, "Strict Place").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reviews",
        None,
        Some(json!({"condoId": condo_id, "rating": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(20)),
        Some(json!({"condoId": condo_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Condo ID and rating are required");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(20)),
        Some(json!({"condoId": condo_id, "rating": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(20)),
        Some(json!({"condoId": condo_id + 1, "rating": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Condo not found");
}

#[tokio::test]
async fn test_ownership_and_admin_routes() {
    let app = server().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/condos",
        Some(&student(30)),
        Some(json!({"name": "x", "address": "y", "description": "z"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let condo_id = create_condo(&app, "Owned").await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(31)),
        Some(json!({"condoId": condo_id, "rating": 3})),
    )
    .await;
    let review_id = body["review"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/reviews/{}", review_id),
        Some(&student(32)),
        Some(json!({"rating": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/reviews/user/condo/{}", condo_id),
        Some(&student(31)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review"]["id"].as_i64(), Some(review_id));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/reviews/user/condo/{}", condo_id),
        Some(&student(32)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["review"].is_null());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/condos/recalculate-reviews",
        Some(&ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], json!(1));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/condos/{}", condo_id),
        Some(&ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/reviews/{}", review_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_and_popular() {
    let app = server().await;
    let busy = create_condo(&app, "Vista Busy").await;
    create_condo(&app, "Vista Quiet").await;
    create_condo(&app, "Green Loft").await;

    send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&student(40)),
        Some(json!({"condoId": busy, "rating": 4, "comment": "Close to campus"})),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/condos?search=vista&limit=1&page=abc",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["pages"], json!(2));
    assert_eq!(body["page"], json!(1));
    assert_eq!(body["condos"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/api/condos/popular", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let condos = body["condos"].as_array().unwrap();
    assert_eq!(condos.len(), 3);
    assert_eq!(condos[0]["id"].as_i64(), Some(busy));
    assert_eq!(condos[0]["recentReview"]["comment"], "Close to campus");
    assert!(condos[1].get("recentReview").is_none());
}
