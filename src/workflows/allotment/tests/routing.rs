use super::common::*;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::allotment::router::{run_handler, student_allotment_handler};
use crate::workflows::allotment::repository::HostelRepository;
use crate::workflows::allotment::{allotment_router, InMemoryHostelRepository};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn run_route_reports_allocations_and_halt_warning() {
    let (service, _) = seeded_service(general_trio(), vec![room("R1", 1)]);
    let router = allotment_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/allotments/runs",
            json!({ "category_cutoff": 2 }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["state"], "halted");
    assert_eq!(body["category_cutoff"], 2);
    assert_eq!(body["unallotted"], 1);
    assert_eq!(body["warning"], "No more rooms available for allotment!");
    assert_eq!(body["events"][0]["event"], "allocated");
    assert_eq!(body["events"][0]["room_number"], "R1");
    assert_eq!(body["events"][1]["event"], "run_halted");
    assert_eq!(body["events"][1]["reason"], "rooms_exhausted");
}

#[tokio::test]
async fn run_handler_without_body_uses_configured_cutoff() {
    let (service, _) = seeded_service(general_trio(), Vec::new());

    let response =
        run_handler::<InMemoryHostelRepository>(State(Arc::new(service)), Bytes::new()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["state"], "aborted");
    assert_eq!(body["category_cutoff"], 2);
    assert_eq!(body["warning"], "No rooms are available for allotment!");
}

#[tokio::test]
async fn run_route_rejects_zero_cutoff() {
    let (service, _) = seeded_service(general_trio(), vec![room("R1", 1)]);
    let router = allotment_router(Arc::new(service));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/allotments/runs",
            json!({ "category_cutoff": 0 }),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_run_body_is_rejected_without_allotting() {
    let (service, repository) = seeded_service(general_trio(), vec![room("R1", 5)]);
    let router = allotment_router(Arc::new(service));

    for body in [
        r#"{"category_cutoff": -1}"#,
        r#"{"category_cutoff": "3"}"#,
        r#"{"cutoff": 3}"#,
        "{not json",
    ] {
        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/allotments/runs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .expect("request builds"),
            )
            .await
            .expect("route responds");

        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "body {body} should be rejected"
        );
    }

    assert!(repository.list_allotments().expect("listed").is_empty());
}

#[tokio::test]
async fn register_routes_create_students_and_rooms() {
    let (service, _) = seeded_service(Vec::new(), Vec::new());
    let router = allotment_router(Arc::new(service));

    let created = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/students",
            json!({
                "registration_id": "CET101",
                "name": "Meera Joshi",
                "category": "SC",
                "merit_score": 93.5
            }),
        ))
        .await
        .expect("route responds");
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json_body(created).await;
    assert_eq!(body["merit_score"], "93.50");
    assert_eq!(body["category"], "SC");

    let duplicate = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/students",
            json!({
                "registration_id": "CET101",
                "name": "Someone Else",
                "category": "OBC",
                "merit_score": "40"
            }),
        ))
        .await
        .expect("route responds");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let invalid_room = router
        .oneshot(json_request(
            "POST",
            "/api/v1/rooms",
            json!({
                "building": "Tilak Hostel",
                "block": "B",
                "room_number": "B-01",
                "total_capacity": 0
            }),
        ))
        .await
        .expect("route responds");
    assert_eq!(invalid_room.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn student_allotment_handler_returns_not_found_for_unknown_students() {
    let (service, _) = seeded_service(general_trio(), Vec::new());

    let response = student_allotment_handler::<InMemoryHostelRepository>(
        State(Arc::new(service)),
        Path("ghost".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["registration_id"], "ghost");
}

#[tokio::test]
async fn roster_route_shows_allotment_status() {
    let (service, _) = seeded_service(general_trio(), vec![room("R1", 2)]);
    service.run_allotment(1).expect("run succeeds");
    let router = allotment_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::get("/api/v1/roster")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["students"][0]["room_number"], "R1");
    assert!(body["students"][1].get("room_number").is_none());
    assert_eq!(body["rooms_with_space"][0]["occupancy"], 1);
}

#[tokio::test]
async fn unavailable_repository_maps_to_internal_error() {
    let service = Arc::new(build_service(Arc::new(UnavailableRepository)));
    let router = allotment_router(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/roster")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
