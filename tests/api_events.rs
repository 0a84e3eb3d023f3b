//! Integration tests for the event endpoints
//!
//! - POST /events
//! - GET /events
//! - GET /events/{event_id}
//! - PATCH /events/{event_id}
//! - POST /events/{event_id}/publish
//! - POST /events/{event_id}/flyer

mod common;

#[cfg(test)]
mod event_tests {
    use super::common::{
        ALICE, BOB, bearer, create_test_server, create_test_state, create_test_state_with,
        eventually, spawn_fake_api, test_config,
    };
    use axum::{Router, body::Bytes, http::StatusCode, routing::put};
    use axum_test::http::HeaderName;
    use guestlist::config::FlyerProviderConfig;
    use guestlist::entities::NotificationKind;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    fn authorization() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    // ============================================================
    // POST /events - create_event
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_event_as_draft(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/events")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({
                "name": "  Garden Brunch ",
                "venue": "Backyard",
                "starts_at": "2026-06-01T10:00:00Z",
                "ends_at": "2026-06-01T14:00:00Z",
                "capacity": 20
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let event: Value = response.json();
        assert_eq!(event["name"], "Garden Brunch");
        assert_eq!(event["status"], "DRAFT");
        assert_eq!(event["creator_id"], ALICE.0);
        assert_eq!(event["attendee_count"], 0);
        assert_eq!(event["remaining_capacity"], 20);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_event_ending_before_start(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({
                "name": "Backwards",
                "starts_at": "2026-06-01T10:00:00Z",
                "ends_at": "2026-06-01T09:00:00Z"
            }))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_event_with_zero_capacity(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({
                "name": "Nobody",
                "starts_at": "2026-06-01T10:00:00Z",
                "capacity": 0
            }))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    // ============================================================
    // GET /events and GET /events/{event_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_list_my_events_soonest_first(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let events: Vec<Value> = server
            .get("/events")
            .add_header(authorization(), bearer(ALICE))
            .await
            .json();
        let ids: Vec<i64> = events.iter().map(|e| e["event_id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let events: Vec<Value> = server
            .get("/events")
            .add_header(authorization(), bearer(BOB))
            .await
            .json();
        assert!(events.is_empty());
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_draft_visible_only_to_its_creator(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/events/2")
            .add_header(authorization(), bearer(ALICE))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "DRAFT");

        server
            .get("/events/2")
            .add_header(authorization(), bearer(BOB))
            .await
            .assert_status_not_found();

        server
            .get("/events/1")
            .add_header(authorization(), bearer(BOB))
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_get_missing_event(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .get("/events/999")
            .add_header(authorization(), bearer(ALICE))
            .await
            .assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // PATCH /events/{event_id} - update_event
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_update_event(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .patch("/events/1")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "name": " Summer Party II ", "venue": "Beach" }))
            .await;

        response.assert_status_ok();
        let event: Value = response.json();
        assert_eq!(event["name"], "Summer Party II");
        assert_eq!(event["venue"], "Beach");
        assert_eq!(event["status"], "PUBLISHED");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_update_by_someone_else(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .patch("/events/1")
            .add_header(authorization(), bearer(BOB))
            .json(&json!({ "name": "Hijacked" }))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_capacity_below_confirmed_guests(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .patch("/events/1")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "capacity": 1 }))
            .await
            .assert_status(StatusCode::CONFLICT);

        let response = server
            .patch("/events/1")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "capacity": 2 }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["remaining_capacity"], 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_update_schedule_against_stored_start(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        // Summer Party starts at 18:00
        server
            .patch("/events/1")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "ends_at": "2026-07-01T17:00:00Z" }))
            .await
            .assert_status_bad_request();
        Ok(())
    }

    // ============================================================
    // POST /events/{event_id}/publish
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_publish_is_idempotent(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let response = server
            .post("/events/2/publish")
            .add_header(authorization(), bearer(ALICE))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "PUBLISHED");

        let again = server
            .post("/events/2/publish")
            .add_header(authorization(), bearer(ALICE))
            .await;
        again.assert_status_ok();
        assert_eq!(again.json::<Value>()["status"], "PUBLISHED");

        let notified = eventually(|| {
            let state = state.clone();
            async move {
                state
                    .notification
                    .find_many_by_recipient(&ALICE.0, false, 50)
                    .await
                    .map(|n| {
                        n.iter()
                            .filter(|n| n.kind == NotificationKind::EventPublished)
                            .count()
                            == 1
                    })
                    .unwrap_or(false)
            }
        })
        .await;
        assert!(notified, "publishing should notify the creator once");

        server
            .get("/events/2")
            .add_header(authorization(), bearer(BOB))
            .await
            .assert_status_ok();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_publish_by_someone_else(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events/2/publish")
            .add_header(authorization(), bearer(BOB))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // POST /events/{event_id}/flyer - upload_flyer
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_flyer_must_be_an_image(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events/1/flyer")
            .add_header(authorization(), bearer(ALICE))
            .content_type("text/plain")
            .bytes(Bytes::from_static(b"not an image"))
            .await
            .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_empty_flyer(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events/1/flyer")
            .add_header(authorization(), bearer(ALICE))
            .content_type("image/png")
            .bytes(Bytes::new())
            .await
            .assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_flyer_without_storage(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/events/1/flyer")
            .add_header(authorization(), bearer(ALICE))
            .content_type("image/png")
            .bytes(Bytes::from_static(b"\x89PNG fake"))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<Value>()["error"], "Flyer storage is unavailable");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_flyer_stored_on_the_event(pool: SqlitePool) -> sqlx::Result<()> {
        let storage = spawn_fake_api(Router::new().route(
            "/{*key}",
            put(|body: Bytes| async move {
                if body.is_empty() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::OK
                }
            }),
        ))
        .await;

        let mut config = test_config();
        config.flyer_primary = Some(FlyerProviderConfig {
            name: "primary",
            upload_url: storage.clone(),
            token: Some("storage-token".to_string()),
            public_url: "https://cdn.example.test".to_string(),
        });
        let server = create_test_server(create_test_state_with(pool, config));

        let response = server
            .post("/events/1/flyer")
            .add_header(authorization(), bearer(ALICE))
            .content_type("image/png")
            .bytes(Bytes::from_static(b"\x89PNG fake"))
            .await;

        response.assert_status_ok();
        let event: Value = response.json();
        let url = event["flyer_url"].as_str().unwrap();
        assert!(url.starts_with("https://cdn.example.test/events/1/flyer-"));
        assert!(url.ends_with(".png"));
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_flyer_by_someone_else(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events/1/flyer")
            .add_header(authorization(), bearer(BOB))
            .content_type("image/png")
            .bytes(Bytes::from_static(b"\x89PNG fake"))
            .await
            .assert_status_forbidden();
        Ok(())
    }
}
