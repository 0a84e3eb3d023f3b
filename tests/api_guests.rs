//! Integration tests for the host side guest list endpoints
//!
//! - GET /events/{event_id}/guests
//! - POST /events/{event_id}/guests
//! - GET /events/{event_id}/guests/export

mod common;

#[cfg(test)]
mod guest_tests {
    use super::common::{
        ALICE, BOB, CAROL, bearer, create_test_server, create_test_state, create_test_state_with,
        eventually, test_config,
    };
    use axum::http::StatusCode;
    use axum_test::http::HeaderName;
    use guestlist::entities::NotificationKind;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use std::path::PathBuf;

    fn authorization() -> HeaderName {
        HeaderName::from_static("authorization")
    }

    // ============================================================
    // GET /events/{event_id}/guests - list_guests
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_roster_for_the_host(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .get("/events/1/guests")
            .add_header(authorization(), bearer(ALICE))
            .await;

        response.assert_status_ok();
        let roster: Value = response.json();
        assert_eq!(roster["event_name"], "Summer Party");
        assert_eq!(roster["total_guests"], 2);
        assert_eq!(roster["by_gender"]["male"], 1);
        assert_eq!(roster["by_gender"]["other"], 1);
        assert_eq!(roster["guests"][0]["name"], "Bob Guest");
        assert_eq!(roster["guests"][0]["submitted_by"], BOB.0);
        assert_eq!(roster["guests"][1]["name"], "Xavier");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_roster_hidden_from_guests(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .get("/events/1/guests")
            .add_header(authorization(), bearer(BOB))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // POST /events/{event_id}/guests - add_guest
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_host_adds_guest(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let response = server
            .post("/events/1/guests")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "name": "Carol", "phone": "900 000 0003", "gender": "FEMALE" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let rsvp: Value = response.json();
        assert_eq!(rsvp["added_by_host"], true);
        assert_eq!(rsvp["created_by"], ALICE.0);
        assert_eq!(rsvp["guests"][0]["phone"], "9000000003");

        let roster: Value = server
            .get("/events/1/guests")
            .add_header(authorization(), bearer(ALICE))
            .await
            .json();
        assert_eq!(roster["total_guests"], 3);
        assert_eq!(roster["by_gender"]["female"], 1);

        // Carol has an account, she hears about it
        let notified = eventually(|| {
            let state = state.clone();
            async move {
                state
                    .notification
                    .find_many_by_recipient(&CAROL.0, true, 50)
                    .await
                    .map(|n| n.iter().any(|n| n.kind == NotificationKind::GuestAdded))
                    .unwrap_or(false)
            }
        })
        .await;
        assert!(notified, "linked account should be notified");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_host_adds_guest_already_listed(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/events/1/guests")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "name": "Xavier Clone", "email": "x@GMAIL.com" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let error: Value = response.json();
        assert_eq!(
            error["guests"][0]["message"],
            "A guest with this email is already on the guest list"
        );
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_host_can_not_add_themselves(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/events/1/guests")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "name": "Alice Again", "phone": ALICE.1 }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<Value>()["guests"][0]["message"],
            "This phone number is yours, you are already the primary guest"
        );
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_guest_can_not_add_guests(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .post("/events/1/guests")
            .add_header(authorization(), bearer(BOB))
            .json(&json!({ "name": "Sneaky", "phone": "9222222222" }))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events")))]
    async fn test_host_adds_guest_to_full_event(pool: SqlitePool) -> sqlx::Result<()> {
        sqlx::query("UPDATE events SET attendee_count = 2 WHERE event_id = 3")
            .execute(&pool)
            .await?;
        let server = create_test_server(create_test_state(pool));

        let response = server
            .post("/events/3/guests")
            .add_header(authorization(), bearer(ALICE))
            .json(&json!({ "name": "Late Comer", "phone": "9222222222" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "Event is full");
        Ok(())
    }

    // ============================================================
    // GET /events/{event_id}/guests/export - export_guests
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_export_without_fonts(pool: SqlitePool) -> sqlx::Result<()> {
        let mut config = test_config();
        config.pdf_font_dir = PathBuf::from("/nonexistent/guestlist-fonts");
        let server = create_test_server(create_test_state_with(pool, config));

        let response = server
            .get("/events/1/guests/export")
            .add_header(authorization(), bearer(ALICE))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json::<Value>()["error"], "PDF export is unavailable");
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "events", "rsvps")))]
    async fn test_export_by_someone_else(pool: SqlitePool) -> sqlx::Result<()> {
        let server = create_test_server(create_test_state(pool));

        server
            .get("/events/1/guests/export")
            .add_header(authorization(), bearer(BOB))
            .await
            .assert_status_forbidden();
        Ok(())
    }
}
