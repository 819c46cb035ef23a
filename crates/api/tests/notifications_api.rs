//! Notification inbox endpoints.

mod common;

use axum::http::StatusCode;
use blip_core::notification::NotificationKind;
use blip_events::{EventPersistence, PlatformEvent};
use common::{body_json, build_test_app, get_auth, post_auth, register};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_inbox_read_flow(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let first = EventPersistence::persist(
        &pool,
        &PlatformEvent::new(NotificationKind::ConnectionRequested, alice.id)
            .with_source("connection", 7)
            .with_actor(bob.id),
    )
    .await
    .unwrap();
    EventPersistence::persist(
        &pool,
        &PlatformEvent::new(NotificationKind::PointsReceived, alice.id)
            .with_payload(serde_json::json!({ "amount": 5 })),
    )
    .await
    .unwrap();

    let json = body_json(get_auth(&app, "/api/v1/notifications/unread-count", &alice.token).await).await;
    assert_eq!(json["data"]["count"], 2);

    let json = body_json(get_auth(&app, "/api/v1/notifications", &alice.token).await).await;
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    let requested = list.iter().find(|n| n["id"] == first).unwrap();
    assert_eq!(requested["kind"], "connection_requested");
    assert_eq!(requested["payload"]["actor_user_id"], bob.id);

    // Someone else's notification looks missing.
    let response = post_auth(&app, &format!("/api/v1/notifications/{first}/read"), &bob.token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_auth(&app, &format!("/api/v1/notifications/{first}/read"), &alice.token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(&app, "/api/v1/notifications?unread_only=true", &alice.token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["kind"], "points_received");

    let response = post_auth(&app, "/api/v1/notifications/read-all", &alice.token).await;
    assert_eq!(body_json(response).await["data"]["marked_read"], 1);

    let json = body_json(get_auth(&app, "/api/v1/notifications/unread-count", &alice.token).await).await;
    assert_eq!(json["data"]["count"], 0);
}
