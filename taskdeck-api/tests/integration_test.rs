/// Integration tests for the Taskdeck API
///
/// These tests drive the full router against a real database:
/// - Registration, login and token-protected access
/// - Assignment / comment notification rules, including suppression
/// - Due-date sweep idempotence through the trigger endpoint
/// - Cascade deletes for projects and tasks
/// - Ownership checks and their no-broadcast guarantee

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{notification_count, send, TestContext};
use serde_json::json;
use taskdeck_shared::models::comment::{Comment, CreateComment};
use uuid::Uuid;

#[tokio::test]
async fn test_register_login_and_me() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("reg-{}@example.com", Uuid::new_v4());

    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "email": email,
            "name": "Registered User",
            "password": "sup3rsecret"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", body);
    let registered_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();

    let (status, body) = send(
        &ctx,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": "sup3rsecret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&ctx, "GET", "/v1/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email);

    ctx.cleanup(&[registered_id]).await.unwrap();
}

#[tokio::test]
async fn test_health_check_is_public() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(&ctx, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup(&[]).await.unwrap();
}

#[tokio::test]
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(&ctx, "GET", "/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&ctx, "GET", "/v1/tasks", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup(&[]).await.unwrap();
}

#[tokio::test]
async fn test_assignment_notifications() {
    let ctx = TestContext::new().await.unwrap();
    let (bob, _) = ctx.create_user("bob").await.unwrap();
    let (carol, carol_token) = ctx.create_user("carol").await.unwrap();

    // Creating a task already assigned to Bob is not a reassignment
    let (status, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Draft announcement", "assignee_id": bob.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", task);
    let task_id = task["id"].as_str().unwrap().to_string();
    assert_eq!(notification_count(&ctx, bob.id, "assigned").await, 0);

    // Reassigning Bob -> Carol notifies Carol
    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/tasks/{}", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "assignee_id": carol.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, carol.id, "assigned").await, 1);

    let (_, notifications) = send(&ctx, "GET", "/v1/notifications", Some(&carol_token), None).await;
    let message = notifications[0]["message"].as_str().unwrap();
    assert_eq!(
        message,
        "Test User assigned \"Draft announcement\" to you"
    );

    // Re-sending the same assignee is a no-op
    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/tasks/{}", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "assignee_id": carol.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, carol.id, "assigned").await, 1);

    // Taking a task yourself never notifies you
    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/tasks/{}", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "assignee_id": ctx.user.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, ctx.user.id, "assigned").await, 0);

    ctx.cleanup(&[bob.id, carol.id]).await.unwrap();
}

#[tokio::test]
async fn test_comment_notifications_and_truncation() {
    let ctx = TestContext::new().await.unwrap();
    let (bob, bob_token) = ctx.create_user("bob").await.unwrap();

    let (_, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Review budget", "assignee_id": bob.id })),
    )
    .await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Long body: notification carries the first 50 chars plus "..."
    let long_body = "x".repeat(80);
    let (status, _) = send(
        &ctx,
        "POST",
        &format!("/v1/tasks/{}/comments", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "content": long_body })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, bob.id, "comment").await, 1);

    let (_, notifications) = send(&ctx, "GET", "/v1/notifications", Some(&bob_token), None).await;
    let message = notifications[0]["message"].as_str().unwrap();
    let expected_excerpt = format!("{}...", "x".repeat(50));
    assert_eq!(
        message,
        format!("Test User commented on \"Review budget\": {}", expected_excerpt)
    );

    // The assignee commenting on their own task stays silent
    let (status, _) = send(
        &ctx,
        "POST",
        &format!("/v1/tasks/{}/comments", task_id),
        Some(&bob_token),
        Some(json!({ "content": "on it" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, bob.id, "comment").await, 1);

    // Short bodies are quoted verbatim, no ellipsis
    let (status, _) = send(
        &ctx,
        "POST",
        &format!("/v1/tasks/{}/comments", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "content": "numbers look fine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, notifications) = send(
        &ctx,
        "GET",
        "/v1/notifications",
        Some(&bob_token),
        None,
    )
    .await;
    let newest = notifications[0]["message"].as_str().unwrap();
    assert!(newest.ends_with(": numbers look fine"));
    assert!(!newest.contains("..."));

    ctx.cleanup(&[bob.id]).await.unwrap();
}

#[tokio::test]
async fn test_due_date_scan_endpoint_is_idempotent() {
    let ctx = TestContext::new().await.unwrap();
    let (bob, bob_token) = ctx.create_user("bob").await.unwrap();
    let tomorrow = (Utc::now().date_naive() + Duration::days(1)).to_string();

    let (status, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({
            "title": "Submit report",
            "assignee_id": bob.id,
            "due_date": tomorrow,
            "status": "todo"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", task);

    let (status, summary) = send(
        &ctx,
        "POST",
        "/v1/notifications/check-due-dates",
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "scan failed: {}", summary);
    assert_eq!(notification_count(&ctx, bob.id, "due_soon").await, 1);

    // Second sweep the same day creates nothing new
    let (status, _) = send(
        &ctx,
        "POST",
        "/v1/notifications/check-due-dates",
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, bob.id, "due_soon").await, 1);

    let (_, notifications) = send(&ctx, "GET", "/v1/notifications", Some(&bob_token), None).await;
    let due_soon = notifications
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["kind"] == "due_soon")
        .expect("due-soon alert missing");
    assert_eq!(due_soon["message"], "\"Submit report\" is due tomorrow");

    ctx.cleanup(&[bob.id]).await.unwrap();
}

#[tokio::test]
async fn test_forbidden_project_update_changes_and_broadcasts_nothing() {
    let ctx = TestContext::new().await.unwrap();
    let (dave, dave_token) = ctx.create_user("dave").await.unwrap();

    let (_, project) = send(
        &ctx,
        "POST",
        "/v1/projects",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Q3 Roadmap", "color": "violet" })),
    )
    .await;
    let project_id = project["id"].as_str().unwrap().to_string();

    // Watch the hub from here on; the create event predates this session
    let (_, mut events_rx) = ctx.hub.subscribe();

    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/projects/{}", project_id),
        Some(&dave_token),
        Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(events_rx.try_recv().is_err(), "rejected update must not broadcast");

    let (_, fetched) = send(
        &ctx,
        "GET",
        &format!("/v1/projects/{}", project_id),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(fetched["title"], "Q3 Roadmap");

    // The owner's update goes through and is broadcast
    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/projects/{}", project_id),
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Q3 Roadmap v2", "color": "violet" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let event = events_rx.recv().await.expect("owner update must broadcast");
    assert_eq!(event.kind.as_str(), "project_updated");
    assert_eq!(event.data["title"], "Q3 Roadmap v2");

    ctx.cleanup(&[dave.id]).await.unwrap();
}

#[tokio::test]
async fn test_project_delete_cascades_tasks_and_comments() {
    let ctx = TestContext::new().await.unwrap();

    let (_, project) = send(
        &ctx,
        "POST",
        "/v1/projects",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Doomed" })),
    )
    .await;
    let project_id: Uuid = project["id"].as_str().unwrap().parse().unwrap();

    let (_, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Doomed task", "project_id": project_id })),
    )
    .await;
    let task_id = task["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &ctx,
        "POST",
        &format!("/v1/tasks/{}/comments", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "content": "soon gone" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &ctx,
        "DELETE",
        &format!("/v1/projects/{}", project_id),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (tasks_left,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(tasks_left, 0);

    let (status, _) = send(
        &ctx,
        "GET",
        &format!("/v1/tasks/{}", task_id),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (comments_left,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM comments WHERE task_id = $1::uuid")
            .bind(&task_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(comments_left, 0);

    ctx.cleanup(&[]).await.unwrap();
}

#[tokio::test]
async fn test_task_delete_cascades_comments_but_keeps_notifications() {
    let ctx = TestContext::new().await.unwrap();
    let (bob, _) = ctx.create_user("bob").await.unwrap();

    let (_, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Ephemeral", "assignee_id": bob.id })),
    )
    .await;
    let task_id: Uuid = task["id"].as_str().unwrap().parse().unwrap();

    let (status, _) = send(
        &ctx,
        "POST",
        &format!("/v1/tasks/{}/comments", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "content": "for the record" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notification_count(&ctx, bob.id, "comment").await, 1);

    let (status, _) = send(
        &ctx,
        "DELETE",
        &format!("/v1/tasks/{}", task_id),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (comments_left,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM comments WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(comments_left, 0);

    // The notification survives with its task reference nulled
    let (task_ref,): (Option<Uuid>,) = sqlx::query_as(
        "SELECT task_id FROM notifications WHERE user_id = $1 AND kind = 'comment'",
    )
    .bind(bob.id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(task_ref, None);

    ctx.cleanup(&[bob.id]).await.unwrap();
}

#[tokio::test]
async fn test_notification_read_flow() {
    let ctx = TestContext::new().await.unwrap();
    let (bob, bob_token) = ctx.create_user("bob").await.unwrap();

    let (_, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Read me" })),
    )
    .await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Reassignment produces Bob's unread notification
    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/tasks/{}", task_id),
        Some(&ctx.jwt_token),
        Some(json!({ "assignee_id": bob.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, count) = send(
        &ctx,
        "GET",
        "/v1/notifications/unread-count",
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 1);

    let (_, notifications) = send(&ctx, "GET", "/v1/notifications", Some(&bob_token), None).await;
    let notification_id = notifications[0]["id"].as_str().unwrap().to_string();

    // Another user cannot mark it read
    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/notifications/{}/read", notification_id),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &ctx,
        "PUT",
        &format!("/v1/notifications/{}/read", notification_id),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, count) = send(
        &ctx,
        "GET",
        "/v1/notifications/unread-count",
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(count["count"], 0);

    ctx.cleanup(&[bob.id]).await.unwrap();
}

#[tokio::test]
async fn test_comment_edit_refreshes_updated_at() {
    let ctx = TestContext::new().await.unwrap();

    let (_, task) = send(
        &ctx,
        "POST",
        "/v1/tasks",
        Some(&ctx.jwt_token),
        Some(json!({ "title": "Editable" })),
    )
    .await;
    let task_id: Uuid = task["id"].as_str().unwrap().parse().unwrap();

    let comment = Comment::create(
        &ctx.db,
        CreateComment {
            content: "first draft".to_string(),
            task_id,
            user_id: ctx.user.id,
        },
    )
    .await
    .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let edited = Comment::update_content(&ctx.db, comment.id, "second draft")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(edited.content, "second draft");
    assert_eq!(edited.created_at, comment.created_at);
    assert!(edited.updated_at > comment.updated_at);

    ctx.cleanup(&[]).await.unwrap();
}
