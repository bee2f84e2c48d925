//! REST client against a scripted in-process HTTP server.
//!
//! Oracle Pattern: each test queues canned responses, the server answers
//! requests in order and records what it received. Assertions cover both the
//! decoded result and the request the client actually sent.

use std::time::Duration;

use huddle_client::{ApiClient, ApiError, ClientConfig, Credential};
use chrono::NaiveDate;
use huddle_proto::{
    Content, NewTask, NotificationKind, Priority, Role, SignupRequest, TaskStatus, TaskUpdate,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
};

/// What the server saw for one request.
#[derive(Debug)]
struct Recorded {
    head: String,
    body: Vec<u8>,
}

impl Recorded {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim().to_owned())
        })
    }
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending a full request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut recorded = Recorded { head, body: buf[head_end..].to_vec() };

    if let Some(length) = recorded.header("content-length") {
        let length: usize = length.parse().unwrap();
        while recorded.body.len() < length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0);
            recorded.body.extend_from_slice(&chunk[..n]);
        }
    } else if recorded.header("transfer-encoding").is_some() {
        while !recorded.body.ends_with(b"0\r\n\r\n") {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0);
            recorded.body.extend_from_slice(&chunk[..n]);
        }
    }
    recorded
}

/// Serve `responses` in order, one per connection.
async fn spawn_server(
    responses: Vec<(u16, &'static str)>,
) -> (ClientConfig, mpsc::UnboundedReceiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let recorded = read_request(&mut stream).await;
            tx.send(recorded).unwrap();

            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
    });

    let config = ClientConfig::new(&format!("http://{addr}"))
        .unwrap()
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    (config, rx)
}

fn client(config: ClientConfig) -> ApiClient {
    ApiClient::new(config, Credential::new("tok-123")).unwrap()
}

#[tokio::test]
async fn me_sends_bearer_and_decodes_identity() {
    let (config, mut seen) = spawn_server(vec![(200, r#"{"user_id": 4, "role": "admin"}"#)]).await;

    let identity = client(config).me().await.unwrap();
    assert_eq!(identity.user_id, 4);
    assert_eq!(identity.role, Role::Admin);

    let request = seen.recv().await.unwrap();
    assert_eq!(request.request_line(), "GET /auth/me HTTP/1.1");
    assert_eq!(request.header("authorization").as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn rejected_session_is_unauthorized() {
    let (config, _seen) = spawn_server(vec![
        (401, r#"{"detail": "Invalid token"}"#),
        (403, r#"{"detail": "Not authenticated"}"#),
    ])
    .await;
    let api = client(config);

    assert!(matches!(api.me().await, Err(ApiError::Unauthorized)));
    assert!(matches!(api.me().await, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn history_preserves_server_order() {
    let body = r#"[
        {"sender_id": 1, "sender": "Ada", "time": "2024-01-01T10:00:00", "type": "text", "message": "first"},
        {"sender_id": 2, "time": "2024-01-01T09:00:00", "type": "file",
         "file_url": "/uploads/x.png", "file_name": "x.png", "file_type": "image/png"}
    ]"#;
    let (config, mut seen) = spawn_server(vec![(200, body)]).await;

    let messages = client(config).history(9).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, Content::text("first"));
    assert_eq!(messages[1].sender_name(), "Unknown");
    assert!(matches!(&messages[1].content, Content::File(f) if f.is_image()));

    assert_eq!(seen.recv().await.unwrap().request_line(), "GET /chat/9 HTTP/1.1");
}

#[tokio::test]
async fn malformed_history_is_a_protocol_error() {
    let (config, _seen) = spawn_server(vec![(200, r#"{"oops": true}"#)]).await;
    let err = client(config).history(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Protocol(_)));
}

#[tokio::test]
async fn error_detail_is_preserved() {
    let (config, _seen) =
        spawn_server(vec![(403, r#"{"detail": "Only admin can create groups"}"#)]).await;

    let err = client(config).create_group("ops", &[2, 3]).await.unwrap_err();
    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 403);
            assert_eq!(detail, "Only admin can create groups");
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn create_group_posts_name_and_members() {
    let (config, mut seen) =
        spawn_server(vec![(200, r#"{"id": 5, "name": "ops", "created_by": 1}"#)]).await;

    let group = client(config).create_group("ops", &[2, 3]).await.unwrap();
    assert_eq!(group.id, 5);

    let request = seen.recv().await.unwrap();
    assert_eq!(request.request_line(), "POST /groups/ HTTP/1.1");
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "ops", "members": [2, 3]}));
}

#[tokio::test]
async fn upload_sends_multipart_file_part() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.png");
    std::fs::write(&path, b"\x89PNG fake").unwrap();

    let (config, mut seen) = spawn_server(vec![(
        200,
        r#"{"file_url": "/uploads/abc.png", "file_name": "cat.png", "file_type": "image/png"}"#,
    )])
    .await;

    let stored = client(config).upload(&path).await.unwrap();
    assert_eq!(stored.file_url, "/uploads/abc.png");
    assert!(stored.is_image());

    let request = seen.recv().await.unwrap();
    assert_eq!(request.request_line(), "POST /chat/upload HTTP/1.1");
    assert!(request.header("content-type").unwrap().starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&request.body);
    assert!(body.contains(r#"name="file"; filename="cat.png""#));
    assert!(body.contains("Content-Type: image/png"));
}

#[tokio::test]
async fn missing_upload_file_fails_before_any_request() {
    let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
    let err = client(config).upload(std::path::Path::new("/definitely/not/here.txt")).await;
    assert!(matches!(err, Err(ApiError::File { .. })));
}

#[tokio::test]
async fn login_is_unauthenticated_and_returns_token() {
    let (config, mut seen) =
        spawn_server(vec![(200, r#"{"access_token": "new-token", "role": "user"}"#)]).await;

    let response = ApiClient::login(&config, "a@b.c", "pw").await.unwrap();
    assert_eq!(response.access_token, "new-token");
    assert_eq!(response.role, Role::User);

    let request = seen.recv().await.unwrap();
    assert_eq!(request.request_line(), "POST /auth/login HTTP/1.1");
    assert!(request.header("authorization").is_none());
}

#[tokio::test]
async fn bad_login_surfaces_detail() {
    let (config, _seen) =
        spawn_server(vec![(400, r#"{"detail": "Invalid email or password"}"#)]).await;

    let err = ApiClient::login(&config, "a@b.c", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "server returned 400: Invalid email or password");
}

#[tokio::test]
async fn delete_group_targets_group_path() {
    let (config, mut seen) = spawn_server(vec![(200, r#"{"message": "Group deleted"}"#)]).await;

    client(config).delete_group(12).await.unwrap();
    assert_eq!(seen.recv().await.unwrap().request_line(), "DELETE /groups/12 HTTP/1.1");
}

#[tokio::test]
async fn signup_is_unauthenticated() {
    let (config, mut seen) =
        spawn_server(vec![(200, r#"{"message": "User created", "role": "admin"}"#)]).await;

    let request = SignupRequest {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        password: "pw".into(),
        role: Role::Admin,
    };
    let created = ApiClient::signup(&config, &request).await.unwrap();
    assert_eq!(created.role, Role::Admin);

    let recorded = seen.recv().await.unwrap();
    assert_eq!(recorded.request_line(), "POST /auth/signup HTTP/1.1");
    assert!(recorded.header("authorization").is_none());
    let body: serde_json::Value = serde_json::from_slice(&recorded.body).unwrap();
    assert_eq!(body["role"], "admin");
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn create_task_posts_full_record() {
    let (config, mut seen) = spawn_server(vec![(
        200,
        r#"{"id": 8, "title": "Ship", "description": "", "priority": "high", "category": "general",
            "due_date": "2024-06-30", "status": "pending", "assigned_to": 1, "created_by": 1}"#,
    )])
    .await;

    let mut task = NewTask::titled("Ship");
    task.due_date = NaiveDate::from_ymd_opt(2024, 6, 30);
    let created = client(config).create_task(&task).await.unwrap();
    assert_eq!(created.id, 8);
    assert_eq!(created.priority, Priority::High);

    let request = seen.recv().await.unwrap();
    assert_eq!(request.request_line(), "POST /tasks/ HTTP/1.1");
    assert_eq!(request.header("authorization").as_deref(), Some("Bearer tok-123"));
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "title": "Ship",
            "description": "",
            "priority": "low",
            "category": "general",
            "due_date": "2024-06-30",
            "status": "pending"
        })
    );
}

#[tokio::test]
async fn update_task_puts_only_changed_fields() {
    let (config, mut seen) = spawn_server(vec![(200, r#"{"message": "updated"}"#)]).await;

    let update = TaskUpdate { status: Some(TaskStatus::Completed), ..TaskUpdate::default() };
    client(config).update_task(3, &update).await.unwrap();

    let request = seen.recv().await.unwrap();
    assert_eq!(request.request_line(), "PUT /tasks/3 HTTP/1.1");
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body, serde_json::json!({"status": "completed"}));
}

#[tokio::test]
async fn task_permission_denied_keeps_detail() {
    let (config, _seen) = spawn_server(vec![
        (403, r#"{"detail": "Permission denied"}"#),
        (404, r#"{"detail": "Task not found"}"#),
    ])
    .await;
    let api = client(config);

    let err = api.delete_task(3).await.unwrap_err();
    assert_eq!(err.to_string(), "server returned 403: Permission denied");
    let err = api.update_task(99, &TaskUpdate { title: Some("x".into()), ..TaskUpdate::default() }).await;
    assert!(matches!(err, Err(ApiError::Status { status: 404, .. })));
}

#[tokio::test]
async fn tasks_notifications_and_activity_decode() {
    let (config, mut seen) = spawn_server(vec![
        (200, r#"[{"id": 1, "title": "a", "priority": "low", "status": "pending", "due_date": null}]"#),
        (
            200,
            r#"[{"type": "due_tomorrow", "title": "a", "priority": "medium", "status": "pending", "due_date": "2024-01-02"}]"#,
        ),
        (
            200,
            r#"[{"id": 1, "task_id": 1, "user_id": 2, "message": "Task created: a", "timestamp": "2024-01-01T10:00:00.5"}]"#,
        ),
    ])
    .await;
    let api = client(config);

    let tasks = api.tasks().await.unwrap();
    assert_eq!(tasks[0].due_date, None);
    let notes = api.notifications().await.unwrap();
    assert_eq!(notes[0].kind, NotificationKind::DueTomorrow);
    let activity = api.activity(1).await.unwrap();
    assert_eq!(activity[0].message, "Task created: a");

    let lines: Vec<String> = [
        seen.recv().await.unwrap(),
        seen.recv().await.unwrap(),
        seen.recv().await.unwrap(),
    ]
    .iter()
    .map(|r| r.request_line().to_owned())
    .collect();
    assert_eq!(lines, [
        "GET /tasks/ HTTP/1.1",
        "GET /notifications/ HTTP/1.1",
        "GET /activity/1 HTTP/1.1"
    ]);
}
