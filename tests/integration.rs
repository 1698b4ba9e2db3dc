//! End-to-end tests: the real `HttpTaskClient` against a minimal in-process
//! HTTP task server.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{Value, json};
use tempfile::TempDir;

use taskdeck::api::{ApiError, HttpTaskClient, TaskService};
use taskdeck::types::{PendingUpload, TaskDraft, TaskStatus};

#[derive(Debug, Clone)]
struct RecordedRequest {
    method: String,
    path: String,
    body_len: usize,
}

#[derive(Debug, Default)]
struct ServerBehavior {
    /// Uploads for this task id answer HTTP 500.
    fail_uploads_for_task: Option<i64>,
    /// Creates with this title answer HTTP 422 with a detail body.
    reject_title: Option<String>,
}

struct MockTaskServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTaskServer {
    fn start(tasks: Vec<Value>, behavior: ServerBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind mock server");
        let addr = listener.local_addr().expect("mock server should have an address");
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();

        let handler_requests = Arc::clone(&requests);
        let state = Arc::new(ServerState {
            tasks: Mutex::new(tasks),
            behavior,
            next_id: AtomicI64::new(1000),
        });
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    break;
                };
                let requests = Arc::clone(&handler_requests);
                let state = Arc::clone(&state);
                thread::spawn(move || handle_connection(stream, requests, state));
            }
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            requests,
        }
    }

    fn client(&self) -> HttpTaskClient {
        HttpTaskClient::new(&self.base_url)
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("request log mutex should not be poisoned")
            .clone()
    }

    fn request_count(&self) -> usize {
        self.requests().len()
    }
}

struct ServerState {
    tasks: Mutex<Vec<Value>>,
    behavior: ServerBehavior,
    next_id: AtomicI64,
}

fn handle_connection(
    mut stream: TcpStream,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    state: Arc<ServerState>,
) {
    let Some((method, path, body)) = read_request(&mut stream) else {
        return;
    };

    requests
        .lock()
        .expect("request log mutex should not be poisoned")
        .push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            body_len: body.len(),
        });

    let (status, response_body) = route(&method, &path, &body, &state);
    let payload = response_body.to_string();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = stream.write_all(response.as_bytes());
}

fn read_request(stream: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end;
    loop {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..read]);
        if let Some(pos) = find_header_end(&buffer) {
            header_end = pos;
            break;
        }
    }

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect();
    let content_length: usize = headers
        .get("content-length")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
    }
    Some((method, path, body))
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn route(method: &str, path: &str, body: &[u8], state: &ServerState) -> (&'static str, Value) {
    let relative = path.strip_prefix("/api/v1").unwrap_or(path);
    let (route_path, query) = match relative.split_once('?') {
        Some((route_path, query)) => (route_path, query),
        None => (relative, ""),
    };

    match (method, route_path) {
        ("GET", "/tasks/") => {
            let status = query_param(query, "status").unwrap_or_default();
            let title = query_param(query, "title").unwrap_or_default();
            let tasks = state
                .tasks
                .lock()
                .expect("task store mutex should not be poisoned");
            let matching: Vec<Value> = tasks
                .iter()
                .filter(|task| task["status"] == Value::String(status.clone()))
                .filter(|task| {
                    title.is_empty()
                        || task["title"]
                            .as_str()
                            .is_some_and(|value| value.contains(&title))
                })
                .cloned()
                .collect();
            ("200 OK", Value::Array(matching))
        }
        ("POST", "/tasks/") => {
            let draft: Value = match serde_json::from_slice(body) {
                Ok(draft) => draft,
                Err(_) => return ("400 Bad Request", json!({"detail": "malformed body"})),
            };
            if let Some(rejected) = state.behavior.reject_title.as_deref()
                && draft["title"].as_str() == Some(rejected)
            {
                return ("422 Unprocessable Entity", json!({"detail": "title rejected"}));
            }
            let id = state.next_id.fetch_add(1, Ordering::SeqCst);
            let task = json!({
                "id": id,
                "title": draft["title"],
                "description": draft["description"],
                "project": draft["project"],
                "organisation": draft["organisation"],
                "status": "new",
                "created_at": "2026-08-05T12:00:00Z",
                "updated_at": "2026-08-05T12:00:00Z",
                "files": []
            });
            state
                .tasks
                .lock()
                .expect("task store mutex should not be poisoned")
                .push(task.clone());
            ("200 OK", task)
        }
        ("GET", _) if route_path.starts_with("/tasks/") => {
            let raw_id = route_path.trim_start_matches("/tasks/").trim_end_matches('/');
            let Ok(id) = raw_id.parse::<i64>() else {
                return ("400 Bad Request", json!({"detail": "bad id"}));
            };
            let tasks = state
                .tasks
                .lock()
                .expect("task store mutex should not be poisoned");
            match tasks.iter().find(|task| task["id"] == json!(id)) {
                Some(task) => ("200 OK", task.clone()),
                None => ("404 Not Found", json!({"detail": "Task not found"})),
            }
        }
        ("POST", _) if route_path.starts_with("/tasks/") && route_path.ends_with("/files/") => {
            let raw_id = route_path
                .trim_start_matches("/tasks/")
                .trim_end_matches("/files/");
            let Ok(id) = raw_id.parse::<i64>() else {
                return ("400 Bad Request", json!({"detail": "bad id"}));
            };
            if state.behavior.fail_uploads_for_task == Some(id) {
                return ("500 Internal Server Error", json!({"detail": "storage unavailable"}));
            }
            let attachment_id = state.next_id.fetch_add(1, Ordering::SeqCst);
            (
                "200 OK",
                json!({
                    "id": attachment_id,
                    "filename": format!("upload-{attachment_id}"),
                    "mimetype": "application/octet-stream",
                    "size": body.len()
                }),
            )
        }
        _ => ("404 Not Found", json!({"detail": "no such route"})),
    }
}

fn query_param(query: &str, key: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == key).then(|| value.to_string())
    })
}

fn seed_task(id: i64, title: &str, status: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("description of {title}"),
        "project": "HD",
        "organisation": "Clinic 17",
        "status": status,
        "created_at": "2026-08-01T08:00:00Z",
        "updated_at": updated_at,
        "files": []
    })
}

fn write_temp_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("failed to write temp file");
    path
}

#[tokio::test]
async fn open_union_is_sorted_and_stable() {
    let server = MockTaskServer::start(
        vec![
            seed_task(1, "alpha", "new", "2026-08-01T10:00:00Z"),
            seed_task(2, "beta", "new", "2026-08-01T10:00:00Z"),
            seed_task(3, "gamma", "in_progress", "2026-08-01T11:00:00Z"),
            seed_task(4, "delta", "in_progress", "2026-08-01T10:00:00Z"),
            seed_task(5, "closed", "done", "2026-08-01T12:00:00Z"),
        ],
        ServerBehavior::default(),
    );
    let client = server.client();

    let tasks = client.list_open("").await.expect("open list should load");

    let ids: Vec<i64> = tasks.iter().map(|task| task.id).collect();
    // newest first; the 10:00 tie keeps new-before-in_progress fetch order
    assert_eq!(ids, vec![3, 1, 2, 4]);
    assert!(tasks.iter().all(|task| task.status.is_open()));

    // the union issued exactly two list requests, one per status
    let list_requests: Vec<String> = server
        .requests()
        .iter()
        .filter(|request| request.method == "GET")
        .map(|request| request.path.clone())
        .collect();
    assert_eq!(list_requests.len(), 2);
    assert!(list_requests.iter().any(|path| path.contains("status=new")));
    assert!(
        list_requests
            .iter()
            .any(|path| path.contains("status=in_progress"))
    );
}

#[tokio::test]
async fn closed_list_returns_empty_without_error() {
    let server = MockTaskServer::start(Vec::new(), ServerBehavior::default());
    let client = server.client();

    let tasks = client
        .list_closed("")
        .await
        .expect("empty closed list is a valid outcome");
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn search_text_is_trimmed_and_percent_encoded() {
    let server = MockTaskServer::start(Vec::new(), ServerBehavior::default());
    let client = server.client();

    client
        .list_by_status(TaskStatus::Done, "  printer jam ")
        .await
        .expect("list with search should load");

    let paths: Vec<String> = server.requests().iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].contains("status=done"));
    assert!(paths[0].contains("title=printer%20jam"));
}

#[tokio::test]
async fn get_task_maps_404_to_not_found() {
    let server = MockTaskServer::start(Vec::new(), ServerBehavior::default());
    let client = server.client();

    let error = client
        .get_task(999)
        .await
        .expect_err("missing task must fail");
    assert!(matches!(error, ApiError::NotFound(999)));
}

#[tokio::test]
async fn get_task_derives_attachment_urls() {
    let mut task = seed_task(10, "with files", "new", "2026-08-01T10:00:00Z");
    task["files"] = json!([
        {"id": 77, "filename": "shot.png", "mimetype": "image/png", "size": 2048}
    ]);
    let server = MockTaskServer::start(vec![task], ServerBehavior::default());
    let client = server.client();

    let task = client.get_task(10).await.expect("task should load");
    assert_eq!(task.files.len(), 1);
    assert_eq!(
        task.files[0].url,
        format!("{}/tasks/files/77", server.base_url)
    );
}

#[tokio::test]
async fn upload_with_no_files_issues_no_request() {
    let server = MockTaskServer::start(Vec::new(), ServerBehavior::default());
    let client = server.client();

    let uploaded = client
        .upload_attachments(1, &[])
        .await
        .expect("empty upload should succeed");

    assert!(uploaded.is_empty());
    assert_eq!(server.request_count(), 0);
}

#[tokio::test]
async fn create_then_upload_commits_every_staged_file() {
    let server = MockTaskServer::start(Vec::new(), ServerBehavior::default());
    let client = server.client();
    let dir = TempDir::new().expect("failed to create temp dir");
    let first = write_temp_file(&dir, "jam-photo.png", b"not really a png");
    let second = write_temp_file(&dir, "printer-log.txt", b"paper jam at tray 2");

    let draft = TaskDraft {
        title: "Printer jam".to_string(),
        description: "Tray 2 keeps jamming".to_string(),
        project: "HD".to_string(),
        organisation: "Clinic 17".to_string(),
    };
    let task = client.create_task(&draft).await.expect("create should succeed");
    assert_eq!(task.title, "Printer jam");
    assert_eq!(task.status, TaskStatus::New);

    let files = vec![
        PendingUpload::from_path(&first).expect("first file should stat"),
        PendingUpload::from_path(&second).expect("second file should stat"),
    ];
    let uploaded = client
        .upload_attachments(task.id, &files)
        .await
        .expect("upload should succeed");

    assert_eq!(uploaded.len(), 2);
    assert!(uploaded.iter().all(|a| a.url.contains("/tasks/files/")));

    // one create plus one request per file
    let posts: Vec<RecordedRequest> = server
        .requests()
        .into_iter()
        .filter(|request| request.method == "POST")
        .collect();
    assert_eq!(posts.len(), 3);
    // multipart bodies actually carried the file bytes
    assert!(posts[1].body_len > b"not really a png".len());
}

#[tokio::test]
async fn upload_failure_is_all_or_nothing_and_stops_early() {
    let server = MockTaskServer::start(
        Vec::new(),
        ServerBehavior {
            fail_uploads_for_task: Some(500),
            ..ServerBehavior::default()
        },
    );
    let client = server.client();
    let dir = TempDir::new().expect("failed to create temp dir");
    let first = write_temp_file(&dir, "a.txt", b"aaa");
    let second = write_temp_file(&dir, "b.txt", b"bbb");

    let files = vec![
        PendingUpload::from_path(&first).expect("first file should stat"),
        PendingUpload::from_path(&second).expect("second file should stat"),
    ];
    let error = client
        .upload_attachments(500, &files)
        .await
        .expect_err("upload against failing task must fail");

    assert!(matches!(error, ApiError::Request { status: 500, .. }));
    // sequential commit stops at the first failure
    assert_eq!(server.request_count(), 1);
}

#[tokio::test]
async fn create_surfaces_server_error_detail() {
    let server = MockTaskServer::start(
        Vec::new(),
        ServerBehavior {
            reject_title: Some("boom".to_string()),
            ..ServerBehavior::default()
        },
    );
    let client = server.client();

    let draft = TaskDraft {
        title: "boom".to_string(),
        description: "d".to_string(),
        project: "HD".to_string(),
        organisation: "Clinic 17".to_string(),
    };
    let error = client
        .create_task(&draft)
        .await
        .expect_err("rejected create must fail");

    match error {
        ApiError::Request { status, detail } => {
            assert_eq!(status, 422);
            assert!(detail.contains("title rejected"));
        }
        other => panic!("expected Request error, got {other:?}"),
    }
}
