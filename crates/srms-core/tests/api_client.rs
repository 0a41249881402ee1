//! HTTP client against a minimal in-process server.
//!
//! Each test binds a throwaway listener that answers a fixed sequence of
//! canned responses and records the requests it saw.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use srms_core::{ApiClient, Grade, RemoteStore, StudentInput};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct Canned {
    status: &'static str,
    body: String,
}

fn canned(status: &'static str, body: &str) -> Canned {
    Canned {
        status,
        body: body.to_string(),
    }
}

/// Read one HTTP/1.1 request (head plus Content-Length body).
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Serve `responses` in order, one per connection. Returns the base URL and
/// the captured requests.
async fn serve(responses: Vec<Canned>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            log.lock().unwrap().push(request);

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response.status,
                response.body.len(),
                response.body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
    });

    (format!("http://{}/api", addr), seen)
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn create_posts_record_json() {
    let (url, seen) = serve(vec![canned("201 Created", "{}")]).await;
    let record = srms_core::compute_result(
        srms_core::validate(&StudentInput::new(12, "Omar", [70, 80, 90])).unwrap(),
    );

    assert!(client(&url).create(&record).await);

    let requests = seen.lock().unwrap();
    let request = &requests[0];
    assert!(request.starts_with("POST /api/students "));
    assert!(request.contains("\"rollNo\":12"));
    assert!(request.contains("\"grade\":\"A\""));
}

#[tokio::test]
async fn create_reports_conflict_as_false() {
    let (url, _) = serve(vec![canned("409 Conflict", r#"{"error":"exists"}"#)]).await;
    let record = srms_core::compute_result(
        srms_core::validate(&StudentInput::new(1, "Pia", [1, 2, 3])).unwrap(),
    );
    assert!(!client(&url).create(&record).await);
}

#[tokio::test]
async fn fetch_by_id_parses_and_rederives() {
    let body = r#"{"rollNo":3,"name":"Quin","subject1":100,"subject2":100,"subject3":50,"total":250,"percentage":83.333336,"grade":"A"}"#;
    let (url, seen) = serve(vec![canned("200 OK", body)]).await;

    let record = client(&url).fetch_by_id(3).await.unwrap();
    assert_eq!(record.name, "Quin");
    assert_eq!(record.percentage, 83.33);
    assert_eq!(record.grade, Grade::A);
    assert!(seen.lock().unwrap()[0].starts_with("GET /api/students/3 "));
}

#[tokio::test]
async fn fetch_by_id_not_found_is_none() {
    let (url, _) = serve(vec![canned("404 Not Found", r#"{"error":"Student not found"}"#)]).await;
    assert!(client(&url).fetch_by_id(404).await.is_none());
}

#[tokio::test]
async fn fetch_all_skips_invalid_and_duplicate_entries() {
    let body = r#"[
        {"rollNo":1,"name":"Rae","subject1":90,"subject2":90,"subject3":90},
        {"rollNo":2,"name":"Sol","subject1":150,"subject2":0,"subject3":0},
        {"rollNo":1,"name":"Rae Again","subject1":10,"subject2":10,"subject3":10},
        {"rollNo":4,"name":"Tam","subject1":30,"subject2":40,"subject3":50}
    ]"#;
    let (url, _) = serve(vec![canned("200 OK", body)]).await;

    let roster = client(&url).fetch_all().await.unwrap();
    let rolls: Vec<u32> = roster.iter().map(|r| r.roll_no).collect();
    assert_eq!(rolls, vec![1, 4]);
    assert_eq!(roster.find(1).unwrap().name, "Rae");
}

#[tokio::test]
async fn fetch_all_keeps_valid_entries_beside_malformed_ones() {
    let body = r#"[
        {"rollNo":1,"name":"Ula","subject1":80,"subject2":80,"subject3":80,"dateAdded":"2024-03-01"},
        {"rollNo":2,"name":"Val","subject1":60,"subject2":60,"subject3":60,"dateAdded":"3/1/2024"},
        {"rollNo":3,"name":"Wes","subject1":55.5,"subject2":60,"subject3":60},
        {"rollNo":"four","name":"Xan","subject1":60,"subject2":60,"subject3":60},
        "not a student"
    ]"#;
    let (url, _) = serve(vec![canned("200 OK", body)]).await;

    let roster = client(&url).fetch_all().await.unwrap();
    let rolls: Vec<u32> = roster.iter().map(|r| r.roll_no).collect();
    assert_eq!(rolls, vec![1, 2]);
    assert!(roster.find(1).unwrap().date_added.is_some());
    assert_eq!(roster.find(2).unwrap().date_added, None);
    assert_eq!(roster.find(2).unwrap().grade, Grade::B);
}

#[tokio::test]
async fn fetch_all_garbage_body_is_none() {
    let (url, _) = serve(vec![canned("200 OK", "<html>oops</html>")]).await;
    assert!(client(&url).fetch_all().await.is_none());
}

#[tokio::test]
async fn server_error_is_none() {
    let (url, _) = serve(vec![canned("500 Internal Server Error", "{}")]).await;
    assert!(client(&url).fetch_all().await.is_none());
}

#[tokio::test]
async fn rate_limited_request_is_retried() {
    let (url, seen) = serve(vec![
        canned("429 Too Many Requests", "{}"),
        canned("200 OK", "[]"),
    ])
    .await;

    let roster = client(&url).fetch_all().await.unwrap();
    assert!(roster.is_empty());
    assert_eq!(seen.lock().unwrap().len(), 2);
}
