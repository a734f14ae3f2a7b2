use crate::common::{join, test_client};
use rocket::http::ContentType;
use std::time::Duration;

/// Writing under the shared directory must eventually surface as a
/// persisted `file_change` message in every active room, per the watcher's
/// fan-out policy and the resolved Open Question that these are persisted
/// rather than push-only.
#[test]
fn file_write_produces_persisted_file_change_message() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client
        .put("/api/fs/file/notes.txt")
        .header(ContentType::Plain)
        .body("hello from the watcher test")
        .dispatch();
    assert_eq!(res.status(), rocket::http::Status::Ok);

    let mut found = false;
    for _ in 0..50 {
        let res = client.get("/api/messages/general").dispatch();
        let body: serde_json::Value = res.into_json().unwrap();
        let messages = body["messages"].as_array().unwrap();
        if messages.iter().any(|m| m["type"] == "file_change" && m["content"].as_str().unwrap_or("").contains("notes.txt")) {
            found = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(found, "expected a file_change message for notes.txt within the timeout");
}
