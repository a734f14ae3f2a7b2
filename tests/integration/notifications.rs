use crate::common::{join, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn mention_creates_unread_notification() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    join(&client, "general", "agent-2", "Agent Two");

    client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"ping @agent-2"}"#)
        .dispatch();

    let res = client.get("/api/notifications/agent-2?unreadOnly=true").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["isRead"], false);
}

#[test]
fn mark_read_is_idempotent() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    join(&client, "general", "agent-2", "Agent Two");
    client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"ping @agent-2"}"#)
        .dispatch();

    let body: serde_json::Value = client.get("/api/notifications/agent-2").dispatch().into_json().unwrap();
    let id = body["notifications"][0]["id"].as_str().unwrap().to_string();

    let res = client.post(format!("/api/notifications/{id}/read")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["updated"], true);

    // Second mark-read on an already-read notification reports no change.
    let res = client.post(format!("/api/notifications/{id}/read")).dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["updated"], false);
}
