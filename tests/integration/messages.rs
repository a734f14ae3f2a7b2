use crate::common::{join, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn send_and_read_back_message() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"hello room"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["mentions"].as_array().unwrap().is_empty());

    let res = client.get("/api/messages/general").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "hello room");
    assert_eq!(messages[0]["agentId"], "agent-1");
}

#[test]
fn send_rejects_empty_content() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"  "}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn send_parses_mentions() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    join(&client, "general", "agent-2", "Agent Two");

    let res = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"hey @agent-2 check this"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let mentions = body["mentions"].as_array().unwrap();
    assert_eq!(mentions, &vec![serde_json::json!("agent-2")]);

    let res = client.get("/api/notifications/agent-2").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["notifications"].as_array().unwrap().len(), 1);
}

#[test]
fn messages_limit_caps_result_size() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    for i in 0..5 {
        client
            .post("/api/send")
            .header(ContentType::JSON)
            .body(format!(r#"{{"agentId":"agent-1","content":"msg {i}"}}"#))
            .dispatch();
    }

    let res = client.get("/api/messages/general?limit=2").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[test]
fn messages_returned_in_chronological_order() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    for i in 1..=3 {
        client
            .post("/api/send")
            .header(ContentType::JSON)
            .body(format!(r#"{{"agentId":"agent-1","content":"msg {i}"}}"#))
            .dispatch();
    }

    let res = client.get("/api/messages/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0]["content"], "msg 1");
    assert_eq!(messages[2]["content"], "msg 3");
}

#[test]
fn since_in_the_future_returns_empty() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"hello"}"#)
        .dispatch();

    let future = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
    let res = client.get(format!("/api/messages/general?since={future}")).dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[test]
fn broadcast_prefixes_sender() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client
        .post("/api/broadcast/general")
        .header(ContentType::JSON)
        .body(r#"{"content":"system going down","from":"Ops"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/messages/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["content"], "[Ops] system going down");
    assert_eq!(messages[0]["type"], "broadcast");
}
