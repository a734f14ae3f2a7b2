use crate::common::test_client;
use rocket::http::{ContentType, Status};

#[test]
fn store_and_fetch_memory() {
    let client = test_client();
    let res = client
        .post("/api/memory/agent-1")
        .header(ContentType::JSON)
        .body(r#"{"key":"preference","value":"dark-mode"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/memory/agent-1").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    let memories = body["memories"].as_array().unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0]["key"], "preference");
    assert_eq!(memories[0]["type"], "note");
}

#[test]
fn store_memory_rejects_empty_key() {
    let client = test_client();
    let res = client
        .post("/api/memory/agent-1")
        .header(ContentType::JSON)
        .body(r#"{"key":"","value":"x"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn expired_memory_is_excluded_from_listing() {
    let client = test_client();
    client
        .post("/api/memory/agent-1")
        .header(ContentType::JSON)
        .body(r#"{"key":"ephemeral","value":"gone soon","expiresIn":-1}"#)
        .dispatch();

    let res = client.get("/api/memory/agent-1").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert!(body["memories"].as_array().unwrap().is_empty());
}

#[test]
fn memory_key_filter_narrows_results() {
    let client = test_client();
    client
        .post("/api/memory/agent-1")
        .header(ContentType::JSON)
        .body(r#"{"key":"a","value":"1"}"#)
        .dispatch();
    client
        .post("/api/memory/agent-1")
        .header(ContentType::JSON)
        .body(r#"{"key":"b","value":"2"}"#)
        .dispatch();

    let res = client.get("/api/memory/agent-1?key=a").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let memories = body["memories"].as_array().unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0]["key"], "a");
}
