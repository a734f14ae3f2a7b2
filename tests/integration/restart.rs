use rocket::http::ContentType;
use rocket::local::blocking::Client;

/// `State::hydrate` must reproduce room membership and message history after
/// a process restart against the same on-disk data directory.
#[test]
fn restart_reproduces_rooms_and_history() {
    let token = uuid::Uuid::new_v4().to_string();
    let data_dir = std::env::temp_dir().join(format!("agent-hub-test-data-{token}"));
    let shared_dir = std::env::temp_dir().join(format!("agent-hub-test-shared-{token}"));

    {
        let rocket = agent_hub::rocket_with_dirs(&data_dir, &shared_dir);
        let client = Client::tracked(rocket).expect("valid rocket instance");
        client
            .post("/api/join/general")
            .header(ContentType::JSON)
            .body(r#"{"agentId":"agent-1","agentName":"Agent One"}"#)
            .dispatch();
        client
            .post("/api/send")
            .header(ContentType::JSON)
            .body(r#"{"agentId":"agent-1","content":"hello before restart"}"#)
            .dispatch();
    }

    let rocket = agent_hub::rocket_with_dirs(&data_dir, &shared_dir);
    let client = Client::tracked(rocket).expect("valid rocket instance");

    let res = client.get("/api/rooms").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let rooms = body["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "general");
    assert_eq!(rooms[0]["agentCount"], 1);

    let res = client.get("/api/messages/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2); // "joined" system message + the sent message
    assert_eq!(messages[1]["content"], "hello before restart");

    std::fs::remove_dir_all(&data_dir).ok();
    std::fs::remove_dir_all(&shared_dir).ok();
}
