use rocket::local::blocking::Client;

/// Wrapper around Client that cleans up its temp data/shared directories on drop.
pub struct TestClient {
    client: Option<Client>,
    data_dir: std::path::PathBuf,
    shared_dir: std::path::PathBuf,
}

impl Drop for TestClient {
    fn drop(&mut self) {
        drop(self.client.take());
        std::fs::remove_dir_all(&self.data_dir).ok();
        std::fs::remove_dir_all(&self.shared_dir).ok();
    }
}

impl std::ops::Deref for TestClient {
    type Target = Client;
    fn deref(&self) -> &Client {
        self.client.as_ref().unwrap()
    }
}

pub fn test_client() -> TestClient {
    let token = uuid::Uuid::new_v4().to_string();
    let data_dir = std::env::temp_dir().join(format!("agent-hub-test-data-{token}"));
    let shared_dir = std::env::temp_dir().join(format!("agent-hub-test-shared-{token}"));

    let rocket = agent_hub::rocket_with_dirs(&data_dir, &shared_dir);
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestClient { client: Some(client), data_dir, shared_dir }
}

/// Joins `agent_id` into `room` and returns the parsed RoomSnapshot response body.
pub fn join(client: &Client, room: &str, agent_id: &str, agent_name: &str) -> serde_json::Value {
    use rocket::http::ContentType;
    let res = client
        .post(format!("/api/join/{room}"))
        .header(ContentType::JSON)
        .body(format!(r#"{{"agentId":"{agent_id}","agentName":"{agent_name}"}}"#))
        .dispatch();
    res.into_json().unwrap()
}
