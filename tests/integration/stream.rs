use crate::common::{join, test_client};
use rocket::http::Status;

#[test]
fn push_registry_tracks_connection_lifecycle() {
    use agent_hub::routes::PushRegistry;

    let registry = PushRegistry::default();
    assert!(!registry.is_connected("agent-1"));

    registry.register("session-1", "agent-1", "general");
    assert!(registry.is_connected("agent-1"));
    assert!(!registry.is_connected("agent-2"));

    registry.unregister("session-1");
    assert!(!registry.is_connected("agent-1"));
}

#[test]
fn push_registry_mark_connected_fills_in_agents() {
    use agent_hub::models::{Agent, AgentStatus};
    use agent_hub::routes::PushRegistry;

    let registry = PushRegistry::default();
    registry.register("session-1", "agent-1", "general");

    let mut agents = vec![
        Agent {
            id: "agent-1".into(),
            name: "Agent One".into(),
            room: Some("general".into()),
            capabilities: serde_json::json!({}),
            joined_at: "t".into(),
            last_active: "t".into(),
            status: AgentStatus::Online,
            connected: false,
        },
        Agent {
            id: "agent-2".into(),
            name: "Agent Two".into(),
            room: Some("general".into()),
            capabilities: serde_json::json!({}),
            joined_at: "t".into(),
            last_active: "t".into(),
            status: AgentStatus::Online,
            connected: false,
        },
    ];

    registry.mark_connected(&mut agents);
    assert!(agents[0].connected);
    assert!(!agents[1].connected);
}

#[test]
fn connecting_to_the_stream_marks_the_agent_connected() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client.get("/api/agents/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["agents"][0]["connected"], false);

    let stream = client.get("/api/stream?agentId=agent-1&room=general").dispatch();
    assert_eq!(stream.status(), Status::Ok);

    let res = client.get("/api/agents/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["agents"][0]["connected"], true);

    drop(stream);

    let res = client.get("/api/agents/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["agents"][0]["connected"], false);
}
