use crate::common::{join, test_client};
use rocket::http::Status;

#[test]
fn health_reports_ok() {
    let client = test_client();
    let res = client.get("/api/health").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["status"], "ok");
}

#[test]
fn stats_reflects_rooms_and_agents() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");
    join(&client, "general", "agent-2", "Agent Two");

    let res = client.get("/api/stats").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["totalRooms"], 1);
    assert_eq!(body["totalAgents"], 2);
    let rooms = body["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["name"], "general");
    assert_eq!(rooms[0]["agentCount"], 2);
}
