use crate::common::join;
use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;

fn test_client_with_limits(messages_max: usize) -> Client {
    let config = agent_hub::rate_limit::RateLimitConfig {
        messages_max,
        ..agent_hub::rate_limit::RateLimitConfig::default()
    };
    let token = uuid::Uuid::new_v4().to_string();
    let data_dir = std::env::temp_dir().join(format!("agent-hub-test-data-{token}"));
    let shared_dir = std::env::temp_dir().join(format!("agent-hub-test-shared-{token}"));
    let rocket = agent_hub::rocket_with_dirs_and_limits(&data_dir, &shared_dir, config);
    Client::tracked(rocket).expect("valid rocket instance")
}

#[test]
fn repeated_sends_trip_the_configured_limit() {
    let client = test_client_with_limits(3);
    join(&client, "general", "agent-1", "Agent One");

    for _ in 0..3 {
        let res = client
            .post("/api/send")
            .header(ContentType::JSON)
            .body(r#"{"agentId":"agent-1","content":"spam"}"#)
            .dispatch();
        assert_eq!(res.status(), Status::Ok);
    }

    let res = client
        .post("/api/send")
        .header(ContentType::JSON)
        .body(r#"{"agentId":"agent-1","content":"one too many"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::TooManyRequests);
    assert!(res.headers().get_one("Retry-After").is_some());
    assert_eq!(res.headers().get_one("X-RateLimit-Limit"), Some("3"));
}
