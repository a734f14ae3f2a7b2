use crate::common::{join, test_client};
use rocket::http::{ContentType, Status};

#[test]
fn create_and_list_task() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client
        .post("/api/tasks")
        .header(ContentType::JSON)
        .body(r#"{"roomName":"general","title":"ship it","description":"release 1.0","creator":"agent-1"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let task: serde_json::Value = res.into_json().unwrap();
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");

    let res = client.get("/api/tasks/general").dispatch();
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn create_task_requires_title_and_creator() {
    let client = test_client();
    let res = client
        .post("/api/tasks")
        .header(ContentType::JSON)
        .body(r#"{"roomName":"general","title":"","description":"x","creator":""}"#)
        .dispatch();
    assert_eq!(res.status(), Status::BadRequest);
}

#[test]
fn update_task_merges_partial_fields() {
    let client = test_client();
    join(&client, "general", "agent-1", "Agent One");

    let res = client
        .post("/api/tasks")
        .header(ContentType::JSON)
        .body(r#"{"roomName":"general","title":"ship it","description":"release 1.0","creator":"agent-1"}"#)
        .dispatch();
    let task: serde_json::Value = res.into_json().unwrap();
    let id = task["id"].as_str().unwrap();

    let res = client
        .post(format!("/api/tasks/{id}/update"))
        .header(ContentType::JSON)
        .body(r#"{"status":"in_progress"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::Ok);
    let updated: serde_json::Value = res.into_json().unwrap();
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["title"], "ship it");
    assert_ne!(updated["updatedAt"], task["updatedAt"]);
}

#[test]
fn update_unknown_task_is_not_found() {
    let client = test_client();
    let res = client
        .post("/api/tasks/ghost/update")
        .header(ContentType::JSON)
        .body(r#"{"status":"done"}"#)
        .dispatch();
    assert_eq!(res.status(), Status::NotFound);
}
