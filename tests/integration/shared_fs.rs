use crate::common::test_client;
use rocket::http::Status;

#[test]
fn write_read_list_delete_roundtrip() {
    let client = test_client();

    let res = client.put("/api/fs/file/notes/a.txt").body("hello").dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/fs/file/notes/a.txt").dispatch();
    assert_eq!(res.status(), Status::Ok);
    assert_eq!(res.into_bytes().unwrap(), b"hello");

    let res = client.get("/api/fs/list?path=notes").dispatch();
    assert_eq!(res.status(), Status::Ok);
    let body: serde_json::Value = res.into_json().unwrap();
    assert_eq!(body["entries"], serde_json::json!(["a.txt"]));

    let res = client.delete("/api/fs/file/notes/a.txt").dispatch();
    assert_eq!(res.status(), Status::Ok);

    let res = client.get("/api/fs/file/notes/a.txt").dispatch();
    assert_eq!(res.status(), Status::NotFound);
}

#[test]
fn path_escape_is_rejected() {
    let client = test_client();
    let res = client.get("/api/fs/file/../../etc/passwd").dispatch();
    assert_ne!(res.status(), Status::Ok);
}
