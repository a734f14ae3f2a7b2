use crate::error::{HubError, HubResult};
use crate::shared_fs::SharedFs;
use rocket::data::{Data, ToByteUnit};
use rocket::http::ContentType;
use rocket::serde::json::Json;
use rocket::{delete, get, put, State};
use std::sync::Arc;

/// §4.7 names read/write/list/delete as operations but the external
/// interfaces table doesn't give them a wire form; these routes are this
/// implementation's chosen exposure (see DESIGN.md).

#[get("/api/fs/list?<path>")]
pub fn list_shared(path: Option<&str>, fs: &State<Arc<SharedFs>>) -> HubResult<Json<serde_json::Value>> {
    let entries = fs.list(path)?;
    Ok(Json(serde_json::json!({ "entries": entries })))
}

#[get("/api/fs/file/<path..>")]
pub fn read_shared(path: std::path::PathBuf, fs: &State<Arc<SharedFs>>) -> HubResult<(ContentType, Vec<u8>)> {
    let rel = path.to_string_lossy().into_owned();
    let data = fs.read(&rel)?;
    Ok((ContentType::Binary, data))
}

#[put("/api/fs/file/<path..>", data = "<body>")]
pub async fn write_shared(
    path: std::path::PathBuf,
    body: Data<'_>,
    fs: &State<Arc<SharedFs>>,
) -> HubResult<Json<serde_json::Value>> {
    let rel = path.to_string_lossy().into_owned();
    let bytes = body
        .open(25.mebibytes())
        .into_bytes()
        .await
        .map_err(|e| HubError::validation(format!("failed to read body: {e}")))?;
    fs.write(&rel, &bytes)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[delete("/api/fs/file/<path..>")]
pub fn delete_shared(path: std::path::PathBuf, fs: &State<Arc<SharedFs>>) -> HubResult<Json<serde_json::Value>> {
    let rel = path.to_string_lossy().into_owned();
    fs.delete(&rel)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
