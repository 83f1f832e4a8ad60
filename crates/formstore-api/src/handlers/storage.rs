use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::controller::{self, ShowOutcome};
use crate::error::ApiError;
use crate::state::ApiState;

pub const INDEX_PATH: &str = "/storage";

/// Carries the acknowledgment shown after a destructive action.
pub static FLASH_MESSAGE_HEADER: HeaderName = HeaderName::from_static("x-flash-message");

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub identifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShowQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub remove_attached_resources: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteAllQuery {
    #[serde(default)]
    pub redirect: bool,
    #[serde(default)]
    pub remove_attached_resources: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    pub identifier: String,
    pub count: u64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub include_date_time: bool,
}

fn default_format() -> String {
    "xlsx".to_string()
}

/// List identifiers
pub async fn index(State(state): State<ApiState>) -> Result<Json<IndexResponse>, ApiError> {
    let identifiers = controller::list_identifiers(&state.db).await?;
    Ok(Json(IndexResponse { identifiers }))
}

/// Paginated entries of one identifier
pub async fn show(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
    Query(params): Query<ShowQuery>,
) -> Result<Response, ApiError> {
    match controller::show(&state.db, &state.settings, &identifier, params.page).await? {
        ShowOutcome::Page(view) => Ok(Json(view).into_response()),
        ShowOutcome::RedirectToIndex => Ok(Redirect::to(INDEX_PATH).into_response()),
    }
}

/// Delete one entry and go back to its listing
pub async fn delete(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteQuery>,
) -> Result<Response, ApiError> {
    let identifier =
        controller::delete_one(&state.db, &id, params.remove_attached_resources).await?;

    let location = format!("{}/{}", INDEX_PATH, urlencoding::encode(&identifier));
    Ok(with_flash_message(
        Redirect::to(&location).into_response(),
        "Entry removed.",
    ))
}

/// Delete every entry of an identifier
pub async fn delete_all(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
    Query(params): Query<DeleteAllQuery>,
) -> Result<Response, ApiError> {
    let count = controller::delete_all(
        &state.db,
        &identifier,
        None,
        params.remove_attached_resources,
    )
    .await?;
    let message = format!("{} entries removed.", count);

    if params.redirect {
        return Ok(with_flash_message(
            Redirect::to(INDEX_PATH).into_response(),
            &message,
        ));
    }

    Ok(Json(DeleteAllResponse {
        identifier,
        count,
        message,
    })
    .into_response())
}

/// Download all entries of an identifier as a spreadsheet
pub async fn export(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
    Query(params): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let file = controller::export(
        &state.db,
        &state.settings,
        &state.writers,
        &identifier,
        &params.format,
        params.include_date_time,
    )
    .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_file_name(&file.file_name),
        urlencoding::encode(&file.file_name)
    );
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| ApiError::Internal(format!("invalid content disposition: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.mime_type)),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache, no-store, must-revalidate, max-age=0"),
            ),
            (header::PRAGMA, HeaderValue::from_static("no-cache")),
            (header::EXPIRES, HeaderValue::from_static("0")),
            (
                HeaderName::from_static("content-transfer-encoding"),
                HeaderValue::from_static("binary"),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

fn with_flash_message(mut response: Response, message: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(message) {
        response
            .headers_mut()
            .insert(FLASH_MESSAGE_HEADER.clone(), value);
    }
    response
}

/// Plain ASCII fallback for clients that ignore `filename*`.
fn ascii_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_file_name() {
        assert_eq!(
            ascii_file_name("Database-Storage-ümlaut \"x\".csv"),
            "Database-Storage-_mlaut _x_.csv"
        );
    }

    #[test]
    fn test_default_export_query() {
        assert_eq!(default_format(), "xlsx");
        assert_eq!(default_page(), 1);
    }
}
