use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use formstore_core::FormField;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::finisher::{FormSubmission, FormValue, SubmissionWriter, UploadedFile};
use crate::state::ApiState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub values: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub database_storage_identifier: String,
}

/// Store a submission sent as JSON
pub async fn submit(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
    Json(payload): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    store(&state, Some(identifier), payload).await
}

/// Store a submission that names no storage identifier
pub async fn submit_unnamed(
    State(state): State<ApiState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    store(&state, None, payload).await
}

async fn store(
    state: &ApiState,
    identifier: Option<String>,
    payload: SubmitRequest,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let submission = FormSubmission {
        storage_identifier: identifier,
        values: payload
            .values
            .into_iter()
            .map(|(key, value)| (key, FormValue::Value(value)))
            .collect(),
        fields: payload.fields,
    };

    write(state, submission).await
}

/// Store a multipart submission; file parts become stored resources.
///
/// Repeated names (or names ending in `[]`) are collected into a list.
pub async fn upload(
    State(state): State<ApiState>,
    Path(identifier): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let mut submission = FormSubmission::new(Some(identifier));

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(|n| n.trim_end_matches("[]").to_string()) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(filename) => {
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

                // Browsers send an empty part for file inputs left blank
                if filename.is_empty() && bytes.is_empty() {
                    submission
                        .values
                        .insert(name, FormValue::Value(serde_json::Value::Null));
                    continue;
                }

                submission.values.insert(
                    name,
                    FormValue::Upload(UploadedFile {
                        filename,
                        media_type,
                        bytes: bytes.to_vec(),
                    }),
                );
            }
            None => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                push_text(&mut submission.values, name, text);
            }
        }
    }

    write(&state, submission).await
}

fn push_text(values: &mut IndexMap<String, FormValue>, name: String, text: String) {
    use serde_json::Value;

    match values.get_mut(&name) {
        Some(FormValue::Value(Value::Array(items))) => items.push(Value::String(text)),
        Some(FormValue::Value(existing)) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(text)]);
        }
        _ => {
            values.insert(name, FormValue::Value(Value::String(text)));
        }
    }
}

async fn write(
    state: &ApiState,
    submission: FormSubmission,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let record = SubmissionWriter::new(&state.db, &state.settings.ignored_fields)
        .write(submission)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            database_storage_identifier: record.id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeated_names_become_a_list() {
        let mut values = IndexMap::new();
        push_text(&mut values, "colors".to_string(), "red".to_string());
        push_text(&mut values, "colors".to_string(), "green".to_string());
        push_text(&mut values, "colors".to_string(), "blue".to_string());
        push_text(&mut values, "name".to_string(), "Jo".to_string());

        match &values["colors"] {
            FormValue::Value(value) => assert_eq!(value, &json!(["red", "green", "blue"])),
            other => panic!("unexpected value {:?}", other),
        }
        match &values["name"] {
            FormValue::Value(value) => assert_eq!(value, &json!("Jo")),
            other => panic!("unexpected value {:?}", other),
        }
    }
}
