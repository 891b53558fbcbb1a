use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::mahasiswa::{
    FileAttachment, IncomingPayload, MahasiswaJsonPayload, ProfileInput,
};

/// Parses a create/update body from either encoding.
///
/// `application/json` bodies go through [`AppJson`]; everything else is read
/// as `multipart/form-data`, the only encoding that may carry a `profile` file.
impl<S> FromRequest<S> for IncomingPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_json(&req) {
            let AppJson(body) = AppJson::<MahasiswaJsonPayload>::from_request(req, state).await?;
            return Ok(body.into());
        }

        let multipart = Multipart::from_request(req, state).await.map_err(|e| {
            AppError::Validation(format!(
                "Request body must be JSON or multipart/form-data: {}",
                e.body_text()
            ))
        })?;
        read_multipart(multipart).await
    }
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
}

async fn read_multipart(mut multipart: Multipart) -> Result<IncomingPayload, AppError> {
    let mut payload = IncomingPayload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let file_name = field
            .file_name()
            .map(str::to_owned)
            .filter(|f| !f.trim().is_empty());

        match (name.as_str(), file_name) {
            ("profile", Some(file_name)) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?;
                payload.profile = Some(ProfileInput::Upload(FileAttachment { file_name, bytes }));
            }
            ("profile", None) => {
                let text = read_text(field).await?;
                // A file part wins over a text reference.
                let has_upload = matches!(payload.profile, Some(ProfileInput::Upload(_)));
                if !text.is_empty() && !has_upload {
                    payload.profile = Some(ProfileInput::Reference(text));
                }
            }
            ("npm", _) => payload.npm = read_text(field).await?,
            ("nama", _) => payload.nama = read_text(field).await?,
            ("kelas", _) => payload.kelas = read_text(field).await?,
            ("minat", _) => payload.minat = read_text(field).await?,
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(payload)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_owned();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}
