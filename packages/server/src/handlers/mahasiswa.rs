use std::io::Cursor;

use axum::Json;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::entity::mahasiswa;
use crate::error::{AppError, ErrorBody};
use crate::extractors::path::AppPath;
use crate::models::mahasiswa::*;
use crate::models::shared::PageWindow;
use crate::repository::{ListFilter, MahasiswaRepository, NewMahasiswa};
use crate::state::AppState;
use crate::uploads::{self, BoxReader, UploadStore};

/// Request body cap for create/update. Larger than the image limit so the
/// upload policy, not the transport, decides on oversized files.
pub fn mahasiswa_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(8 * 1024 * 1024) // 8 MB
}

#[utoipa::path(
    get,
    path = "/mahasiswa",
    tag = "Mahasiswa",
    operation_id = "listMahasiswa",
    summary = "List students with search and pagination",
    description = "Returns the most recently created students first. `q` filters by a \
        case-sensitive substring of npm, nama, kelas or minat. `limit` outside 1-100 falls \
        back to 10.",
    params(MahasiswaListQuery),
    responses(
        (status = 200, description = "Page of students", body = MahasiswaListResponse),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_mahasiswa(
    State(state): State<AppState>,
    Query(query): Query<MahasiswaListQuery>,
) -> Result<Json<MahasiswaListResponse>, AppError> {
    let window = PageWindow::resolve(query.page.as_deref(), query.limit.as_deref());
    let search = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from);

    let total = state.repo.count(search.as_deref()).await?;
    let rows = if window.offset() >= total {
        Vec::new()
    } else {
        state
            .repo
            .list(&ListFilter {
                query: search,
                offset: window.offset(),
                limit: window.limit,
            })
            .await?
    };

    Ok(Json(MahasiswaListResponse {
        data: rows.into_iter().map(MahasiswaResponse::from).collect(),
        total,
        page: window.page,
        limit: window.limit,
    }))
}

#[utoipa::path(
    get,
    path = "/mahasiswa/{id}",
    tag = "Mahasiswa",
    operation_id = "getMahasiswa",
    summary = "Get a student by ID",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student details", body = MahasiswaSingleResponse),
        (status = 400, description = "Invalid ID", body = ErrorBody),
        (status = 404, description = "Student not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_mahasiswa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<MahasiswaSingleResponse>, AppError> {
    let model = find_mahasiswa(&*state.repo, record_id(id)?).await?;
    Ok(Json(MahasiswaSingleResponse { data: model.into() }))
}

#[utoipa::path(
    post,
    path = "/mahasiswa",
    tag = "Mahasiswa",
    operation_id = "createMahasiswa",
    summary = "Create a student",
    description = "Accepts `application/json` or `multipart/form-data` with the same fields. \
        In multipart bodies `profile` may be an image file (.jpg, .jpeg, .png, .webp, max 2 MB), \
        which is stored and referenced by its generated name. Otherwise `profile` is stored \
        verbatim.",
    request_body = MahasiswaJsonPayload,
    responses(
        (status = 201, description = "Student created", body = MahasiswaSingleResponse),
        (status = 400, description = "Validation or upload policy error", body = ErrorBody),
        (status = 500, description = "Storage or filesystem failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_mahasiswa(
    State(state): State<AppState>,
    payload: IncomingPayload,
) -> Result<impl IntoResponse, AppError> {
    let fields = validate_create(&payload)?;

    let (profile, stored_upload) = match payload.profile {
        Some(ProfileInput::Upload(file)) => {
            let stored = store_attachment(&*state.uploads, file).await?;
            (Some(stored.clone()), Some(stored))
        }
        Some(ProfileInput::Reference(reference)) => (Some(reference), None),
        None => (None, None),
    };

    let record = NewMahasiswa {
        npm: fields.npm,
        nama: fields.nama,
        kelas: fields.kelas,
        minat: fields.minat,
        profile,
    };
    let model = match state.repo.create(record).await {
        Ok(model) => model,
        Err(e) => {
            if let Some(stored) = stored_upload {
                uploads::discard(&*state.uploads, &stored).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(id = model.id, "Created mahasiswa");
    Ok((
        StatusCode::CREATED,
        Json(MahasiswaSingleResponse { data: model.into() }),
    ))
}

#[utoipa::path(
    put,
    path = "/mahasiswa/{id}",
    tag = "Mahasiswa",
    operation_id = "updateMahasiswa",
    summary = "Update a student",
    description = "Partial update: blank or missing fields keep their stored value, but a \
        non-blank npm must be exactly 8 characters. Uploading a new `profile` file replaces \
        the stored image and removes the previous one.",
    params(("id" = i64, Path, description = "Student ID")),
    request_body = MahasiswaJsonPayload,
    responses(
        (status = 200, description = "Student updated", body = MahasiswaSingleResponse),
        (status = 400, description = "Validation or upload policy error", body = ErrorBody),
        (status = 404, description = "Student not found", body = ErrorBody),
        (status = 500, description = "Storage or filesystem failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(id))]
pub async fn update_mahasiswa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    payload: IncomingPayload,
) -> Result<Json<MahasiswaSingleResponse>, AppError> {
    let mut record = find_mahasiswa(&*state.repo, record_id(id)?).await?;
    let previous_profile = record.profile.clone();
    apply_update(&mut record, &payload)?;

    let mut stored_upload = None;
    if let Some(ProfileInput::Upload(file)) = payload.profile {
        let stored = store_attachment(&*state.uploads, file).await?;
        record.profile = Some(stored.clone());
        stored_upload = Some(stored);
    }

    let model = match state.repo.update(record).await {
        Ok(model) => model,
        Err(e) => {
            if let Some(stored) = &stored_upload {
                uploads::discard(&*state.uploads, stored).await;
            }
            return Err(e.into());
        }
    };

    // The row now points at the new file; the old one is no longer referenced.
    if stored_upload.is_some()
        && let Some(previous) = previous_profile
    {
        uploads::discard(&*state.uploads, &previous).await;
    }

    Ok(Json(MahasiswaSingleResponse { data: model.into() }))
}

#[utoipa::path(
    delete,
    path = "/mahasiswa/{id}",
    tag = "Mahasiswa",
    operation_id = "deleteMahasiswa",
    summary = "Delete a student",
    description = "Deletes the student and then removes its stored profile image. Failure to \
        remove the image does not fail the request.",
    params(("id" = i64, Path, description = "Student ID")),
    responses(
        (status = 204, description = "Student deleted"),
        (status = 400, description = "Invalid ID", body = ErrorBody),
        (status = 404, description = "Student not found", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn delete_mahasiswa(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let id = record_id(id)?;
    let record = find_mahasiswa(&*state.repo, id).await?;

    if !state.repo.delete(id).await? {
        return Err(AppError::NotFound("Not found".into()));
    }

    if let Some(profile) = record.profile.as_deref() {
        uploads::discard(&*state.uploads, profile).await;
    }

    tracing::info!(id, "Deleted mahasiswa");
    Ok(StatusCode::NO_CONTENT)
}

/// Ids are stored as `i32`; any other integer cannot name a record.
fn record_id(raw: i64) -> Result<i32, AppError> {
    i32::try_from(raw).map_err(|_| AppError::NotFound("Not found".into()))
}

async fn find_mahasiswa(
    repo: &dyn MahasiswaRepository,
    id: i32,
) -> Result<mahasiswa::Model, AppError> {
    repo.find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".into()))
}

/// Validate and persist an uploaded profile image, returning its stored name.
async fn store_attachment(
    store: &dyn UploadStore,
    file: FileAttachment,
) -> Result<String, AppError> {
    let size = file.bytes.len() as u64;
    let reader: BoxReader = Box::new(Cursor::new(file.bytes));
    Ok(store.store(&file.file_name, size, reader).await?)
}
