use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::mahasiswa;
use crate::error::AppError;

use super::shared::{invalid, non_empty};

/// Required length of an NPM, in characters.
pub const NPM_LENGTH: usize = 8;

const INVALID_FIELDS: &str =
    "Invalid fields (npm must be 8 characters; nama, kelas and minat are required)";
const INVALID_NPM: &str = "npm must be exactly 8 characters";

/// Request payload, identical for create and update, normalized from either a
/// JSON or a multipart body.
#[derive(Debug, Default)]
pub struct IncomingPayload {
    pub npm: String,
    pub nama: String,
    pub kelas: String,
    pub minat: String,
    pub profile: Option<ProfileInput>,
}

#[derive(Debug)]
pub enum ProfileInput {
    /// A caller-supplied reference, stored as-is without existence checks.
    Reference(String),
    /// A file part from a multipart body.
    Upload(FileAttachment),
}

#[derive(Debug)]
pub struct FileAttachment {
    pub file_name: String,
    pub bytes: Bytes,
}

/// JSON request body. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct MahasiswaJsonPayload {
    #[schema(example = "12345678")]
    pub npm: Option<String>,
    #[schema(example = "Budi Santoso")]
    pub nama: Option<String>,
    #[schema(example = "3IA01")]
    pub kelas: Option<String>,
    #[schema(example = "Machine Learning")]
    pub minat: Option<String>,
    /// Profile image reference (a file name, not an upload).
    pub profile: Option<String>,
}

impl From<MahasiswaJsonPayload> for IncomingPayload {
    fn from(body: MahasiswaJsonPayload) -> Self {
        Self {
            npm: body.npm.unwrap_or_default(),
            nama: body.nama.unwrap_or_default(),
            kelas: body.kelas.unwrap_or_default(),
            minat: body.minat.unwrap_or_default(),
            profile: body
                .profile
                .filter(|p| !p.is_empty())
                .map(ProfileInput::Reference),
        }
    }
}

/// Trimmed, validated fields of a new record.
#[derive(Debug, PartialEq, Eq)]
pub struct MahasiswaFields {
    pub npm: String,
    pub nama: String,
    pub kelas: String,
    pub minat: String,
}

#[derive(Serialize, ToSchema)]
pub struct MahasiswaResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "12345678")]
    pub npm: String,
    #[schema(example = "Budi Santoso")]
    pub nama: String,
    #[schema(example = "3IA01")]
    pub kelas: String,
    #[schema(example = "Machine Learning")]
    pub minat: String,
    /// Stored file name (served under `/uploads/`) or caller reference.
    #[schema(example = "20240101_120000_123456789a1b2.png")]
    pub profile: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MahasiswaSingleResponse {
    pub data: MahasiswaResponse,
}

#[derive(Serialize, ToSchema)]
pub struct MahasiswaListResponse {
    pub data: Vec<MahasiswaResponse>,
    /// Matching records across all pages.
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Raw list query. Numbers are kept as strings so malformed values fall back
/// to defaults instead of rejecting the request.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MahasiswaListQuery {
    /// Substring matched against npm, nama, kelas and minat (case-sensitive).
    pub q: Option<String>,
    /// Page number, 1-based. Defaults to 1.
    pub page: Option<String>,
    /// Page size, 1-100. Defaults to 10.
    pub limit: Option<String>,
}

impl From<mahasiswa::Model> for MahasiswaResponse {
    fn from(m: mahasiswa::Model) -> Self {
        Self {
            id: m.id,
            npm: m.npm,
            nama: m.nama,
            kelas: m.kelas,
            minat: m.minat,
            profile: m.profile,
        }
    }
}

/// Validate a full payload for record creation.
pub fn validate_create(payload: &IncomingPayload) -> Result<MahasiswaFields, AppError> {
    let npm = payload.npm.trim();
    let (Some(nama), Some(kelas), Some(minat)) = (
        non_empty(&payload.nama),
        non_empty(&payload.kelas),
        non_empty(&payload.minat),
    ) else {
        return Err(invalid(INVALID_FIELDS));
    };
    if npm.chars().count() != NPM_LENGTH {
        return Err(invalid(INVALID_FIELDS));
    }

    Ok(MahasiswaFields {
        npm: npm.to_string(),
        nama: nama.to_string(),
        kelas: kelas.to_string(),
        minat: minat.to_string(),
    })
}

/// Merge a partial payload into `record`.
///
/// Blank fields keep the stored value. A non-blank npm of the wrong length is
/// rejected, and `record` is left untouched on error. A profile reference
/// replaces the stored one; uploads are handled by the caller.
pub fn apply_update(
    record: &mut mahasiswa::Model,
    payload: &IncomingPayload,
) -> Result<(), AppError> {
    let npm = non_empty(&payload.npm);
    if let Some(npm) = npm
        && npm.chars().count() != NPM_LENGTH
    {
        return Err(invalid(INVALID_NPM));
    }

    if let Some(npm) = npm {
        record.npm = npm.to_string();
    }
    if let Some(nama) = non_empty(&payload.nama) {
        record.nama = nama.to_string();
    }
    if let Some(kelas) = non_empty(&payload.kelas) {
        record.kelas = kelas.to_string();
    }
    if let Some(minat) = non_empty(&payload.minat) {
        record.minat = minat.to_string();
    }
    if let Some(ProfileInput::Reference(reference)) = &payload.profile
        && let Some(reference) = non_empty(reference)
    {
        record.profile = Some(reference.to_string());
    }
    Ok(())
}
