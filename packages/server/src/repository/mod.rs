//! Persistence for student records.

mod sql;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::entity::mahasiswa;

pub use self::sql::SeaOrmRepository;

/// Filter and page window for listing records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Case-sensitive substring matched against npm, nama, kelas or minat.
    pub query: Option<String>,
    pub offset: u64,
    pub limit: u64,
}

/// Field values for a record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMahasiswa {
    pub npm: String,
    pub nama: String,
    pub kelas: String,
    pub minat: String,
    pub profile: Option<String>,
}

/// CRUD over the `mahasiswa` table.
#[async_trait]
pub trait MahasiswaRepository: Send + Sync {
    async fn find(&self, id: i32) -> Result<Option<mahasiswa::Model>, DbErr>;

    /// Matching records, most recently created first.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<mahasiswa::Model>, DbErr>;

    /// Number of records matching `query`, ignoring paging.
    async fn count(&self, query: Option<&str>) -> Result<u64, DbErr>;

    async fn create(&self, record: NewMahasiswa) -> Result<mahasiswa::Model, DbErr>;

    /// Overwrite every column of an existing record.
    async fn update(&self, record: mahasiswa::Model) -> Result<mahasiswa::Model, DbErr>;

    /// Returns `false` if no record had this id.
    async fn delete(&self, id: i32) -> Result<bool, DbErr>;
}
