use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mahasiswa")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Student registration number, exactly 8 characters. Not unique.
    pub npm: String,
    pub nama: String,
    pub kelas: String,
    pub minat: String,

    /// Stored upload name, or an arbitrary caller-supplied reference.
    pub profile: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
