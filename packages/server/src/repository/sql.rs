use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::*;

use super::{ListFilter, MahasiswaRepository, NewMahasiswa};
use crate::entity::mahasiswa;

/// Columns searched by the list query.
const SEARCH_COLUMNS: &[&str] = &["npm", "nama", "kelas", "minat"];

#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered(&self, query: Option<&str>) -> Select<mahasiswa::Entity> {
        let select = mahasiswa::Entity::find();
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(term) => select.filter(contains_any(self.db.get_database_backend(), term)),
            None => select,
        }
    }
}

/// Case-sensitive substring match of `term` against any search column.
///
/// `LIKE` folds case under the default MySQL and SQLite collations, so the
/// match is expressed with each backend's position function instead.
fn contains_any(backend: DbBackend, term: &str) -> Condition {
    SEARCH_COLUMNS.iter().fold(Condition::any(), |cond, column| {
        let template = match backend {
            DbBackend::MySql => format!("INSTR(CAST({column} AS BINARY), ?) > 0"),
            DbBackend::Postgres => format!("strpos({column}, $1) > 0"),
            _ => format!("instr({column}, ?) > 0"),
        };
        cond.add(Expr::cust_with_values(template, [term.to_owned()]))
    })
}

#[async_trait]
impl MahasiswaRepository for SeaOrmRepository {
    async fn find(&self, id: i32) -> Result<Option<mahasiswa::Model>, DbErr> {
        mahasiswa::Entity::find_by_id(id).one(&self.db).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<mahasiswa::Model>, DbErr> {
        self.filtered(filter.query.as_deref())
            .order_by_desc(mahasiswa::Column::Id)
            .offset(Some(filter.offset))
            .limit(Some(filter.limit))
            .all(&self.db)
            .await
    }

    async fn count(&self, query: Option<&str>) -> Result<u64, DbErr> {
        self.filtered(query).count(&self.db).await
    }

    async fn create(&self, record: NewMahasiswa) -> Result<mahasiswa::Model, DbErr> {
        let active = mahasiswa::ActiveModel {
            npm: Set(record.npm),
            nama: Set(record.nama),
            kelas: Set(record.kelas),
            minat: Set(record.minat),
            profile: Set(record.profile),
            ..Default::default()
        };
        active.insert(&self.db).await
    }

    async fn update(&self, record: mahasiswa::Model) -> Result<mahasiswa::Model, DbErr> {
        let active = mahasiswa::ActiveModel {
            id: Unchanged(record.id),
            npm: Set(record.npm),
            nama: Set(record.nama),
            kelas: Set(record.kelas),
            minat: Set(record.minat),
            profile: Set(record.profile),
        };
        active.update(&self.db).await
    }

    async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        let res = mahasiswa::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}
