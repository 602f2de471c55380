use crate::Schema;
use crate::CATEGORIES;
use crate::PgErr;
use ctf_core::Category;
use ctf_core::Unique;
use ctf_core::ID;
use std::sync::Arc;
use tokio_postgres::Client;

pub(crate) const CREATE: &str = const_format::concatcp!(
    "CREATE TABLE IF NOT EXISTS ",
    CATEGORIES,
    " (id UUID PRIMARY KEY, name TEXT NOT NULL)"
);
pub(crate) const INDICES: &str = "";

pub struct CategorySchema;
impl Schema for CategorySchema {
    const NAME: &'static str = CATEGORIES;
    const CREATE: &'static str = CREATE;
    const INDICES: &'static str = INDICES;
}

/// Repository trait for the themed-column catalog (spec.md §4.1 `listCategories`).
#[allow(async_fn_in_trait)]
pub trait CategoryRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, PgErr>;
    async fn create_category(&self, category: &Category) -> Result<(), PgErr>;
}

impl CategoryRepository for Arc<Client> {
    async fn list_categories(&self) -> Result<Vec<Category>, PgErr> {
        self.query(
            const_format::concatcp!("SELECT id, name FROM ", CATEGORIES, " ORDER BY id"),
            &[],
        )
        .await
        .map(|rows| {
            rows.iter()
                .map(|row| Category::new(ID::from(row.get::<_, uuid::Uuid>(0)), row.get::<_, String>(1)))
                .collect()
        })
    }

    async fn create_category(&self, category: &Category) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("INSERT INTO ", CATEGORIES, " (id, name) VALUES ($1, $2)"),
            &[&category.id().inner(), &category.name()],
        )
        .await
        .map(|_| ())
    }
}
