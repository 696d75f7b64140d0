//! SeaORM-backed purchase storage.
//!
//! Production persistence for purchase records. The entity lives inline
//! since the table is owned entirely by this module.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};

use crate::error::Result;
use crate::store::{Purchase, PurchaseStore};

mod entity {
    pub mod purchase {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "purchases")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: String,
            pub course_id: String,
            pub user_id: String,
            pub created_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

use entity::purchase;

/// Purchase store backed by a SeaORM connection.
#[derive(Clone)]
pub struct SeaOrmPurchaseStore {
    db: DatabaseConnection,
}

impl SeaOrmPurchaseStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create the `purchases` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.db.get_database_backend();
        let schema = sea_orm::Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(purchase::Entity);
        stmt.if_not_exists();
        self.db.execute(backend.build(&stmt)).await?;
        Ok(())
    }
}

#[async_trait]
impl PurchaseStore for SeaOrmPurchaseStore {
    async fn create_purchase(&self, course_id: &str, user_id: &str) -> Result<Purchase> {
        let id = uuid::Uuid::new_v4().to_string();

        let row = purchase::ActiveModel {
            id: Set(id),
            course_id: Set(course_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        let model = row.insert(&self.db).await?;

        Ok(Purchase {
            id: model.id,
            course_id: model.course_id,
            user_id: model.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{Database, EntityTrait};

    async fn sqlite_store() -> SeaOrmPurchaseStore {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let store = SeaOrmPurchaseStore::new(db);
        store.ensure_schema().await.unwrap();
        store
    }

    #[tokio::test]
    async fn inserts_and_returns_purchase() {
        let store = sqlite_store().await;

        let purchase = store.create_purchase("c1", "u1").await.unwrap();
        assert_eq!(purchase.course_id, "c1");
        assert_eq!(purchase.user_id, "u1");

        let rows = purchase::Entity::find().all(&store.db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, purchase.id);
    }

    #[tokio::test]
    async fn replayed_insert_creates_second_row() {
        let store = sqlite_store().await;

        store.create_purchase("c1", "u1").await.unwrap();
        store.create_purchase("c1", "u1").await.unwrap();

        let rows = purchase::Entity::find().all(&store.db).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let store = sqlite_store().await;
        store.ensure_schema().await.unwrap();
    }
}
