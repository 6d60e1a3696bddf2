use crate::entities::{countries, currencies, invoices, prelude::*, producers};
use crate::services::producer_service::LogoType;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

/// Relational data behind the dashboard: producers, invoices and the
/// currency/country reference tables.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    async fn ping(&self) -> bool;

    async fn find_producer(&self, id: &str) -> Result<Option<producers::Model>, DbErr>;

    /// Writes `url` into the column matching `logo_type`.
    /// Fails with `DbErr::RecordNotFound` for an unknown producer.
    async fn set_producer_logo(
        &self,
        id: &str,
        logo_type: LogoType,
        url: &str,
    ) -> Result<producers::Model, DbErr>;

    async fn find_invoice(&self, id: &str) -> Result<Option<invoices::Model>, DbErr>;

    async fn list_currencies(&self) -> Result<Vec<currencies::Model>, DbErr>;

    async fn list_countries(&self) -> Result<Vec<countries::Model>, DbErr>;
}

pub struct SeaOrmDatabase {
    db: DatabaseConnection,
}

impl SeaOrmDatabase {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DatabaseService for SeaOrmDatabase {
    async fn ping(&self) -> bool {
        self.db.ping().await.is_ok()
    }

    async fn find_producer(&self, id: &str) -> Result<Option<producers::Model>, DbErr> {
        Producers::find_by_id(id).one(&self.db).await
    }

    async fn set_producer_logo(
        &self,
        id: &str,
        logo_type: LogoType,
        url: &str,
    ) -> Result<producers::Model, DbErr> {
        let producer = Producers::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("producer {}", id)))?;

        let mut active = producer.into_active_model();
        let value = Set(Some(url.to_string()));
        match logo_type {
            LogoType::Logo => active.logo = value,
            LogoType::LogoWhite => active.logo_white = value,
            LogoType::LogoBlack => active.logo_black = value,
            LogoType::LogoBanner => active.logo_banner = value,
        }
        active.updated_at = Set(Utc::now());

        active.update(&self.db).await
    }

    async fn find_invoice(&self, id: &str) -> Result<Option<invoices::Model>, DbErr> {
        Invoices::find_by_id(id).one(&self.db).await
    }

    async fn list_currencies(&self) -> Result<Vec<currencies::Model>, DbErr> {
        Currencies::find()
            .order_by_asc(currencies::Column::Id)
            .all(&self.db)
            .await
    }

    async fn list_countries(&self) -> Result<Vec<countries::Model>, DbErr> {
        Countries::find()
            .order_by_asc(countries::Column::Name)
            .all(&self.db)
            .await
    }
}
