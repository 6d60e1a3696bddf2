use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "currencies")]
#[schema(as = Currency)]
pub struct Model {
    /// ISO 4217 code
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimal_digits: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::countries::Entity")]
    Countries,
    #[sea_orm(has_many = "super::invoices::Entity")]
    Invoices,
}

impl Related<super::countries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Countries.def()
    }
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
