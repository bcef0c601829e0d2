use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 唯一索引表extension_unique_keys，(index_name, index_value) 指向持有它的扩展对象
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "extension_unique_keys")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "String(Some(255))")]
    pub index_name: String,

    #[sea_orm(primary_key, auto_increment = false, column_type = "String(Some(255))")]
    pub index_value: String,

    #[sea_orm(column_type = "String(Some(255))")]
    pub owner: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
