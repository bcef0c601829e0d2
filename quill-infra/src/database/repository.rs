use crate::database::extension_store::{self, Entity as ExtensionStoreEntity};
use crate::database::unique_key::{self, Entity as UniqueKeyEntity};
use quill_api::extension::{Committed, ExtensionError, RawExtension, UniqueKey, Write};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// 名称冲突时报告的索引名
pub const NAME_INDEX: &str = "metadata.name";

/// ExtensionRepository trait 定义扩展对象的数据访问操作
#[async_trait]
pub trait ExtensionRepository: Send + Sync {
    /// 原子地执行一组写操作，唯一索引按最终状态检查
    async fn apply(&self, writes: Vec<Write>) -> Result<Committed, ExtensionError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<RawExtension>, ExtensionError>;

    async fn find_by_unique_key(&self, index: &str, value: &str) -> Result<Option<RawExtension>, ExtensionError>;

    /// 按名称前缀列出对象，结果按名称排序
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<RawExtension>, ExtensionError>;
}

pub(crate) fn db_err(err: DbErr) -> ExtensionError {
    ExtensionError::Database(err.to_string())
}

/// SeaOrmExtensionRepository 使用Sea-ORM实现的Repository
///
/// 每个批次在一个数据库事务中执行，版本号检查通过带条件的UPDATE/DELETE完成，
/// 唯一索引由extension_unique_keys表的主键保证。
pub struct SeaOrmExtensionRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmExtensionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn current(txn: &DatabaseTransaction, name: &str) -> Result<extension_store::Model, ExtensionError> {
        ExtensionStoreEntity::find_by_id(name.to_string())
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ExtensionError::NotFound { name: name.to_string() })
    }

    fn version_condition(current: &extension_store::Model) -> Condition {
        let condition = Condition::all().add(extension_store::Column::Name.eq(current.name.clone()));
        match current.version {
            Some(version) => condition.add(extension_store::Column::Version.eq(version)),
            None => condition.add(extension_store::Column::Version.is_null()),
        }
    }

    fn check_expected(raw_version: Option<u64>, current: &extension_store::Model) -> Result<(), ExtensionError> {
        match raw_version {
            Some(expected) if expected != current.current_version() => Err(ExtensionError::VersionMismatch {
                name: current.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    async fn write_one(
        txn: &DatabaseTransaction,
        write: &Write,
        committed: &mut HashMap<String, u64>,
    ) -> Result<(), ExtensionError> {
        match write {
            Write::Create(raw) => {
                let model = extension_store::ActiveModel {
                    name: Set(raw.name.clone()),
                    data: Set(raw.data.clone()),
                    version: Set(Some(1)),
                };
                ExtensionStoreEntity::insert(model)
                    .exec_without_returning(txn)
                    .await
                    .map_err(|e| match e.sql_err() {
                        Some(SqlErr::UniqueConstraintViolation(_)) => ExtensionError::Conflict {
                            index: NAME_INDEX.to_string(),
                            value: raw.name.clone(),
                        },
                        _ => db_err(e),
                    })?;
                committed.insert(raw.name.clone(), 1);
            }
            Write::Update(raw) => {
                let current = Self::current(txn, &raw.name).await?;
                Self::check_expected(raw.version, &current)?;
                let next = current.current_version() + 1;

                let result = ExtensionStoreEntity::update_many()
                    .col_expr(extension_store::Column::Data, Expr::value(raw.data.clone()))
                    .col_expr(extension_store::Column::Version, Expr::value(next as i64))
                    .filter(Self::version_condition(&current))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                if result.rows_affected == 0 {
                    return Err(ExtensionError::VersionMismatch { name: raw.name.clone() });
                }
                committed.insert(raw.name.clone(), next);
            }
            Write::Delete { name, version } => {
                let current = Self::current(txn, name).await?;
                Self::check_expected(*version, &current)?;

                let result = ExtensionStoreEntity::delete_many()
                    .filter(Self::version_condition(&current))
                    .exec(txn)
                    .await
                    .map_err(db_err)?;
                if result.rows_affected == 0 {
                    return Err(ExtensionError::VersionMismatch { name: name.clone() });
                }
                committed.remove(name);
            }
        }
        Ok(())
    }

    async fn insert_key(txn: &DatabaseTransaction, owner: &str, key: &UniqueKey) -> Result<(), ExtensionError> {
        let model = unique_key::ActiveModel {
            index_name: Set(key.index.clone()),
            index_value: Set(key.value.clone()),
            owner: Set(owner.to_string()),
        };
        UniqueKeyEntity::insert(model)
            .exec_without_returning(txn)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => ExtensionError::Conflict {
                    index: key.index.clone(),
                    value: key.value.clone(),
                },
                _ => db_err(e),
            })?;
        Ok(())
    }
}

#[async_trait]
impl ExtensionRepository for SeaOrmExtensionRepository {
    async fn apply(&self, writes: Vec<Write>) -> Result<Committed, ExtensionError> {
        if writes.is_empty() {
            return Ok(Committed::default());
        }
        // 事务在出错返回时被丢弃并回滚
        let txn = self.db.begin().await.map_err(db_err)?;
        let mut committed = HashMap::new();

        for write in &writes {
            Self::write_one(&txn, write, &mut committed).await?;
        }

        // 先释放所有涉及对象的旧索引，再登记最终状态的索引
        let touched: BTreeSet<&str> = writes.iter().map(Write::name).collect();
        UniqueKeyEntity::delete_many()
            .filter(unique_key::Column::Owner.is_in(touched.iter().copied()))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let mut final_keys: HashMap<&str, &[UniqueKey]> = HashMap::new();
        for write in &writes {
            match write {
                Write::Create(raw) | Write::Update(raw) => {
                    final_keys.insert(&raw.name, &raw.unique_keys);
                }
                Write::Delete { name, .. } => {
                    final_keys.remove(name.as_str());
                }
            }
        }
        for (owner, keys) in final_keys {
            for key in keys {
                Self::insert_key(&txn, owner, key).await?;
            }
        }

        txn.commit().await.map_err(db_err)?;
        Ok(Committed::new(committed))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<RawExtension>, ExtensionError> {
        let model = ExtensionStoreEntity::find_by_id(name.to_string())
            .one(&*self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(RawExtension::from))
    }

    async fn find_by_unique_key(&self, index: &str, value: &str) -> Result<Option<RawExtension>, ExtensionError> {
        let Some(key) = UniqueKeyEntity::find_by_id((index.to_string(), value.to_string()))
            .one(&*self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        self.find_by_name(&key.owner).await
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<RawExtension>, ExtensionError> {
        let models = ExtensionStoreEntity::find()
            .filter(extension_store::Column::Name.starts_with(prefix))
            .order_by_asc(extension_store::Column::Name)
            .all(&*self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(RawExtension::from).collect())
    }
}
