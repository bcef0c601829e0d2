use crate::database::repository::{ExtensionRepository, NAME_INDEX};
use quill_api::extension::{Committed, ExtensionError, RawExtension, UniqueKey, Write};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredExtension {
    data: Vec<u8>,
    version: u64,
    unique_keys: Vec<UniqueKey>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    objects: BTreeMap<String, StoredExtension>,
    /// (index, value) -> owner
    unique_keys: HashMap<(String, String), String>,
}

impl MemoryState {
    fn raw(&self, name: &str) -> Option<RawExtension> {
        self.objects.get(name).map(|stored| RawExtension {
            name: name.to_string(),
            data: stored.data.clone(),
            version: Some(stored.version),
            unique_keys: stored.unique_keys.clone(),
        })
    }

    fn expect_version(&self, name: &str, expected: Option<u64>) -> Result<u64, ExtensionError> {
        let stored = self
            .objects
            .get(name)
            .ok_or_else(|| ExtensionError::NotFound { name: name.to_string() })?;
        match expected {
            Some(expected) if expected != stored.version => {
                Err(ExtensionError::VersionMismatch { name: name.to_string() })
            }
            _ => Ok(stored.version),
        }
    }
}

/// MemoryExtensionRepository 基于内存的Repository
///
/// 与SeaOrmExtensionRepository遵守相同的契约，用于测试和不配置数据库的运行方式。
/// 批次在状态副本上执行，全部成功后才替换当前状态。
#[derive(Debug, Default)]
pub struct MemoryExtensionRepository {
    state: RwLock<MemoryState>,
}

impl MemoryExtensionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExtensionRepository for MemoryExtensionRepository {
    async fn apply(&self, writes: Vec<Write>) -> Result<Committed, ExtensionError> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let mut committed = HashMap::new();

        for write in &writes {
            match write {
                Write::Create(raw) => {
                    if staged.objects.contains_key(&raw.name) {
                        return Err(ExtensionError::Conflict {
                            index: NAME_INDEX.to_string(),
                            value: raw.name.clone(),
                        });
                    }
                    staged.objects.insert(
                        raw.name.clone(),
                        StoredExtension {
                            data: raw.data.clone(),
                            version: 1,
                            unique_keys: raw.unique_keys.clone(),
                        },
                    );
                    committed.insert(raw.name.clone(), 1);
                }
                Write::Update(raw) => {
                    let next = staged.expect_version(&raw.name, raw.version)? + 1;
                    staged.objects.insert(
                        raw.name.clone(),
                        StoredExtension {
                            data: raw.data.clone(),
                            version: next,
                            unique_keys: raw.unique_keys.clone(),
                        },
                    );
                    committed.insert(raw.name.clone(), next);
                }
                Write::Delete { name, version } => {
                    staged.expect_version(name, *version)?;
                    staged.objects.remove(name);
                    committed.remove(name);
                }
            }
        }

        // 唯一索引按最终状态检查
        let touched: Vec<&str> = writes.iter().map(Write::name).collect();
        staged
            .unique_keys
            .retain(|_, owner| !touched.contains(&owner.as_str()));
        for name in &touched {
            let Some(stored) = staged.objects.get(*name) else {
                continue;
            };
            for key in &stored.unique_keys {
                let entry = (key.index.clone(), key.value.clone());
                match staged.unique_keys.get(&entry) {
                    Some(owner) if owner != name => {
                        return Err(ExtensionError::Conflict {
                            index: key.index.clone(),
                            value: key.value.clone(),
                        });
                    }
                    _ => {
                        staged.unique_keys.insert(entry, name.to_string());
                    }
                }
            }
        }

        *state = staged;
        Ok(Committed::new(committed))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<RawExtension>, ExtensionError> {
        Ok(self.state.read().await.raw(name))
    }

    async fn find_by_unique_key(&self, index: &str, value: &str) -> Result<Option<RawExtension>, ExtensionError> {
        let state = self.state.read().await;
        Ok(state
            .unique_keys
            .get(&(index.to_string(), value.to_string()))
            .and_then(|owner| state.raw(owner)))
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<RawExtension>, ExtensionError> {
        let state = self.state.read().await;
        Ok(state
            .objects
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter_map(|(name, _)| state.raw(name))
            .collect())
    }
}
