use crate::extension::{Extension, ExtensionError, RawExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// ExtensionConverter 负责Extension和存储形式之间的转换
pub trait ExtensionConverter: Send + Sync {
    fn convert_to<E: Extension + Serialize>(&self, extension: &E) -> Result<RawExtension, ExtensionError>;
    fn convert_from<E: Extension + DeserializeOwned>(&self, raw: &RawExtension) -> Result<E, ExtensionError>;
}

/// JSONExtensionConverter 使用JSON序列化的转换器
#[derive(Debug, Clone, Copy, Default)]
pub struct JSONExtensionConverter;

impl ExtensionConverter for JSONExtensionConverter {
    fn convert_to<E: Extension + Serialize>(&self, extension: &E) -> Result<RawExtension, ExtensionError> {
        let metadata = extension.metadata();
        Ok(RawExtension {
            name: E::gvk().store_name(&metadata.name),
            data: serde_json::to_vec(extension)?,
            version: metadata.version,
            unique_keys: extension.unique_keys(),
        })
    }

    fn convert_from<E: Extension + DeserializeOwned>(&self, raw: &RawExtension) -> Result<E, ExtensionError> {
        let mut extension: E = serde_json::from_slice(&raw.data)?;
        // 版本号以存储层为准
        extension.metadata_mut().version = raw.version;
        Ok(extension)
    }
}
