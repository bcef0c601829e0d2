pub mod extension;
pub mod notification;

pub use extension::{
    Batch, Committed, Extension, ExtensionClient, ExtensionError, GroupVersionKind, ListOptions,
    ListResult, Metadata, RawExtension, UniqueKey, Write,
};

pub use notification::{Notifier, NotifyEvent};
