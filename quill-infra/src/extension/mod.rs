pub mod client;

pub use client::ReactiveExtensionClient;
