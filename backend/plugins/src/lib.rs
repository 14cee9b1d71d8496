pub mod manifest;
pub mod registry;
pub mod sdk;

pub use manifest::{CommandManifest, PluginManifest};
pub use registry::PluginRegistry;
