use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::handler::CommandHandler;

/// One command as reported by the host's command listing.
///
/// Groups carry their sub-commands in `sub_commands`; the sub-commands are
/// always leaves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    /// Globally unique handler path, e.g. `"moderation.main.mute"`.
    pub handler_full_name: String,
    /// Handler name as exposed in the plugin's handler table.
    pub handler_name: String,
    /// Owning plugin name.
    pub plugin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    /// Full command text as registered (`"role add"` for a group member).
    pub original_command: String,
    /// Last fragment of the command, the name a user actually types.
    pub current_fragment: String,
    #[serde(default)]
    pub effective_command: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Permission requirement, `"everyone"` or `"admin"`.
    #[serde(default = "default_permission")]
    pub permission: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub sub_commands: Vec<CommandRecord>,
}

fn default_permission() -> String {
    "everyone".to_string()
}

fn default_enabled() -> bool {
    true
}

impl CommandRecord {
    /// `"plugin:original command"`, used in human-readable descriptions.
    pub fn label(&self) -> String {
        format!("{}:{}", self.plugin, self.original_command)
    }
}

/// A declared handler parameter. `type_name` is `None` when the parameter has
/// no concrete type (event/context parameters, untyped defaults).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerParam {
    pub name: String,
    #[serde(default)]
    pub type_name: Option<String>,
}

impl HandlerParam {
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: Some(type_name.into()) }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: None }
    }
}

/// Parameter declarations for one command, as exposed by host introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub command_name: String,
    /// Declaration order is positional order.
    pub params: Vec<HandlerParam>,
}

impl ParamDescriptor {
    /// Parameters with a concrete type, in declaration order.
    pub fn typed_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter_map(|p| p.type_name.as_deref().map(|t| (p.name.as_str(), t)))
    }
}

/// Per-plugin metadata looked up by plugin name.
#[derive(Clone)]
pub struct PluginMetadata {
    pub name: String,
    pub description: String,
    pub activated: bool,
    /// Handler table keyed by handler name.
    pub handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl PluginMetadata {
    pub fn handler(&self, name: &str) -> Option<&Arc<dyn CommandHandler>> {
        self.handlers.get(name)
    }
}

impl fmt::Debug for PluginMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("PluginMetadata")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("activated", &self.activated)
            .field("handlers", &names)
            .finish()
    }
}
