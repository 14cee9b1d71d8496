//! Plugin registry: an in-memory plugin host.
//!
//! Implements [`CommandHost`] over registered [`PluginManifest`]s so the
//! router can run without an external host. Registration order is listing
//! order.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, info};

use cmdrouter_core::{
    CommandHandler, CommandHost, CommandRecord, HandlerParam, ParamDescriptor, PluginMetadata,
};

use crate::manifest::{CommandManifest, PluginManifest};

#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<IndexMap<String, PluginManifest>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any plugin with the same name.
    pub fn register(&self, manifest: PluginManifest) {
        info!("[Plugins] Registered: {} ({} commands)", manifest.name, manifest.commands.len());
        self.write(|plugins| {
            plugins.insert(manifest.name.clone(), manifest);
        });
    }

    pub fn unload(&self, name: &str) -> bool {
        let removed = self.write(|plugins| plugins.shift_remove(name).is_some());
        if removed {
            info!("[Plugins] Unloaded: {}", name);
        }
        removed
    }

    pub fn activate(&self, name: &str) -> bool {
        self.set_activated(name, true)
    }

    pub fn deactivate(&self, name: &str) -> bool {
        self.set_activated(name, false)
    }

    fn set_activated(&self, name: &str, activated: bool) -> bool {
        self.write(|plugins| match plugins.get_mut(name) {
            Some(p) => {
                p.activated = activated;
                true
            }
            None => false,
        })
    }

    /// Enable or disable a command by its full text (`"role add"` for group
    /// members, `"role"` for the whole group).
    pub fn set_command_enabled(&self, plugin: &str, command: &str, enabled: bool) -> bool {
        self.with_command(plugin, command, |c| c.enabled = enabled)
    }

    /// Swap the handler behind a command, as a plugin reload would.
    pub fn replace_handler(
        &self,
        plugin: &str,
        command: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> bool {
        self.with_command(plugin, command, |c| c.handler = Some(handler))
    }

    /// Drop the handler behind a command while keeping it listed.
    pub fn remove_handler(&self, plugin: &str, command: &str) -> bool {
        self.with_command(plugin, command, |c| c.handler = None)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.read(|plugins| plugins.keys().cloned().collect())
    }

    fn with_command(
        &self,
        plugin: &str,
        command: &str,
        f: impl FnOnce(&mut CommandManifest),
    ) -> bool {
        let mut parts = command.split_whitespace();
        let Some(head) = parts.next() else { return false };
        let tail = parts.next();

        self.write(|plugins| {
            let Some(manifest) = plugins.get_mut(plugin) else { return false };
            let Some(top) = manifest.commands.iter_mut().find(|c| c.name == head) else {
                return false;
            };
            let target = match tail {
                None => Some(top),
                Some(sub) => top.sub_commands.iter_mut().find(|c| c.name == sub),
            };
            match target {
                Some(c) => {
                    f(c);
                    true
                }
                None => false,
            }
        })
    }

    fn read<T>(&self, f: impl FnOnce(&IndexMap<String, PluginManifest>) -> T) -> T {
        let guard = self.plugins.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut IndexMap<String, PluginManifest>) -> T) -> T {
        let mut guard = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

fn leaf_handler_name(parent: Option<&str>, command: &CommandManifest) -> String {
    match (&command.handler_name, parent) {
        (Some(name), _) => name.clone(),
        (None, Some(group)) => format!("{group}_{}", command.name),
        (None, None) => command.name.clone(),
    }
}

fn leaf_record(plugin: &str, parent: Option<&str>, command: &CommandManifest) -> CommandRecord {
    let handler_name = leaf_handler_name(parent, command);
    let original = match parent {
        Some(group) => format!("{group} {}", command.name),
        None => command.name.clone(),
    };
    CommandRecord {
        handler_full_name: format!("{plugin}.{handler_name}"),
        handler_name,
        plugin: plugin.to_string(),
        plugin_display_name: None,
        description: command.description.clone(),
        effective_command: original.clone(),
        original_command: original,
        current_fragment: command.name.clone(),
        aliases: command.aliases.clone(),
        permission: command.permission.clone(),
        enabled: command.enabled,
        is_group: false,
        sub_commands: Vec::new(),
    }
}

fn command_record(plugin: &str, command: &CommandManifest) -> CommandRecord {
    if !command.is_group {
        return leaf_record(plugin, None, command);
    }
    let handler_name = leaf_handler_name(None, command);
    CommandRecord {
        handler_full_name: format!("{plugin}.{handler_name}"),
        handler_name,
        plugin: plugin.to_string(),
        plugin_display_name: None,
        description: command.description.clone(),
        original_command: command.name.clone(),
        current_fragment: command.name.clone(),
        effective_command: command.name.clone(),
        aliases: command.aliases.clone(),
        permission: command.permission.clone(),
        enabled: command.enabled,
        is_group: true,
        sub_commands: command
            .sub_commands
            .iter()
            .map(|sub| leaf_record(plugin, Some(&command.name), sub))
            .collect(),
    }
}

fn descriptor(command: &CommandManifest) -> ParamDescriptor {
    let mut params = vec![HandlerParam::untyped("event")];
    params.extend(command.params.iter().cloned());
    ParamDescriptor { command_name: command.name.clone(), params }
}

#[async_trait]
impl CommandHost for PluginRegistry {
    async fn list_commands(&self) -> Result<Vec<CommandRecord>> {
        let records: Vec<CommandRecord> = self.read(|plugins| {
            plugins
                .values()
                .flat_map(|p| p.commands.iter().map(move |c| command_record(&p.name, c)))
                .collect()
        });
        debug!("[Plugins] Listed {} commands", records.len());
        Ok(records)
    }

    fn collect_parameter_descriptors(&self, include_sub_commands: bool) -> Vec<ParamDescriptor> {
        self.read(|plugins| {
            let mut out = Vec::new();
            for command in plugins.values().flat_map(|p| p.commands.iter()) {
                if !command.is_group {
                    out.push(descriptor(command));
                } else if include_sub_commands {
                    out.extend(command.sub_commands.iter().map(descriptor));
                }
            }
            out
        })
    }

    fn get_registered_plugin(&self, name: &str) -> Option<PluginMetadata> {
        self.read(|plugins| {
            let manifest = plugins.get(name)?;
            let mut handlers: HashMap<String, Arc<dyn CommandHandler>> = HashMap::new();
            for command in &manifest.commands {
                if command.is_group {
                    for sub in &command.sub_commands {
                        if let Some(h) = &sub.handler {
                            let name = leaf_handler_name(Some(&command.name), sub);
                            handlers.insert(name, Arc::clone(h));
                        }
                    }
                } else if let Some(h) = &command.handler {
                    handlers.insert(leaf_handler_name(None, command), Arc::clone(h));
                }
            }
            Some(PluginMetadata {
                name: manifest.name.clone(),
                description: manifest.description.clone(),
                activated: manifest.activated,
                handlers,
            })
        })
    }
}
