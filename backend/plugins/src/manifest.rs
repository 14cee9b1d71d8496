//! Plugin and command declarations for the in-memory host.

use std::fmt;
use std::sync::Arc;

use cmdrouter_core::{CommandHandler, HandlerParam};

/// A plugin as registered with [`crate::PluginRegistry`].
#[derive(Clone)]
pub struct PluginManifest {
    pub name: String,
    pub description: String,
    pub activated: bool,
    pub commands: Vec<CommandManifest>,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            activated: true,
            commands: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn activated(mut self, activated: bool) -> Self {
        self.activated = activated;
        self
    }

    pub fn command(mut self, command: CommandManifest) -> Self {
        self.commands.push(command);
        self
    }
}

impl fmt::Debug for PluginManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManifest")
            .field("name", &self.name)
            .field("activated", &self.activated)
            .field("commands", &self.commands)
            .finish()
    }
}

/// A leaf command or a command group.
#[derive(Clone)]
pub struct CommandManifest {
    pub name: String,
    pub description: String,
    pub aliases: Vec<String>,
    pub permission: String,
    pub enabled: bool,
    /// Declared parameters after the implicit event parameter.
    pub params: Vec<HandlerParam>,
    /// Defaults to the command name (`group_name` for group members).
    pub handler_name: Option<String>,
    pub handler: Option<Arc<dyn CommandHandler>>,
    pub is_group: bool,
    pub sub_commands: Vec<CommandManifest>,
}

impl CommandManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            aliases: Vec::new(),
            permission: "everyone".to_string(),
            enabled: true,
            params: Vec::new(),
            handler_name: None,
            handler: None,
            is_group: false,
            sub_commands: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self { is_group: true, ..Self::new(name) }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.permission = "admin".to_string();
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Typed positional parameter, e.g. `arg("user", "str")`.
    pub fn arg(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.params.push(HandlerParam::typed(name, type_name));
        self
    }

    /// Parameter without a concrete type; never shown to the model.
    pub fn untyped_arg(mut self, name: impl Into<String>) -> Self {
        self.params.push(HandlerParam::untyped(name));
        self
    }

    pub fn handler_name(mut self, name: impl Into<String>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    pub fn handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn sub(mut self, command: CommandManifest) -> Self {
        self.sub_commands.push(command);
        self
    }
}

impl fmt::Debug for CommandManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandManifest")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("is_group", &self.is_group)
            .field("has_handler", &self.handler.is_some())
            .field("sub_commands", &self.sub_commands)
            .finish()
    }
}
