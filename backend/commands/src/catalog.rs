//! Command catalog.
//!
//! Flattens the host's live command listing into addressable entries with
//! sequential ids and compact, model-facing briefs. A rebuild produces a new
//! immutable [`CatalogSnapshot`] off to the side and publishes it with one
//! pointer swap; dispatch always works against a complete snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use cmdrouter_core::{
    CommandHandler, CommandHost, CommandRecord, ParamDescriptor, PluginMetadata, RouterError,
};

use crate::codec;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Compact projection of one command, as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBrief {
    pub full_description: String,
    pub plugin_name: String,
    pub function_name: String,
    pub command_name: String,
    pub aliases: Vec<String>,
    /// Typed parameters only, argument name to type name, in order.
    pub args: IndexMap<String, String>,
    pub id: u32,
}

/// Identity of a command that survives rebuilds, unlike its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogKey {
    pub plugin: String,
    pub handler_full_name: String,
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin, self.handler_full_name)
    }
}

/// One invocable command in a snapshot.
#[derive(Clone)]
pub struct CatalogEntry {
    pub id: u32,
    pub record: CommandRecord,
    pub brief: CommandBrief,
    /// `"plugin:original command"`.
    pub label: String,
    pub key: CatalogKey,
    /// Handler captured from the plugin's handler table at build time.
    pub handler: Option<Arc<dyn CommandHandler>>,
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("key", &self.key)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable, fully built catalog.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    generation: u64,
    entries: BTreeMap<u32, CatalogEntry>,
    plugins: HashMap<String, PluginMetadata>,
    listing: String,
}

impl CatalogSnapshot {
    /// The snapshot in place before the first build.
    pub fn empty() -> Self {
        Self { listing: codec::render_catalog(std::iter::empty()), ..Self::default() }
    }

    /// Query the host and build a complete snapshot.
    pub async fn build(host: &dyn CommandHost, generation: u64) -> Result<Self, RouterError> {
        let records = host
            .list_commands()
            .await
            .map_err(|e| RouterError::Host(format!("listing commands failed: {e:#}")))?;

        let params: HashMap<String, ParamDescriptor> = host
            .collect_parameter_descriptors(true)
            .into_iter()
            .map(|d| (d.command_name.clone(), d))
            .collect();

        let mut builder = SnapshotBuilder {
            host,
            params,
            next_id: 0,
            entries: BTreeMap::new(),
            plugins: HashMap::new(),
        };
        for record in &records {
            builder.add(record);
        }

        let listing = codec::render_catalog(builder.entries.values().map(|e| &e.brief));
        debug!(
            "[Catalog] Built generation {} from {} host records ({} entries)",
            generation,
            records.len(),
            builder.entries.len()
        );
        Ok(Self { generation, entries: builder.entries, plugins: builder.plugins, listing })
    }

    /// Number of rebuilds that led to this snapshot; `0` means never built.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, id: u32) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    /// Look an entry up by its stable key.
    pub fn find_by_key(&self, key: &CatalogKey) -> Option<&CatalogEntry> {
        self.entries.values().find(|e| &e.key == key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn briefs(&self) -> impl Iterator<Item = &CommandBrief> {
        self.entries.values().map(|e| &e.brief)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plugin metadata seen during the build, disabled commands included.
    pub fn plugin(&self, name: &str) -> Option<&PluginMetadata> {
        self.plugins.get(name)
    }

    pub fn plugin_names(&self) -> BTreeSet<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Serialized brief list, rendered once per build.
    pub fn listing(&self) -> &str {
        &self.listing
    }

    pub fn build_prompt(&self, user_message: &str) -> String {
        codec::build_catalog_prompt(&self.listing, user_message)
    }
}

struct SnapshotBuilder<'a> {
    host: &'a dyn CommandHost,
    params: HashMap<String, ParamDescriptor>,
    next_id: u32,
    entries: BTreeMap<u32, CatalogEntry>,
    plugins: HashMap<String, PluginMetadata>,
}

impl SnapshotBuilder<'_> {
    fn add(&mut self, record: &CommandRecord) {
        self.cache_plugin(&record.plugin);
        if !record.enabled {
            debug!("[Catalog] Skipping disabled command {}", record.label());
            return;
        }

        if !record.is_group {
            let plugin_desc = self.plugin_description(&record.plugin);
            let description =
                format!("插件描述：{}\n指令描述：{}", plugin_desc, record.description);
            self.push(record, description);
            return;
        }

        for sub in &record.sub_commands {
            if !sub.enabled {
                debug!("[Catalog] Skipping disabled sub-command {}", sub.label());
                continue;
            }
            self.cache_plugin(&sub.plugin);
            let plugin_desc = self.plugin_description(&sub.plugin);
            let description = format!(
                "插件描述：{}\n指令组描述：{}\n本指令描述：{}",
                plugin_desc, record.description, sub.description
            );
            self.push(sub, description);
        }
    }

    fn cache_plugin(&mut self, name: &str) {
        if self.plugins.contains_key(name) {
            return;
        }
        match self.host.get_registered_plugin(name) {
            Some(meta) => {
                self.plugins.insert(name.to_string(), meta);
            }
            None => warn!("[Catalog] Plugin {} is listed but not registered", name),
        }
    }

    fn plugin_description(&self, name: &str) -> String {
        self.plugins.get(name).map(|p| p.description.clone()).unwrap_or_default()
    }

    fn push(&mut self, record: &CommandRecord, full_description: String) {
        self.next_id += 1;
        let id = self.next_id;

        let args: IndexMap<String, String> = self
            .params
            .get(&record.current_fragment)
            .map(|d| d.typed_params().map(|(n, t)| (n.to_string(), t.to_string())).collect())
            .unwrap_or_default();

        let handler = self
            .plugins
            .get(&record.plugin)
            .and_then(|p| p.handler(&record.handler_name))
            .cloned();

        let brief = CommandBrief {
            full_description,
            plugin_name: record.plugin.clone(),
            function_name: record.handler_name.clone(),
            command_name: record.current_fragment.clone(),
            aliases: record.aliases.clone(),
            args,
            id,
        };
        let entry = CatalogEntry {
            id,
            label: record.label(),
            key: CatalogKey {
                plugin: record.plugin.clone(),
                handler_full_name: record.handler_full_name.clone(),
            },
            record: record.clone(),
            brief,
            handler,
        };
        self.entries.insert(id, entry);
    }
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Plugin set changes between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub commands: usize,
}

impl CatalogDiff {
    pub fn between(before: &CatalogSnapshot, after: &CatalogSnapshot) -> Self {
        let old = before.plugin_names();
        let new = after.plugin_names();
        Self {
            added: new.difference(&old).cloned().collect(),
            removed: old.difference(&new).cloned().collect(),
            commands: after.len(),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Human-readable summary sent back to whoever asked for the sync.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("指令同步完成，共 {} 条可用指令。", self.commands)];
        if self.is_unchanged() {
            lines.push("插件无变化。".to_string());
        }
        if !self.added.is_empty() {
            lines.push(format!("新增插件：{}", self.added.join("、")));
        }
        if !self.removed.is_empty() {
            lines.push(format!("移除插件：{}", self.removed.join("、")));
        }
        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The published catalog. Readers clone the current snapshot and never hold
/// the lock across an await.
pub struct Catalog {
    host: Arc<dyn CommandHost>,
    current: RwLock<Arc<CatalogSnapshot>>,
    rebuild_lock: Mutex<()>,
}

impl Catalog {
    pub fn new(host: Arc<dyn CommandHost>) -> Self {
        Self {
            host,
            current: RwLock::new(Arc::new(CatalogSnapshot::empty())),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn host(&self) -> &Arc<dyn CommandHost> {
        &self.host
    }

    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Build a new snapshot and publish it. Rebuilds are serialized; on
    /// failure the previous snapshot stays in place.
    pub async fn rebuild(&self) -> Result<CatalogDiff, RouterError> {
        let _guard = self.rebuild_lock.lock().await;
        self.rebuild_locked().await
    }

    /// Build once if nothing has been published yet. Returns `None` when a
    /// snapshot already exists.
    pub async fn ensure_built(&self) -> Result<Option<CatalogDiff>, RouterError> {
        let _guard = self.rebuild_lock.lock().await;
        if self.snapshot().await.generation() > 0 {
            return Ok(None);
        }
        self.rebuild_locked().await.map(Some)
    }

    async fn rebuild_locked(&self) -> Result<CatalogDiff, RouterError> {
        let previous = self.snapshot().await;
        let next = CatalogSnapshot::build(self.host.as_ref(), previous.generation() + 1).await?;
        let diff = CatalogDiff::between(&previous, &next);

        *self.current.write().await = Arc::new(next);

        info!(
            added = ?diff.added,
            removed = ?diff.removed,
            "[Catalog] Published generation {} with {} commands",
            previous.generation() + 1,
            diff.commands
        );
        Ok(diff)
    }
}
