/// Command dispatch: resolve a model match to a live handler and invoke it.
use std::sync::Arc;

use anyhow::Result;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, info, warn};

use cmdrouter_core::{CommandHandler, MessageEvent, OutgoingMessage, RouterError};

use crate::catalog::{CatalogEntry, CatalogSnapshot};
use crate::codec::MatchResult;
use crate::filter::permission_filter;
use crate::lifecycle::SyncController;

/// Replies produced by one dispatch. Handler errors surface as `Err` items.
pub type DispatchStream = BoxStream<'static, Result<OutgoingMessage>>;

/// Human-readable form of a match: `"<command>，参数：<params>"`.
///
/// `label` is the entry's `"plugin:original command"` label; empty
/// parameters render as `无`.
pub fn describe(label: &str, parameters: &[String]) -> String {
    let command = label.split_once(':').map(|(_, c)| c).unwrap_or(label);
    let params = if parameters.is_empty() { "无".to_string() } else { parameters.join(" ") };
    format!("{command}，参数：{params}")
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

enum Resolution {
    Ready(Arc<dyn CommandHandler>),
    Deactivated,
    Stale(&'static str),
}

fn same_handler(a: &Arc<dyn CommandHandler>, b: &Arc<dyn CommandHandler>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher {
    sync: Arc<SyncController>,
    matched_tips: bool,
}

impl Dispatcher {
    pub fn new(sync: Arc<SyncController>, matched_tips: bool) -> Self {
        Self { sync, matched_tips }
    }

    fn resolve(&self, entry: &CatalogEntry) -> Resolution {
        let host = self.sync.catalog().host();
        let Some(live) = host.get_registered_plugin(&entry.record.plugin) else {
            return Resolution::Stale("plugin no longer registered");
        };
        let Some(live_handler) = live.handler(&entry.record.handler_name) else {
            return Resolution::Stale("handler no longer exposed");
        };
        let Some(captured) = &entry.handler else {
            return Resolution::Stale("no handler captured at build time");
        };
        if !same_handler(captured, live_handler) {
            return Resolution::Stale("handler replaced since build");
        }
        if !live.activated {
            return Resolution::Deactivated;
        }
        Resolution::Ready(Arc::clone(captured))
    }

    /// Resolve `id` against the snapshot the model was prompted with,
    /// resyncing once if that entry turns out to be stale. `None` means the
    /// plugin is deactivated.
    async fn target(
        &self,
        snapshot: &CatalogSnapshot,
        id: u32,
    ) -> Result<Option<(CatalogEntry, Arc<dyn CommandHandler>)>, RouterError> {
        let entry = snapshot.get(id).ok_or(RouterError::UnknownCommand(id))?;

        let reason = match self.resolve(entry) {
            Resolution::Ready(handler) => return Ok(Some((entry.clone(), handler))),
            Resolution::Deactivated => {
                let plugin = &entry.record.plugin;
                info!("[Dispatch] Plugin {} is deactivated, ignoring {}", plugin, entry.label);
                return Ok(None);
            }
            Resolution::Stale(reason) => reason,
        };

        warn!(
            id = id,
            key = %entry.key,
            "[Dispatch] Stale catalog entry {}: {}",
            entry.label,
            reason
        );
        let key = entry.key.clone();
        let label = entry.label.clone();
        self.sync.resync_after_drift(&label).await?;

        let refreshed = self.sync.catalog().snapshot().await;
        let Some(entry) = refreshed.find_by_key(&key) else {
            return Err(RouterError::CatalogOutOfSync { command: label });
        };
        match self.resolve(entry) {
            Resolution::Ready(handler) => Ok(Some((entry.clone(), handler))),
            Resolution::Deactivated => Ok(None),
            Resolution::Stale(_) => Err(RouterError::CatalogOutOfSync { command: label }),
        }
    }

    /// Act on a model match and return the replies to send. `snapshot` must
    /// be the catalog the prompt was rendered from, since ids are only
    /// meaningful against it.
    ///
    /// Non-matches and deactivated plugins produce no replies. A denied
    /// permission check produces exactly one reply and skips the handler.
    pub async fn dispatch(
        &self,
        snapshot: &CatalogSnapshot,
        event: Arc<dyn MessageEvent>,
        result: MatchResult,
    ) -> Result<DispatchStream, RouterError> {
        let MatchResult::Matched { id, parameters, .. } = result else {
            return Ok(stream::empty().boxed());
        };

        let Some((entry, handler)) = self.target(snapshot, id).await? else {
            return Ok(stream::empty().boxed());
        };

        let description = describe(&entry.label, &parameters);
        if !permission_filter(event.as_ref(), &entry.record.permission) {
            info!(
                sender = %event.sender_id(),
                "[Dispatch] Permission denied for {} (requires {})",
                entry.label,
                entry.record.permission
            );
            let denied =
                event.plain_result(&format!("成功匹配指令：{description}，但你无权调用。"));
            return Ok(stream::once(future::ready(Ok(denied))).boxed());
        }

        let mut prelude = Vec::new();
        if self.matched_tips {
            prelude.push(Ok(event.plain_result(&format!("成功匹配指令：{description}。"))));
        }

        info!(id = entry.id, args = parameters.len(), "[Dispatch] Invoking {}", entry.key);
        let output = handler.invoke(Arc::clone(&event), parameters)?;
        debug!("[Dispatch] {} returned {}", entry.label, output.shape());

        Ok(stream::iter(prelude).chain(output.into_stream()).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cmdrouter_core::TextEvent;
    use cmdrouter_plugins::{sdk, CommandManifest, PluginManifest, PluginRegistry};

    use crate::catalog::Catalog;

    type Calls = Arc<Mutex<Vec<Vec<String>>>>;

    fn recording(calls: &Calls, reply: &'static str) -> Arc<dyn CommandHandler> {
        let calls = Arc::clone(calls);
        sdk::single(move |_event, args| {
            calls.lock().unwrap().push(args);
            async move { Ok(OutgoingMessage::plain(reply)) }
        })
    }

    async fn setup(calls: &Calls, matched_tips: bool) -> (Arc<PluginRegistry>, Dispatcher) {
        let host = Arc::new(PluginRegistry::new());
        host.register(
            PluginManifest::new("mod")
                .command(
                    CommandManifest::new("kick")
                        .arg("user", "str")
                        .handler(recording(calls, "kicked")),
                )
                .command(
                    CommandManifest::new("ban")
                        .arg("user", "str")
                        .admin_only()
                        .handler(recording(calls, "banned")),
                ),
        );
        let sync = Arc::new(SyncController::new(Arc::new(Catalog::new(host.clone()))));
        sync.on_host_ready().await.unwrap();
        (host, Dispatcher::new(sync, matched_tips))
    }

    fn matched(id: u32, params: &[&str]) -> MatchResult {
        MatchResult::Matched {
            id,
            parameters: params.iter().map(|p| p.to_string()).collect(),
            confidence: Some(0.9),
        }
    }

    /// Dispatch against whatever snapshot is published right now.
    async fn current(
        dispatcher: &Dispatcher,
        event: Arc<dyn MessageEvent>,
        result: MatchResult,
    ) -> Result<DispatchStream, RouterError> {
        let snapshot = dispatcher.sync.catalog().snapshot().await;
        dispatcher.dispatch(&snapshot, event, result).await
    }

    async fn texts(stream: DispatchStream) -> Vec<String> {
        stream.map(|r| r.unwrap().text().to_string()).collect().await
    }

    fn event(admin: bool) -> Arc<dyn MessageEvent> {
        Arc::new(TextEvent::new("msg").admin(admin))
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe("mod:ban", &["alice".to_string()]), "ban，参数：alice");
        assert_eq!(describe("mod:ban", &[]), "ban，参数：无");
        assert_eq!(describe("mod:role add", &["a".into(), "b".into()]), "role add，参数：a b");
    }

    #[tokio::test]
    async fn test_not_matched_is_silent() {
        let calls = Calls::default();
        let (_, dispatcher) = setup(&calls, false).await;
        let chat = MatchResult::NotMatched { reason: "闲聊".into() };
        let out = current(&dispatcher, event(false), chat).await.unwrap();
        assert!(texts(out).await.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_matched_tips_precede_handler_reply() {
        let calls = Calls::default();
        let (_, dispatcher) = setup(&calls, true).await;
        let out = current(&dispatcher, event(false), matched(1, &["alice"])).await.unwrap();
        assert_eq!(texts(out).await, vec!["成功匹配指令：kick，参数：alice。", "kicked"]);
        assert_eq!(*calls.lock().unwrap(), vec![vec!["alice".to_string()]]);
    }

    #[tokio::test]
    async fn test_admin_check() {
        let calls = Calls::default();
        let (_, dispatcher) = setup(&calls, true).await;
        let denied = current(&dispatcher, event(false), matched(2, &["alice"])).await.unwrap();
        assert_eq!(texts(denied).await, vec!["成功匹配指令：ban，参数：alice，但你无权调用。"]);
        assert!(calls.lock().unwrap().is_empty());

        let allowed = current(&dispatcher, event(true), matched(2, &["alice"])).await.unwrap();
        assert_eq!(texts(allowed).await.last().map(String::as_str), Some("banned"));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let calls = Calls::default();
        let (_, dispatcher) = setup(&calls, false).await;
        let err = current(&dispatcher, event(false), matched(99, &[])).await.err().unwrap();
        assert!(matches!(err, RouterError::UnknownCommand(99)));
    }

    #[tokio::test]
    async fn test_ids_resolve_against_prompted_snapshot() {
        let calls = Calls::default();
        let (host, dispatcher) = setup(&calls, false).await;
        let prompted = dispatcher.sync.catalog().snapshot().await;

        // A concurrent sync shifts ban from id 2 to id 1.
        host.set_command_enabled("mod", "kick", false);
        dispatcher.sync.sync().await.unwrap();
        let published = dispatcher.sync.catalog().snapshot().await;
        assert_eq!(published.get(1).unwrap().label, "mod:ban");

        let out =
            dispatcher.dispatch(&prompted, event(true), matched(1, &["alice"])).await.unwrap();
        assert_eq!(texts(out).await, vec!["kicked"]);
    }

    #[tokio::test]
    async fn test_replaced_handler_triggers_one_resync() {
        let calls = Calls::default();
        let (host, dispatcher) = setup(&calls, false).await;
        host.replace_handler("mod", "kick", recording(&calls, "kicked v2"));

        let out = current(&dispatcher, event(false), matched(1, &["bob"])).await.unwrap();
        assert_eq!(texts(out).await, vec!["kicked v2"]);
        assert_eq!(dispatcher.sync.catalog().snapshot().await.generation(), 2);
    }

    #[tokio::test]
    async fn test_retry_follows_key_after_ids_shift() {
        let calls = Calls::default();
        let (host, dispatcher) = setup(&calls, false).await;
        host.set_command_enabled("mod", "kick", false);
        host.replace_handler("mod", "ban", recording(&calls, "banned v2"));

        let out = current(&dispatcher, event(true), matched(2, &["eve"])).await.unwrap();
        assert_eq!(texts(out).await, vec!["banned v2"]);
        let snapshot = dispatcher.sync.catalog().snapshot().await;
        assert_eq!(snapshot.get(1).unwrap().label, "mod:ban");
    }

    #[tokio::test]
    async fn test_missing_handler_is_out_of_sync_after_retry() {
        let calls = Calls::default();
        let (host, dispatcher) = setup(&calls, false).await;
        host.remove_handler("mod", "kick");

        let err = current(&dispatcher, event(false), matched(1, &["bob"])).await.err().unwrap();
        assert!(
            matches!(err, RouterError::CatalogOutOfSync { ref command } if command == "mod:kick")
        );
        assert_eq!(dispatcher.sync.catalog().snapshot().await.generation(), 2);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unloaded_plugin_is_out_of_sync() {
        let calls = Calls::default();
        let (host, dispatcher) = setup(&calls, false).await;
        host.unload("mod");
        let err = current(&dispatcher, event(false), matched(1, &["bob"])).await.err().unwrap();
        assert!(matches!(err, RouterError::CatalogOutOfSync { .. }));
    }

    #[tokio::test]
    async fn test_streaming_handler_forwards_every_reply() {
        let host = Arc::new(PluginRegistry::new());
        let count = sdk::streaming(|_event, args| {
            let n: usize = args.first().and_then(|a| a.parse().ok()).unwrap_or(0);
            stream::iter((1..=n).map(|i| Ok(OutgoingMessage::plain(i.to_string()))))
        });
        host.register(
            PluginManifest::new("count")
                .command(CommandManifest::new("count").arg("n", "int").handler(count)),
        );
        let sync = Arc::new(SyncController::new(Arc::new(Catalog::new(host))));
        sync.on_host_ready().await.unwrap();
        let dispatcher = Dispatcher::new(sync, false);

        let out = current(&dispatcher, event(false), matched(1, &["3"])).await.unwrap();
        assert_eq!(texts(out).await, vec!["1", "2", "3"]);
    }
}
