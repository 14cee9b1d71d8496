//! Demo plugin set served by the in-memory host.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use futures::stream;
use tracing::info;

use cmdrouter_core::{MessageEvent, OutgoingMessage};
use cmdrouter_plugins::{sdk, CommandManifest, PluginManifest, PluginRegistry};

fn moderation() -> PluginManifest {
    PluginManifest::new("moderation")
        .description("群管理工具")
        .command(
            CommandManifest::new("mute")
                .description("禁言指定成员，时长单位为分钟")
                .alias("禁言")
                .arg("user", "str")
                .arg("minutes", "int")
                .handler(sdk::single(|_event, args| async move {
                    let user = args.first().context("缺少成员参数")?;
                    let minutes: u32 = match args.get(1) {
                        Some(raw) => {
                            raw.parse().with_context(|| format!("无效的时长：{raw}"))?
                        }
                        None => 10,
                    };
                    let reply = format!("已禁言 {user} {minutes} 分钟");
                    Ok::<_, anyhow::Error>(OutgoingMessage::plain(reply))
                })),
        )
        .command(
            CommandManifest::new("kick")
                .description("将成员移出群聊")
                .arg("user", "str")
                .admin_only()
                .handler(sdk::single(|event: Arc<dyn MessageEvent>, args| async move {
                    let user = args.first().context("缺少成员参数")?;
                    let reply = format!("已将 {user} 移出群聊");
                    Ok::<_, anyhow::Error>(event.quote_result(&reply))
                })),
        )
        .command(
            CommandManifest::group("role")
                .description("成员角色管理")
                .sub(
                    CommandManifest::new("add")
                        .description("为成员添加角色")
                        .arg("user", "str")
                        .arg("role", "str")
                        .handler(sdk::single(|_event, args| async move {
                            let [user, role] = args.as_slice() else {
                                bail!("需要成员和角色两个参数")
                            };
                            Ok(OutgoingMessage::plain(format!("已为 {user} 添加角色 {role}")))
                        })),
                )
                .sub(
                    CommandManifest::new("remove")
                        .description("移除成员的角色")
                        .arg("user", "str")
                        .arg("role", "str")
                        .handler(sdk::single(|_event, args| async move {
                            let [user, role] = args.as_slice() else {
                                bail!("需要成员和角色两个参数")
                            };
                            Ok(OutgoingMessage::plain(format!("已移除 {user} 的角色 {role}")))
                        })),
                ),
        )
}

fn weather() -> PluginManifest {
    PluginManifest::new("weather")
        .description("天气查询")
        .command(
            CommandManifest::new("forecast")
                .description("查询城市未来三天的天气")
                .alias("天气")
                .arg("city", "GreedyStr")
                .handler(sdk::streaming(|_event, args| {
                    let city = args.join(" ");
                    let days = ["今天：晴", "明天：多云", "后天：小雨"];
                    stream::iter(
                        days.map(move |d| Ok(OutgoingMessage::plain(format!("{city} {d}")))),
                    )
                })),
        )
}

fn notes(store: Arc<Mutex<Vec<String>>>) -> PluginManifest {
    let listing = Arc::clone(&store);
    PluginManifest::new("notes")
        .description("简单的备忘录")
        .command(
            CommandManifest::new("remember")
                .description("记住一段文字，不回复")
                .arg("text", "GreedyStr")
                .handler(sdk::silent(move |_event, args| {
                    let text = args.join(" ");
                    info!("[Demo] Remembering note: {}", text);
                    store.lock().unwrap_or_else(|e| e.into_inner()).push(text);
                    Ok(())
                })),
        )
        .command(
            CommandManifest::new("notes")
                .description("列出所有备忘")
                .handler(sdk::single(move |_event, _args| {
                    let all = listing.lock().unwrap_or_else(|e| e.into_inner()).clone();
                    async move {
                        if all.is_empty() {
                            return Ok(OutgoingMessage::plain("还没有备忘"));
                        }
                        Ok(OutgoingMessage::plain(all.join("\n")))
                    }
                })),
        )
}

/// Host preloaded with the demo plugins.
pub fn demo_host() -> Arc<PluginRegistry> {
    let host = PluginRegistry::new();
    host.register(moderation());
    host.register(weather());
    host.register(notes(Arc::default()));
    Arc::new(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdrouter_core::{CommandHost, TextEvent};
    use futures::StreamExt;

    #[tokio::test]
    async fn demo_commands_are_listed() {
        let host = demo_host();
        let records = host.list_commands().await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.original_command.as_str()).collect();
        assert_eq!(names, vec!["mute", "kick", "role", "forecast", "remember", "notes"]);
    }

    #[tokio::test]
    async fn notes_round_trip_through_handlers() {
        let host = demo_host();
        let meta = host.get_registered_plugin("notes").unwrap();
        let event: Arc<dyn MessageEvent> = Arc::new(TextEvent::new("记一下"));

        let remember = meta.handler("remember").unwrap();
        let out = remember.invoke(event.clone(), vec!["买牛奶".into()]).unwrap();
        assert_eq!(out.shape(), "nothing");

        let out = meta.handler("notes").unwrap().invoke(event, vec![]).unwrap();
        let replies: Vec<_> = out.into_stream().collect().await;
        assert_eq!(replies[0].as_ref().unwrap().text(), "买牛奶");
    }
}
