//! `cmdrouter catalog`: show what the model gets to choose from.

use anyhow::Result;

use cmdrouter_commands::{CatalogEntry, CommandRouter};

use crate::terminal_output::{note_info, render_table, Column};

fn args_cell(entry: &CatalogEntry) -> String {
    entry
        .brief
        .args
        .iter()
        .map(|(name, ty)| format!("{name}:{ty}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub async fn run(router: &CommandRouter, message: Option<&str>, json: bool) -> Result<()> {
    let diff = router.catalog().rebuild().await?;
    let snapshot = router.catalog().snapshot().await;

    if json {
        let briefs: Vec<_> = snapshot.briefs().collect();
        println!("{}", serde_json::to_string_pretty(&briefs)?);
    } else {
        let columns = [
            Column::right("ID"),
            Column::left("插件"),
            Column::left("指令"),
            Column::left("参数").max_width(32),
            Column::left("权限"),
        ];
        let rows: Vec<Vec<String>> = snapshot
            .entries()
            .map(|e| {
                vec![
                    e.id.to_string(),
                    e.record.plugin.clone(),
                    e.record.original_command.clone(),
                    args_cell(e),
                    e.record.permission.clone(),
                ]
            })
            .collect();
        print!("{}", render_table(&columns, &rows));
        let plugins = snapshot.plugin_names().len();
        note_info(&format!("{} 条指令，来自 {} 个插件", diff.commands, plugins));
    }

    if let Some(message) = message {
        println!();
        println!("{}", snapshot.build_prompt(message));
    }
    Ok(())
}
