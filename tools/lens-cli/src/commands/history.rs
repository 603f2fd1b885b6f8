//! Search history commands.

use anyhow::Result;
use dialoguer::Confirm;

use super::{HistoryArgs, HistoryCommand};
use crate::context::Context;
use crate::output::{format_timestamp, truncate};

/// Run the history command.
pub async fn run(args: HistoryArgs, ctx: &Context) -> Result<()> {
    match args.command {
        Some(HistoryCommand::List) | None => list_history(ctx),
        Some(HistoryCommand::Clear { yes }) => clear_history(yes, ctx),
    }
}

fn list_history(ctx: &Context) -> Result<()> {
    let history = ctx.library.history();

    if ctx.output.is_json() {
        ctx.output.json(&history);
        return Ok(());
    }

    ctx.output.header("Search history");

    if history.is_empty() {
        ctx.output.info("No searches yet.");
        ctx.output.info("Run `pricelens search <url-or-image>` to start.");
        return Ok(());
    }

    let widths = [18, 6, 50];
    ctx.output.table_row(&["WHEN", "TYPE", "SEARCH"], &widths);
    for entry in &history {
        let when = format_timestamp(&entry.timestamp);
        let kind = entry.search_type.to_string();
        let term = truncate(&entry.search_term, widths[2]);
        ctx.output.table_row(&[&when, &kind, &term], &widths);
    }

    ctx.output.info("");
    ctx.output.info(&format!("Total: {} search(es)", history.len()));
    Ok(())
}

fn clear_history(yes: bool, ctx: &Context) -> Result<()> {
    let count = ctx.library.history().len();
    if count == 0 {
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!({ "cleared": 0 }));
        } else {
            ctx.output.info("History is already empty.");
        }
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Clear {} search(es) from history?", count))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Cancelled");
            return Ok(());
        }
    }

    ctx.library.clear_history();
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "cleared": count }));
    } else {
        ctx.output.success(&format!("Cleared {} search(es)", count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::context;
    use lens_commerce::SearchType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_clear_with_yes_empties_history() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);
        ctx.library.add_history("desk lamp", SearchType::Url);
        ctx.library.add_history("vintage camera", SearchType::Image);

        run(
            HistoryArgs {
                command: Some(HistoryCommand::Clear { yes: true }),
            },
            &ctx,
        )
        .await
        .unwrap();

        assert!(ctx.library.history().is_empty());
        assert!(context(&dir, None).library.history().is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_history() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);
        run(HistoryArgs { command: None }, &ctx).await.unwrap();
    }
}
