//! Wishlist commands.

use anyhow::{bail, Result};
use dialoguer::Confirm;
use lens_commerce::WishlistEntry;

use super::{WishlistArgs, WishlistCommand};
use crate::context::Context;
use crate::output::{format_price, format_timestamp, truncate};

/// Run the wishlist command.
pub async fn run(args: WishlistArgs, ctx: &Context) -> Result<()> {
    match args.command {
        Some(WishlistCommand::List) | None => list_wishlist(ctx),
        Some(WishlistCommand::Remove { id }) => remove_item(&id, ctx),
        Some(WishlistCommand::Clear { yes }) => clear_wishlist(yes, ctx),
    }
}

fn list_wishlist(ctx: &Context) -> Result<()> {
    let entries = ctx.library.wishlist();

    if ctx.output.is_json() {
        ctx.output.json(&entries);
        return Ok(());
    }

    ctx.output.header("Wishlist");

    if entries.is_empty() {
        ctx.output.info("Your wishlist is empty.");
        ctx.output.info("Save a result with `pricelens search <input> --save <position>`.");
        return Ok(());
    }

    let widths = [16, 40, 20, 10, 16];
    ctx.output
        .table_row(&["ID", "NAME", "STORE", "PRICE", "ADDED"], &widths);
    for entry in &entries {
        let name = truncate(&entry.name, widths[1]);
        let store = truncate(&entry.store_name, widths[2]);
        let price = format_price(entry.price);
        let added = format_timestamp(&entry.added_at);
        ctx.output
            .table_row(&[entry.id.as_str(), &name, &store, &price, &added], &widths);
    }

    ctx.output.info("");
    ctx.output.info(&format!(
        "Total: {} item(s), {}",
        entries.len(),
        format_price(total_price(&entries))
    ));
    Ok(())
}

fn remove_item(id: &str, ctx: &Context) -> Result<()> {
    if !ctx.library.remove_from_wishlist(id) {
        bail!("No wishlist item with ID '{}'", id);
    }

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "removed": id }));
    } else {
        ctx.output.success(&format!("Removed '{}' from wishlist", id));
    }
    Ok(())
}

fn clear_wishlist(yes: bool, ctx: &Context) -> Result<()> {
    let count = ctx.library.wishlist().len();
    if count == 0 {
        if ctx.output.is_json() {
            ctx.output.json(&serde_json::json!({ "cleared": 0 }));
        } else {
            ctx.output.info("Wishlist is already empty.");
        }
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove all {} saved item(s)?", count))
            .default(false)
            .interact()?;

        if !confirmed {
            ctx.output.warn("Cancelled");
            return Ok(());
        }
    }

    ctx.library.clear_wishlist();
    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "cleared": count }));
    } else {
        ctx.output.success(&format!("Removed {} item(s)", count));
    }
    Ok(())
}

fn total_price(entries: &[WishlistEntry]) -> f64 {
    entries.iter().map(|e| e.price).sum()
}
