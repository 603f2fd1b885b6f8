//! Search command: derive a query, compare offers, optionally save one.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use console::style;
use indicatif::ProgressBar;
use lens_commerce::{Currency, PriceInsights, SearchResultSet, SearchType, WishlistItem, WishlistItemId, WishlistToggle};
use lens_observability::DiagnosticEvent;
use lens_search::{
    ImageFile, Notice, ProxyChoice, SearchInput, SearchObserver, SearchOptions,
    SearchOrchestrator, SearchOutcome,
};
use serde::Serialize;

use super::SearchArgs;
use crate::context::Context;
use crate::output::{format_price, truncate};

/// Machine-readable search report for `--json`.
#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    search_type: SearchType,
    recorded_in_history: bool,
    results: &'a SearchResultSet,
    insights: Option<PriceInsights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<SavedItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<DiagnosticEvent>,
}

#[derive(Debug, Serialize)]
struct SavedItem {
    id: WishlistItemId,
    position: u32,
    action: WishlistToggle,
}

/// Mirrors search progress onto the spinner.
struct SpinnerObserver {
    spinner: ProgressBar,
}

impl SearchObserver for SpinnerObserver {
    fn on_query_derived(&self, query: &str) {
        self.spinner.set_message(format!("Searching for \"{}\"...", query));
    }

    fn on_notice(&self, notice: &Notice) {
        self.spinner.set_message(notice.to_string());
    }
}

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let input = resolve_input(&args.input).await?;
    let config = ctx.search_config();
    let options = search_options(&args, config.default_limit);
    let currency = Currency::for_country(&config.gl);

    ctx.output.debug(&format!(
        "mock={} relay={}",
        options.mock.unwrap_or(config.mock_mode),
        config.selected_proxy().unwrap_or("direct")
    ));

    let spinner = ctx.output.spinner("Searching...");
    let orchestrator = SearchOrchestrator::from_config(config, ctx.library.clone(), ctx.diagnostics.clone())
        .with_observer(Arc::new(SpinnerObserver {
            spinner: spinner.clone(),
        }));

    let result = orchestrator.submit_with(input, options).await;
    spinner.finish_and_clear();
    let outcome = result.context("Search failed")?;

    let saved = match args.save {
        Some(position) => Some(save_result(&outcome, position, ctx)?),
        None => None,
    };
    let insights = PriceInsights::from_results_in(&outcome.results.results, currency);

    if ctx.output.is_json() {
        ctx.output.json(&SearchReport {
            query: &outcome.query,
            search_type: outcome.search_type,
            recorded_in_history: outcome.history_entry.is_some(),
            results: &outcome.results,
            insights,
            saved,
            diagnostics: ctx.diagnostics.snapshot(),
        });
        return Ok(());
    }

    print_results(&outcome, ctx);
    if let Some(insights) = &insights {
        print_insights(insights, ctx);
    }
    if let Some(saved) = &saved {
        match saved.action {
            WishlistToggle::Added => ctx
                .output
                .success(&format!("Saved result #{} to wishlist ({})", saved.position, saved.id)),
            WishlistToggle::Removed => ctx
                .output
                .success(&format!("Removed result #{} from wishlist ({})", saved.position, saved.id)),
        }
    }

    if outcome.history_entry.is_none() {
        ctx.output.debug("Placeholder query; not recorded in history");
    }
    if let Some(event) = ctx.diagnostics.last() {
        ctx.output
            .debug(&format!("Last fallback: [{}] {}", event.stage, event.message));
    }
    Ok(())
}

/// An existing file is searched as an image; anything else as a URL or text.
async fn resolve_input(input: &str) -> Result<SearchInput> {
    let path = Path::new(input);
    if path.is_file() {
        let image = ImageFile::load(path).await?;
        return Ok(SearchInput::image(image));
    }
    Ok(SearchInput::url(input))
}

/// `--mock`/`--live` apply to the whole search, image recognition included.
fn search_options(args: &SearchArgs, default_limit: usize) -> SearchOptions {
    let mut options = SearchOptions::default().with_limit(args.limit.unwrap_or(default_limit));
    if args.book {
        options = options.book();
    }
    if args.mock {
        options = options.with_mock(true);
    } else if args.live {
        options = options.with_mock(false);
    }
    if args.direct {
        options = options.with_proxy(ProxyChoice::Direct);
    } else if let Some(index) = args.proxy {
        options = options.with_proxy(ProxyChoice::Index(index));
    }
    options
}

fn save_result(outcome: &SearchOutcome, position: u32, ctx: &Context) -> Result<SavedItem> {
    let result = outcome
        .results
        .by_position(position)
        .with_context(|| format!("No result at position {}", position))?;

    let item = WishlistItem::from_result(result);
    let id = item.id.clone();
    let action = ctx.library.toggle_wishlist(item);
    tracing::debug!(id = %id, ?action, "wishlist toggled from search");
    Ok(SavedItem { id, position, action })
}

fn print_results(outcome: &SearchOutcome, ctx: &Context) {
    let results = &outcome.results;
    ctx.output
        .header(&format!("Results for \"{}\" ({})", outcome.query, outcome.search_type));

    if results.is_synthetic_data {
        let reason = results.fallback_reason.as_deref().unwrap_or("provider unavailable");
        ctx.output.banner(&format!("Demo data: {}", reason));
    }

    let best = results.best_value().map(|r| r.position);
    let title_width = ctx.output.term_width().saturating_sub(60).clamp(20, 50);
    let widths = [4, title_width, 20, 10, 18, 6];

    ctx.output
        .table_row(&["#", "TITLE", "STORE", "PRICE", "DELIVERY", ""], &widths);
    for offer in results.sorted_by_price() {
        let position = offer.position.to_string();
        let title = truncate(&offer.title, title_width);
        let store = truncate(&offer.source, 20);
        let price = if offer.has_price() {
            format_price(offer.extracted_price)
        } else {
            offer.price.clone()
        };
        let delivery = truncate(&offer.delivery_text, 18);
        let marker = if best == Some(offer.position) {
            style("best").green().bold().to_string()
        } else {
            String::new()
        };
        ctx.output
            .table_row(&[&position, &title, &store, &price, &delivery, &marker], &widths);
    }

    ctx.output.info("");
    ctx.output.info(&format!("{} offer(s)", results.len()));
}

fn print_insights(insights: &PriceInsights, ctx: &Context) {
    ctx.output.header("Price insights");
    ctx.output.kv("Lowest", &insights.lowest.display());
    ctx.output.kv("Highest", &insights.highest.display());
    ctx.output.kv("Average", &insights.average.display());
    ctx.output.kv("Spread", &insights.spread.display());
    ctx.output
        .kv("Resale score", &format!("{}/100", insights.resale_score));
    ctx.output.kv(
        "Best value",
        &format!(
            "#{} saves {} vs average",
            insights.best_value_position,
            insights.savings_vs_average().display()
        ),
    );
}
