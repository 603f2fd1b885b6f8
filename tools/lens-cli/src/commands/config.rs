//! Configuration and preference commands.

use anyhow::{bail, Result};
use lens_search::{Preferences, SearchConfig};
use serde::Serialize;

use super::{ConfigArgs, ConfigCommand};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Proxy { index } => select_proxy(index, ctx),
        ConfigCommand::Mock { state } => set_mock(&state, ctx),
        ConfigCommand::Path => show_paths(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

/// Effective configuration with the API key masked.
#[derive(Serialize)]
struct ConfigView {
    config_file: Option<String>,
    data_dir: String,
    user: Option<String>,
    search: SearchConfig,
    preferences: Preferences,
}

fn show_config(ctx: &Context) -> Result<()> {
    let mut search = ctx.search_config();
    search.api_key = mask_secret(&search.api_key);
    search.proxy_api_key = search.proxy_api_key.as_deref().map(mask_secret);

    let view = ConfigView {
        config_file: ctx.config_path.as_ref().map(|p| p.display().to_string()),
        data_dir: ctx.data_dir().display().to_string(),
        user: ctx.library.scope().identity_id().map(|id| id.to_string()),
        search,
        preferences: ctx.preferences(),
    };

    if ctx.output.is_json() {
        ctx.output.json(&view);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    ctx.output
        .kv("config file", view.config_file.as_deref().unwrap_or("(defaults)"));
    ctx.output.kv("data dir", &view.data_dir);
    ctx.output.kv("user", view.user.as_deref().unwrap_or("(anonymous)"));

    let search = &view.search;
    ctx.output.info("");
    ctx.output.info("[search]");
    ctx.output.kv("provider_url", &search.provider_url);
    ctx.output.kv("api_key", &search.api_key);
    ctx.output.kv("api_base", &search.api_base);
    ctx.output.kv("gl / hl", &format!("{} / {}", search.gl, search.hl));
    ctx.output.kv("mock_mode", &search.mock_mode.to_string());
    ctx.output.kv("default_limit", &search.default_limit.to_string());
    ctx.output.kv(
        "timeouts",
        &format!(
            "search {}s, image {}s, recognition {}s",
            search.search_timeout_secs, search.image_timeout_secs, search.recognition_timeout_secs
        ),
    );

    ctx.output.info("");
    ctx.output.info("[relays]");
    if !search.proxy_enabled {
        ctx.output.kv("status", "disabled (direct requests)");
    }
    let selected = search.selected_proxy();
    for (index, proxy) in search.proxies.iter().enumerate() {
        let marker = if selected == Some(proxy.as_str()) { "*" } else { " " };
        ctx.output.list_item(&format!("{} [{}] {}", marker, index, proxy));
    }
    Ok(())
}

fn select_proxy(index: usize, ctx: &Context) -> Result<()> {
    let config = ctx.search_config();
    let Some(proxy) = config.proxies.get(index) else {
        bail!(
            "No relay at index {} ({} configured)",
            index,
            config.proxies.len()
        );
    };

    Preferences {
        selected_proxy_index: Some(index),
        use_mock_data: None,
    }
    .save(&ctx.cache)?;

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "selectedProxyIndex": index, "proxy": proxy }));
    } else {
        ctx.output.success(&format!("Using relay [{}] {}", index, proxy));
    }
    Ok(())
}

fn set_mock(state: &str, ctx: &Context) -> Result<()> {
    let enabled = match state {
        "on" => true,
        "off" => false,
        other => bail!("Expected 'on' or 'off', got '{}'", other),
    };

    Preferences {
        selected_proxy_index: None,
        use_mock_data: Some(enabled),
    }
    .save(&ctx.cache)?;

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({ "useMockData": enabled }));
    } else if enabled {
        ctx.output.success("Demo data enabled; searches will not contact the provider");
    } else {
        ctx.output.success("Demo data disabled");
    }
    Ok(())
}

fn show_paths(ctx: &Context) -> Result<()> {
    let config_file = ctx.config_file();
    let data_dir = ctx.data_dir();

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "configFile": config_file.display().to_string(),
            "configExists": config_file.is_file(),
            "dataDir": data_dir.display().to_string(),
        }));
        return Ok(());
    }

    let exists = if config_file.is_file() { "" } else { " (not created)" };
    ctx.output
        .kv("config file", &format!("{}{}", config_file.display(), exists));
    ctx.output.kv("data dir", &data_dir.display().to_string());
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let path = ctx.config_file();
    if path.exists() && !force {
        bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    ctx.config.save(&path)?;

    if ctx.output.is_json() {
        ctx.output
            .json(&serde_json::json!({ "created": path.display().to_string() }));
    } else {
        ctx.output.success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

/// Keep the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => String::new(),
        n if n <= 4 => "*".repeat(n),
        n => format!("{}{}", "*".repeat(n - 4), chars[n - 4..].iter().collect::<String>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use crate::context::tests::context;
    use tempfile::TempDir;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret("secret-key-1234"), "***********1234");
    }

    #[tokio::test]
    async fn test_proxy_selection_is_persisted() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);

        run(ConfigArgs { command: ConfigCommand::Proxy { index: 2 } }, &ctx)
            .await
            .unwrap();
        assert_eq!(ctx.preferences().selected_proxy_index, Some(2));
        assert_eq!(context(&dir, None).search_config().proxy_index, 2);
    }

    #[tokio::test]
    async fn test_proxy_out_of_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);

        let err = run(ConfigArgs { command: ConfigCommand::Proxy { index: 7 } }, &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No relay at index 7"));
        assert_eq!(ctx.preferences().selected_proxy_index, None);
    }

    #[tokio::test]
    async fn test_mock_toggle_keeps_proxy_choice() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, None);

        run(ConfigArgs { command: ConfigCommand::Proxy { index: 1 } }, &ctx)
            .await
            .unwrap();
        run(
            ConfigArgs {
                command: ConfigCommand::Mock { state: "on".into() },
            },
            &ctx,
        )
        .await
        .unwrap();

        let prefs = ctx.preferences();
        assert_eq!(prefs.selected_proxy_index, Some(1));
        assert_eq!(prefs.use_mock_data, Some(true));
        assert!(ctx.search_config().mock_mode);
    }

    #[tokio::test]
    async fn test_init_writes_and_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pricelens.toml");
        let mut ctx = context(&dir, None);
        ctx.config_path = Some(path.clone());
        ctx.config.search.default_limit = 4;

        run(ConfigArgs { command: ConfigCommand::Init { force: false } }, &ctx)
            .await
            .unwrap();
        assert_eq!(CliConfig::load(&path).unwrap().search.default_limit, 4);

        assert!(run(ConfigArgs { command: ConfigCommand::Init { force: false } }, &ctx)
            .await
            .is_err());
        run(ConfigArgs { command: ConfigCommand::Init { force: true } }, &ctx)
            .await
            .unwrap();
    }
}
