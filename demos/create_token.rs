//! # Create Warehouse Access Token
//!
//! Creates a warehouse access token from the command line, then shows that the
//! project's token list was invalidated in the query cache.
//!
//! ```text
//! REPORTS_ACCESS_TOKEN=sbp_... cargo run --example create_token -- abc123 ci-token
//! ```
//!
//! `REPORTS_CONFIG` may point at a JSON config file; `REPORTS_ACCESS_TOKEN` overrides
//! the token it contains.

use dioxus_studio_reports::prelude::*;
use std::{error::Error, path::Path};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let project_ref = args.next().unwrap_or_default();
    let description = args.next().unwrap_or_else(|| "ci-token".to_string());

    let mut config = match std::env::var("REPORTS_CONFIG") {
        Ok(path) => ReportsConfig::from_path(Path::new(&path))?,
        Err(_) => ReportsConfig::default(),
    };
    if let Ok(token) = std::env::var("REPORTS_ACCESS_TOKEN") {
        config.access_token = Some(token);
    }

    let client = QueryClient::new().with_stale_time(config.stale_time());
    let api = HttpClient::from_config(&config)?;

    let tokens_key = analytics_keys::warehouse_access_tokens(&project_ref);
    client.set_query_data(tokens_key.clone(), Vec::<WarehouseAccessToken>::new());

    let token = run_mutation(
        &CreateWarehouseAccessToken::new(api),
        WarehouseAccessTokenCreateVariables::new(project_ref, description),
        &client,
        &LogNotifier,
        &MutationOptions::new(),
    )
    .await?;

    info!("Created token {} ({})", token.id, token.description);
    info!(
        "{} stale after create: {}",
        tokens_key,
        client.is_stale(&tokens_key)
    );
    Ok(())
}
