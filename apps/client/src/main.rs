use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use disha_client::config::Config;
use disha_client::identity::{Principal, StaticTokenSource};
use disha_client::sync::{PollStop, StoreSnapshot};
use disha_client::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "disha={0},disha_client={0}",
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Disha client v{}", env!("CARGO_PKG_VERSION"));

    let wait_for_recommendations = std::env::args()
        .skip(1)
        .any(|arg| arg == "--wait-recommendations");

    let identity = config
        .identity
        .clone()
        .context("DISHA_UID and DISHA_ID_TOKEN must be set to sign in")?;

    let tokens = Arc::new(StaticTokenSource::new(identity.id_token.clone()));
    let app = AppContext::start(config, tokens)?;

    // Sign in and wait for the first load to settle
    let mut rx = app.store().watch();
    app.session()
        .sign_in(Principal::new(identity.uid.clone(), identity.email.clone()));
    rx.wait_for(|s| s.uid.as_deref() == Some(identity.uid.as_str()) && !s.loading)
        .await
        .context("store stopped before the first load")?;

    if wait_for_recommendations {
        match app.start_polling() {
            Some(handle) => match handle.finished().await {
                PollStop::RecommendationsArrived => info!("Recommendations are ready"),
                other => warn!("Stopped waiting for recommendations: {other:?}"),
            },
            None => info!("Nothing to wait for; polling conditions do not hold"),
        }
    }

    let summary = summarize(&app.store().snapshot());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    app.shutdown().await;
    Ok(())
}

fn summarize(snapshot: &StoreSnapshot) -> serde_json::Value {
    let saved_paths: Vec<_> = snapshot
        .saved_paths()
        .iter()
        .map(|p| json!({ "career_name": p.name(), "progress": p.display_progress() }))
        .collect();
    let recommendations: Vec<&str> = snapshot
        .recommendations()
        .iter()
        .map(|c| c.career_name.as_str())
        .collect();

    json!({
        "uid": snapshot.uid,
        "error": snapshot.error,
        "profile": snapshot.profile(),
        "ready_for_recommendations": snapshot
            .profile()
            .is_some_and(|p| p.is_ready_for_recommendations()),
        "saved_paths": saved_paths,
        "recommendations": recommendations,
    })
}
