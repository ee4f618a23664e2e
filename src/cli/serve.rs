use anyhow::Result;

use super::init_tracing;
use crate::api;
use crate::core::AppConfig;

pub async fn run(host: String, port: String) -> Result<()> {
    init_tracing(format!(
        "{}=debug,tower_http=debug,axum::rejection=trace",
        env!("CARGO_CRATE_NAME")
    ));

    let config = AppConfig::default();
    api::serve(host, port, config).await
}
