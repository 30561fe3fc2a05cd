use ::log::*;

use db_bootstrap::backend::make_backend;
use db_bootstrap::capability::SignatureClassifier;
use db_bootstrap::catalog::Catalog;
use db_bootstrap::config::Config;

#[tokio::main]
async fn main() -> ::anyhow::Result<()> {
    ::env_logger::Builder::from_env(
        ::env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let config = Config::from_env()?;
    let settings = config.settings();
    let classifier = SignatureClassifier::mongodb()?;
    let backend = make_backend(&config).await?;

    let report = db_bootstrap::bootstrap::run(
        backend.as_ref(),
        &classifier,
        &Catalog::turbodex(),
        &settings,
    )
    .await;

    let degraded = report.degraded_collections();
    if !degraded.is_empty() {
        warn!(
            "collections without their validator: {}",
            degraded.join(", ")
        );
    }

    for record in report.failed_indexes() {
        warn!("index {}.{} not in place", record.collection, record.name);
    }

    if report.is_clean() {
        info!("provisioning complete");
    } else {
        warn!("provisioning finished with issues, re-run after fixing them");
    }

    Ok(())
}
