use crate::{
    config,
    error::Result,
    info,
    management::ExportManager,
    progress::StepLogger,
    session::Session,
    spotify::{analysis as aggregator, tracks},
    success,
};

/// Resolves the references, names them and exports their analyses.
///
/// With `preserve_order` the output follows the input order; otherwise
/// canonical references come before resolved queries.
pub async fn analysis(args: Vec<String>, preserve_order: bool) -> Result<()> {
    let mut logger = StepLogger::new("beat aggregation", 6);

    let references = super::read_references(args)?;
    logger.step("input");

    let session = Session::from_env();
    super::connect(&session, &[]).await?;
    logger.step("spotify connection");

    let uris = if preserve_order {
        tracks::resolve_in_order(&session, &references).await?
    } else {
        tracks::resolve(&session, &references).await?
    };
    logger.step("URIs");

    let metadata = tracks::fetch_metadata(&session, &uris).await?;
    let names = tracks::name_lookup(&metadata);
    logger.step("track names");

    let total = uris.len();
    let analyses = aggregator::aggregate(&session, &uris, Some(&names), |index, report| {
        info!(
            "Fetched analysis {}/{}: {}",
            index + 1,
            total,
            report.name.as_deref().unwrap_or(report.uri.as_str())
        );
    })
    .await?;
    logger.step("analysis");

    let path = ExportManager::new(config::data_dir())
        .export_analyses(&analyses)
        .await?;
    logger.step("write to disk");

    success!("Wrote {} analyses to {}", analyses.len(), path.display());
    logger.done();
    Ok(())
}
