use crate::{
    config,
    error::Result,
    management::ExportManager,
    progress::StepLogger,
    session::Session,
    spotify::tracks,
    success,
};

pub async fn uris(args: Vec<String>) -> Result<()> {
    let mut logger = StepLogger::new("URI fetching", 4);

    let references = super::read_references(args)?;
    logger.step("input");

    let session = Session::from_env();
    super::connect(&session, &[]).await?;
    logger.step("spotify connection");

    let uris = tracks::resolve(&session, &references).await?;
    logger.step("URIs");

    let path = ExportManager::new(config::data_dir())
        .export_uris(&uris)
        .await?;
    logger.step("write to disk");

    success!("Wrote {} URIs to {}", uris.len(), path.display());
    logger.done();
    Ok(())
}
