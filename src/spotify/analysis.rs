use std::collections::HashMap;

use reqwest::Method;

use crate::{
    error::Result,
    session::Session,
    types::{AnalysisReport, TrackUri},
};

/// Fetches the audio analysis for every id, one request at a time.
///
/// Requests are never issued concurrently: all of them share the same rate
/// limit budget and the output has to follow the input order. `names`
/// attaches a display name to each report when it contains the uri.
/// `on_report` is called after each fetch with the position of the report.
///
/// The first failure aborts the whole call; reports fetched up to that
/// point are only visible through `on_report`.
///
/// # Arguments
///
/// * `session` - Authorized session
/// * `ids` - Canonical ids, fetched in this order
/// * `names` - Optional uri to display name lookup, see [`tracks::name_lookup`](super::tracks::name_lookup)
/// * `on_report` - Progress callback receiving the index and the new report
///
/// # Returns
///
/// Exactly one [`AnalysisReport`] per id, in input order.
///
/// # Errors
///
/// - `Error::Unauthenticated` if the session holds no credentials
/// - `Error::FatalApi` for an unknown track or any other rejected request
/// - `Error::Json` if a response is not valid JSON
///
/// # Example
///
/// ```
/// let names = tracks::name_lookup(&metadata);
/// let reports = analysis::aggregate(&session, &uris, Some(&names), |index, report| {
///     info!("Fetched {}: {}", index + 1, report.uri);
/// })
/// .await?;
/// ```
pub async fn aggregate<F>(
    session: &Session,
    ids: &[TrackUri],
    names: Option<&HashMap<TrackUri, String>>,
    mut on_report: F,
) -> Result<Vec<AnalysisReport>>
where
    F: FnMut(usize, &AnalysisReport),
{
    let mut reports = Vec::with_capacity(ids.len());

    for (index, uri) in ids.iter().enumerate() {
        let analysis = fetch_analysis(session, uri).await?;
        let report = AnalysisReport {
            uri: uri.clone(),
            name: names.and_then(|n| n.get(uri).cloned()),
            analysis,
        };
        on_report(index, &report);
        reports.push(report);
    }

    Ok(reports)
}

/// Raw analysis payload. Its content is passed through untouched.
pub async fn fetch_analysis(session: &Session, uri: &TrackUri) -> Result<serde_json::Value> {
    let request = session
        .api_request(Method::GET, &format!("audio-analysis/{}", uri.id()))?
        .build()?;
    session.client().get_json(request).await
}
