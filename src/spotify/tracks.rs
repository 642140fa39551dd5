use std::collections::HashMap;

use reqwest::{Method, StatusCode};

use crate::{
    error::{Error, Result},
    session::Session,
    types::{SearchResponse, SeveralTracksResponse, TrackMetadata, TrackReference, TrackUri},
};

/// Maximum ids accepted by `GET /tracks`.
pub const TRACKS_PER_REQUEST: usize = 50;

/// Resolves references to canonical ids.
///
/// Canonical references are returned first in their input order, followed by
/// the search results for the free-text references in theirs. Each query is
/// searched once and must produce at least one match.
///
/// ```text
/// ["Song A", "spotify:track:XYZ"]  ->  ["spotify:track:XYZ", <match for "Song A">]
/// ```
///
/// # Arguments
///
/// * `session` - Authorized session used for the catalog searches
/// * `references` - Parsed command-line references, canonical or free text
///
/// # Returns
///
/// One canonical id per reference. Duplicates are passed through as given.
///
/// # Errors
///
/// - `Error::Unauthenticated` if the session holds no credentials
/// - `Error::Resolution` naming the first query without a match
/// - `Error::Json` if a search result carries a uri that is not a track
/// - Any client error from [`RateLimitedClient::execute`](crate::spotify::client::RateLimitedClient::execute)
///
/// # Example
///
/// ```
/// let references = TrackReference::parse_all(&["Song A", "spotify:track:XYZ"]);
/// let uris = tracks::resolve(&session, &references).await?;
///
/// assert_eq!(uris[0].as_str(), "spotify:track:XYZ");
/// ```
pub async fn resolve(session: &Session, references: &[TrackReference]) -> Result<Vec<TrackUri>> {
    let mut canonical = Vec::with_capacity(references.len());
    let mut queries = Vec::new();

    for reference in references {
        match reference {
            TrackReference::Canonical(uri) => canonical.push(uri.clone()),
            TrackReference::Query(query) => queries.push(query.as_str()),
        }
    }

    for query in queries {
        canonical.push(search_first(session, query).await?);
    }

    Ok(canonical)
}

/// Same searches as [`resolve`], but each result takes the position of the
/// reference it came from.
pub async fn resolve_in_order(
    session: &Session,
    references: &[TrackReference],
) -> Result<Vec<TrackUri>> {
    let mut resolved = Vec::with_capacity(references.len());
    for reference in references {
        let uri = match reference {
            TrackReference::Canonical(uri) => uri.clone(),
            TrackReference::Query(query) => search_first(session, query).await?,
        };
        resolved.push(uri);
    }
    Ok(resolved)
}

/// Rejects the whole input if a single reference is not canonical.
pub fn assert_canonical(references: &[TrackReference]) -> Result<Vec<TrackUri>> {
    references
        .iter()
        .map(|reference| match reference {
            TrackReference::Canonical(uri) => Ok(uri.clone()),
            TrackReference::Query(query) => Err(Error::NonCanonical(query.clone())),
        })
        .collect()
}

/// Catalog search returning the top-ranked track for `query`.
pub async fn search_first(session: &Session, query: &str) -> Result<TrackUri> {
    let request = session
        .api_request(Method::GET, "search")?
        .query(&[("type", "track"), ("limit", "1"), ("q", query)])
        .build()?;

    let response: SearchResponse = session.client().get_json(request).await?;
    response
        .tracks
        .items
        .into_iter()
        .next()
        .map(|track| track.uri)
        .ok_or_else(|| Error::Resolution {
            query: query.to_string(),
        })
}

/// Fetches name and duration for every uri, preserving order.
pub async fn fetch_metadata(session: &Session, uris: &[TrackUri]) -> Result<Vec<TrackMetadata>> {
    let mut tracks = Vec::with_capacity(uris.len());

    for chunk in uris.chunks(TRACKS_PER_REQUEST) {
        let ids = chunk.iter().map(TrackUri::id).collect::<Vec<_>>().join(",");
        let request = session
            .api_request(Method::GET, "tracks")?
            .query(&[("ids", ids.as_str())])
            .build()?;
        let url = request.url().to_string();

        let response: SeveralTracksResponse = session.client().get_json(request).await?;
        if response.tracks.len() != chunk.len() {
            return Err(Error::FatalApi {
                status: StatusCode::OK,
                url,
                message: format!(
                    "expected {} tracks, received {}",
                    chunk.len(),
                    response.tracks.len()
                ),
            });
        }

        for (uri, track) in chunk.iter().zip(response.tracks) {
            match track {
                Some(track) => tracks.push(track),
                None => {
                    return Err(Error::FatalApi {
                        status: StatusCode::NOT_FOUND,
                        url: url.clone(),
                        message: format!("track {} does not exist", uri),
                    });
                }
            }
        }
    }

    Ok(tracks)
}

pub fn name_lookup(tracks: &[TrackMetadata]) -> HashMap<TrackUri, String> {
    tracks
        .iter()
        .map(|t| (t.uri.clone(), t.name.clone()))
        .collect()
}
