//! # CLI Module
//!
//! Run modes invoked by the binary. Each mode builds a
//! [`Session`](crate::session::Session), walks its pipeline step by step and
//! returns the first error to `main`, which decides how the process exits.
//!
//! ## Modes
//!
//! - [`uris`] - resolve references and export `uris.txt`
//! - [`analysis`] - resolve references, fetch analyses, export `analysis.json`
//! - [`play`] - play canonical tracks on a device and wait for them to finish
//!
//! References are taken from the command line; a single `-` reads the rest
//! from stdin, one per line.

mod analysis;
mod play;
mod uris;

use std::io::{self, Read};

pub use analysis::analysis;
pub use play::PlayOptions;
pub use play::play;
pub use play::verify_recorded;
pub use uris::uris;

use crate::{
    error::Result,
    session::Session,
    spotify::auth,
    success,
    types::{Credentials, TrackReference},
    utils, warning,
};

/// Scopes required to read and control the user's playback.
pub const PLAYBACK_SCOPES: [&str; 2] = ["user-read-playback-state", "user-modify-playback-state"];

/// Expands `-` into stdin lines and classifies every reference.
pub fn read_references(args: Vec<String>) -> Result<Vec<TrackReference>> {
    let input = utils::expand_input(args, || {
        let mut data = String::new();
        io::stdin().read_to_string(&mut data)?;
        Ok(data)
    })?;
    Ok(TrackReference::parse_all(&input))
}

/// Authorizes `session`, opening the authorize URL in the browser.
pub async fn connect(session: &Session, scopes: &[&str]) -> Result<Credentials> {
    let credentials = auth::authorize(session, scopes.iter().copied(), open_authorize_url).await?;
    success!("Authorization successful");
    Ok(credentials)
}

fn open_authorize_url(url: &str) {
    if webbrowser::open(url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            url
        );
    }
}
