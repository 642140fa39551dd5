//! HTTP endpoints of the local authorization listener.
//!
//! The listener exposes a single route: [`callback`] receives the redirect
//! from the accounts service and forwards its query parameters to the
//! waiting authorization flow through a one-shot channel.

mod callback;

pub use callback::RedirectSlot;
pub use callback::callback;
pub use callback::redirect_slot;
