use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::{Mutex, oneshot};

use crate::types::RedirectParams;

/// One-shot slot shared with the callback handler. The first redirect takes
/// the sender; afterwards the slot stays empty.
pub type RedirectSlot = Arc<Mutex<Option<oneshot::Sender<RedirectParams>>>>;

pub fn redirect_slot(sender: oneshot::Sender<RedirectParams>) -> RedirectSlot {
    Arc::new(Mutex::new(Some(sender)))
}

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(slot): Extension<RedirectSlot>,
) -> Html<&'static str> {
    let Some(sender) = slot.lock().await.take() else {
        return Html("<h4>Authorization was already handled.</h4>");
    };

    let redirect = RedirectParams {
        code: params.get("code").cloned(),
        error: params.get("error").cloned(),
        state: params.get("state").cloned(),
    };

    let page = if redirect.error.is_none() && redirect.code.is_some() {
        "<html><head><title>Nice!</title></head><body>Nice!<script>window.close();</script></body></html>"
    } else {
        "<h4>Authorization failed.</h4>"
    };

    // the receiver only disappears when the flow gave up waiting
    let _ = sender.send(redirect);
    Html(page)
}
