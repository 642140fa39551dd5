use std::{net::SocketAddr, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{sync::oneshot, task::JoinHandle};

use crate::{
    api::{self, RedirectSlot},
    error::{Error, Result},
    warning,
};

/// Running callback listener. Dropping it without [`shutdown`](Self::shutdown)
/// aborts the serving task.
pub struct CallbackServer {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

/// Binds `addr` and serves `path` until the returned server is shut down.
pub async fn start_callback_server(
    addr: &str,
    path: &str,
    slot: RedirectSlot,
) -> Result<CallbackServer> {
    if !path.starts_with('/') {
        return Err(Error::Configuration(format!(
            "Redirect path must start with '/': {}",
            path
        )));
    }

    let app = Router::new().route(path, get(api::callback).layer(Extension(slot)));

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        Error::Configuration(format!("Failed to bind callback listener on {}: {}", addr, e))
    })?;
    let local_addr = listener.local_addr()?;

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let shutdown = async {
            let _ = rx.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            warning!("Callback listener stopped with error: {}", e);
        }
    });

    Ok(CallbackServer {
        local_addr,
        shutdown: Some(tx),
        handle: Some(handle),
    })
}

impl CallbackServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits briefly for open ones.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(Duration::from_secs(2), &mut handle)
                .await
                .is_err()
            {
                handle.abort();
            }
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
