//! Helpers shared by the unit tests: a throwaway HTTP server and a client
//! wired to it.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{Router, serve};
use tokio::net::TcpListener;
use url::Url;

use crate::{
    actions::Actions,
    api::ApiClient,
    credentials::{CredentialStore, MemoryCredentialStore},
    session::SessionStore,
};

/// Serves `router` on an ephemeral port and returns the API base URL.
pub async fn spawn_server(router: Router) -> Url {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/api/")).unwrap()
}

/// A base URL nothing listens on.
pub async fn dead_url() -> Url {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}/api/")).unwrap()
}

pub fn client_with(base_url: Url, session: SessionStore, credentials: Arc<dyn CredentialStore>) -> ApiClient {
    ApiClient::new(base_url, session, credentials).unwrap()
}

/// Actions over a fresh session and an in-memory credential store.
pub fn actions(base_url: Url) -> (Actions, SessionStore, Arc<MemoryCredentialStore>) {
    let session = SessionStore::default();
    let credentials = Arc::new(MemoryCredentialStore::new());
    let api = client_with(base_url, session.clone(), credentials.clone());
    (Actions::new(api), session, credentials)
}

/// Request counter to hand to route handlers.
#[derive(Debug, Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn record(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
