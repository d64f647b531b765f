//! Server registry types.

use serde::{Deserialize, Serialize};

use parley_common::ServerId;

/// A configured chat server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    pub url: String,
}

/// Accept bare host:port entries by assuming the plain scheme.
pub(crate) fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("ws://") || url.starts_with("wss://") {
        url.to_string()
    } else {
        format!("ws://{url}")
    }
}
