//! Shared application state.
//!
//! Constructed once in `main` and cloned into every handler via axum's
//! `State` extractor - there is no ambient/static lookup anywhere.

use stockroom_db::Database;

use crate::media::MediaClient;

/// State shared by all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle (pool + repositories + ledger).
    pub db: Database,

    /// Media host client for image attachments.
    pub media: MediaClient,
}
