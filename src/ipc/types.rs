use serde::Deserialize;

use crate::model::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// All daemon state: the one owned model instance. Handlers receive it
/// explicitly; nothing lives in globals.
pub struct AppState {
    pub store: Store,
}
