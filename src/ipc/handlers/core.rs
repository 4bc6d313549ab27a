use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sections: Vec<&str> = state.store.sections().iter().map(|s| s.name()).collect();
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "revision": state.store.revision(),
            "sections": sections,
        }),
    )
}

fn handle_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.store.reset();
    tracing::info!("model reset");
    ok(&req.id, json!({ "revision": state.store.revision() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "model.reset" => Some(handle_reset(state, req)),
        _ => None,
    }
}
