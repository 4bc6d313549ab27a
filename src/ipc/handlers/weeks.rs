use crate::ipc::error::ok;
use crate::ipc::helpers::{opt_usize, required_usize, section_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_weeks_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = section_param(req);
    let (week_count, current_week) = state
        .store
        .section(&section)
        .map(|s| (s.week_count(), s.current_week()))
        .unwrap_or((0, None));
    ok(
        &req.id,
        json!({
            "section": section,
            "weekCount": week_count,
            "currentWeek": current_week,
        }),
    )
}

/// Week read. The index defaults to the section's cursor; out-of-range and
/// unknown-section reads answer with empty entries.
fn handle_weeks_snapshot(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = section_param(req);
    let week = match opt_usize(req, "week") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let week = week.or_else(|| state.store.section(&section).and_then(|s| s.current_week()));

    let entries = match week {
        Some(w) => state.store.snapshot(&section, w),
        None => &[],
    };
    ok(
        &req.id,
        json!({
            "section": section,
            "week": week,
            "entries": entries,
        }),
    )
}

fn handle_weeks_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = section_param(req);
    let week = state.store.add_week(&section);
    tracing::debug!(section = %section, week, "week appended");
    let week_count = state
        .store
        .section(&section)
        .map(|s| s.week_count())
        .unwrap_or(0);
    ok(
        &req.id,
        json!({
            "section": section,
            "week": week,
            "weekCount": week_count,
            "revision": state.store.revision(),
        }),
    )
}

fn handle_weeks_set_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = section_param(req);
    let week = match required_usize(req, "week") {
        Ok(v) => v,
        Err(e) => return e,
    };
    state.store.set_current_week(&section, week);
    let current = state
        .store
        .section(&section)
        .and_then(|s| s.current_week());
    ok(
        &req.id,
        json!({
            "section": section,
            "currentWeek": current,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "weeks.count" => Some(handle_weeks_count(state, req)),
        "weeks.snapshot" => Some(handle_weeks_snapshot(state, req)),
        "weeks.add" => Some(handle_weeks_add(state, req)),
        "weeks.setCurrent" => Some(handle_weeks_set_current(state, req)),
        _ => None,
    }
}
