use crate::calc;
use crate::ipc::error::ok;
use crate::ipc::helpers::{opt_usize, section_param};
use crate::ipc::types::{AppState, Request};
use crate::model::ScoreEntry;
use serde_json::json;

fn resolve_week(state: &AppState, section: &str, requested: Option<usize>) -> usize {
    requested
        .or_else(|| state.store.section(section).and_then(|s| s.current_week()))
        .unwrap_or(0)
}

/// Pure preview: ranks the week without touching the store.
fn handle_ranking_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = section_param(req);
    let requested = match opt_usize(req, "week") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let week = resolve_week(state, &section, requested);
    let ranked = state
        .store
        .section(&section)
        .map(|sec| calc::compute_ranking(sec, week))
        .unwrap_or_default();

    ok(
        &req.id,
        json!({
            "section": section,
            "week": week,
            "ranked": ranked,
        }),
    )
}

/// Compute, then write the ranked list back as the week's authoritative
/// entries. This is the explicit half of the original commit-on-rank
/// behaviour: the week's record becomes the sorted list.
fn handle_ranking_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = section_param(req);
    let requested = match opt_usize(req, "week") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let week = resolve_week(state, &section, requested);
    let ranked = state
        .store
        .section(&section)
        .map(|sec| calc::compute_ranking(sec, week))
        .unwrap_or_default();

    let entries: Vec<ScoreEntry> = ranked
        .iter()
        .map(|r| ScoreEntry {
            name: r.name.clone(),
            quiz: r.quiz,
            lab: r.lab,
        })
        .collect();
    state.store.commit_week(&section, week, entries);
    tracing::info!(section = %section, week, students = ranked.len(), "ranking committed");

    ok(
        &req.id,
        json!({
            "section": section,
            "week": week,
            "ranked": ranked,
            "revision": state.store.revision(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ranking.compute" => Some(handle_ranking_compute(state, req)),
        "ranking.commit" => Some(handle_ranking_commit(state, req)),
        _ => None,
    }
}
