use crate::ingest;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_i64, required_str, required_usize, section_param, section_summary};
use crate::ipc::types::{AppState, Request};
use crate::model::Record;
use serde_json::json;

/// Full-replace ingestion: the roster and every week sequence are rebuilt
/// from the uploaded text, and each touched section's cursor moves to its
/// newest week (the dashboard opens on the latest upload).
fn handle_roster_ingest(state: &mut AppState, req: &Request) -> serde_json::Value {
    let text = match required_str(req, "text") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let report = match ingest::parse_delimited(&text) {
        Ok(r) => r,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };

    state.store.reset();
    for rec in &report.records {
        state.store.upsert(rec);
    }
    let latest: Vec<(String, usize)> = state
        .store
        .sections()
        .iter()
        .filter(|s| s.week_count() > 0)
        .map(|s| (s.name().to_string(), s.week_count() - 1))
        .collect();
    for (name, last) in latest {
        state.store.set_current_week(&name, last);
    }

    tracing::info!(
        accepted = report.records.len(),
        skipped = report.skipped.len(),
        sectioned = report.sectioned,
        "roster ingested"
    );

    let sections: Vec<serde_json::Value> =
        state.store.sections().iter().map(section_summary).collect();
    ok(
        &req.id,
        json!({
            "accepted": report.records.len(),
            "skipped": report.skipped,
            "students": state.store.roster(),
            "sections": sections,
            "revision": state.store.revision(),
        }),
    )
}

/// Incremental upsert for one (student, week, section) cell; the live-edit
/// path the presentation layer uses for its score inputs.
fn handle_scores_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let week = match required_usize(req, "week") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if week > ingest::MAX_WEEK_INDEX {
        return err(
            &req.id,
            "bad_params",
            format!("week must be at most {}", ingest::MAX_WEEK_INDEX),
            None,
        );
    }
    let quiz = match required_i64(req, "quiz") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let lab = match required_i64(req, "lab") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = section_param(req);

    state.store.upsert(&Record {
        section: Some(section.clone()),
        name,
        week,
        quiz,
        lab,
    });
    tracing::debug!(section = %section, week, "score upserted");

    let week_count = state
        .store
        .section(&section)
        .map(|s| s.week_count())
        .unwrap_or(0);
    ok(
        &req.id,
        json!({
            "section": section,
            "weekCount": week_count,
            "revision": state.store.revision(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.ingest" => Some(handle_roster_ingest(state, req)),
        "scores.upsert" => Some(handle_scores_upsert(state, req)),
        _ => None,
    }
}
