use crate::calc;
use crate::ipc::error::ok;
use crate::ipc::helpers::{opt_str, required_str, section_summary};
use crate::ipc::types::{AppState, Request};
use crate::model::DEFAULT_SECTION;
use serde_json::json;

fn handle_roster_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sections: Vec<serde_json::Value> =
        state.store.sections().iter().map(section_summary).collect();
    ok(
        &req.id,
        json!({
            "students": state.store.roster(),
            "sections": sections,
            "revision": state.store.revision(),
        }),
    )
}

/// Detail-view series for one trainee: the zero-filled per-week rows plus
/// whole-sequence averages and the all-weeks rank. Unknown names and
/// sections read as empty/zero, never an error.
fn handle_student_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let section = match opt_str(req, "section") {
        Some(s) => s,
        // Without a section, the first one containing the trainee wins.
        None => state
            .store
            .sections()
            .iter()
            .find(|s| s.members().iter().any(|m| m == &name))
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| DEFAULT_SECTION.to_string()),
    };

    let weeks = state.store.history(&section, &name);
    let n = weeks.len();
    let (average_quiz, average_lab) = if n > 0 {
        (
            weeks.iter().map(|w| w.quiz).sum::<i64>() as f64 / n as f64,
            weeks.iter().map(|w| w.lab).sum::<i64>() as f64 / n as f64,
        )
    } else {
        (0.0, 0.0)
    };
    let total_average = (average_quiz + average_lab) / 2.0;
    let rank = state
        .store
        .section(&section)
        .and_then(|sec| calc::overall_rank(sec, &name));

    ok(
        &req.id,
        json!({
            "name": name,
            "section": section,
            "weeks": weeks,
            "averageQuiz": calc::round2(average_quiz),
            "averageLab": calc::round2(average_lab),
            "totalAverage": calc::round2(total_average),
            "rank": rank,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.list" => Some(handle_roster_list(state, req)),
        "student.history" => Some(handle_student_history(state, req)),
        _ => None,
    }
}
