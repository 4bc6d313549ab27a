use crate::calc::{self, CombineMode, ScoreUnit, TrendOptions};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_str, opt_usize};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn parse_options(req: &Request) -> Result<TrendOptions, serde_json::Value> {
    let mut opts = TrendOptions::default();

    if let Some(window) = opt_usize(req, "window")? {
        if window == 0 {
            return Err(err(&req.id, "bad_params", "window must be at least 1", None));
        }
        opts.window = window;
    }
    if let Some(v) = req.params.get("threshold") {
        let Some(t) = v.as_f64() else {
            return Err(err(&req.id, "bad_params", "threshold must be a number", None));
        };
        opts.threshold = t;
    }
    if let Some(mode) = opt_str(req, "combineMode") {
        opts.combine_mode = if mode.eq_ignore_ascii_case("OR") {
            CombineMode::Or
        } else if mode.eq_ignore_ascii_case("AND") {
            CombineMode::And
        } else {
            return Err(err(
                &req.id,
                "bad_params",
                "combineMode must be \"OR\" or \"AND\"",
                None,
            ));
        };
    }
    if let Some(unit) = opt_str(req, "scoreUnit") {
        opts.score_unit = if unit.eq_ignore_ascii_case("sum0to200") {
            ScoreUnit::Sum0To200
        } else if unit.eq_ignore_ascii_case("avg0to100") {
            ScoreUnit::Avg0To100
        } else {
            return Err(err(
                &req.id,
                "bad_params",
                "scoreUnit must be \"sum0to200\" or \"avg0to100\"",
                None,
            ));
        };
    }

    Ok(opts)
}

/// The support-needed scan. With no section the whole model is scanned;
/// the heuristic knobs default to the dashboard's fixed values and may be
/// overridden per request.
fn handle_support_analyze(state: &mut AppState, req: &Request) -> serde_json::Value {
    let section = opt_str(req, "section");
    let opts = match parse_options(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let flagged = calc::analyze_support(&state.store, section.as_deref(), &opts);
    tracing::debug!(flagged = flagged.len(), "support scan");

    ok(
        &req.id,
        json!({
            "flagged": flagged,
            "options": opts,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "support.analyze" => Some(handle_support_analyze(state, req)),
        _ => None,
    }
}
