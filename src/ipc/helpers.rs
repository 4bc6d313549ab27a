use super::error::err;
use super::types::Request;
use crate::model::{SectionState, DEFAULT_SECTION};
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn opt_str(req: &Request, key: &str) -> Option<String> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
}

/// The target section, defaulting to the implicit one.
pub fn section_param(req: &Request) -> String {
    opt_str(req, "section").unwrap_or_else(|| DEFAULT_SECTION.to_string())
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params.get(key).and_then(|v| v.as_i64()).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            format!("{} must be an integer", key),
            None,
        )
    })
}

pub fn required_usize(req: &Request, key: &str) -> Result<usize, serde_json::Value> {
    match req.params.get(key).and_then(|v| v.as_u64()) {
        Some(n) => Ok(n as usize),
        None => Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a non-negative integer", key),
            None,
        )),
    }
}

/// Absent keys and nulls read as None; anything else must be a
/// non-negative integer.
pub fn opt_usize(req: &Request, key: &str) -> Result<Option<usize>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) => Ok(Some(n as usize)),
            None => Err(err(
                &req.id,
                "bad_params",
                format!("{} must be a non-negative integer", key),
                None,
            )),
        },
    }
}

/// The section summary shape shared by `roster.list` and the ingest report.
pub fn section_summary(sec: &SectionState) -> serde_json::Value {
    json!({
        "name": sec.name(),
        "members": sec.members(),
        "weekCount": sec.week_count(),
        "currentWeek": sec.current_week(),
    })
}
