mod calc;
mod ingest;
mod ipc;
mod model;

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries the protocol; diagnostics go to stderr only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut state = ipc::AppState {
        store: model::Store::new(),
    };

    // Optional one-shot bootstrap: a single argument names a delimited-text
    // roster file. A bad file logs a warning and the daemon starts empty.
    if let Some(arg) = std::env::args_os().nth(1) {
        let path = Path::new(&arg);
        if let Err(e) = bootstrap(&mut state, path) {
            tracing::warn!(path = %path.display(), error = %e, "bootstrap ingest failed");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with an id; report and keep reading.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}

fn bootstrap(state: &mut ipc::AppState, path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let report = ingest::parse_delimited(&text)?;
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
        records = report.records.len(),
        skipped = report.skipped.len(),
        "bootstrap roster loaded"
    );
    Ok(())
}
