mod db;
mod ipc;
mod receipt;
mod seed;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("seed") {
        let Some(data_dir) = args.get(2) else {
            eprintln!("usage: feebookd seed <dataDir>");
            std::process::exit(2);
        };
        if let Err(e) = seed::run(&PathBuf::from(data_dir)) {
            log::error!("seeding failed: {e:?}");
            std::process::exit(1);
        }
        return;
    }

    serve();
}

/// Stdio request loop. One JSON request per stdin line; responses and push
/// events go to stdout, one JSON object per line. Stderr is free for logging.
fn serve() {
    log::info!("feebookd {} listening on stdio", env!("CARGO_PKG_VERSION"));

    let mut state = ipc::AppState {
        data_dir: None,
        db: None,
    };

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
                // Can't reply with an id; emit a best-effort error line.
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({ "success": false, "error": format!("bad request: {e}") })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        for out in ipc::handle_request(&mut state, req) {
            let _ = writeln!(
                stdout,
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{\"success\":false}".to_string())
            );
        }
        let _ = stdout.flush();
    }

    log::info!("stdin closed, shutting down");
}
