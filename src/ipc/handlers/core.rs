use crate::db;
use crate::ipc::error::{err, ok, plain, with_notice};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "dataDir": state.data_dir.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_init(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("dataDir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "missing params.dataDir");
    };

    match db::open_db(&path) {
        Ok(conn) => {
            log::info!("database ready in {}", path.display());
            state.data_dir = Some(path.clone());
            state.db = Some(conn);
            ok(&req.id, json!({ "dataDir": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_dashboard_stats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };

    let stats = conn.query_row(
        "SELECT
           (SELECT COUNT(*) FROM students),
           (SELECT COUNT(*) FROM fees),
           (SELECT COUNT(*) FROM fees WHERE status = 'paid'),
           (SELECT COALESCE(SUM(amount), 0) FROM fees),
           (SELECT COALESCE(SUM(amount), 0) FROM fees WHERE status = 'paid')",
        [],
        |row| {
            let total_students: i64 = row.get(0)?;
            let total_fees: i64 = row.get(1)?;
            let paid_fees: i64 = row.get(2)?;
            let total_amount: i64 = row.get(3)?;
            let paid_amount: i64 = row.get(4)?;
            Ok(json!({
                "totalStudents": total_students,
                "totalFees": total_fees,
                "paidFees": paid_fees,
                "totalAmount": total_amount,
                "paidAmount": paid_amount,
                "pendingAmount": total_amount - paid_amount,
            }))
        },
    );

    match stats {
        Ok(stats) => ok(&req.id, stats),
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_settings_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "database not initialized");
    }
    // Static defaults; the UI keeps its own copy. Nothing is persisted.
    ok(
        &req.id,
        json!({
            "schoolName": "Your School Name",
            "currency": "INR",
            "darkMode": false,
        }),
    )
}

fn handle_settings_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "database not initialized");
    }
    ok(&req.id, req.params.clone())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Vec<serde_json::Value>> {
    match req.method.as_str() {
        "app:health" => Some(plain(handle_health(state, req))),
        "app:init" => Some(plain(handle_init(state, req))),
        "dashboard:stats" => Some(plain(handle_dashboard_stats(state, req))),
        "settings:get" => Some(plain(handle_settings_get(state, req))),
        "settings:update" => Some(with_notice(
            handle_settings_update(state, req),
            "Settings updated successfully",
        )),
        _ => None,
    }
}
