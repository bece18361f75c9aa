use serde_json::json;

use crate::db;
use crate::ipc::error::{err, ok, plain};
use crate::ipc::types::{AppState, Request};
use crate::receipt;

fn load_fee(state: &AppState, req: &Request) -> Result<serde_json::Value, serde_json::Value> {
    let Some(conn) = state.db.as_ref() else {
        return Err(err(&req.id, "database not initialized"));
    };
    let Some(fee_id) = req.params.get("feeId").and_then(|v| v.as_i64()) else {
        return Err(err(&req.id, "missing feeId"));
    };
    match db::get_fee_with_student(conn, fee_id) {
        Ok(Some(fee)) => Ok(fee),
        Ok(None) => Err(err(&req.id, "Fee record not found")),
        Err(e) => Err(err(&req.id, e.to_string())),
    }
}

/// Placeholder: reports where a PDF would land without writing one.
fn handle_generate_pdf(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "database not initialized");
    }
    let Some(fee_id) = req.params.get("feeId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing feeId");
    };
    ok(&req.id, json!({ "path": format!("/tmp/fee-slip-{fee_id}.pdf") }))
}

fn handle_print_slip(state: &mut AppState, req: &Request) -> serde_json::Value {
    let fee = match load_fee(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match receipt::render_receipt(&fee) {
        Ok(html) => ok(&req.id, json!({ "html": receipt::with_auto_print(&html) })),
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_preview_slip(state: &mut AppState, req: &Request) -> serde_json::Value {
    let fee = match load_fee(state, req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match receipt::render_receipt(&fee) {
        Ok(html) => ok(&req.id, json!({ "html": html })),
        Err(e) => err(&req.id, e.to_string()),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Vec<serde_json::Value>> {
    match req.method.as_str() {
        "print:generatePDF" => Some(plain(handle_generate_pdf(state, req))),
        "print:printSlip" => Some(plain(handle_print_slip(state, req))),
        "print:previewSlip" => Some(plain(handle_preview_slip(state, req))),
        _ => None,
    }
}
