use serde_json::json;

use crate::db;
use crate::ipc::error::{err, notification, ok, ok_empty, plain};
use crate::ipc::types::{AppState, Request};

fn handle_monthly(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(month) = req.params.get("month").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing month");
    };
    let Some(year) = req.params.get("year").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing year");
    };

    let ids: Result<Vec<i64>, _> = conn
        .prepare(
            "SELECT id FROM fees WHERE month = ? AND year = ?
             ORDER BY created_at DESC, id DESC",
        )
        .and_then(|mut stmt| {
            stmt.query_map([month, year], |r| r.get(0))
                .and_then(|it| it.collect())
        });
    let ids = match ids {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.to_string()),
    };

    let mut fees = Vec::with_capacity(ids.len());
    for id in ids {
        match db::get_fee_with_student(conn, id) {
            Ok(Some(fee)) => fees.push(fee),
            Ok(None) => {}
            Err(e) => return err(&req.id, e.to_string()),
        }
    }

    let totals = conn.query_row(
        "SELECT
           COALESCE(SUM(amount), 0),
           COALESCE(SUM(CASE WHEN status = 'paid' THEN amount ELSE 0 END), 0)
         FROM fees WHERE month = ? AND year = ?",
        [month, year],
        |row| {
            let total: i64 = row.get(0)?;
            let paid: i64 = row.get(1)?;
            Ok((total, paid))
        },
    );
    let (total_amount, paid_amount) = match totals {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.to_string()),
    };

    ok(
        &req.id,
        json!({
            "fees": fees,
            "totalAmount": total_amount,
            "paidAmount": paid_amount,
            "pendingAmount": total_amount - paid_amount,
        }),
    )
}

fn handle_student_history(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing studentId");
    };

    match db::fees_for_student(conn, student_id) {
        Ok(fees) => ok(&req.id, json!({ "fees": fees })),
        Err(e) => err(&req.id, e.to_string()),
    }
}

/// Export placeholder: emits the toast and succeeds without writing anything.
fn handle_export(state: &mut AppState, req: &Request, message: &str) -> Vec<serde_json::Value> {
    if state.db.is_none() {
        return plain(err(&req.id, "database not initialized"));
    }
    vec![notification("success", message), ok_empty(&req.id)]
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Vec<serde_json::Value>> {
    match req.method.as_str() {
        "reports:monthly" => Some(plain(handle_monthly(state, req))),
        "reports:studentHistory" => Some(plain(handle_student_history(state, req))),
        "reports:exportCSV" => Some(handle_export(state, req, "CSV export initiated")),
        "reports:exportExcel" => Some(handle_export(state, req, "Excel export initiated")),
        _ => None,
    }
}
