use serde_json::json;

use crate::db;
use crate::ipc::error::{err, ok, ok_empty, plain, with_notice};
use crate::ipc::types::{AppState, Request};

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };

    let ids: Result<Vec<i64>, _> = conn
        .prepare("SELECT id FROM fees ORDER BY created_at DESC, id DESC")
        .and_then(|mut stmt| {
            stmt.query_map([], |r| r.get(0))
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
    ok(&req.id, json!({ "fees": fees }))
}

fn handle_get_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
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

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };

    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing studentId");
    };
    let Some(month) = req.params.get("month").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing month");
    };
    let Some(year) = req.params.get("year").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing year");
    };
    let Some(amount) = req.params.get("amount").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing amount");
    };
    if !(1..=12).contains(&month) {
        return err(&req.id, "month must be between 1 and 12");
    }
    if !(1900..=2999).contains(&year) {
        return err(&req.id, "year out of range");
    }

    let status = req
        .params
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unpaid");
    let payment_method = req.params.get("paymentMethod").and_then(|v| v.as_str());
    let date = req.params.get("date").and_then(|v| v.as_str());

    match db::get_student(conn, student_id) {
        Ok(Some(_)) => {}
        Ok(None) => return err(&req.id, "Student not found"),
        Err(e) => return err(&req.id, e.to_string()),
    }

    let fee_id = match db::insert_fee(
        conn,
        student_id,
        month,
        year,
        amount,
        status,
        payment_method,
        date,
    ) {
        Ok(v) => v,
        Err(e) => {
            let msg = e.to_string();
            if msg.contains("fees.student_id, fees.month, fees.year") {
                return err(&req.id, "fee already exists for this student and month");
            }
            return err(&req.id, msg);
        }
    };

    match db::get_fee_with_student(conn, fee_id) {
        Ok(Some(fee)) => ok(&req.id, json!({ "fee": fee })),
        Ok(None) => err(&req.id, "Fee record not found"),
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing id");
    };

    // Only the collection fields are mutable; period and amount are fixed at
    // creation time.
    let status = req.params.get("status").and_then(|v| v.as_str());
    let payment_method = req.params.get("paymentMethod").and_then(|v| v.as_str());
    let date = req.params.get("date").and_then(|v| v.as_str());

    let changed = conn.execute(
        "UPDATE fees SET
           status = COALESCE(?, status),
           payment_method = COALESCE(?, payment_method),
           date = COALESCE(?, date),
           updated_at = ?
         WHERE id = ?",
        (status, payment_method, date, db::now_iso(), id),
    );
    match changed {
        Ok(0) => return err(&req.id, "Fee record not found"),
        Ok(_) => {}
        Err(e) => return err(&req.id, e.to_string()),
    }

    match db::get_fee_with_student(conn, id) {
        Ok(Some(fee)) => ok(&req.id, json!({ "fee": fee })),
        Ok(None) => err(&req.id, "Fee record not found"),
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing id");
    };

    match conn.execute("DELETE FROM fees WHERE id = ?", [id]) {
        Ok(0) => err(&req.id, "Fee record not found"),
        Ok(_) => ok_empty(&req.id),
        Err(e) => err(&req.id, e.to_string()),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Vec<serde_json::Value>> {
    match req.method.as_str() {
        "fees:list" => Some(plain(handle_list(state, req))),
        "fees:getByStudent" => Some(plain(handle_get_by_student(state, req))),
        "fees:create" => Some(with_notice(
            handle_create(state, req),
            "Fee record created successfully",
        )),
        "fees:update" => Some(with_notice(
            handle_update(state, req),
            "Fee record updated successfully",
        )),
        "fees:delete" => Some(with_notice(
            handle_delete(state, req),
            "Fee record deleted successfully",
        )),
        _ => None,
    }
}
