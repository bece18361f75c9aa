use rusqlite::params_from_iter;
use serde_json::{json, Value};

use crate::db;
use crate::ipc::error::{err, ok, ok_empty, plain, with_notice};
use crate::ipc::types::{AppState, Request};

const FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("class", "class"),
    ("section", "section"),
    ("rollNo", "roll_no"),
    ("parentName", "parent_name"),
    ("phone", "phone"),
    ("address", "address"),
];

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };

    let mut stmt = match conn.prepare(&format!(
        "SELECT {} FROM students ORDER BY created_at DESC, id DESC",
        db::STUDENT_COLS
    )) {
        Ok(s) => s,
        Err(e) => return err(&req.id, e.to_string()),
    };
    let rows = stmt
        .query_map([], db::student_row_json)
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(id) = req.params.get("id").and_then(|v| v.as_i64()) else {
        return err(&req.id, "missing id");
    };

    let student = match db::get_student(conn, id) {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.to_string()),
    };
    let Some(mut student) = student else {
        return err(&req.id, "Student not found");
    };
    match db::fees_for_student(conn, id) {
        Ok(fees) => student["fees"] = Value::Array(fees),
        Err(e) => return err(&req.id, e.to_string()),
    }
    ok(&req.id, json!({ "student": student }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };

    let mut values = Vec::new();
    for (param, _col) in FIELDS {
        match req.params.get(param).and_then(|v| v.as_str()) {
            Some(v) => values.push(v.to_string()),
            None => return err(&req.id, format!("missing {param}")),
        }
    }
    values.push(db::now_iso());

    if let Err(e) = conn.execute(
        "INSERT INTO students(name, class, section, roll_no, parent_name, phone, address, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        params_from_iter(values.iter()),
    ) {
        return err(&req.id, e.to_string());
    }

    let id = conn.last_insert_rowid();
    match db::get_student(conn, id) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "Student not found"),
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

    // Partial update: absent fields keep their current value.
    let field = |name: &str| req.params.get(name).and_then(|v| v.as_str());

    let changed = conn.execute(
        "UPDATE students SET
           name = COALESCE(?, name),
           class = COALESCE(?, class),
           section = COALESCE(?, section),
           roll_no = COALESCE(?, roll_no),
           parent_name = COALESCE(?, parent_name),
           phone = COALESCE(?, phone),
           address = COALESCE(?, address),
           updated_at = ?
         WHERE id = ?",
        (
            field("name"),
            field("class"),
            field("section"),
            field("rollNo"),
            field("parentName"),
            field("phone"),
            field("address"),
            db::now_iso(),
            id,
        ),
    );
    match changed {
        Ok(0) => return err(&req.id, "Student not found"),
        Ok(_) => {}
        Err(e) => return err(&req.id, e.to_string()),
    }

    match db::get_student(conn, id) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "Student not found"),
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

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, e.to_string()),
    };

    // Fee rows first (no ON DELETE CASCADE).
    if let Err(e) = tx.execute("DELETE FROM fees WHERE student_id = ?", [id]) {
        let _ = tx.rollback();
        return err(&req.id, e.to_string());
    }
    let deleted = match tx.execute("DELETE FROM students WHERE id = ?", [id]) {
        Ok(n) => n,
        Err(e) => {
            let _ = tx.rollback();
            return err(&req.id, e.to_string());
        }
    };
    if deleted == 0 {
        let _ = tx.rollback();
        return err(&req.id, "Student not found");
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, e.to_string());
    }

    ok_empty(&req.id)
}

fn handle_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(query) = req.params.get("query").and_then(|v| v.as_str()) else {
        return err(&req.id, "missing query");
    };
    let class_filter = req
        .params
        .get("filters")
        .and_then(|f| f.get("class"))
        .and_then(|v| v.as_str());

    let like = format!("%{}%", query);
    let mut sql = format!(
        "SELECT {} FROM students
         WHERE (name LIKE ?1 OR parent_name LIKE ?1 OR roll_no LIKE ?1)",
        db::STUDENT_COLS
    );
    if class_filter.is_some() {
        sql.push_str(" AND class = ?2");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, e.to_string()),
    };
    let rows = match class_filter {
        Some(class) => stmt.query_map((&like, class), db::student_row_json),
        None => stmt.query_map([&like], db::student_row_json),
    }
    .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(students) => ok(&req.id, json!({ "students": students })),
        Err(e) => err(&req.id, e.to_string()),
    }
}

fn handle_get_by_roll_no(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };
    let Some(roll_no) = req.params.get("rollNo").and_then(|v| v.as_str()) else {
        return err(&req.id, "missing rollNo");
    };

    // Roll numbers are not unique; first match wins, as with the UI lookup.
    let mut stmt = match conn.prepare(&format!(
        "SELECT {} FROM students WHERE roll_no = ? ORDER BY id LIMIT 1",
        db::STUDENT_COLS
    )) {
        Ok(s) => s,
        Err(e) => return err(&req.id, e.to_string()),
    };
    let student = stmt
        .query_map([roll_no], db::student_row_json)
        .and_then(|mut it| it.next().transpose());

    let mut student = match student {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "Student not found"),
        Err(e) => return err(&req.id, e.to_string()),
    };
    let id = student["id"].as_i64().unwrap_or(0);
    match db::fees_for_student(conn, id) {
        Ok(fees) => student["fees"] = Value::Array(fees),
        Err(e) => return err(&req.id, e.to_string()),
    }
    ok(&req.id, json!({ "student": student }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Vec<serde_json::Value>> {
    match req.method.as_str() {
        "students:list" => Some(plain(handle_list(state, req))),
        "students:get" => Some(plain(handle_get(state, req))),
        "students:create" => Some(with_notice(
            handle_create(state, req),
            "Student created successfully",
        )),
        "students:update" => Some(with_notice(
            handle_update(state, req),
            "Student updated successfully",
        )),
        "students:delete" => Some(with_notice(
            handle_delete(state, req),
            "Student deleted successfully",
        )),
        "students:search" => Some(plain(handle_search(state, req))),
        "students:getByRollNo" => Some(plain(handle_get_by_roll_no(state, req))),
        _ => None,
    }
}
