use argon2::{password_hash::PasswordHash, Argon2, PasswordVerifier};
use rusqlite::OptionalExtension;
use serde_json::json;

use crate::ipc::error::{err, ok, ok_empty, plain};
use crate::ipc::types::{AppState, Request};

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "database not initialized");
    };

    let username = match req.params.get("username").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "missing username"),
    };
    let password = match req.params.get("password").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "missing password"),
    };

    let row: Option<(i64, String, String, String)> = match conn
        .query_row(
            "SELECT id, username, password_hash, role FROM users WHERE username = ?",
            [&username],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, e.to_string()),
    };

    // Unknown user and wrong password produce the same generic error.
    let Some((id, username, password_hash, role)) = row else {
        return err(&req.id, "Invalid credentials");
    };

    let parsed = match PasswordHash::new(&password_hash) {
        Ok(v) => v,
        Err(_) => return err(&req.id, "Invalid credentials"),
    };
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_err()
    {
        return err(&req.id, "Invalid credentials");
    }

    ok(
        &req.id,
        json!({ "user": { "id": id, "username": username, "role": role } }),
    )
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    if state.db.is_none() {
        return err(&req.id, "database not initialized");
    }
    // No session state to tear down.
    ok_empty(&req.id)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Vec<serde_json::Value>> {
    match req.method.as_str() {
        "auth:login" => Some(plain(handle_login(state, req))),
        "auth:logout" => Some(plain(handle_logout(state, req))),
        _ => None,
    }
}
