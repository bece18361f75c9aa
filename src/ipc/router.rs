use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::{err, plain};

pub fn handle_request(state: &mut AppState, req: Request) -> Vec<serde_json::Value> {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::auth::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::fees::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::reports::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::print::try_handle(state, &req) {
        return resp;
    }

    plain(err(&req.id, format!("unknown method: {}", req.method)))
}
