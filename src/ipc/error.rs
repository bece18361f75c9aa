use serde_json::json;

pub fn ok(id: &str, data: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "success": true,
        "data": data
    })
}

pub fn ok_empty(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "success": true
    })
}

pub fn err(id: &str, message: impl Into<String>) -> serde_json::Value {
    json!({
        "id": id,
        "success": false,
        "error": message.into()
    })
}

/// Push event line. Has no "id" so clients can tell it apart from responses.
pub fn notification(kind: &str, message: &str) -> serde_json::Value {
    json!({
        "event": "notification",
        "message": message,
        "type": kind
    })
}

/// Wrap a mutation response with its toast: the success message on success,
/// the error message itself on failure. The notification line is written
/// before the response line.
pub fn with_notice(resp: serde_json::Value, ok_message: &str) -> Vec<serde_json::Value> {
    let notice = if resp["success"].as_bool().unwrap_or(false) {
        notification("success", ok_message)
    } else {
        notification("error", resp["error"].as_str().unwrap_or("operation failed"))
    };
    vec![notice, resp]
}

pub fn plain(resp: serde_json::Value) -> Vec<serde_json::Value> {
    vec![resp]
}
