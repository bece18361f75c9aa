use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde_json::Value;
use tera::{Context, Tera};
use uuid::Uuid;

lazy_static! {
    static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        tera.add_raw_template("receipt", include_str!("templates/receipt.html"))
            .expect("receipt template must parse");
        tera
    };
}

/// `RCPT-YYYYMMDD-NNNN`: UTC date plus a 4-digit random suffix. The suffix is
/// short on purpose (it mirrors what is printed on paper slips); the UNIQUE
/// column on fees.receipt_id catches the rare collision and the caller retries.
pub fn generate_receipt_id() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let bytes = *Uuid::new_v4().as_bytes();
    let suffix = u16::from_le_bytes([bytes[0], bytes[1]]) % 10000;
    format!("RCPT-{date}-{suffix:04}")
}

pub fn month_name(month: i64) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Invalid",
    }
}

/// en-IN style grouping: last three digits, then groups of two.
fn group_indian(amount: i64) -> String {
    let digits = amount.abs().to_string();
    let mut grouped = String::new();
    if digits.len() <= 3 {
        grouped.push_str(&digits);
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let head_bytes = head.as_bytes();
        let mut parts: Vec<&str> = Vec::new();
        let mut end = head_bytes.len();
        while end > 2 {
            parts.push(&head[end - 2..end]);
            end -= 2;
        }
        parts.push(&head[..end]);
        parts.reverse();
        grouped.push_str(&parts.join(","));
        grouped.push(',');
        grouped.push_str(tail);
    }
    if amount < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

pub fn format_currency(amount: i64, currency: &str) -> String {
    let grouped = group_indian(amount);
    if currency == "INR" {
        format!("₹{grouped}.00")
    } else {
        format!("{currency} {grouped}.00")
    }
}

/// Render the receipt for a fee row with its student embedded (the shape the
/// fee queries return). Payment date renders as DD/MM/YYYY; unpaid fees fall
/// back to today.
pub fn render_receipt(fee: &Value) -> anyhow::Result<String> {
    let student = &fee["student"];

    // The date is a pass-through string; take a char-boundary-safe prefix so
    // arbitrary input lands on the today-fallback instead of panicking.
    let date = fee["date"]
        .as_str()
        .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok())
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| chrono::Utc::now().format("%d/%m/%Y").to_string());

    let mut ctx = Context::new();
    ctx.insert("receipt_id", fee["receiptId"].as_str().unwrap_or(""));
    ctx.insert("date", &date);
    ctx.insert("student_name", student["name"].as_str().unwrap_or(""));
    ctx.insert("roll_no", student["rollNo"].as_str().unwrap_or(""));
    ctx.insert("class", student["class"].as_str().unwrap_or(""));
    ctx.insert("section", student["section"].as_str().unwrap_or(""));
    ctx.insert("parent_name", student["parentName"].as_str().unwrap_or(""));
    ctx.insert("month_name", month_name(fee["month"].as_i64().unwrap_or(0)));
    ctx.insert("year", &fee["year"].as_i64().unwrap_or(0));
    ctx.insert(
        "amount",
        &format_currency(fee["amount"].as_i64().unwrap_or(0), "INR"),
    );

    Ok(TEMPLATES.render("receipt", &ctx)?)
}

/// The shell loads this HTML into a hidden window; the onload hook kicks off
/// the print dialog immediately.
pub fn with_auto_print(html: &str) -> String {
    html.replace(
        "</body>",
        "<script>\n  window.onload = () => {\n    window.print();\n  }\n</script>\n</body>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn receipt_id_format() {
        let id = generate_receipt_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3, "bad shape: {id}");
        assert_eq!(parts[0], "RCPT");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(month_name(13), "Invalid");
        assert_eq!(month_name(0), "Invalid");
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(0, "INR"), "₹0.00");
        assert_eq!(format_currency(500, "INR"), "₹500.00");
        assert_eq!(format_currency(2500, "INR"), "₹2,500.00");
        assert_eq!(format_currency(100000, "INR"), "₹1,00,000.00");
        assert_eq!(format_currency(12345678, "INR"), "₹1,23,45,678.00");
        assert_eq!(format_currency(2500, "USD"), "USD 2,500.00");
    }

    fn sample_fee() -> serde_json::Value {
        json!({
            "id": 1,
            "studentId": 7,
            "month": 3,
            "year": 2024,
            "amount": 2500,
            "status": "paid",
            "paymentMethod": "cash",
            "date": "2024-03-05T10:00:00Z",
            "receiptId": "RCPT-20240305-0042",
            "student": {
                "id": 7,
                "name": "Rahul Kumar",
                "class": "10-A",
                "section": "Science",
                "rollNo": "001",
                "parentName": "Mr. Kumar",
                "phone": "9876543210",
                "address": "123 Main St, Delhi"
            }
        })
    }

    #[test]
    fn receipt_html_fields() {
        let html = render_receipt(&sample_fee()).expect("render");
        assert!(html.contains("RCPT-20240305-0042"));
        assert!(html.contains("05/03/2024"));
        assert!(html.contains("Rahul Kumar"));
        assert!(html.contains("10-A"));
        assert!(html.contains("Science"));
        assert!(html.contains("Mr. Kumar"));
        assert!(html.contains("March 2024"));
        assert_eq!(html.matches("₹2,500.00").count(), 2);
        assert!(!html.contains("window.print"));
    }

    #[test]
    fn receipt_html_missing_date_falls_back_to_today() {
        let mut fee = sample_fee();
        fee["date"] = serde_json::Value::Null;
        let html = render_receipt(&fee).expect("render");
        let today = chrono::Utc::now().format("%d/%m/%Y").to_string();
        assert!(html.contains(&today));
    }

    #[test]
    fn receipt_html_multibyte_date_falls_back_to_today() {
        let mut fee = sample_fee();
        fee["date"] = serde_json::Value::String("2024年03月05日".to_string());
        let html = render_receipt(&fee).expect("render");
        let today = chrono::Utc::now().format("%d/%m/%Y").to_string();
        assert!(html.contains(&today));
    }

    #[test]
    fn auto_print_injected_before_body_close() {
        let html = with_auto_print(&render_receipt(&sample_fee()).expect("render"));
        let script = html.find("window.print").expect("script present");
        let body_close = html.rfind("</body>").expect("body close present");
        assert!(script < body_close);
    }
}
