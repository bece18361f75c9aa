use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::{json, Value};
use std::path::Path;

use crate::receipt;

pub fn open_db(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("feebook.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            class TEXT NOT NULL,
            section TEXT NOT NULL,
            roll_no TEXT NOT NULL,
            parent_name TEXT NOT NULL,
            phone TEXT NOT NULL,
            address TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    // Lookup key only; uniqueness is deliberately not enforced.
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_roll_no ON students(roll_no)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS fees(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            month INTEGER NOT NULL,
            year INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL,
            payment_method TEXT,
            date TEXT,
            receipt_id TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            FOREIGN KEY(student_id) REFERENCES students(id),
            UNIQUE(student_id, month, year)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_fees_student ON fees(student_id)",
        [],
    )?;

    Ok(conn)
}

pub fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub const STUDENT_COLS: &str =
    "id, name, class, section, roll_no, parent_name, phone, address, created_at, updated_at";

pub fn student_row_json(row: &Row) -> rusqlite::Result<Value> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let class: String = row.get(2)?;
    let section: String = row.get(3)?;
    let roll_no: String = row.get(4)?;
    let parent_name: String = row.get(5)?;
    let phone: String = row.get(6)?;
    let address: String = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: Option<String> = row.get(9)?;
    Ok(json!({
        "id": id,
        "name": name,
        "class": class,
        "section": section,
        "rollNo": roll_no,
        "parentName": parent_name,
        "phone": phone,
        "address": address,
        "createdAt": created_at,
        "updatedAt": updated_at,
    }))
}

pub const FEE_COLS: &str = "id, student_id, month, year, amount, status, payment_method, date, \
                            receipt_id, created_at, updated_at";

pub fn fee_row_json(row: &Row) -> rusqlite::Result<Value> {
    let id: i64 = row.get(0)?;
    let student_id: i64 = row.get(1)?;
    let month: i64 = row.get(2)?;
    let year: i64 = row.get(3)?;
    let amount: i64 = row.get(4)?;
    let status: String = row.get(5)?;
    let payment_method: Option<String> = row.get(6)?;
    let date: Option<String> = row.get(7)?;
    let receipt_id: String = row.get(8)?;
    let created_at: String = row.get(9)?;
    let updated_at: Option<String> = row.get(10)?;
    Ok(json!({
        "id": id,
        "studentId": student_id,
        "month": month,
        "year": year,
        "amount": amount,
        "status": status,
        "paymentMethod": payment_method,
        "date": date,
        "receiptId": receipt_id,
        "createdAt": created_at,
        "updatedAt": updated_at,
    }))
}

pub fn get_student(conn: &Connection, id: i64) -> rusqlite::Result<Option<Value>> {
    conn.query_row(
        &format!("SELECT {STUDENT_COLS} FROM students WHERE id = ?"),
        [id],
        student_row_json,
    )
    .optional()
}

/// Fee rows for one student, newest first.
pub fn fees_for_student(conn: &Connection, student_id: i64) -> rusqlite::Result<Vec<Value>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FEE_COLS} FROM fees
         WHERE student_id = ?
         ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([student_id], fee_row_json)?;
    rows.collect()
}

// The 4-digit suffix collides eventually; the UNIQUE column catches it and we
// draw again. Ten thousand slots per day makes repeats past this bound
// effectively impossible.
const RECEIPT_ID_ATTEMPTS: usize = 8;

/// Insert a fee row, stamping a fresh receipt id and drawing again if the id
/// is already taken. Every other constraint error goes straight back to the
/// caller.
#[allow(clippy::too_many_arguments)]
pub fn insert_fee(
    conn: &Connection,
    student_id: i64,
    month: i64,
    year: i64,
    amount: i64,
    status: &str,
    payment_method: Option<&str>,
    date: Option<&str>,
) -> rusqlite::Result<i64> {
    insert_fee_with(
        conn,
        student_id,
        month,
        year,
        amount,
        status,
        payment_method,
        date,
        receipt::generate_receipt_id,
    )
}

#[allow(clippy::too_many_arguments)]
fn insert_fee_with(
    conn: &Connection,
    student_id: i64,
    month: i64,
    year: i64,
    amount: i64,
    status: &str,
    payment_method: Option<&str>,
    date: Option<&str>,
    next_receipt_id: impl Fn() -> String,
) -> rusqlite::Result<i64> {
    let mut attempts = RECEIPT_ID_ATTEMPTS;
    loop {
        let receipt_id = next_receipt_id();
        attempts -= 1;
        let inserted = conn.execute(
            "INSERT INTO fees(student_id, month, year, amount, status, payment_method, date, receipt_id, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                student_id,
                month,
                year,
                amount,
                status,
                payment_method,
                date,
                &receipt_id,
                now_iso(),
            ),
        );
        match inserted {
            Ok(_) => return Ok(conn.last_insert_rowid()),
            Err(e) if attempts > 0 && e.to_string().contains("fees.receipt_id") => continue,
            Err(e) => return Err(e),
        }
    }
}

/// One fee row with its owning student embedded under "student".
pub fn get_fee_with_student(conn: &Connection, id: i64) -> rusqlite::Result<Option<Value>> {
    let fee = conn
        .query_row(
            &format!("SELECT {FEE_COLS} FROM fees WHERE id = ?"),
            [id],
            fee_row_json,
        )
        .optional()?;
    let Some(mut fee) = fee else {
        return Ok(None);
    };
    let student_id = fee["studentId"].as_i64().unwrap_or(0);
    fee["student"] = get_student(conn, student_id)?.unwrap_or(Value::Null);
    Ok(Some(fee))
}
