use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use rusqlite::Connection;
use std::path::Path;

use crate::db;

const DEMO_STUDENTS: &[(&str, &str, &str, &str, &str, &str, &str)] = &[
    (
        "Rahul Kumar",
        "10-A",
        "Science",
        "001",
        "Mr. Kumar",
        "9876543210",
        "123 Main St, Delhi",
    ),
    (
        "Priya Singh",
        "10-B",
        "Commerce",
        "002",
        "Mr. Singh",
        "9876543211",
        "456 Park Rd, Mumbai",
    ),
    (
        "Amit Patel",
        "9-A",
        "Science",
        "003",
        "Mr. Patel",
        "9876543212",
        "789 Oak Ave, Bangalore",
    ),
    (
        "Neha Verma",
        "9-B",
        "Arts",
        "004",
        "Mrs. Verma",
        "9876543213",
        "321 Elm St, Chennai",
    ),
    (
        "Vikram Dubey",
        "8-A",
        "General",
        "005",
        "Mr. Dubey",
        "9876543214",
        "654 Birch Ln, Pune",
    ),
];

/// Wipe and repopulate the database with the demo operator, five students and
/// two fee rows per student. Safe to re-run.
pub fn run(data_dir: &Path) -> anyhow::Result<()> {
    log::info!("seeding database in {}", data_dir.display());
    let conn = db::open_db(data_dir)?;

    conn.execute("DELETE FROM fees", [])?;
    conn.execute("DELETE FROM students", [])?;
    conn.execute("DELETE FROM users", [])?;

    create_admin_user(&conn)?;
    log::info!("created admin user");

    let mut student_ids = Vec::new();
    for (name, class, section, roll_no, parent_name, phone, address) in DEMO_STUDENTS {
        conn.execute(
            "INSERT INTO students(name, class, section, roll_no, parent_name, phone, address, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            (
                name,
                class,
                section,
                roll_no,
                parent_name,
                phone,
                address,
                db::now_iso(),
            ),
        )?;
        student_ids.push(conn.last_insert_rowid());
    }
    log::info!("created {} students", student_ids.len());

    // Month 1 collected, month 2 still due.
    let mut fee_count = 0;
    for student_id in &student_ids {
        for month in 1..=2i64 {
            let paid = month == 1;
            let paid_date = if paid { Some(db::now_iso()) } else { None };
            db::insert_fee(
                &conn,
                *student_id,
                month,
                2024,
                2500,
                if paid { "paid" } else { "unpaid" },
                if paid { Some("online") } else { None },
                paid_date.as_deref(),
            )?;
            fee_count += 1;
        }
    }
    log::info!("created {fee_count} fee records");

    log::info!("database seeded successfully");
    Ok(())
}

fn create_admin_user(conn: &Connection) -> anyhow::Result<()> {
    let hash = Argon2::default()
        .hash_password(b"admin123", &SaltString::generate(&mut OsRng))
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    conn.execute(
        "INSERT INTO users(username, password_hash, role, created_at) VALUES(?, ?, ?, ?)",
        ("admin", hash, "admin", db::now_iso()),
    )?;
    Ok(())
}
