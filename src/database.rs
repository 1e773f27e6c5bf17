use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// A report as issued and archived: identity, predicted score and the
/// accepted what-if narratives (stored as a JSON array of strings).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReportRecord {
    pub id: i64,
    pub student_name: String,
    pub student_id: String,
    pub department: String,
    pub prediction: f64,
    pub roadmap: String,
    pub attendance_rate: f64,
    pub study_hours: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub student_name: String,
    pub student_id: String,
    pub department: String,
    pub prediction: f64,
    pub roadmap: String,
    pub attendance_rate: f64,
    pub study_hours: f64,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        // A single connection keeps in-memory databases coherent and is
        // plenty for SQLite's serialized writes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_name TEXT NOT NULL,
                student_id TEXT NOT NULL,
                department TEXT NOT NULL,
                prediction REAL NOT NULL,
                roadmap TEXT NOT NULL,
                attendance_rate REAL NOT NULL,
                study_hours REAL NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Database { pool })
    }

    pub async fn save_report(&self, report: &NewReport) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO reports
                (student_name, student_id, department, prediction, roadmap,
                 attendance_rate, study_hours, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.student_name)
        .bind(&report.student_id)
        .bind(&report.department)
        .bind(report.prediction)
        .bind(&report.roadmap)
        .bind(report.attendance_rate)
        .bind(report.study_hours)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_report(&self, id: i64) -> Result<Option<ReportRecord>, sqlx::Error> {
        sqlx::query_as::<_, ReportRecord>(
            r#"
            SELECT id, student_name, student_id, department, prediction,
                   roadmap, attendance_rate, study_hours, created_at
            FROM reports
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_reports(&self) -> Result<Vec<ReportRecord>, sqlx::Error> {
        sqlx::query_as::<_, ReportRecord>(
            r#"
            SELECT id, student_name, student_id, department, prediction,
                   roadmap, attendance_rate, study_hours, created_at
            FROM reports
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}
