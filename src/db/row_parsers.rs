use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::errors::AppError;

use super::roles::DbProjectRole;

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, AppError> {
    let s = s.trim();

    // RFC3339 is what sqlx writes for DateTime<Utc>
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // SQLite CURRENT_TIMESTAMP format, for rows written by hand
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    Err(AppError::internal(format!("invalid datetime: {}", s)))
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|e| AppError::internal(format!("invalid uuid in {}: {}", column, e)))
}

pub fn db_project_role_from_row(row: &SqliteRow) -> Result<DbProjectRole, AppError> {
    let user_id_s: String = row.try_get("user_id").map_err(|e| AppError::internal(format!("missing user_id: {}", e)))?;
    let project_id_s: String = row.try_get("project_id").map_err(|e| AppError::internal(format!("missing project_id: {}", e)))?;
    let kind: String = row.try_get("kind").map_err(|e| AppError::internal(format!("missing kind: {}", e)))?;
    let policy: Option<String> = row.try_get("policy").map_err(|e| AppError::internal(format!("missing policy: {}", e)))?;
    let created_at_s: String = row.try_get("created_at").map_err(|e| AppError::internal(format!("missing created_at: {}", e)))?;
    let updated_at_s: String = row.try_get("updated_at").map_err(|e| AppError::internal(format!("missing updated_at: {}", e)))?;

    Ok(DbProjectRole {
        user_id: parse_uuid("user_id", &user_id_s)?,
        project_id: parse_uuid("project_id", &project_id_s)?,
        kind,
        policy,
        created_at: parse_datetime(&created_at_s)?,
        updated_at: parse_datetime(&updated_at_s)?,
    })
}
