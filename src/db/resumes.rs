use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{EducationEntry, ExperienceEntry, ResumeForm, SkillEntry};

#[derive(Debug, Clone, FromRow)]
struct ResumeRow {
    id: String,
    user_id: String,
    full_name: String,
    email: String,
    phone: String,
    location: String,
    summary: String,
    education: String,
    experience: String,
    skills: String,
    generated_content: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Resume {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    pub education: Vec<EducationEntry>,
    pub experience: Vec<ExperienceEntry>,
    pub skills: Vec<SkillEntry>,
    pub generated_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResumeRow> for Resume {
    type Error = AppError;

    fn try_from(row: ResumeRow) -> AppResult<Self> {
        Ok(Resume {
            education: serde_json::from_str(&row.education)
                .map_err(|e| AppError::internal(format!("Corrupt education column: {}", e)))?,
            experience: serde_json::from_str(&row.experience)
                .map_err(|e| AppError::internal(format!("Corrupt experience column: {}", e)))?,
            skills: serde_json::from_str(&row.skills)
                .map_err(|e| AppError::internal(format!("Corrupt skills column: {}", e)))?,
            id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            location: row.location,
            summary: row.summary,
            generated_content: row.generated_content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Stores the user's resume, replacing every field of an existing one.
pub async fn upsert(
    pool: &SqlitePool,
    user_id: &str,
    form: &ResumeForm,
    generated_content: &str,
) -> AppResult<Resume> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO resumes (
            id, user_id, full_name, email, phone, location, summary,
            education, experience, skills, generated_content, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE SET
            full_name = excluded.full_name,
            email = excluded.email,
            phone = excluded.phone,
            location = excluded.location,
            summary = excluded.summary,
            education = excluded.education,
            experience = excluded.experience,
            skills = excluded.skills,
            generated_content = excluded.generated_content,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(form.full_name.trim())
    .bind(form.email.trim())
    .bind(form.phone.trim())
    .bind(form.location.trim())
    .bind(form.summary.trim())
    .bind(serde_json::to_string(&form.education)?)
    .bind(serde_json::to_string(&form.experience)?)
    .bind(serde_json::to_string(&form.skills)?)
    .bind(generated_content)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_for_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::internal("Resume vanished after upsert"))
}

pub async fn find_for_user(pool: &SqlitePool, user_id: &str) -> AppResult<Option<Resume>> {
    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        SELECT id, user_id, full_name, email, phone, location, summary,
               education, experience, skills, generated_content, created_at, updated_at
        FROM resumes
        WHERE user_id = ?
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(Resume::try_from).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, users};

    fn form(name: &str, schools: &[&str]) -> ResumeForm {
        ResumeForm {
            full_name: name.to_string(),
            email: "someone@example.com".to_string(),
            education: schools
                .iter()
                .map(|s| EducationEntry {
                    degree: "BSc".to_string(),
                    institution: s.to_string(),
                    ..EducationEntry::default()
                })
                .collect(),
            ..ResumeForm::default()
        }
    }

    #[tokio::test]
    async fn resubmission_overwrites_in_place() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let user = users::create_user(&pool, "ada", "password1").await.unwrap();

        let first = upsert(&pool, &user.id, &form("Ada", &["Cambridge", "London"]), "<p>v1</p>")
            .await
            .unwrap();
        let second = upsert(&pool, &user.id, &form("Ada L.", &["Oxford"]), "<p>v2</p>")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.full_name, "Ada L.");
        assert_eq!(second.education.len(), 1);
        assert_eq!(second.education[0].institution, "Oxford");
        assert_eq!(second.generated_content.as_deref(), Some("<p>v2</p>"));
    }

    #[tokio::test]
    async fn missing_resume_is_none() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        assert!(find_for_user(&pool, "nobody").await.unwrap().is_none());
    }
}
