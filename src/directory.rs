//! Read-only access to the user and opportunity directories.
//!
//! Both directories are owned by collaborators outside this service; the
//! SQLite adapter here reads the same document shapes they write. Records the
//! adapter cannot make sense of are skipped, never fatal.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    models::{OpportunityRecord, OpportunityStatus, Role, UserId, VolunteerProfile},
    AppResult,
};

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn profile(&self, id: UserId) -> AppResult<Option<VolunteerProfile>>;

    /// All users with the volunteer role, in directory order.
    async fn volunteers(&self) -> AppResult<Vec<VolunteerProfile>>;

    async fn display_name(&self, id: UserId) -> AppResult<Option<String>>;
}

#[async_trait]
pub trait OpportunityDirectory: Send + Sync {
    async fn opportunity(&self, id: Uuid) -> AppResult<Option<OpportunityRecord>>;

    /// Opportunities with status `open`, in directory order.
    async fn open_opportunities(&self) -> AppResult<Vec<OpportunityRecord>>;
}

type UserRow = (String, String, Option<String>, Option<String>);
type OpportunityRow = (String, String, Option<String>, Option<String>, String, String);

#[derive(Clone)]
pub struct SqliteDirectory {
    db_pool: SqlitePool,
}

impl SqliteDirectory {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub async fn add_user(&self, profile: &VolunteerProfile, role: Role) -> AppResult<()> {
        sqlx::query("INSERT INTO users (id,name,role,skills,location) VALUES (?,?,?,?,?)")
            .bind(profile.id.to_string())
            .bind(&profile.name)
            .bind(role.as_str())
            .bind(encode_skills(&profile.skills))
            .bind(&profile.location)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }

    pub async fn add_opportunity(&self, opportunity: &OpportunityRecord) -> AppResult<()> {
        sqlx::query("INSERT INTO opportunities (id,title,required_skills,location,owner_id,status) VALUES (?,?,?,?,?,?)")
            .bind(opportunity.id.to_string())
            .bind(&opportunity.title)
            .bind(encode_skills(&opportunity.required_skills))
            .bind(&opportunity.location)
            .bind(opportunity.owner_id.to_string())
            .bind(opportunity.status.as_str())
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for SqliteDirectory {
    async fn profile(&self, id: UserId) -> AppResult<Option<VolunteerProfile>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id,name,skills,location FROM users WHERE id=?")
                .bind(id.to_string())
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(row.and_then(user_from_row))
    }

    async fn volunteers(&self) -> AppResult<Vec<VolunteerProfile>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id,name,skills,location FROM users WHERE role=? ORDER BY rowid")
                .bind(Role::Volunteer.as_str())
                .fetch_all(&self.db_pool)
                .await?;

        Ok(rows.into_iter().filter_map(user_from_row).collect())
    }

    async fn display_name(&self, id: UserId) -> AppResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE id=?")
            .bind(id.to_string())
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(row.map(|(name,)| name).filter(|name| !name.trim().is_empty()))
    }
}

#[async_trait]
impl OpportunityDirectory for SqliteDirectory {
    async fn opportunity(&self, id: Uuid) -> AppResult<Option<OpportunityRecord>> {
        let row: Option<OpportunityRow> = sqlx::query_as(
            "SELECT id,title,required_skills,location,owner_id,status FROM opportunities WHERE id=?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(row.and_then(opportunity_from_row))
    }

    async fn open_opportunities(&self) -> AppResult<Vec<OpportunityRecord>> {
        let rows: Vec<OpportunityRow> = sqlx::query_as(
            "SELECT id,title,required_skills,location,owner_id,status FROM opportunities WHERE status=? ORDER BY rowid",
        )
        .bind(OpportunityStatus::Open.as_str())
        .fetch_all(&self.db_pool)
        .await?;

        Ok(rows.into_iter().filter_map(opportunity_from_row).collect())
    }
}

fn encode_skills(skills: &[String]) -> String {
    serde_json::to_string(skills).unwrap_or_else(|_| "[]".to_owned())
}

// Missing or malformed skill lists read as empty.
fn decode_skills(raw: Option<String>) -> Vec<String> {
    raw.and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn user_from_row((id, name, skills, location): UserRow) -> Option<VolunteerProfile> {
    let Ok(id) = Uuid::parse_str(&id) else {
        tracing::warn!(%id, "skipping user record with malformed id");
        return None;
    };

    Some(VolunteerProfile {
        id,
        name,
        skills: decode_skills(skills),
        location,
    })
}

fn opportunity_from_row(
    (id, title, skills, location, owner_id, status): OpportunityRow,
) -> Option<OpportunityRecord> {
    let (Ok(id), Ok(owner_id), Ok(status)) = (
        Uuid::parse_str(&id),
        Uuid::parse_str(&owner_id),
        status.parse::<OpportunityStatus>(),
    ) else {
        tracing::warn!(%id, "skipping malformed opportunity record");
        return None;
    };

    Some(OpportunityRecord {
        id,
        title,
        required_skills: decode_skills(skills),
        location,
        owner_id,
        status,
    })
}
