use async_trait::async_trait;
use uuid::Uuid;

use crate::Database;
use crate::error::Result;
use crate::models::{CreditTransaction, Profile};

/// Jam statuses that count towards battle eligibility.
pub const APPROVED_JAM_STATUSES: [&str; 2] = ["approved", "active"];

/// Read side of the user profile store, plus the credit ledger.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;

    /// Newest first.
    async fn list_credit_transactions(&self, user_id: Uuid) -> Result<Vec<CreditTransaction>>;
}

/// The jam catalogue, seen from the battle engine.
#[async_trait]
pub trait JamInventory: Send + Sync {
    /// Jams of the user that are approved and still listed.
    async fn count_approved_jams(&self, user_id: Uuid) -> Result<i64>;

    async fn find_jam_owner(&self, jam_id: Uuid) -> Result<Option<Uuid>>;
}

#[async_trait]
impl ProfileRepository for Database {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, credits, is_organizer, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(profile)
    }

    async fn list_credit_transactions(&self, user_id: Uuid) -> Result<Vec<CreditTransaction>> {
        let transactions = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT id, user_id, amount, description, related_order_id, battle_id, created_at
            FROM credit_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(transactions)
    }
}

#[async_trait]
impl JamInventory for Database {
    async fn count_approved_jams(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM jams
            WHERE creator_id = $1
              AND is_active
              AND status = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(&APPROVED_JAM_STATUSES[..])
        .fetch_one(self.pool())
        .await?;

        Ok(count)
    }

    async fn find_jam_owner(&self, jam_id: Uuid) -> Result<Option<Uuid>> {
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT creator_id FROM jams WHERE id = $1")
            .bind(jam_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(owner)
    }
}
