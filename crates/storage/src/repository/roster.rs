use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use sqlx::PgConnection;

use super::{BattleRole, Enrollment, PhaseGuarded, SelectionOutcome, lock_battle_phase};
use crate::Database;
use crate::error::Result;
use crate::models::{BattlePhase, Candidate, Judge, JudgeLogistics, Participant};

/// Candidates, participants and judges of a battle.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Refused with `Conflict(Judge)` when the user judges the battle.
    async fn insert_candidate(
        &self,
        candidate: &Candidate,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<Enrollment<Candidate>>>;

    async fn find_candidate(&self, candidate_id: Uuid) -> Result<Option<Candidate>>;

    async fn list_candidates(&self, battle_id: Uuid) -> Result<Vec<Candidate>>;

    /// Marks the candidate selected and creates its participant row, at most
    /// once per (battle, user) and never beyond `capacity` participants.
    async fn select_candidate(
        &self,
        candidate: &Candidate,
        open: &[BattlePhase],
        capacity: usize,
    ) -> Result<SelectionOutcome>;

    async fn delete_candidate(&self, candidate: &Candidate, open: &[BattlePhase]) -> Result<PhaseGuarded<()>>;

    async fn find_participant(&self, participant_id: Uuid) -> Result<Option<Participant>>;

    /// Ordered by selection time.
    async fn list_participants(&self, battle_id: Uuid) -> Result<Vec<Participant>>;

    async fn delete_participant(
        &self,
        participant: &Participant,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<()>>;

    /// Refused with `Conflict` when the user competes or applied to compete.
    async fn insert_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<Enrollment<Judge>>>;

    async fn find_judge(&self, judge_id: Uuid) -> Result<Option<Judge>>;

    async fn list_judges(&self, battle_id: Uuid) -> Result<Vec<Judge>>;

    async fn validate_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<Judge>>;

    async fn set_judge_logistics(
        &self,
        judge: &Judge,
        field: JudgeLogistics,
        value: bool,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<Judge>>;

    async fn delete_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<()>>;
}

#[async_trait]
impl RosterRepository for Database {
    async fn insert_candidate(
        &self,
        candidate: &Candidate,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<Enrollment<Candidate>>> {
        let mut tx = self.pool().begin().await?;

        // Exclusive: role checks of concurrent judge applications must wait.
        let Some(phase) = lock_battle_phase(&mut tx, candidate.battle_id, true).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }
        if holds_role(&mut tx, "battle_judges", candidate.battle_id, candidate.user_id).await? {
            return Ok(PhaseGuarded::Applied(Enrollment::Conflict(BattleRole::Judge)));
        }

        let inserted = sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO battle_candidates (
                id, battle_id, user_id, motivation, reference_jam_id, is_selected, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (battle_id, user_id) DO NOTHING
            RETURNING id, battle_id, user_id, motivation, reference_jam_id, is_selected, created_at
            "#,
        )
        .bind(candidate.id)
        .bind(candidate.battle_id)
        .bind(candidate.user_id)
        .bind(&candidate.motivation)
        .bind(candidate.reference_jam_id)
        .bind(candidate.is_selected)
        .bind(candidate.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PhaseGuarded::Applied(inserted.map_or(Enrollment::Duplicate, Enrollment::Enrolled)))
    }

    async fn find_candidate(&self, candidate_id: Uuid) -> Result<Option<Candidate>> {
        let candidate = sqlx::query_as::<_, Candidate>(
            r#"
            SELECT id, battle_id, user_id, motivation, reference_jam_id, is_selected, created_at
            FROM battle_candidates
            WHERE id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(candidate)
    }

    async fn list_candidates(&self, battle_id: Uuid) -> Result<Vec<Candidate>> {
        let candidates = sqlx::query_as::<_, Candidate>(
            r#"
            SELECT id, battle_id, user_id, motivation, reference_jam_id, is_selected, created_at
            FROM battle_candidates
            WHERE battle_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(battle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(candidates)
    }

    async fn select_candidate(
        &self,
        candidate: &Candidate,
        open: &[BattlePhase],
        capacity: usize,
    ) -> Result<SelectionOutcome> {
        let mut tx = self.pool().begin().await?;

        // Exclusive: serialises selections of the same battle so the
        // capacity check below cannot be raced.
        let Some(phase) = lock_battle_phase(&mut tx, candidate.battle_id, true).await? else {
            return Ok(SelectionOutcome::Missing);
        };
        if !open.contains(&phase) {
            return Ok(SelectionOutcome::Closed(phase));
        }

        let flagged = sqlx::query(
            r#"
            UPDATE battle_candidates
            SET is_selected = true
            WHERE id = $1
            "#,
        )
        .bind(candidate.id)
        .execute(&mut *tx)
        .await?;

        if flagged.rows_affected() == 0 {
            return Ok(SelectionOutcome::Missing);
        }

        let existing = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, battle_id, user_id, created_at
            FROM battle_participants
            WHERE battle_id = $1 AND user_id = $2
            "#,
        )
        .bind(candidate.battle_id)
        .bind(candidate.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(participant) = existing {
            tx.commit().await?;
            return Ok(SelectionOutcome::AlreadySelected(participant));
        }

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM battle_participants WHERE battle_id = $1
            "#,
        )
        .bind(candidate.battle_id)
        .fetch_one(&mut *tx)
        .await?;

        if count >= capacity as i64 {
            return Ok(SelectionOutcome::RosterFull);
        }

        let participant = sqlx::query_as::<_, Participant>(
            r#"
            INSERT INTO battle_participants (id, battle_id, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, battle_id, user_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(candidate.battle_id)
        .bind(candidate.user_id)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SelectionOutcome::Selected(participant))
    }

    async fn delete_candidate(&self, candidate: &Candidate, open: &[BattlePhase]) -> Result<PhaseGuarded<()>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, candidate.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let result = sqlx::query("DELETE FROM battle_candidates WHERE id = $1")
            .bind(candidate.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(if result.rows_affected() == 0 {
            PhaseGuarded::Missing
        } else {
            PhaseGuarded::Applied(())
        })
    }

    async fn find_participant(&self, participant_id: Uuid) -> Result<Option<Participant>> {
        let participant = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, battle_id, user_id, created_at
            FROM battle_participants
            WHERE id = $1
            "#,
        )
        .bind(participant_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(participant)
    }

    async fn list_participants(&self, battle_id: Uuid) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT id, battle_id, user_id, created_at
            FROM battle_participants
            WHERE battle_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(battle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(participants)
    }

    async fn delete_participant(
        &self,
        participant: &Participant,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<()>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, participant.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let result = sqlx::query("DELETE FROM battle_participants WHERE id = $1")
            .bind(participant.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() > 0 {
            sqlx::query(
                r#"
                UPDATE battle_candidates
                SET is_selected = FALSE
                WHERE battle_id = $1 AND user_id = $2
                "#,
            )
            .bind(participant.battle_id)
            .bind(participant.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(if result.rows_affected() == 0 {
            PhaseGuarded::Missing
        } else {
            PhaseGuarded::Applied(())
        })
    }

    async fn insert_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<Enrollment<Judge>>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, judge.battle_id, true).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }
        for (table, role) in [
            ("battle_participants", BattleRole::Participant),
            ("battle_candidates", BattleRole::Candidate),
        ] {
            if holds_role(&mut tx, table, judge.battle_id, judge.user_id).await? {
                return Ok(PhaseGuarded::Applied(Enrollment::Conflict(role)));
            }
        }

        let inserted = sqlx::query_as::<_, Judge>(
            r#"
            INSERT INTO battle_judges (
                id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (battle_id, user_id) DO NOTHING
            RETURNING id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
            "#,
        )
        .bind(judge.id)
        .bind(judge.battle_id)
        .bind(judge.user_id)
        .bind(judge.is_validated)
        .bind(judge.has_ordered)
        .bind(judge.has_received)
        .bind(judge.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PhaseGuarded::Applied(inserted.map_or(Enrollment::Duplicate, Enrollment::Enrolled)))
    }

    async fn find_judge(&self, judge_id: Uuid) -> Result<Option<Judge>> {
        let judge = sqlx::query_as::<_, Judge>(
            r#"
            SELECT id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
            FROM battle_judges
            WHERE id = $1
            "#,
        )
        .bind(judge_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(judge)
    }

    async fn list_judges(&self, battle_id: Uuid) -> Result<Vec<Judge>> {
        let judges = sqlx::query_as::<_, Judge>(
            r#"
            SELECT id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
            FROM battle_judges
            WHERE battle_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(battle_id)
        .fetch_all(self.pool())
        .await?;

        Ok(judges)
    }

    async fn validate_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<Judge>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, judge.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let updated = sqlx::query_as::<_, Judge>(
            r#"
            UPDATE battle_judges
            SET is_validated = true
            WHERE id = $1
            RETURNING id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
            "#,
        )
        .bind(judge.id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated.map_or(PhaseGuarded::Missing, PhaseGuarded::Applied))
    }

    async fn set_judge_logistics(
        &self,
        judge: &Judge,
        field: JudgeLogistics,
        value: bool,
        open: &[BattlePhase],
    ) -> Result<PhaseGuarded<Judge>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, judge.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let sql = match field {
            JudgeLogistics::HasOrdered => {
                r#"
                UPDATE battle_judges
                SET has_ordered = $2
                WHERE id = $1
                RETURNING id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
                "#
            }
            JudgeLogistics::HasReceived => {
                r#"
                UPDATE battle_judges
                SET has_received = $2
                WHERE id = $1
                RETURNING id, battle_id, user_id, is_validated, has_ordered, has_received, created_at
                "#
            }
        };

        let updated = sqlx::query_as::<_, Judge>(sql)
            .bind(judge.id)
            .bind(value)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(updated.map_or(PhaseGuarded::Missing, PhaseGuarded::Applied))
    }

    async fn delete_judge(&self, judge: &Judge, open: &[BattlePhase]) -> Result<PhaseGuarded<()>> {
        let mut tx = self.pool().begin().await?;

        let Some(phase) = lock_battle_phase(&mut tx, judge.battle_id, false).await? else {
            return Ok(PhaseGuarded::Missing);
        };
        if let Some(closed) = PhaseGuarded::check(phase, open) {
            return Ok(closed);
        }

        let result = sqlx::query("DELETE FROM battle_judges WHERE id = $1")
            .bind(judge.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(if result.rows_affected() == 0 {
            PhaseGuarded::Missing
        } else {
            PhaseGuarded::Applied(())
        })
    }
}

/// `table` is one of the roster tables; never caller input.
async fn holds_role(conn: &mut PgConnection, table: &str, battle_id: Uuid, user_id: Uuid) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE battle_id = $1 AND user_id = $2)",
        table
    );

    let held: bool = sqlx::query_scalar(&sql)
        .bind(battle_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    Ok(held)
}
