// src/poll.rs
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewPoll, NewVote, Poll, Vote};

/// Storage operations for polls and their votes.
///
/// Uniqueness of `(poll_id, voter_ip)` and the cascade from polls to votes
/// are left to the database; this type only adds the checks the schema
/// cannot express.
#[derive(Clone)]
pub struct PollStore {
    pool: PgPool,
}

impl PollStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_poll(&self, new_poll: NewPoll) -> Result<Poll, StoreError> {
        new_poll.validate(Utc::now())?;

        let poll = sqlx::query_as::<_, Poll>(
            r#"
            INSERT INTO polls (title, options, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, title, options, expires_at, created_at
            "#,
        )
        .bind(new_poll.title.trim())
        .bind(&new_poll.options)
        .bind(new_poll.expires_at)
        .fetch_one(&self.pool)
        .await?;

        info!(poll_id = %poll.id, options = poll.options.len(), "poll created");
        Ok(poll)
    }

    pub async fn get_poll(&self, id: Uuid) -> Result<Poll, StoreError> {
        sqlx::query_as::<_, Poll>(
            "SELECT id, title, options, expires_at, created_at FROM polls WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::PollNotFound(id))
    }

    pub async fn list_polls(&self) -> Result<Vec<Poll>, StoreError> {
        let polls = sqlx::query_as::<_, Poll>(
            "SELECT id, title, options, expires_at, created_at FROM polls ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(polls)
    }

    /// Delete a poll. Its votes go with it via `ON DELETE CASCADE`.
    pub async fn delete_poll(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::PollNotFound(id));
        }
        info!(poll_id = %id, "poll deleted");
        Ok(())
    }

    /// Record a vote.
    ///
    /// The poll row is share-locked for the duration of the insert, so a
    /// concurrent delete either happens first (and this returns
    /// `PollNotFound`) or waits until the vote is committed and then
    /// cascades over it.
    pub async fn cast_vote(&self, new_vote: NewVote) -> Result<Vote, StoreError> {
        new_vote.validate()?;

        let mut tx = self.pool.begin().await?;

        let (options, expires_at): (Vec<String>, DateTime<Utc>) = sqlx::query_as(
            "SELECT options, expires_at FROM polls WHERE id = $1 FOR SHARE",
        )
        .bind(new_vote.poll_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::PollNotFound(new_vote.poll_id))?;

        if Utc::now() >= expires_at {
            return Err(StoreError::PollClosed(new_vote.poll_id));
        }
        new_vote.check_option(&options)?;

        let vote = sqlx::query_as::<_, Vote>(
            r#"
            INSERT INTO votes (poll_id, option_index, voter_ip)
            VALUES ($1, $2, $3)
            RETURNING id, poll_id, option_index, voter_ip, created_at
            "#,
        )
        .bind(new_vote.poll_id)
        .bind(new_vote.option_index)
        .bind(new_vote.voter_ip.trim())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(poll_id = %vote.poll_id, vote_id = %vote.id, "vote recorded");
        Ok(vote)
    }

    pub async fn votes_for_poll(&self, poll_id: Uuid) -> Result<Vec<Vote>, StoreError> {
        let votes = sqlx::query_as::<_, Vote>(
            r#"
            SELECT id, poll_id, option_index, voter_ip, created_at
            FROM votes
            WHERE poll_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(votes)
    }
}
