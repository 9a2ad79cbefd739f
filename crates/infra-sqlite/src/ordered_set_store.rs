// SQLite OrderedSetStore Implementation
//
// Ordering is (score ASC, member ASC) with BINARY collation, which matches
// the byte-wise tie-break of a remote sorted-set store.

use crate::map_sqlx_error;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use waitroom_core::error::Result;
use waitroom_core::port::{KeyPage, OrderedSetStore, ScoredMember};

const POP_MINIMUM_SQL: &str = r#"
    DELETE FROM sorted_set_members
    WHERE set_key = ? AND member IN (
        SELECT member FROM sorted_set_members
        WHERE set_key = ?
        ORDER BY score ASC, member ASC
        LIMIT ?
    )
    RETURNING member, score
"#;

pub struct SqliteOrderedSetStore {
    pool: SqlitePool,
}

impl SqliteOrderedSetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn clamp_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// RETURNING does not promise any order
fn into_sorted_members(rows: Vec<(String, f64)>) -> Vec<ScoredMember> {
    let mut members: Vec<ScoredMember> = rows
        .into_iter()
        .map(|(member, score)| ScoredMember { member, score })
        .collect();
    members.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.member.cmp(&b.member))
    });
    members
}

#[async_trait]
impl OrderedSetStore for SqliteOrderedSetStore {
    async fn add_if_absent(&self, key: &str, member: &str, score: f64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO sorted_set_members (set_key, member, score)
            VALUES (?, ?, ?)
            ON CONFLICT (set_key, member) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(member)
        .bind(score)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn rank(&self, key: &str, member: &str) -> Result<Option<u64>> {
        let rank: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT (
                SELECT COUNT(*) FROM sorted_set_members o
                WHERE o.set_key = m.set_key
                  AND (o.score < m.score OR (o.score = m.score AND o.member < m.member))
            )
            FROM sorted_set_members m
            WHERE m.set_key = ? AND m.member = ?
            "#,
        )
        .bind(key)
        .bind(member)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rank.map(|r| r as u64))
    }

    async fn pop_minimum(&self, key: &str, count: u64) -> Result<Vec<ScoredMember>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, f64)> = sqlx::query_as(POP_MINIMUM_SQL)
            .bind(key)
            .bind(key)
            .bind(clamp_count(count))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(into_sorted_members(rows))
    }

    async fn scan_keys(
        &self,
        pattern: &str,
        cursor: Option<&str>,
        page_size: usize,
    ) -> Result<KeyPage> {
        let page_size = page_size.max(1);

        // One extra row tells us whether another page exists
        let mut keys: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT set_key FROM sorted_set_members
            WHERE set_key GLOB ? AND set_key > ?
            ORDER BY set_key ASC
            LIMIT ?
            "#,
        )
        .bind(pattern)
        .bind(cursor.unwrap_or(""))
        .bind(page_size as i64 + 1)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let next_cursor = if keys.len() > page_size {
            keys.truncate(page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(KeyPage { keys, next_cursor })
    }

    /// Pop and insert inside one transaction, so a member is either still
    /// waiting or already in `to`, never neither.
    async fn move_minimum(
        &self,
        from: &str,
        to: &str,
        count: u64,
        score: f64,
    ) -> Result<Vec<ScoredMember>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let rows: Vec<(String, f64)> = sqlx::query_as(POP_MINIMUM_SQL)
            .bind(from)
            .bind(from)
            .bind(clamp_count(count))
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let popped = into_sorted_members(rows);

        for entry in &popped {
            sqlx::query(
                r#"
                INSERT INTO sorted_set_members (set_key, member, score)
                VALUES (?, ?, ?)
                ON CONFLICT (set_key, member) DO NOTHING
                "#,
            )
            .bind(to)
            .bind(&entry.member)
            .bind(score)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(from = %from, to = %to, moved = popped.len(), "Moved lowest-score members");

        Ok(popped
            .into_iter()
            .map(|entry| ScoredMember {
                member: entry.member,
                score,
            })
            .collect())
    }
}
