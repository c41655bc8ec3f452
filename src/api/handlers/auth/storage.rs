//! Database helpers for credential and one-time-code state.
//!
//! Every mutation is a single-document operation or a short transaction; the
//! storage layer's per-row atomicity is the only coordination primitive.
//! Cross-row cleanup on account deletion rides on `ON DELETE CASCADE`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::Role;
use super::utils::is_unique_violation;

/// Full credential record, including the password hash. Only sanitized
/// projections leave the API boundary.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub blocked: bool,
    pub profile_complete: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome when attempting to create a new user + code pair.
#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created(Uuid),
    Conflict,
}

fn user_from_row(row: &PgRow) -> Result<UserRecord> {
    let role: String = row.get("role");
    let role =
        Role::parse(&role).with_context(|| format!("unknown role in users table: {role}"))?;
    Ok(UserRecord {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        verified: row.get("verified"),
        blocked: row.get("blocked"),
        profile_complete: row.get("profile_complete"),
        created_at: row.get("created_at"),
    })
}

pub(crate) async fn lookup_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, full_name, email, password_hash, role, verified, blocked,
               profile_complete, created_at
        FROM users
        WHERE email = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by email")?;

    row.as_ref().map(user_from_row).transpose()
}

pub(crate) async fn lookup_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = r"
        SELECT id, full_name, email, password_hash, role, verified, blocked,
               profile_complete, created_at
        FROM users
        WHERE id = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by id")?;

    row.as_ref().map(user_from_row).transpose()
}

/// Create the credential record and its first one-time code atomically.
///
/// The unique index on `users.email` decides concurrent registrations for
/// the same address; the loser comes back as `Conflict`.
pub(super) async fn insert_user_with_otp(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
    code: &str,
    otp_ttl_seconds: i64,
) -> Result<RegisterOutcome> {
    let mut tx = pool.begin().await.context("begin register transaction")?;

    let query = r"
        INSERT INTO users (full_name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: Uuid = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(RegisterOutcome::Conflict);
            }
            return Err(err).context("failed to insert user");
        }
    };

    insert_otp(&mut tx, user_id, code, otp_ttl_seconds).await?;

    tx.commit().await.context("commit register transaction")?;

    Ok(RegisterOutcome::Created(user_id))
}

async fn insert_otp(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    code: &str,
    otp_ttl_seconds: i64,
) -> Result<()> {
    let query = r"
        INSERT INTO otps (user_id, code, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .bind(otp_ttl_seconds)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to insert one-time code")?;

    Ok(())
}

/// Best-effort housekeeping: drop every code whose expiry has passed.
///
/// Correctness never depends on this having run; `consume_otp` checks the
/// expiry itself.
pub(super) async fn sweep_expired_otps(pool: &PgPool) -> Result<u64> {
    let query = "DELETE FROM otps WHERE expires_at <= NOW()";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to sweep expired codes")?;

    Ok(result.rows_affected())
}

/// Consume a matching, unexpired code and flip the account to verified.
///
/// The expiry predicate lives in the delete itself so an expired-but-unswept
/// code can never verify. Returns `false` when no row matched (wrong code,
/// already consumed, or expired - indistinguishable on purpose).
pub(super) async fn consume_otp(pool: &PgPool, user_id: Uuid, code: &str) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin verify transaction")?;

    let query = r"
        DELETE FROM otps
        WHERE user_id = $1
          AND code = $2
          AND expires_at > NOW()
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to consume one-time code")?;

    if row.is_none() {
        let _ = tx.rollback().await;
        return Ok(false);
    }

    let query = r"
        UPDATE users
        SET verified = TRUE,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark user verified")?;

    tx.commit().await.context("commit verify transaction")?;

    Ok(true)
}

/// Replace any existing code for the user with a fresh one.
///
/// Delete-then-insert in one transaction; prior codes stop verifying the
/// moment this commits, even when unexpired.
pub(super) async fn replace_otp(
    pool: &PgPool,
    user_id: Uuid,
    code: &str,
    otp_ttl_seconds: i64,
) -> Result<()> {
    let mut tx = pool.begin().await.context("begin resend transaction")?;

    let query = "DELETE FROM otps WHERE user_id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete prior codes")?;

    insert_otp(&mut tx, user_id, code, otp_ttl_seconds).await?;

    tx.commit().await.context("commit resend transaction")?;

    Ok(())
}

/// Overwrite the stored password hash. Returns `false` when the user is gone.
pub(super) async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<bool> {
    let query = r"
        UPDATE users
        SET password_hash = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password")?;

    Ok(result.rows_affected() > 0)
}

/// Delete the credential record; owned profiles, projects, and comments go
/// with it via cascade. Returns `false` when the id was already absent.
pub(super) async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_users(pool: &PgPool) -> Result<Vec<UserRecord>> {
    let query = r"
        SELECT id, full_name, email, password_hash, role, verified, blocked,
               profile_complete, created_at
        FROM users
        ORDER BY created_at DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list users")?;

    rows.iter().map(user_from_row).collect()
}

/// Set or clear the blocked flag. Returns `false` for unknown ids.
pub(crate) async fn set_blocked(pool: &PgPool, user_id: Uuid, blocked: bool) -> Result<bool> {
    let query = r"
        UPDATE users
        SET blocked = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(blocked)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update blocked flag")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::RegisterOutcome;
    use uuid::Uuid;

    #[test]
    fn register_outcome_debug_names() {
        let id = Uuid::nil();
        assert_eq!(
            format!("{:?}", RegisterOutcome::Created(id)),
            format!("Created({id:?})")
        );
        assert_eq!(format!("{:?}", RegisterOutcome::Conflict), "Conflict");
    }
}
