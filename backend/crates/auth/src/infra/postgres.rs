//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::session::{Session, SessionPayload};
use crate::domain::entity::user::User;
use crate::domain::repository::{CredentialRepository, SessionRepository};
use crate::domain::service::lockout::{LockoutPolicy, LoginState};
use crate::domain::value_object::{email::Email, user_password::UserPassword, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed credential and session store
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = r#"
    user_id,
    email,
    name,
    role,
    password_hash,
    login_attempts,
    locked_until,
    last_login_at,
    created_at,
    updated_at
"#;

// ============================================================================
// Credential Repository Implementation
// ============================================================================

impl CredentialRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                name,
                role,
                password_hash,
                login_attempts,
                locked_until,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(&user.name)
        .bind(user.role.id())
        .bind(user.password_hash.as_phc_string())
        .bind(attempts_to_db(user.login_state.login_attempts))
        .bind(user.login_state.locked_until)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AuthError::EmailTaken,
            _ => AuthError::Database(e),
        })?;

        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn update_login_state(&self, user_id: &UserId, state: &LoginState) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                login_attempts = $2,
                locked_until = $3,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(attempts_to_db(state.login_attempts))
        .bind(state.locked_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_last_login(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Single statement, so concurrent failures serialize on the row lock
    /// and none of them is lost. Mirrors `LockoutPolicy::after_failure`.
    async fn record_failed_login(
        &self,
        email: &Email,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<LoginState>> {
        let row = sqlx::query_as::<_, LoginStateRow>(
            r#"
            UPDATE users SET
                login_attempts = CASE
                    WHEN locked_until IS NOT NULL AND locked_until <= $2 THEN 1
                    ELSE LEAST(login_attempts, 2147483646) + 1
                END,
                locked_until = CASE
                    WHEN (CASE
                            WHEN locked_until IS NOT NULL AND locked_until <= $2 THEN 1
                            ELSE LEAST(login_attempts, 2147483646) + 1
                          END) >= $3 THEN $4
                    WHEN locked_until IS NOT NULL AND locked_until <= $2 THEN NULL
                    ELSE locked_until
                END,
                updated_at = $2
            WHERE email = $1
            RETURNING login_attempts, locked_until
            "#,
        )
        .bind(email.as_str())
        .bind(now)
        .bind(attempts_to_db(policy.max_attempts))
        .bind(policy.lock_deadline(now))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LoginStateRow::into_state))
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn find(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, payload, created_at, updated_at
            FROM web_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(SessionRow::into_session))
    }

    async fn save(&self, session: &Session) -> AuthResult<()> {
        let payload = serde_json::to_string(&session.payload)
            .map_err(|e| AuthError::Internal(format!("Session payload encoding failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO web_sessions (session_id, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (session_id) DO UPDATE SET
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(payload)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM web_sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM web_sessions WHERE updated_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types
// ============================================================================

fn attempts_to_db(attempts: u32) -> i32 {
    i32::try_from(attempts).unwrap_or(i32::MAX)
}

fn attempts_from_db(attempts: i32) -> u32 {
    u32::try_from(attempts).unwrap_or(0)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    name: String,
    role: i16,
    password_hash: String,
    login_attempts: i32,
    locked_until: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_id(self.role)
            .ok_or_else(|| AuthError::Internal(format!("Unknown role id: {}", self.role)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            name: self.name,
            role,
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            login_state: LoginState {
                login_attempts: attempts_from_db(self.login_attempts),
                locked_until: self.locked_until,
            },
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LoginStateRow {
    login_attempts: i32,
    locked_until: Option<DateTime<Utc>>,
}

impl LoginStateRow {
    fn into_state(self) -> LoginState {
        LoginState {
            login_attempts: attempts_from_db(self.login_attempts),
            locked_until: self.locked_until,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    payload: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    /// An unreadable payload is treated like a missing session
    fn into_session(self) -> Option<Session> {
        match serde_json::from_str::<SessionPayload>(&self.payload) {
            Ok(payload) => Some(Session {
                session_id: SessionId::from_uuid(self.session_id),
                payload,
                created_at: self.created_at,
                updated_at: self.updated_at,
            }),
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    error = %e,
                    "Discarding unreadable session payload"
                );
                None
            }
        }
    }
}
