//! SQLite-backed auth provider.
//!
//! # Responsibility
//! - Persist accounts and the signed-in session next to the notes, so owner
//!   ids and the launch route survive an app restart.
//!
//! # Invariants
//! - Passwords are stored only as Argon2id PHC strings.
//! - At most one session row exists (`auth_session.slot = 1`).
//! - An email maps to the same `owner_id` for the lifetime of the file.

use crate::auth::{check_new_account, normalize_email, AuthError, AuthProvider, Principal};
use crate::clock::now_epoch_ms;
use crate::db::{open_db, open_db_in_memory};
use crate::model::note::OwnerId;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt::Display;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SESSION_SELECT_SQL: &str = "SELECT
    accounts.owner_id,
    accounts.email
FROM auth_session
JOIN accounts ON accounts.owner_id = auth_session.owner_id
WHERE auth_session.slot = 1;";

/// Auth provider keeping accounts and the active session in SQLite.
pub struct SqliteAuthProvider {
    conn: Mutex<Connection>,
    params: Params,
}

impl SqliteAuthProvider {
    /// Wraps a migrated connection, hashing with default Argon2id costs.
    ///
    /// # Errors
    /// - Returns `Unavailable` when the account tables are missing.
    pub fn new(conn: Connection) -> Result<Self, AuthError> {
        Self::with_params(conn, Params::default())
    }

    /// Wraps a migrated connection, hashing with explicit Argon2id costs.
    pub fn with_params(conn: Connection, params: Params) -> Result<Self, AuthError> {
        ensure_account_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            params,
        })
    }

    /// Opens (and migrates) the database file shared with the note store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        Self::new(open_db(path).map_err(unavailable)?)
    }

    /// Opens a private in-memory account table.
    pub fn open_in_memory() -> Result<Self, AuthError> {
        Self::new(open_db_in_memory().map_err(unavailable)?)
    }

    fn hasher(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, AuthError> {
        self.conn
            .lock()
            .map_err(|_| AuthError::Unavailable("auth store connection lock poisoned".into()))
    }

    fn hash_new_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(unavailable)?;
        let hash = self
            .hasher()
            .hash_password(password.as_bytes(), &salt)
            .map_err(unavailable)?;
        Ok(hash.to_string())
    }

    fn password_matches(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(hash) => self
                .hasher()
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(err) => {
                warn!("event=auth_verify module=auth status=error error_code=bad_hash error={err}");
                false
            }
        }
    }

    fn find_account(&self, email: &str) -> Result<Option<(OwnerId, String)>, AuthError> {
        let conn = self.lock_conn()?;
        conn.query_row(
            "SELECT owner_id, password_hash FROM accounts WHERE email = ?1;",
            [email],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(unavailable)
    }
}

impl AuthProvider for SqliteAuthProvider {
    fn current_owner_id(&self) -> Option<OwnerId> {
        self.current_principal().map(|principal| principal.owner_id)
    }

    fn current_principal(&self) -> Option<Principal> {
        let conn = match self.lock_conn() {
            Ok(conn) => conn,
            Err(err) => {
                warn!("event=auth_session_load module=auth status=error error={err}");
                return None;
            }
        };
        match load_session(&conn) {
            Ok(principal) => principal,
            Err(err) => {
                warn!("event=auth_session_load module=auth status=error error={err}");
                None
            }
        }
    }

    fn register(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = check_new_account(email, password)?;
        let password_hash = self.hash_new_password(password)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(unavailable)?;
        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?1);",
                [email.as_str()],
                |row| row.get(0),
            )
            .map_err(unavailable)?;
        if exists {
            return Err(AuthError::AccountExists(email));
        }

        let owner_id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO accounts (email, owner_id, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                email.as_str(),
                owner_id.as_str(),
                password_hash.as_str(),
                now_epoch_ms(),
            ],
        )
        .map_err(unavailable)?;
        store_session(&tx, &owner_id).map_err(unavailable)?;
        tx.commit().map_err(unavailable)?;

        info!("event=auth_register module=auth status=ok store=sqlite");
        Ok(Principal { owner_id, email })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = normalize_email(email);
        let verified = match self.find_account(&email)? {
            Some((owner_id, password_hash)) if self.password_matches(password, &password_hash) => {
                Some(owner_id)
            }
            _ => None,
        };
        let Some(owner_id) = verified else {
            warn!("event=auth_sign_in module=auth status=error error_code=invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        let conn = self.lock_conn()?;
        store_session(&conn, &owner_id).map_err(unavailable)?;
        info!("event=auth_sign_in module=auth status=ok store=sqlite");
        Ok(Principal { owner_id, email })
    }

    fn sign_out(&self) {
        let cleared = self.lock_conn().and_then(|conn| {
            conn.execute("DELETE FROM auth_session;", [])
                .map_err(unavailable)
        });
        match cleared {
            Ok(0) => {}
            Ok(_) => info!("event=auth_sign_out module=auth status=ok store=sqlite"),
            Err(err) => warn!("event=auth_sign_out module=auth status=error error={err}"),
        }
    }
}

fn load_session(conn: &Connection) -> rusqlite::Result<Option<Principal>> {
    conn.query_row(SESSION_SELECT_SQL, [], |row| {
        Ok(Principal {
            owner_id: row.get(0)?,
            email: row.get(1)?,
        })
    })
    .optional()
}

fn store_session(conn: &Connection, owner_id: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO auth_session (slot, owner_id)
         VALUES (1, ?1)
         ON CONFLICT(slot) DO UPDATE SET owner_id = excluded.owner_id;",
        [owner_id],
    )?;
    Ok(())
}

fn ensure_account_tables(conn: &Connection) -> Result<(), AuthError> {
    let present: i64 = conn
        .query_row(
            "SELECT COUNT(*)
             FROM sqlite_master
             WHERE type = 'table' AND name IN ('accounts', 'auth_session');",
            [],
            |row| row.get(0),
        )
        .map_err(unavailable)?;
    if present != 2 {
        return Err(AuthError::Unavailable(
            "missing required tables `accounts`/`auth_session`".to_string(),
        ));
    }
    Ok(())
}

fn unavailable(err: impl Display) -> AuthError {
    AuthError::Unavailable(format!("auth store error: {err}"))
}
