//! In-process auth provider.
//!
//! Accounts live only in process memory; see `SqliteAuthProvider` for
//! accounts and sessions that survive a restart.

use crate::auth::{check_new_account, normalize_email, AuthError, AuthProvider, Principal};
use crate::model::note::OwnerId;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct Account {
    owner_id: OwnerId,
    password: String,
}

#[derive(Default)]
struct AuthState {
    accounts: BTreeMap<String, Account>,
    current: Option<Principal>,
}

/// Auth provider keeping accounts and the active session in memory.
#[derive(Default)]
pub struct MemoryAuthProvider {
    state: Mutex<AuthState>,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuthProvider for MemoryAuthProvider {
    fn current_owner_id(&self) -> Option<OwnerId> {
        self.lock_state()
            .current
            .as_ref()
            .map(|principal| principal.owner_id.clone())
    }

    fn current_principal(&self) -> Option<Principal> {
        self.lock_state().current.clone()
    }

    fn register(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = check_new_account(email, password)?;

        let mut state = self.lock_state();
        if state.accounts.contains_key(&email) {
            return Err(AuthError::AccountExists(email));
        }

        let owner_id = Uuid::new_v4().to_string();
        state.accounts.insert(
            email.clone(),
            Account {
                owner_id: owner_id.clone(),
                password: password.to_string(),
            },
        );
        let principal = Principal { owner_id, email };
        state.current = Some(principal.clone());
        info!("event=auth_register module=auth status=ok");
        Ok(principal)
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let email = normalize_email(email);
        let mut state = self.lock_state();
        let owner_id = match state.accounts.get(&email) {
            Some(account) if account.password == password => account.owner_id.clone(),
            _ => {
                warn!("event=auth_sign_in module=auth status=error error_code=invalid_credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let principal = Principal { owner_id, email };
        state.current = Some(principal.clone());
        info!("event=auth_sign_in module=auth status=ok");
        Ok(principal)
    }

    fn sign_out(&self) {
        if self.lock_state().current.take().is_some() {
            info!("event=auth_sign_out module=auth status=ok");
        }
    }
}
