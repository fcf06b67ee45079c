//! Registration, login and session restoration.
//!
//! Credentials are stored as a vault-encrypted `"digest:salt"` blob on
//! the user row; neither the cleartext password nor the bare digest ever
//! reaches the database.

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use wayfarer_shared::types::TravelerId;
use wayfarer_shared::vault::{generate_salt, hash_password, verify_password};
use wayfarer_store::User;

use crate::error::ClientError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub traveler_id: String,
    pub token: String,
}

/// Create a new traveler account and open a session for it.
pub fn register(
    state: &AppState,
    traveler_id: &str,
    password: &str,
) -> Result<SessionInfo, ClientError> {
    let traveler_id = traveler_id.trim();
    if traveler_id.is_empty() {
        return Err(ClientError::Validation("traveler id is required".into()));
    }
    if password.is_empty() {
        return Err(ClientError::Validation("password is required".into()));
    }

    let traveler = TravelerId::new(traveler_id);
    if traveler.is_assistant() {
        return Err(ClientError::Validation(
            "this identity is reserved".into(),
        ));
    }

    let db = state.db()?;
    if db.find_user(&traveler)?.is_some() {
        return Err(ClientError::Validation(
            "traveler id is already registered".into(),
        ));
    }

    let salt = generate_salt();
    let digest = hash_password(password, &salt);
    let blob = state.vault().encrypt_str(&format!("{digest}:{salt}"))?;

    let token = state.sessions().issue(&traveler);

    let mut user = User::new(traveler.clone(), traveler_id);
    user.encrypted_password = blob;
    user.token = Some(token.clone());
    user.is_online = true;
    user.last_seen = Utc::now();

    db.upsert_user(&user)?;
    db.save_session(&traveler, &token)?;

    info!(traveler = %traveler, "registered new traveler");

    Ok(SessionInfo {
        traveler_id: traveler.to_string(),
        token,
    })
}

/// Verify a password against the stored blob and open a session.
pub fn login(
    state: &AppState,
    traveler_id: &str,
    password: &str,
) -> Result<SessionInfo, ClientError> {
    let traveler_id = traveler_id.trim();
    if traveler_id.is_empty() {
        return Err(ClientError::Validation("traveler id is required".into()));
    }
    if password.is_empty() {
        return Err(ClientError::Validation("password is required".into()));
    }

    let traveler = TravelerId::new(traveler_id);

    let db = state.db()?;
    let user = db
        .find_user(&traveler)?
        .ok_or_else(|| ClientError::Authentication("unknown traveler id".into()))?;

    let decrypted = state.vault().decrypt_str(&user.encrypted_password)?;
    let (digest, salt) = decrypted
        .split_once(':')
        .ok_or_else(|| ClientError::Internal("malformed credential blob".into()))?;

    if !verify_password(password, digest, salt) {
        return Err(ClientError::Authentication("wrong password".into()));
    }

    let token = state.sessions().issue(&traveler);
    db.set_user_token(&traveler, Some(&token))?;
    db.set_user_presence(&traveler, true, Utc::now())?;
    db.save_session(&traveler, &token)?;

    info!(traveler = %traveler, "login successful");

    Ok(SessionInfo {
        traveler_id: traveler.to_string(),
        token,
    })
}

/// Purely local logout: drop the token and go offline.  There is no
/// remote revocation.
pub fn logout(state: &AppState, traveler_id: &TravelerId) -> Result<(), ClientError> {
    let db = state.db()?;
    db.set_user_token(traveler_id, None)?;
    db.set_user_presence(traveler_id, false, Utc::now())?;
    db.clear_session()?;

    info!(traveler = %traveler_id, "logged out");
    Ok(())
}

/// Resume the persisted session if its token still verifies and has not
/// expired.  Anything less returns `None` and the UI goes back to login.
pub fn restore_session(state: &AppState) -> Result<Option<SessionInfo>, ClientError> {
    let stored = state.db()?.stored_session()?;

    let Some((traveler, token)) = stored else {
        return Ok(None);
    };

    let sessions = state.sessions();
    if !sessions.is_valid(&token) || sessions.is_expired(&token) {
        return Ok(None);
    }
    if sessions.subject(&token)? != traveler {
        return Ok(None);
    }

    Ok(Some(SessionInfo {
        traveler_id: traveler.to_string(),
        token,
    }))
}
