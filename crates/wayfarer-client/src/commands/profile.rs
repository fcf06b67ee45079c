//! Profile edits and the small cached profile fields in settings.

use serde::Serialize;
use tracing::info;

use wayfarer_shared::types::TravelerId;
use wayfarer_store::settings::{
    KEY_AVATAR_PATH, KEY_PROFILE_BIO, KEY_PROFILE_EMAIL, KEY_PROFILE_USERNAME,
};

use crate::error::ClientError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub traveler_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
    pub avatar_accessory: Option<String>,
    pub is_online: bool,
    pub last_seen: String,
}

/// Fetch a traveler's profile.
pub fn profile(state: &AppState, traveler_id: &TravelerId) -> Result<ProfileDto, ClientError> {
    let user = state
        .db()?
        .find_user(traveler_id)?
        .ok_or_else(|| ClientError::NotFound(format!("unknown traveler {traveler_id}")))?;

    Ok(ProfileDto {
        traveler_id: user.traveler_id.to_string(),
        username: user.username,
        avatar_url: user.avatar_url,
        avatar_accessory: user.avatar_accessory,
        is_online: user.is_online,
        last_seen: user.last_seen.to_rfc3339(),
    })
}

/// Apply a partial profile edit.  `None` fields are left untouched.
pub fn update_profile(
    state: &AppState,
    traveler_id: &TravelerId,
    username: Option<&str>,
    avatar_url: Option<&str>,
    avatar_accessory: Option<&str>,
) -> Result<(), ClientError> {
    let db = state.db()?;
    let mut user = db
        .find_user(traveler_id)?
        .ok_or_else(|| ClientError::NotFound(format!("unknown traveler {traveler_id}")))?;

    if let Some(name) = username {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("username cannot be blank".into()));
        }
        user.username = name.to_string();
        db.set_setting(KEY_PROFILE_USERNAME, name)?;
    }
    if let Some(url) = avatar_url {
        user.avatar_url = Some(url.to_string());
    }
    if let Some(accessory) = avatar_accessory {
        user.avatar_accessory = Some(accessory.to_string());
    }

    db.upsert_user(&user)?;

    info!(traveler = %traveler_id, "profile updated");
    Ok(())
}

/// Remember where the local avatar file lives.
pub fn set_avatar_path(state: &AppState, path: &str) -> Result<(), ClientError> {
    Ok(state.db()?.set_setting(KEY_AVATAR_PATH, path)?)
}

pub fn avatar_path(state: &AppState) -> Result<Option<String>, ClientError> {
    Ok(state.db()?.get_setting(KEY_AVATAR_PATH)?)
}

/// Cache free-form profile fields shown on the settings screen.
pub fn cache_profile_fields(
    state: &AppState,
    email: Option<&str>,
    bio: Option<&str>,
) -> Result<(), ClientError> {
    let db = state.db()?;
    if let Some(email) = email {
        db.set_setting(KEY_PROFILE_EMAIL, email)?;
    }
    if let Some(bio) = bio {
        db.set_setting(KEY_PROFILE_BIO, bio)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::register;
    use crate::testutil::test_state;

    #[test]
    fn profile_edit_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        register(&state, "user001", "pw").unwrap();
        let traveler = TravelerId::new("user001");

        update_profile(
            &state,
            &traveler,
            Some("Wanderer"),
            Some("https://cdn/avatar.png"),
            None,
        )
        .unwrap();

        let loaded = profile(&state, &traveler).unwrap();
        assert_eq!(loaded.username, "Wanderer");
        assert_eq!(loaded.avatar_url.as_deref(), Some("https://cdn/avatar.png"));
        assert!(loaded.avatar_accessory.is_none());

        // username is mirrored into the settings cache
        assert_eq!(
            state
                .db()
                .unwrap()
                .get_setting(KEY_PROFILE_USERNAME)
                .unwrap()
                .as_deref(),
            Some("Wanderer")
        );
    }

    #[test]
    fn blank_username_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        register(&state, "user001", "pw").unwrap();
        assert!(matches!(
            update_profile(&state, &TravelerId::new("user001"), Some(" "), None, None),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn missing_traveler_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        assert!(matches!(
            profile(&state, &TravelerId::new("ghost")),
            Err(ClientError::NotFound(_))
        ));
    }

    #[test]
    fn avatar_path_and_cached_fields() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        assert!(avatar_path(&state).unwrap().is_none());
        set_avatar_path(&state, "/home/me/avatar.png").unwrap();
        assert_eq!(
            avatar_path(&state).unwrap().as_deref(),
            Some("/home/me/avatar.png")
        );

        cache_profile_fields(&state, Some("me@wayfarer.app"), Some("over the hills")).unwrap();
        let db = state.db().unwrap();
        assert_eq!(
            db.get_setting(KEY_PROFILE_EMAIL).unwrap().as_deref(),
            Some("me@wayfarer.app")
        );
        assert_eq!(
            db.get_setting(KEY_PROFILE_BIO).unwrap().as_deref(),
            Some("over the hills")
        );
    }
}
