use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::*;
use crate::core::db::{allocate_id, apply, load_ids, Write};
use crate::core::errors::{Error, Result};
use crate::core::helpers::{
    char_len, hash_password, is_valid_email, is_valid_username, sanitize_text, verify_password,
    Clock,
};
use crate::core::store::KvStore;
use crate::models::models::{User, UserId, UserRecord};

/// Registered users and their credentials.
pub struct IdentityStore<'a, S: KvStore> {
    store: &'a S,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a, S: KvStore> IdentityStore<'a, S> {
    pub fn new(store: &'a S, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self { store, config, clock }
    }

    pub fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let username = username.trim();
        let email = email.trim();

        validate_username(username)?;
        if email.is_empty() {
            return Err(Error::validation("Email is required"));
        }
        if char_len(email) > MAX_EMAIL_LENGTH || !is_valid_email(email) {
            return Err(Error::validation("Invalid email address."));
        }
        if password.is_empty() {
            return Err(Error::validation("Password is required"));
        }

        if self.store.exists(&username_key(username))? {
            return Err(Error::validation("Please use a different username."));
        }
        if self.store.exists(&email_key(email))? {
            return Err(Error::validation("Please use a different email address."));
        }

        let (id, next_id) = allocate_id(self.store, "user")?;
        let user = User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password, &self.config.secret_key)?,
            about_me: None,
            last_seen: self.clock.now(),
        };

        let mut users = load_ids(self.store, USERS_LIST_KEY)?;
        users.push(id);

        apply(
            self.store,
            vec![
                next_id,
                Write::json(user_key(id), &UserRecord::from(&user))?,
                Write::json(username_key(username), &id)?,
                Write::json(email_key(email), &id)?,
                Write::json(USERS_LIST_KEY, &users)?,
            ],
        )?;

        info!(user_id = id, username, "user registered");
        Ok(user)
    }

    pub fn get(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_json::<UserRecord>(&user_key(user_id))?
            .map(User::from)
            .ok_or_else(|| Error::not_found(format!("user {user_id}")))
    }

    /// Resolves ids in order; fails if any of them is unknown.
    pub fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>> {
        ids.iter().map(|&id| self.get(id)).collect()
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        debug!(username, "lookup by username");
        match self.store.get_json::<UserId>(&username_key(username.trim()))? {
            Some(id) => self.get(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        debug!(email, "lookup by email");
        match self.store.get_json::<UserId>(&email_key(email.trim()))? {
            Some(id) => self.get(id).map(Some),
            None => Ok(None),
        }
    }

    /// Checks a login attempt. A successful login counts as activity.
    pub fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.find_by_username(username)? else {
            warn!(username, "login for unknown user");
            return Ok(None);
        };

        if !verify_password(password, &user.password_hash, &self.config.secret_key) {
            warn!(user_id = user.id, "invalid password");
            return Ok(None);
        }

        self.record_activity(user.id).map(Some)
    }

    pub fn record_activity(&self, user_id: UserId) -> Result<User> {
        let mut user = self.get(user_id)?;
        user.last_seen = self.clock.now();
        self.store.set_json(&user_key(user_id), &UserRecord::from(&user))?;
        Ok(user)
    }

    /// Renames the user and replaces the about-me text. Passing the current
    /// username keeps it.
    pub fn update_profile(
        &self,
        user_id: UserId,
        username: &str,
        about_me: Option<&str>,
    ) -> Result<User> {
        let mut user = self.get(user_id)?;
        let username = username.trim();
        validate_username(username)?;

        let about_me = about_me.map(str::trim).filter(|s| !s.is_empty());
        if let Some(text) = about_me {
            if char_len(text) > MAX_ABOUT_ME_LENGTH {
                return Err(Error::validation(format!(
                    "About me is too long (max {} characters).",
                    MAX_ABOUT_ME_LENGTH
                )));
            }
        }
        let about_me = about_me
            .map(|text| sanitize_text(text).trim().to_string())
            .filter(|s| !s.is_empty());

        let mut writes = Vec::new();
        if username != user.username {
            if self.store.exists(&username_key(username))? {
                return Err(Error::validation("Please use a different username."));
            }
            writes.push(Write::Delete(username_key(&user.username)));
            writes.push(Write::json(username_key(username), &user_id)?);
            user.username = username.to_string();
        }
        user.about_me = about_me;
        writes.push(Write::json(user_key(user_id), &UserRecord::from(&user))?);

        apply(self.store, writes)?;

        info!(user_id, "profile updated");
        Ok(user)
    }

    pub fn set_password(&self, user_id: UserId, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(Error::validation("Password is required"));
        }
        let mut user = self.get(user_id)?;
        user.password_hash = hash_password(password, &self.config.secret_key)?;
        self.store.set_json(&user_key(user_id), &UserRecord::from(&user))?;
        info!(user_id, "password changed");
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::validation("Username is required"));
    }
    if char_len(username) > MAX_USERNAME_LENGTH {
        return Err(Error::validation(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    if !is_valid_username(username) {
        return Err(Error::validation(
            "Username may only contain letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(())
}

/// Gravatar image for the user's email, identicon when none is registered.
pub fn avatar_url(user: &User, size: u32) -> String {
    let digest = Sha256::digest(user.email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?d=identicon&s={}",
        hex::encode(digest),
        size
    )
}
