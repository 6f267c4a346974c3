use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use rand::rngs::OsRng;
use regex::Regex;

use crate::core::errors::{Error, Result};
use crate::models::models::Post;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn argon2(secret: &[u8]) -> Result<Argon2<'_>> {
    Argon2::new_with_secret(secret, Algorithm::default(), Version::default(), Params::default())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

pub fn hash_password(password: &str, secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    argon2(secret.as_bytes())?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str, secret: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    match argon2(secret.as_bytes()) {
        Ok(a) => a.verify_password(password.as_bytes(), &parsed_hash).is_ok(),
        Err(_) => false,
    }
}

/// Strips every tag and returns plain text. Escaping is left to whoever
/// renders it.
pub fn sanitize_text(text: &str) -> String {
    let stripped = Builder::default()
        .tags(HashSet::new())
        .clean(text)
        .to_string();
    decode_html_entities(&stripped).into_owned()
}

fn username_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("Regex should compile"))
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile")
    })
}

pub fn is_valid_username(username: &str) -> bool {
    username_regex().is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Newest first; equal timestamps put the higher id first.
pub fn sort_recent_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
}
