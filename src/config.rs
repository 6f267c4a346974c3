use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub const MAX_POST_LENGTH: usize = 140;
pub const MAX_ABOUT_ME_LENGTH: usize = 140;
pub const MAX_USERNAME_LENGTH: usize = 64;
pub const MAX_EMAIL_LENGTH: usize = 120;
pub const DEFAULT_POSTS_PER_PAGE: usize = 20;

const DEV_SECRET_KEY: &str = "you-will-never-guess";

// === Store keys ===
pub const USERS_LIST_KEY: &str = "users_list";
pub const FEED_KEY: &str = "feed";

pub fn next_id_key(kind: &str) -> String {
    format!("next_id:{}", kind)
}

pub fn user_key(user_id: u64) -> String {
    format!("user:{}", user_id)
}

pub fn username_key(username: &str) -> String {
    format!("username:{}", username)
}

pub fn email_key(email: &str) -> String {
    format!("email:{}", email)
}

pub fn post_key(post_id: u64) -> String {
    format!("post:{}", post_id)
}

pub fn posts_by_key(user_id: u64) -> String {
    format!("posts_by:{}", user_id)
}

pub fn follow_key(follower_id: u64, followed_id: u64) -> String {
    format!("follow:{}:{}", follower_id, followed_id)
}

pub fn followings_key(user_id: u64) -> String {
    format!("followings:{}", user_id)
}

pub fn followers_key(user_id: u64) -> String {
    format!("followers:{}", user_id)
}

/// Application settings handed to the components at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub posts_per_page: usize,
    /// Mixed into every password hash; changing it invalidates stored hashes.
    pub secret_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            secret_key: DEV_SECRET_KEY.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let posts_per_page = try_load("MICROBLOG_POSTS_PER_PAGE", DEFAULT_POSTS_PER_PAGE).max(1);
        let secret_key = env::var("MICROBLOG_SECRET_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| {
                warn!("MICROBLOG_SECRET_KEY not set, using the development secret");
                DEV_SECRET_KEY.to_string()
            });

        Self {
            posts_per_page,
            secret_key,
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
