use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type PostId = u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// argon2 PHC string. Skipped when the user is serialized for display.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
}

/// Stored form of [`User`]; unlike the public type it keeps the hash.
#[derive(Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            about_me: r.about_me,
            last_seen: r.last_seen,
        }
    }
}

impl From<&User> for UserRecord {
    fn from(u: &User) -> Self {
        UserRecord {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            about_me: u.about_me.clone(),
            last_seen: u.last_seen,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub followed_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Cuts 1-indexed page `page` out of an already ordered list.
    /// Page 0 is read as page 1 and a zero page size as 1.
    pub fn slice(all: Vec<T>, page: usize, page_size: usize) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let total = all.len();
        let start = (page - 1).saturating_mul(page_size);
        let end = start.saturating_add(page_size);

        let items: Vec<T> = all.into_iter().skip(start).take(page_size).collect();

        Page {
            items,
            page,
            page_size,
            total,
            has_prev: page > 1 && start.min(total) > 0,
            has_next: end < total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
