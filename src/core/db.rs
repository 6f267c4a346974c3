use serde::Serialize;
use tracing::{error, info};

use crate::config::*;
use crate::core::errors::Result;
use crate::core::store::KvStore;
use crate::models::models::{UserId, UserRecord};
use crate::Microblog;

/// One pending mutation of a batch passed to [`apply`].
pub enum Write {
    Set(String, Vec<u8>),
    Delete(String),
}

impl Write {
    pub fn json<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Write::Set(key.into(), serde_json::to_vec(value)?))
    }

    fn key(&self) -> &str {
        match self {
            Write::Set(key, _) | Write::Delete(key) => key,
        }
    }
}

/// Applies `writes` in order. If any write fails, the keys already touched are
/// restored to their previous values before the error is returned.
pub fn apply<S: KvStore>(store: &S, writes: Vec<Write>) -> Result<()> {
    let mut applied: Vec<(String, Option<Vec<u8>>)> = Vec::with_capacity(writes.len());

    for write in writes {
        let result = store.get(write.key()).and_then(|previous| {
            match &write {
                Write::Set(key, value) => store.set(key, value)?,
                Write::Delete(key) => store.delete(key)?,
            }
            Ok(previous)
        });

        match result {
            Ok(previous) => applied.push((write.key().to_string(), previous)),
            Err(e) => {
                rollback(store, applied);
                return Err(e.into());
            }
        }
    }

    Ok(())
}

fn rollback<S: KvStore>(store: &S, applied: Vec<(String, Option<Vec<u8>>)>) {
    for (key, previous) in applied.into_iter().rev() {
        let restored = match previous {
            Some(value) => store.set(&key, &value),
            None => store.delete(&key),
        };
        if let Err(e) = restored {
            error!(%key, error = %e, "rollback failed, store may hold a partial write");
        }
    }
}

/// Reserves the next integer id of `kind`. The returned write must be part of
/// the batch that stores the new record.
pub fn allocate_id<S: KvStore>(store: &S, kind: &str) -> Result<(u64, Write)> {
    let key = next_id_key(kind);
    let id = store.get_json::<u64>(&key)?.unwrap_or(0) + 1;
    Ok((id, Write::json(key, &id)?))
}

pub fn load_ids<S: KvStore>(store: &S, key: &str) -> Result<Vec<u64>> {
    Ok(store.get_json::<Vec<u64>>(key)?.unwrap_or_default())
}

pub fn init_test_data<S: KvStore>(app: &Microblog<S>) -> Result<()> {
    let users = app.users();

    if users.find_by_username("test")?.is_some()
        && users.find_by_username("alice")?.is_some()
        && users.find_by_username("bob")?.is_some()
    {
        return Ok(()); // Already initialized
    }

    let seed = [
        ("test", "Test user bio", vec!["This is my first post!"]),
        (
            "alice",
            "Hello, I'm Alice!",
            vec![
                "Welcome to my microblog! Excited to share thoughts here.",
                "Just finished an amazing project. Feeling productive today!",
            ],
        ),
        (
            "bob",
            "Bob's corner of the internet",
            vec!["Hey everyone! Just joined, looking forward to connecting with you all."],
        ),
    ];

    for (username, about_me, bodies) in seed {
        if users.find_by_username(username)?.is_some() {
            continue;
        }
        let user = users.create_user(username, &format!("{username}@example.com"), username)?;
        users.update_profile(user.id, username, Some(about_me))?;
        for body in bodies {
            app.posts().create(user.id, body)?;
        }
    }

    // "test" follows "bob"
    if let Some(test) = users.find_by_username("test")? {
        app.follow(test.id, "bob")?;
    }

    info!("demo data initialized");
    Ok(())
}

pub fn reset_db_data<S: KvStore>(store: &S) -> Result<()> {
    let users: Vec<UserId> = load_ids(store, USERS_LIST_KEY)?;

    for &id in &users {
        if let Some(user) = store.get_json::<UserRecord>(&user_key(id))? {
            store.delete(&username_key(&user.username))?;
            store.delete(&email_key(&user.email))?;
        }
        for followed in load_ids(store, &followings_key(id))? {
            store.delete(&follow_key(id, followed))?;
        }
        store.delete(&followings_key(id))?;
        store.delete(&followers_key(id))?;
        store.delete(&posts_by_key(id))?;
        store.delete(&user_key(id))?;
    }

    for id in load_ids(store, FEED_KEY)? {
        store.delete(&post_key(id))?;
    }

    store.delete(USERS_LIST_KEY)?;
    store.delete(FEED_KEY)?;
    store.delete(&next_id_key("user"))?;
    store.delete(&next_id_key("post"))?;

    info!(users = users.len(), "store reset");
    Ok(())
}
