//! Microblogging core: users, follow relationships, posts and home timelines
//! over a key-value store.

pub mod config;
pub mod follow;
pub mod posts;
pub mod timeline;
pub mod users;

pub mod core {
    pub mod db;
    pub mod errors;
    pub mod helpers;
    pub mod store;
}

pub mod models {
    #[allow(clippy::module_inception)]
    pub mod models;
}

pub use crate::config::Config;
pub use crate::core::errors::{Error, Result};
pub use crate::core::helpers::{Clock, SystemClock};
pub use crate::core::store::{KvStore, MemoryStore, SpinStore};
pub use crate::follow::SocialGraph;
pub use crate::models::models::{FollowEdge, Page, Post, PostId, User, UserId};
pub use crate::posts::PostStore;
pub use crate::timeline::Timeline;
pub use crate::users::{avatar_url, IdentityStore};

use tracing::info;

/// Owns the store, settings and clock, and hands out the components.
pub struct Microblog<S: KvStore> {
    store: S,
    config: Config,
    clock: Box<dyn Clock>,
}

impl Microblog<SpinStore> {
    /// The Spin component's default store, configured from the environment.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(SpinStore::open_default()?, Config::from_env()))
    }
}

impl<S: KvStore> Microblog<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self::with_clock(store, config, Box::new(SystemClock))
    }

    pub fn with_clock(store: S, config: Config, clock: Box<dyn Clock>) -> Self {
        info!(posts_per_page = config.posts_per_page, "microblog ready");
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn users(&self) -> IdentityStore<'_, S> {
        IdentityStore::new(&self.store, &self.config, self.clock.as_ref())
    }

    pub fn graph(&self) -> SocialGraph<'_, S> {
        SocialGraph::new(&self.store, self.clock.as_ref())
    }

    pub fn posts(&self) -> PostStore<'_, S> {
        PostStore::new(&self.store, &self.config, self.clock.as_ref())
    }

    pub fn timeline(&self) -> Timeline<'_, S> {
        Timeline::new(&self.config, self.graph(), self.posts())
    }

    /// Makes `follower_id` follow the user called `username`.
    pub fn follow(&self, follower_id: UserId, username: &str) -> Result<User> {
        let (follower, target) = self.resolve_pair(follower_id, username)?;
        if follower.id == target.id {
            return Err(Error::validation("You cannot follow yourself!"));
        }
        self.graph().follow(follower.id, target.id)?;
        Ok(target)
    }

    pub fn unfollow(&self, follower_id: UserId, username: &str) -> Result<User> {
        let (follower, target) = self.resolve_pair(follower_id, username)?;
        if follower.id == target.id {
            return Err(Error::validation("You cannot unfollow yourself!"));
        }
        self.graph().unfollow(follower.id, target.id)?;
        Ok(target)
    }

    pub fn followers(&self, user_id: UserId) -> Result<Vec<User>> {
        self.users().get(user_id)?;
        self.users().get_many(&self.graph().followers_of(user_id)?)
    }

    pub fn following(&self, user_id: UserId) -> Result<Vec<User>> {
        self.users().get(user_id)?;
        self.users().get_many(&self.graph().followed_by(user_id)?)
    }

    fn resolve_pair(&self, user_id: UserId, username: &str) -> Result<(User, User)> {
        let users = self.users();
        let user = users.get(user_id)?;
        let target = users
            .find_by_username(username)?
            .ok_or_else(|| Error::not_found(format!("User {} not found.", username)))?;
        Ok((user, target))
    }
}
