use tracing::{debug, info, warn};

use crate::config::*;
use crate::core::db::{apply, load_ids, Write};
use crate::core::errors::Result;
use crate::core::helpers::Clock;
use crate::core::store::KvStore;
use crate::models::models::{FollowEdge, UserId};

/// Directed follow edges. Each edge lives under its own composite key, with
/// per-user adjacency lists in both directions for enumeration.
///
/// The graph does not know which users exist and does not refuse self-edges;
/// [`crate::Microblog::follow`] does both checks.
pub struct SocialGraph<'a, S: KvStore> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: KvStore> SocialGraph<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Adds the edge. For an edge that already exists this only puts back ids
    /// missing from the adjacency lists, e.g. after a lost concurrent update.
    pub fn follow(&self, follower_id: UserId, followed_id: UserId) -> Result<()> {
        let mut followings = load_ids(self.store, &followings_key(follower_id))?;
        let mut followers = load_ids(self.store, &followers_key(followed_id))?;
        let listed = followings.contains(&followed_id) && followers.contains(&follower_id);

        if self.is_following(follower_id, followed_id)? {
            if listed {
                debug!(follower_id, followed_id, "already following");
                return Ok(());
            }
            warn!(follower_id, followed_id, "edge missing from follow lists, repairing");
        }

        let mut writes = Vec::with_capacity(3);
        if !followings.contains(&followed_id) {
            followings.push(followed_id);
            writes.push(Write::json(followings_key(follower_id), &followings)?);
        }
        if !followers.contains(&follower_id) {
            followers.push(follower_id);
            writes.push(Write::json(followers_key(followed_id), &followers)?);
        }
        if !self.is_following(follower_id, followed_id)? {
            let edge = FollowEdge {
                follower_id,
                followed_id,
                created_at: self.clock.now(),
            };
            writes.push(Write::json(follow_key(follower_id, followed_id), &edge)?);
        }

        apply(self.store, writes)?;

        info!(follower_id, followed_id, "followed");
        Ok(())
    }

    pub fn unfollow(&self, follower_id: UserId, followed_id: UserId) -> Result<()> {
        if !self.is_following(follower_id, followed_id)? {
            debug!(follower_id, followed_id, "not following");
            return Ok(());
        }

        let mut followings = load_ids(self.store, &followings_key(follower_id))?;
        followings.retain(|&id| id != followed_id);
        let mut followers = load_ids(self.store, &followers_key(followed_id))?;
        followers.retain(|&id| id != follower_id);

        apply(
            self.store,
            vec![
                Write::Delete(follow_key(follower_id, followed_id)),
                Write::json(followings_key(follower_id), &followings)?,
                Write::json(followers_key(followed_id), &followers)?,
            ],
        )?;

        info!(follower_id, followed_id, "unfollowed");
        Ok(())
    }

    pub fn is_following(&self, follower_id: UserId, followed_id: UserId) -> Result<bool> {
        Ok(self.store.exists(&follow_key(follower_id, followed_id))?)
    }

    pub fn edge(&self, follower_id: UserId, followed_id: UserId) -> Result<Option<FollowEdge>> {
        self.store.get_json(&follow_key(follower_id, followed_id))
    }

    /// Users following `user_id`, oldest edge first.
    pub fn followers_of(&self, user_id: UserId) -> Result<Vec<UserId>> {
        load_ids(self.store, &followers_key(user_id))
    }

    /// Users `user_id` follows, oldest edge first.
    pub fn followed_by(&self, user_id: UserId) -> Result<Vec<UserId>> {
        load_ids(self.store, &followings_key(user_id))
    }

    pub fn follower_count(&self, user_id: UserId) -> Result<usize> {
        Ok(self.followers_of(user_id)?.len())
    }

    pub fn followed_count(&self, user_id: UserId) -> Result<usize> {
        Ok(self.followed_by(user_id)?.len())
    }
}
