use tracing::info;

use crate::config::*;
use crate::core::db::{allocate_id, apply, load_ids, Write};
use crate::core::errors::{Error, Result};
use crate::core::helpers::{char_len, sort_recent_first, Clock};
use crate::core::store::KvStore;
use crate::models::models::{Page, Post, PostId, UserId};

/// Authored posts. Posts are immutable once stored.
pub struct PostStore<'a, S: KvStore> {
    store: &'a S,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a, S: KvStore> PostStore<'a, S> {
    pub fn new(store: &'a S, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self { store, config, clock }
    }

    /// Stores a new post by `author_id`. The author is not looked up here.
    pub fn create(&self, author_id: UserId, body: &str) -> Result<Post> {
        if body.trim().is_empty() {
            return Err(Error::validation("Post body is required"));
        }
        if char_len(body) > MAX_POST_LENGTH {
            return Err(Error::validation(format!(
                "Post is too long (max {} characters)",
                MAX_POST_LENGTH
            )));
        }

        let (id, next_id) = allocate_id(self.store, "post")?;
        let post = Post {
            id,
            author_id,
            body: body.to_string(),
            timestamp: self.clock.now(),
        };

        let mut by_author = load_ids(self.store, &posts_by_key(author_id))?;
        by_author.insert(0, id); // newest first
        let mut feed = load_ids(self.store, FEED_KEY)?;
        feed.insert(0, id);

        apply(
            self.store,
            vec![
                next_id,
                Write::json(post_key(id), &post)?,
                Write::json(posts_by_key(author_id), &by_author)?,
                Write::json(FEED_KEY, &feed)?,
            ],
        )?;

        info!(post_id = id, author_id, "post created");
        Ok(post)
    }

    pub fn get(&self, post_id: PostId) -> Result<Post> {
        self.store
            .get_json::<Post>(&post_key(post_id))?
            .ok_or_else(|| Error::not_found(format!("post {post_id}")))
    }

    pub(crate) fn load(&self, ids: &[PostId]) -> Result<Vec<Post>> {
        let mut posts = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(p) = self.store.get_json::<Post>(&post_key(id))? {
                posts.push(p);
            }
        }
        sort_recent_first(&mut posts);
        Ok(posts)
    }

    pub(crate) fn ids_by(&self, author_id: UserId) -> Result<Vec<PostId>> {
        load_ids(self.store, &posts_by_key(author_id))
    }

    pub fn posts_by(&self, author_id: UserId) -> Result<Vec<Post>> {
        self.load(&self.ids_by(author_id)?)
    }

    pub fn all_posts_recent_first(&self) -> Result<Vec<Post>> {
        self.load(&load_ids(self.store, FEED_KEY)?)
    }

    /// One page of an author's posts, for their profile.
    pub fn user_page(&self, author_id: UserId, page: usize) -> Result<Page<Post>> {
        Ok(Page::slice(self.posts_by(author_id)?, page, self.config.posts_per_page))
    }

    /// One page of everybody's posts.
    pub fn explore_page(&self, page: usize) -> Result<Page<Post>> {
        Ok(Page::slice(
            self.all_posts_recent_first()?,
            page,
            self.config.posts_per_page,
        ))
    }
}
