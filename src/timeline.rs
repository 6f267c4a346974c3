use std::collections::HashSet;

use tracing::debug;

use crate::config::Config;
use crate::core::errors::Result;
use crate::core::store::KvStore;
use crate::follow::SocialGraph;
use crate::models::models::{Page, Post, UserId};
use crate::posts::PostStore;

/// Home timeline: the user's own posts plus those of everyone they follow.
pub struct Timeline<'a, S: KvStore> {
    config: &'a Config,
    graph: SocialGraph<'a, S>,
    posts: PostStore<'a, S>,
}

impl<'a, S: KvStore> Timeline<'a, S> {
    pub fn new(config: &'a Config, graph: SocialGraph<'a, S>, posts: PostStore<'a, S>) -> Self {
        Self {
            config,
            graph,
            posts,
        }
    }

    pub fn page(&self, user_id: UserId, page: usize, page_size: usize) -> Result<Page<Post>> {
        let mut authors: HashSet<UserId> = self.graph.followed_by(user_id)?.into_iter().collect();
        authors.insert(user_id);

        let mut ids = Vec::new();
        for &author_id in &authors {
            ids.extend(self.posts.ids_by(author_id)?);
        }
        let posts = self.posts.load(&ids)?;

        debug!(user_id, authors = authors.len(), posts = posts.len(), page, "timeline");
        Ok(Page::slice(posts, page, page_size))
    }

    pub fn home(&self, user_id: UserId, page: usize) -> Result<Page<Post>> {
        self.page(user_id, page, self.config.posts_per_page)
    }
}
