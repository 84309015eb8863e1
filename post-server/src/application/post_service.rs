use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::data::post_repository::{PostRepository, next_id};
use crate::domain::error::DomainError;
use crate::domain::generation::GeneratedPost;
use crate::domain::post::{EngagementStats, NewPost, Post, PostStatus, PostUpdate};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<PostStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: usize,
    pub per_page: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct PostStats {
    pub total_posts: usize,
    pub published_posts: usize,
    pub draft_posts: usize,
    pub scheduled_posts: usize,
    pub failed_posts: usize,
    pub today_posts: usize,
    pub total_engagement: f64,
}

/// Post lifecycle over a whole-collection store. Every mutation is
/// load -> mutate -> save under one writer lock.
pub struct PostService<R: PostRepository + 'static> {
    repo: Arc<R>,
    write_lock: Arc<Mutex<()>>,
}

impl<R: PostRepository + 'static> Clone for PostService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<R> PostService<R>
where
    R: PostRepository + 'static,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get_post(&self, id: u64) -> Result<Post, DomainError> {
        self.repo
            .load()
            .await?
            .posts
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound(id))
    }

    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, DomainError> {
        let mut posts: Vec<Post> = self
            .repo
            .load()
            .await?
            .posts
            .into_iter()
            .filter(|p| query.status.is_none_or(|status| p.status == status))
            .filter(|p| {
                query
                    .search
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .is_none_or(|s| p.matches(s))
            })
            .collect();

        posts.sort_by(|a, b| b.created_time.cmp(&a.created_time).then(b.id.cmp(&a.id)));

        let per_page = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let current_page = query.page.unwrap_or(1).max(1);
        let total = posts.len();
        let pages = total.div_ceil(per_page);

        let posts = posts
            .into_iter()
            .skip((current_page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();

        Ok(PostPage {
            posts,
            pagination: Pagination {
                current_page,
                per_page,
                total,
                pages,
            },
        })
    }

    #[instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create_post(&self, new: NewPost) -> Result<Post, DomainError> {
        let _guard = self.write_lock.lock().await;
        let mut store = self.repo.load().await?;

        let post = Post::new(store.allocate_id(), new, Utc::now());
        store.posts.push(post.clone());
        self.repo.save(&store).await?;

        info!(post_id = post.id, status = %post.status, "post created");
        Ok(post)
    }

    #[instrument(skip(self))]
    pub async fn update_post(&self, id: u64, update: PostUpdate) -> Result<Post, DomainError> {
        let _guard = self.write_lock.lock().await;
        let mut store = self.repo.load().await?;

        let post = store
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound(id))?;
        post.apply(update, Utc::now());
        let updated = post.clone();

        self.repo.save(&store).await?;

        info!(post_id = id, "post updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: u64) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;
        let mut store = self.repo.load().await?;

        // Settle the high-water mark before the id disappears from the list.
        store.next_id = store.next_id.max(next_id(&store.posts));
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        if store.posts.len() == before {
            return Err(DomainError::PostNotFound(id));
        }

        self.repo.save(&store).await?;

        info!(post_id = id, "post deleted");
        Ok(())
    }

    /// Simulated publish: assigns an external id and random engagement.
    #[instrument(skip(self))]
    pub async fn publish_post(&self, id: u64) -> Result<Post, DomainError> {
        let _guard = self.write_lock.lock().await;
        let mut store = self.repo.load().await?;

        let post = store
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound(id))?;
        if post.is_published() {
            return Err(DomainError::AlreadyPublished(id));
        }

        let now = Utc::now();
        post.status = PostStatus::Published;
        post.facebook_post_id = Some(external_post_id(id, now));
        post.engagement_stats = simulated_engagement();
        post.touch(now);
        let published = post.clone();

        self.repo.save(&store).await?;

        info!(
            post_id = id,
            facebook_post_id = published.facebook_post_id.as_deref().unwrap_or_default(),
            "post published"
        );
        Ok(published)
    }

    pub async fn stats(&self) -> Result<PostStats, DomainError> {
        let posts = self.repo.load().await?.posts;
        let today = Utc::now().date_naive();

        let mut stats = PostStats {
            total_posts: posts.len(),
            ..PostStats::default()
        };
        for post in &posts {
            match post.status {
                PostStatus::Published => stats.published_posts += 1,
                PostStatus::Draft => stats.draft_posts += 1,
                PostStatus::Scheduled => stats.scheduled_posts += 1,
                PostStatus::Failed => stats.failed_posts += 1,
            }
            if post.is_published() && post.created_time.date_naive() == today {
                stats.today_posts += 1;
            }
            stats.total_engagement += post.total_engagement();
        }

        Ok(stats)
    }

    /// Persists a pipeline result as an AI-generated draft.
    pub async fn promote(&self, generated: GeneratedPost) -> Result<Post, DomainError> {
        self.create_post(generated.into_new_post()).await
    }

    /// Loads the demo dataset into a store that has never held a post.
    /// Returns how many posts were created.
    pub async fn seed_if_empty(&self, seed: Vec<NewPost>) -> Result<usize, DomainError> {
        let store = self.repo.load().await?;
        if !store.posts.is_empty() || store.next_id > 1 {
            return Ok(0);
        }

        let mut created = 0;
        for new in seed {
            let publish = new.status == Some(PostStatus::Published);
            let new = NewPost {
                status: if publish { None } else { new.status },
                ..new
            };
            let post = self.create_post(new).await?;
            if publish {
                self.publish_post(post.id).await?;
            }
            created += 1;
        }

        info!(count = created, "demo posts seeded");
        Ok(created)
    }
}

fn external_post_id(id: u64, now: DateTime<Utc>) -> String {
    format!("fb_{}_{}", id, now.timestamp())
}

fn simulated_engagement() -> EngagementStats {
    [
        ("likes", 10, 500),
        ("comments", 5, 100),
        ("shares", 1, 50),
        ("views", 100, 2000),
    ]
    .into_iter()
    .map(|(metric, low, high)| (metric.to_string(), random_between(low, high) as f64))
    .collect()
}

fn random_between(low: u32, high: u32) -> u32 {
    low + OsRng.next_u32() % (high - low + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::post_repository::JsonPostRepository;
    use crate::data::seed::demo_posts;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> PostService<JsonPostRepository> {
        PostService::new(Arc::new(JsonPostRepository::new(
            dir.path().join("posts.json"),
        )))
    }

    #[tokio::test]
    async fn create_allocates_sequential_ids_with_equal_timestamps() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let a = svc.create_post(NewPost::new("A", "B")).await.unwrap();
        let c = svc.create_post(NewPost::new("C", "D")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(c.id, 2);
        assert_eq!(a.created_time, a.updated_time);
        assert_eq!(a.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn deleted_ids_are_never_reused() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        svc.create_post(NewPost::new("A", "B")).await.unwrap();
        svc.create_post(NewPost::new("C", "D")).await.unwrap();
        svc.delete_post(1).await.unwrap();

        let remaining = svc.list_posts(&PostQuery::default()).await.unwrap();
        assert_eq!(remaining.posts.len(), 1);
        assert_eq!(remaining.posts[0].id, 2);

        let e = svc.create_post(NewPost::new("E", "F")).await.unwrap();
        assert_eq!(e.id, 3);
    }

    #[tokio::test]
    async fn deleting_missing_post_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.create_post(NewPost::new("A", "B")).await.unwrap();

        let result = svc.delete_post(42).await;

        assert!(matches!(result, Err(DomainError::PostNotFound(42))));
        assert_eq!(svc.stats().await.unwrap().total_posts, 1);
    }

    #[tokio::test]
    async fn deleting_highest_id_does_not_free_it() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.create_post(NewPost::new("A", "B")).await.unwrap();
        svc.create_post(NewPost::new("C", "D")).await.unwrap();
        svc.delete_post(2).await.unwrap();

        let next = svc.create_post(NewPost::new("E", "F")).await.unwrap();
        assert_eq!(next.id, 3);

        // Survives a fresh service over the same file.
        svc.delete_post(3).await.unwrap();
        let reopened = service(&dir);
        let after_reopen = reopened.create_post(NewPost::new("G", "H")).await.unwrap();
        assert_eq!(after_reopen.id, 4);
    }

    #[tokio::test]
    async fn emptied_store_keeps_counting() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.create_post(NewPost::new("A", "B")).await.unwrap();
        svc.delete_post(1).await.unwrap();

        let next = svc.create_post(NewPost::new("C", "D")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn update_applies_partial_fields_and_bumps_updated() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let created = svc.create_post(NewPost::new("A", "B")).await.unwrap();

        let updated = svc
            .update_post(
                created.id,
                PostUpdate {
                    title: Some("A2".into()),
                    status: Some(PostStatus::Scheduled),
                    ..PostUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "A2");
        assert_eq!(updated.content, "B");
        assert_eq!(updated.status, PostStatus::Scheduled);
        assert!(updated.updated_time >= created.updated_time);
        assert_eq!(updated.created_time, created.created_time);
    }

    #[tokio::test]
    async fn update_missing_post_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let result = svc.update_post(5, PostUpdate::default()).await;
        assert!(matches!(result, Err(DomainError::PostNotFound(5))));
    }

    #[tokio::test]
    async fn publish_sets_status_external_id_and_engagement() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let created = svc.create_post(NewPost::new("A", "B")).await.unwrap();

        let published = svc.publish_post(created.id).await.unwrap();

        assert_eq!(published.status, PostStatus::Published);
        let external = published.facebook_post_id.clone().unwrap();
        assert!(external.starts_with("fb_1_"));
        assert!(published.updated_time >= created.updated_time);
        let likes = published.engagement_stats["likes"];
        assert!((10.0..=500.0).contains(&likes));
        assert_eq!(published.engagement_stats.len(), 4);
    }

    #[tokio::test]
    async fn republishing_fails_and_keeps_record() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let created = svc.create_post(NewPost::new("A", "B")).await.unwrap();
        let first = svc.publish_post(created.id).await.unwrap();

        let second = svc.publish_post(created.id).await;

        assert!(matches!(second, Err(DomainError::AlreadyPublished(1))));
        let stored = svc.get_post(created.id).await.unwrap();
        assert_eq!(stored.facebook_post_id, first.facebook_post_id);
        assert_eq!(stored.status, PostStatus::Published);
        assert_eq!(stored.updated_time, first.updated_time);
    }

    #[tokio::test]
    async fn failed_posts_can_be_published() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        let created = svc
            .create_post(NewPost {
                status: Some(PostStatus::Failed),
                ..NewPost::new("A", "B")
            })
            .await
            .unwrap();

        let published = svc.publish_post(created.id).await.unwrap();
        assert_eq!(published.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn list_filters_searches_and_paginates() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        for i in 0..5 {
            svc.create_post(NewPost::new(format!("Coffee {i}"), "beans"))
                .await
                .unwrap();
        }
        svc.create_post(NewPost {
            status: Some(PostStatus::Scheduled),
            ..NewPost::new("Tea", "leaves")
        })
        .await
        .unwrap();

        let page = svc
            .list_posts(&PostQuery {
                page: Some(2),
                limit: Some(2),
                search: Some("COFFEE".into()),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].id, 3);

        let scheduled = svc
            .list_posts(&PostQuery {
                status: Some(PostStatus::Scheduled),
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(scheduled.posts.len(), 1);
        assert_eq!(scheduled.posts[0].title, "Tea");
    }

    #[tokio::test]
    async fn concurrent_creates_do_not_lose_writes() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.create_post(NewPost::new(format!("post {i}"), "body"))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total_posts, 8);
    }

    #[tokio::test]
    async fn seeding_only_applies_to_empty_store() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);

        assert_eq!(svc.seed_if_empty(demo_posts()).await.unwrap(), 3);
        assert_eq!(svc.seed_if_empty(demo_posts()).await.unwrap(), 0);

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total_posts, 3);
        assert_eq!(stats.published_posts, 1);
        assert_eq!(stats.scheduled_posts, 1);
        assert_eq!(stats.draft_posts, 1);
        assert_eq!(stats.today_posts, 1);
        assert!(stats.total_engagement > 0.0);
    }

    #[tokio::test]
    async fn store_emptied_by_deletes_is_not_reseeded() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir);
        svc.create_post(NewPost::new("A", "B")).await.unwrap();
        svc.delete_post(1).await.unwrap();

        assert_eq!(svc.seed_if_empty(demo_posts()).await.unwrap(), 0);
        assert_eq!(svc.stats().await.unwrap().total_posts, 0);
    }
}
