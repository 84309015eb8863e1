use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::domain::post::Post;
use crate::infrastructure::json_file::{JsonFileError, read_json, write_json};

/// Whole-collection persistence for posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn load(&self) -> Result<PostCollection, JsonFileError>;
    async fn save(&self, collection: &PostCollection) -> Result<(), JsonFileError>;
}

/// `1` for an empty collection, otherwise one past the largest id.
pub fn next_id(posts: &[Post]) -> u64 {
    posts.iter().map(|p| p.id).max().map_or(1, |max| max + 1)
}

/// The stored document: the posts plus the id high-water mark, which only
/// ever grows so a deleted id is never handed out again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostCollection {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub posts: Vec<Post>,
}

impl PostCollection {
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id.max(next_id(&self.posts));
        self.next_id = id + 1;
        id
    }
}

/// Older stores hold a bare array of posts.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPosts {
    Legacy(Vec<Post>),
    Collection(PostCollection),
}

impl From<StoredPosts> for PostCollection {
    fn from(stored: StoredPosts) -> Self {
        match stored {
            StoredPosts::Legacy(posts) => PostCollection {
                next_id: next_id(&posts),
                posts,
            },
            StoredPosts::Collection(collection) => collection,
        }
    }
}

/// Posts kept as a single pretty-printed JSON document.
#[derive(Clone)]
pub struct JsonPostRepository {
    path: PathBuf,
}

impl JsonPostRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PostRepository for JsonPostRepository {
    async fn load(&self) -> Result<PostCollection, JsonFileError> {
        match read_json::<StoredPosts>(&self.path).await {
            Ok(Some(stored)) => {
                let collection = PostCollection::from(stored);
                debug!(count = collection.posts.len(), next_id = collection.next_id, "posts loaded");
                Ok(collection)
            }
            Ok(None) => Ok(PostCollection::default()),
            Err(JsonFileError::Malformed { path, source }) => {
                warn!(path = %path.display(), error = %source, "posts document unreadable, starting empty");
                Ok(PostCollection::default())
            }
            Err(err) => {
                error!("failed to load posts: {}", err);
                Err(err)
            }
        }
    }

    async fn save(&self, collection: &PostCollection) -> Result<(), JsonFileError> {
        write_json(&self.path, collection).await.map_err(|err| {
            error!("failed to save posts: {}", err);
            err
        })?;
        debug!(count = collection.posts.len(), "posts saved");
        Ok(())
    }
}
