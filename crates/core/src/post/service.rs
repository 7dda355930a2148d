//! Post mutation engine implementation.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::error::PostError;
use super::types::{
    Attachment, AttachmentDownload, CreatePostInput, NewAttachmentRecord, NewPostRecord, NewUpload,
    Post, PostWithAttachments, UpdateOutcome, UpdatePostInput,
};
use crate::storage::BlobStore;

/// Repository trait for post persistence.
///
/// Each mutating method is one atomic unit of work: the implementation must
/// commit every row change or none of them. This trait is implemented by the
/// db crate.
pub trait PostRepository: Send + Sync {
    /// Atomically insert a post row and its attachment rows.
    fn create(
        &self,
        post: NewPostRecord,
        attachments: Vec<NewAttachmentRecord>,
    ) -> impl std::future::Future<Output = Result<PostWithAttachments, PostError>> + Send;

    /// Atomically update the post body, delete the attachment rows for the
    /// given ids (scoped to this post; foreign ids are ignored), then insert
    /// the new attachment rows. Deletions order before additions.
    fn update(
        &self,
        post_id: Uuid,
        body: String,
        deleted_attachment_ids: &[Uuid],
        new_attachments: Vec<NewAttachmentRecord>,
    ) -> impl std::future::Future<Output = Result<UpdateOutcome, PostError>> + Send;

    /// Find a post by id.
    fn find_post(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Post>, PostError>> + Send;

    /// Find an attachment by id.
    fn find_attachment(
        &self,
        id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Attachment>, PostError>> + Send;

    /// List a post's attachments in insertion order.
    fn list_attachments(
        &self,
        post_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Attachment>, PostError>> + Send;

    /// Atomically delete a post, its attachment rows, and its reaction rows.
    /// Returns the storage keys of the removed attachment rows.
    fn delete_post(
        &self,
        post_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<String>, PostError>> + Send;
}

/// Post mutation engine.
///
/// Orchestrates blob writes and the relational unit of work so that no
/// committed attachment row ever points at a missing blob, and no blob
/// written by a failed call survives it (modulo a crash between write and
/// cleanup, which out-of-band garbage collection owns).
pub struct PostService<R: PostRepository> {
    storage: Arc<BlobStore>,
    repo: Arc<R>,
}

impl<R: PostRepository> PostService<R> {
    /// Create a new post service.
    #[must_use]
    pub fn new(storage: Arc<BlobStore>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    /// Create a post with zero or more attachments.
    ///
    /// Blobs are written in input order; every successful write lands in a
    /// rollback list immediately, so a failure on file k removes blobs
    /// 1..k-1 before the error surfaces. The relational rows go in as one
    /// atomic unit afterwards; if that unit fails, all written blobs are
    /// removed as well.
    ///
    /// # Errors
    ///
    /// Returns an error if validation, a blob write, or persistence fails.
    /// On error no post or attachment row persists and no blob survives.
    pub async fn create(&self, input: CreatePostInput) -> Result<PostWithAttachments, PostError> {
        if input.body.trim().is_empty() && input.files.is_empty() {
            return Err(PostError::validation(
                "post must have body text or at least one attachment",
            ));
        }

        let post_id = Uuid::new_v4();
        let mut written: Vec<String> = Vec::new();

        let drafts = match self
            .stage_uploads(post_id, input.owner_id, &input.files, &mut written)
            .await
        {
            Ok(drafts) => drafts,
            Err(e) => {
                self.discard_blobs(&written).await;
                return Err(e);
            }
        };

        let record = NewPostRecord {
            id: post_id,
            user_id: input.owner_id,
            body: input.body,
        };

        match self.repo.create(record, drafts).await {
            Ok(created) => Ok(created),
            Err(e) => {
                self.discard_blobs(&written).await;
                Err(e)
            }
        }
    }

    /// Update a post's body and attachment set.
    ///
    /// Row-level deletions and additions commit in one atomic unit with
    /// deletions ordered first, so a failed addition also unwinds the
    /// deletions. Blobs of removed attachments are deleted only after the
    /// unit commits; new blobs are rolled back if anything fails.
    ///
    /// # Errors
    ///
    /// Returns `PostError::NotFound` if the post does not exist and
    /// `PostError::Unauthorized` if the requester is not the owner.
    pub async fn update(&self, input: UpdatePostInput) -> Result<PostWithAttachments, PostError> {
        let existing = self
            .repo
            .find_post(input.post_id)
            .await?
            .ok_or_else(|| PostError::not_found(input.post_id))?;

        if existing.user_id != input.owner_id {
            return Err(PostError::Unauthorized);
        }

        let mut written: Vec<String> = Vec::new();
        let drafts = match self
            .stage_uploads(input.post_id, input.owner_id, &input.files, &mut written)
            .await
        {
            Ok(drafts) => drafts,
            Err(e) => {
                self.discard_blobs(&written).await;
                return Err(e);
            }
        };

        match self
            .repo
            .update(
                input.post_id,
                input.body,
                &input.deleted_attachment_ids,
                drafts,
            )
            .await
        {
            Ok(outcome) => {
                // The unit committed; old blobs are now unreferenced.
                self.discard_blobs(&outcome.removed_keys).await;
                Ok(PostWithAttachments {
                    post: outcome.post,
                    attachments: outcome.attachments,
                })
            }
            Err(e) => {
                self.discard_blobs(&written).await;
                Err(e)
            }
        }
    }

    /// Destroy a post.
    ///
    /// # Errors
    ///
    /// Returns `PostError::NotFound` if the post does not exist and
    /// `PostError::Unauthorized` if the requester is not the owner.
    pub async fn destroy(&self, post_id: Uuid, requester_id: Uuid) -> Result<(), PostError> {
        let existing = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| PostError::not_found(post_id))?;

        if existing.user_id != requester_id {
            return Err(PostError::Unauthorized);
        }

        let removed_keys = self.repo.delete_post(post_id).await?;
        self.discard_blobs(&removed_keys).await;

        Ok(())
    }

    /// Fetch a post with its attachments.
    ///
    /// # Errors
    ///
    /// Returns `PostError::NotFound` if the post does not exist.
    pub async fn get(&self, post_id: Uuid) -> Result<PostWithAttachments, PostError> {
        let post = self
            .repo
            .find_post(post_id)
            .await?
            .ok_or_else(|| PostError::not_found(post_id))?;
        let attachments = self.repo.list_attachments(post_id).await?;

        Ok(PostWithAttachments { post, attachments })
    }

    /// Download an attachment's payload along with its declared name.
    ///
    /// # Errors
    ///
    /// Returns `PostError::AttachmentNotFound` if the row does not exist.
    pub async fn download(&self, attachment_id: Uuid) -> Result<AttachmentDownload, PostError> {
        let attachment = self
            .repo
            .find_attachment(attachment_id)
            .await?
            .ok_or(PostError::AttachmentNotFound(attachment_id))?;

        let data = self.storage.read(&attachment.storage_key).await?;

        Ok(AttachmentDownload {
            name: attachment.name,
            mime_type: attachment.mime_type,
            data,
        })
    }

    /// Validate and write each upload in input order, pushing every
    /// successfully written key into `written` before moving on.
    async fn stage_uploads(
        &self,
        post_id: Uuid,
        created_by: Uuid,
        files: &[NewUpload],
        written: &mut Vec<String>,
    ) -> Result<Vec<NewAttachmentRecord>, PostError> {
        let mut drafts = Vec::with_capacity(files.len());

        for file in files {
            self.storage
                .validate_upload(&file.content_type, file.size())?;

            // v7 ids are time-ordered, so an id tiebreak after created_at
            // reproduces the input order when rows share a timestamp.
            let attachment_id = Uuid::now_v7();
            let key = BlobStore::storage_key(post_id, attachment_id, &file.name);

            self.storage.write(&key, file.data.clone()).await?;
            written.push(key.clone());

            #[allow(clippy::cast_possible_wrap)]
            drafts.push(NewAttachmentRecord {
                id: attachment_id,
                post_id,
                name: file.name.clone(),
                storage_key: key,
                mime_type: file.content_type.clone(),
                size_bytes: file.size() as i64,
                created_by,
            });
        }

        Ok(drafts)
    }

    /// Best-effort compensating cleanup: each delete is attempted
    /// independently, and a failed delete is logged rather than escalated.
    /// A leaked blob is an acceptable degraded outcome; a row pointing at a
    /// missing blob is not.
    async fn discard_blobs(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete(key).await {
                warn!(key = %key, error = %e, "failed to remove orphaned blob");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageError, StorageProvider};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Mock repository for testing. All mutating methods behave atomically:
    /// they either apply every row change or none.
    #[derive(Default)]
    struct MockPostRepository {
        posts: Mutex<HashMap<Uuid, Post>>,
        attachments: Mutex<Vec<Attachment>>,
        fail_writes: AtomicBool,
    }

    impl MockPostRepository {
        fn new() -> Self {
            Self::default()
        }

        fn failing() -> Self {
            let repo = Self::default();
            repo.arm_failure();
            repo
        }

        fn arm_failure(&self) {
            self.fail_writes.store(true, Ordering::SeqCst);
        }

        fn post_count(&self) -> usize {
            self.posts.lock().unwrap().len()
        }

        fn attachment_count(&self) -> usize {
            self.attachments.lock().unwrap().len()
        }

        fn seed_post(&self, owner: Uuid, body: &str) -> Post {
            let now = chrono::Utc::now();
            let post = Post {
                id: Uuid::new_v4(),
                user_id: owner,
                body: body.to_string(),
                created_at: now,
                updated_at: now,
            };
            self.posts.lock().unwrap().insert(post.id, post.clone());
            post
        }

        fn seed_attachment(&self, post_id: Uuid, key: &str) -> Attachment {
            let attachment = Attachment {
                id: Uuid::new_v4(),
                post_id,
                name: "seed.png".to_string(),
                storage_key: key.to_string(),
                mime_type: "image/png".to_string(),
                size_bytes: 1,
                created_by: Uuid::new_v4(),
                created_at: chrono::Utc::now(),
            };
            self.attachments.lock().unwrap().push(attachment.clone());
            attachment
        }

        fn check_failure(&self) -> Result<(), PostError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(PostError::repository("simulated commit failure"))
            } else {
                Ok(())
            }
        }

        fn materialize(record: NewAttachmentRecord) -> Attachment {
            Attachment {
                id: record.id,
                post_id: record.post_id,
                name: record.name,
                storage_key: record.storage_key,
                mime_type: record.mime_type,
                size_bytes: record.size_bytes,
                created_by: record.created_by,
                created_at: chrono::Utc::now(),
            }
        }
    }

    impl PostRepository for MockPostRepository {
        async fn create(
            &self,
            post: NewPostRecord,
            attachments: Vec<NewAttachmentRecord>,
        ) -> Result<PostWithAttachments, PostError> {
            self.check_failure()?;

            let now = chrono::Utc::now();
            let post = Post {
                id: post.id,
                user_id: post.user_id,
                body: post.body,
                created_at: now,
                updated_at: now,
            };
            let rows: Vec<Attachment> = attachments
                .into_iter()
                .map(Self::materialize)
                .collect();

            self.posts.lock().unwrap().insert(post.id, post.clone());
            self.attachments.lock().unwrap().extend(rows.clone());

            Ok(PostWithAttachments {
                post,
                attachments: rows,
            })
        }

        async fn update(
            &self,
            post_id: Uuid,
            body: String,
            deleted_attachment_ids: &[Uuid],
            new_attachments: Vec<NewAttachmentRecord>,
        ) -> Result<UpdateOutcome, PostError> {
            self.check_failure()?;

            let mut posts = self.posts.lock().unwrap();
            let post = posts
                .get_mut(&post_id)
                .ok_or_else(|| PostError::not_found(post_id))?;
            post.body = body;
            post.updated_at = chrono::Utc::now();
            let post = post.clone();
            drop(posts);

            let mut attachments = self.attachments.lock().unwrap();
            let mut removed_keys = Vec::new();
            attachments.retain(|a| {
                let doomed = a.post_id == post_id && deleted_attachment_ids.contains(&a.id);
                if doomed {
                    removed_keys.push(a.storage_key.clone());
                }
                !doomed
            });

            let rows: Vec<Attachment> = new_attachments
                .into_iter()
                .map(Self::materialize)
                .collect();
            attachments.extend(rows.clone());

            let surviving: Vec<Attachment> = attachments
                .iter()
                .filter(|a| a.post_id == post_id)
                .cloned()
                .collect();

            Ok(UpdateOutcome {
                post,
                attachments: surviving,
                removed_keys,
            })
        }

        async fn find_post(&self, id: Uuid) -> Result<Option<Post>, PostError> {
            Ok(self.posts.lock().unwrap().get(&id).cloned())
        }

        async fn find_attachment(&self, id: Uuid) -> Result<Option<Attachment>, PostError> {
            Ok(self
                .attachments
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn list_attachments(&self, post_id: Uuid) -> Result<Vec<Attachment>, PostError> {
            Ok(self
                .attachments
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.post_id == post_id)
                .cloned()
                .collect())
        }

        async fn delete_post(&self, post_id: Uuid) -> Result<Vec<String>, PostError> {
            self.check_failure()?;

            self.posts.lock().unwrap().remove(&post_id);

            let mut attachments = self.attachments.lock().unwrap();
            let mut removed_keys = Vec::new();
            attachments.retain(|a| {
                if a.post_id == post_id {
                    removed_keys.push(a.storage_key.clone());
                    false
                } else {
                    true
                }
            });

            Ok(removed_keys)
        }
    }

    fn temp_root() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("murmur-post-test-{}", Uuid::new_v4()))
    }

    fn storage_at(root: &std::path::Path) -> Arc<BlobStore> {
        let config = StorageConfig::new(StorageProvider::local_fs(root.to_path_buf()));
        Arc::new(BlobStore::from_config(config).expect("should create store"))
    }

    fn service_with(
        repo: Arc<MockPostRepository>,
    ) -> (PostService<MockPostRepository>, Arc<BlobStore>) {
        let storage = storage_at(&temp_root());
        (PostService::new(storage.clone(), repo), storage)
    }

    /// Count the regular files under the store's root on disk. Zero when the
    /// root was never created.
    fn blob_count(root: &std::path::Path) -> usize {
        fn walk(dir: &std::path::Path, count: &mut usize) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, count);
                } else {
                    *count += 1;
                }
            }
        }

        let mut count = 0;
        walk(root, &mut count);
        count
    }

    fn png(name: &str, len: usize) -> NewUpload {
        NewUpload {
            name: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from(vec![0u8; len]),
        }
    }

    #[tokio::test]
    async fn test_create_with_files() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, storage) = service_with(repo.clone());

        let created = service
            .create(CreatePostInput {
                owner_id: Uuid::new_v4(),
                body: "hi".to_string(),
                files: vec![png("a.png", 10), png("b.png", 20)],
            })
            .await
            .expect("create should succeed");

        assert_eq!(created.attachments.len(), 2);
        assert_eq!(repo.post_count(), 1);
        assert_eq!(repo.attachment_count(), 2);

        // Display order follows input order.
        assert_eq!(created.attachments[0].name, "a.png");
        assert_eq!(created.attachments[1].name, "b.png");

        // Every row's blob exists with the declared size.
        let mut total = 0;
        for attachment in &created.attachments {
            let blob = storage
                .read(&attachment.storage_key)
                .await
                .expect("blob should exist");
            assert_eq!(blob.len() as i64, attachment.size_bytes);
            total += blob.len();
        }
        assert_eq!(total, 30);
    }

    #[tokio::test]
    async fn test_create_without_files() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo.clone());

        let created = service
            .create(CreatePostInput {
                owner_id: Uuid::new_v4(),
                body: "text only".to_string(),
                files: vec![],
            })
            .await
            .expect("create should succeed");

        assert!(created.attachments.is_empty());
        assert_eq!(repo.post_count(), 1);
    }

    #[tokio::test]
    async fn test_create_empty_post_rejected() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo.clone());

        let result = service
            .create(CreatePostInput {
                owner_id: Uuid::new_v4(),
                body: "   ".to_string(),
                files: vec![],
            })
            .await;

        assert!(matches!(result, Err(PostError::Validation(_))));
        assert_eq!(repo.post_count(), 0);
    }

    #[tokio::test]
    async fn test_create_second_file_invalid_rolls_back_first_blob() {
        let repo = Arc::new(MockPostRepository::new());
        let root = temp_root();
        let service = PostService::new(storage_at(&root), repo.clone());

        let bad = NewUpload {
            name: "evil.exe".to_string(),
            content_type: "application/x-executable".to_string(),
            data: Bytes::from_static(b"MZ"),
        };

        let result = service
            .create(CreatePostInput {
                owner_id: Uuid::new_v4(),
                body: "hi".to_string(),
                files: vec![png("a.png", 10), bad],
            })
            .await;

        assert!(matches!(
            result,
            Err(PostError::Storage(StorageError::InvalidMimeType { .. }))
        ));
        assert_eq!(repo.post_count(), 0);
        assert_eq!(repo.attachment_count(), 0);
        // The first file's blob was written before the second failed
        // validation; the rollback must have removed it.
        assert_eq!(blob_count(&root), 0);
    }

    #[tokio::test]
    async fn test_create_persistence_failure_rolls_back_all_blobs() {
        let repo = Arc::new(MockPostRepository::failing());
        let root = temp_root();
        let service = PostService::new(storage_at(&root), repo.clone());

        let result = service
            .create(CreatePostInput {
                owner_id: Uuid::new_v4(),
                body: "hi".to_string(),
                files: vec![png("a.png", 10), png("b.png", 20)],
            })
            .await;

        assert!(matches!(result, Err(PostError::Repository(_))));
        assert_eq!(repo.post_count(), 0);
        assert_eq!(repo.attachment_count(), 0);
        // Both blobs were written before the commit failed; neither may
        // survive the rollback.
        assert_eq!(blob_count(&root), 0);
    }

    #[tokio::test]
    async fn test_update_replaces_attachments() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, storage) = service_with(repo.clone());
        let owner = Uuid::new_v4();

        let created = service
            .create(CreatePostInput {
                owner_id: owner,
                body: "v1".to_string(),
                files: vec![png("old.png", 5)],
            })
            .await
            .expect("create should succeed");
        let old = created.attachments[0].clone();

        let updated = service
            .update(UpdatePostInput {
                post_id: created.post.id,
                owner_id: owner,
                body: "v2".to_string(),
                deleted_attachment_ids: vec![old.id],
                files: vec![png("new.png", 7)],
            })
            .await
            .expect("update should succeed");

        assert_eq!(updated.post.body, "v2");
        assert_eq!(updated.attachments.len(), 1);
        assert_eq!(updated.attachments[0].name, "new.png");

        // Old blob removed after commit, new one present.
        assert!(!storage.exists(&old.storage_key).await);
        assert!(storage.exists(&updated.attachments[0].storage_key).await);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_listed_deletions_and_their_blobs() {
        let repo = Arc::new(MockPostRepository::new());
        let root = temp_root();
        let storage = storage_at(&root);
        let service = PostService::new(storage.clone(), repo.clone());
        let owner = Uuid::new_v4();

        let created = service
            .create(CreatePostInput {
                owner_id: owner,
                body: "v1".to_string(),
                files: vec![png("old.png", 5)],
            })
            .await
            .expect("create should succeed");
        let old = created.attachments[0].clone();

        // The unit of work refuses; deletions listed in the same call must
        // not have been applied, and the new blob must be rolled back.
        repo.arm_failure();

        let result = service
            .update(UpdatePostInput {
                post_id: created.post.id,
                owner_id: owner,
                body: "v2".to_string(),
                deleted_attachment_ids: vec![old.id],
                files: vec![png("new.png", 7)],
            })
            .await;

        assert!(matches!(result, Err(PostError::Repository(_))));

        let unchanged = repo
            .find_post(created.post.id)
            .await
            .expect("lookup should succeed")
            .expect("post should exist");
        assert_eq!(unchanged.body, "v1");

        let survivor = repo
            .find_attachment(old.id)
            .await
            .expect("lookup should succeed")
            .expect("attachment row should survive");
        assert_eq!(survivor.storage_key, old.storage_key);
        assert!(storage.exists(&old.storage_key).await);

        // Only the original blob remains on disk.
        assert_eq!(blob_count(&root), 1);
    }

    #[tokio::test]
    async fn test_update_ignores_foreign_attachment_ids() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, storage) = service_with(repo.clone());
        let owner = Uuid::new_v4();

        // A second post owns an attachment that must survive.
        let other = repo.seed_post(Uuid::new_v4(), "other");
        let foreign_key = BlobStore::storage_key(other.id, Uuid::new_v4(), "keep.png");
        storage
            .write(&foreign_key, Bytes::from_static(b"keep"))
            .await
            .expect("write should succeed");
        let foreign = repo.seed_attachment(other.id, &foreign_key);

        let created = service
            .create(CreatePostInput {
                owner_id: owner,
                body: "mine".to_string(),
                files: vec![],
            })
            .await
            .expect("create should succeed");

        service
            .update(UpdatePostInput {
                post_id: created.post.id,
                owner_id: owner,
                body: "mine v2".to_string(),
                deleted_attachment_ids: vec![foreign.id],
                files: vec![],
            })
            .await
            .expect("update should succeed");

        // The foreign row and blob are untouched.
        assert!(
            repo.find_attachment(foreign.id)
                .await
                .expect("lookup should succeed")
                .is_some()
        );
        assert!(storage.exists(&foreign_key).await);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_rejected() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo.clone());
        let owner = Uuid::new_v4();
        let post = repo.seed_post(owner, "original");

        let result = service
            .update(UpdatePostInput {
                post_id: post.id,
                owner_id: Uuid::new_v4(),
                body: "hijacked".to_string(),
                deleted_attachment_ids: vec![],
                files: vec![],
            })
            .await;

        assert!(matches!(result, Err(PostError::Unauthorized)));
        let unchanged = repo
            .find_post(post.id)
            .await
            .expect("lookup should succeed")
            .expect("post should exist");
        assert_eq!(unchanged.body, "original");
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo);

        let result = service
            .update(UpdatePostInput {
                post_id: Uuid::new_v4(),
                owner_id: Uuid::new_v4(),
                body: "x".to_string(),
                deleted_attachment_ids: vec![],
                files: vec![],
            })
            .await;

        assert!(matches!(result, Err(PostError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_destroy_by_owner_removes_rows_and_blobs() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, storage) = service_with(repo.clone());
        let owner = Uuid::new_v4();

        let created = service
            .create(CreatePostInput {
                owner_id: owner,
                body: "doomed".to_string(),
                files: vec![png("a.png", 3)],
            })
            .await
            .expect("create should succeed");
        let key = created.attachments[0].storage_key.clone();

        service
            .destroy(created.post.id, owner)
            .await
            .expect("destroy should succeed");

        assert_eq!(repo.post_count(), 0);
        assert_eq!(repo.attachment_count(), 0);
        assert!(!storage.exists(&key).await);
    }

    #[tokio::test]
    async fn test_destroy_by_non_owner_rejected() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo.clone());
        let post = repo.seed_post(Uuid::new_v4(), "keep me");

        let result = service.destroy(post.id, Uuid::new_v4()).await;

        assert!(matches!(result, Err(PostError::Unauthorized)));
        assert_eq!(repo.post_count(), 1);
    }

    #[tokio::test]
    async fn test_download_roundtrip() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo);
        let owner = Uuid::new_v4();

        let created = service
            .create(CreatePostInput {
                owner_id: owner,
                body: "with file".to_string(),
                files: vec![png("photo.png", 16)],
            })
            .await
            .expect("create should succeed");

        let download = service
            .download(created.attachments[0].id)
            .await
            .expect("download should succeed");

        assert_eq!(download.name, "photo.png");
        assert_eq!(download.mime_type, "image/png");
        assert_eq!(download.data.len(), 16);
    }

    #[tokio::test]
    async fn test_download_missing_attachment() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo);

        let result = service.download(Uuid::new_v4()).await;
        assert!(matches!(result, Err(PostError::AttachmentNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let repo = Arc::new(MockPostRepository::new());
        let (service, _storage) = service_with(repo);

        let result = service.get(Uuid::new_v4()).await;
        assert!(matches!(result, Err(PostError::NotFound(_))));
    }
}
