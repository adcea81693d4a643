//! Shared test fixtures: an in-memory store implementing every repository
//! trait and a media store that records what it was asked to do.
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use microblog_service::db::{
    HealthProbe, NotificationRepository, PostRepository, RelationshipRepository, RepoResult,
    UserRepository,
};
use microblog_service::media::{parse_data_url, MediaError, MediaStore};
use microblog_service::models::{
    Comment, CommentView, NewUser, Notification, NotificationKind, NotificationSender,
    NotificationView, Post, PostFilter, PostView, ProfileChanges, User, UserSummary,
};
use microblog_service::state::CookieSettings;
use microblog_service::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "microblog-test-secret-0123456789abcdef";
pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

pub fn init_jwt() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        crypto_core::jwt::initialize_jwt_secret(TEST_JWT_SECRET).expect("init jwt secret");
    });
}

#[derive(Default)]
struct Inner {
    clock: i64,
    users: Vec<User>,
    follows: Vec<(Uuid, Uuid, DateTime<Utc>)>,
    posts: Vec<Post>,
    likes: Vec<(Uuid, Uuid, DateTime<Utc>)>,
    comments: Vec<Comment>,
    notifications: Vec<Notification>,
}

impl Inner {
    /// Strictly increasing timestamps so "newest first" is deterministic
    fn tick(&mut self, epoch: DateTime<Utc>) -> DateTime<Utc> {
        self.clock += 1;
        epoch + Duration::milliseconds(self.clock)
    }

    fn hydrate(&self, user: &User) -> User {
        let mut user = user.clone();
        user.followers = self
            .follows
            .iter()
            .filter(|(_, following, _)| *following == user.id)
            .map(|(follower, _, _)| *follower)
            .collect();
        user.following = self
            .follows
            .iter()
            .filter(|(follower, _, _)| *follower == user.id)
            .map(|(_, following, _)| *following)
            .collect();
        user.liked_posts = self
            .likes
            .iter()
            .filter(|(_, liker, _)| *liker == user.id)
            .map(|(post, _, _)| *post)
            .collect();
        user
    }

    fn user(&self, id: Uuid) -> Option<User> {
        self.users.iter().find(|u| u.id == id).map(|u| self.hydrate(u))
    }

    fn summary(&self, id: Uuid) -> UserSummary {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(UserSummary::from)
            .unwrap_or(UserSummary {
                id,
                username: String::new(),
                full_name: String::new(),
                profile_img: String::new(),
            })
    }

    fn notify(&mut self, epoch: DateTime<Utc>, from: Uuid, to: Uuid, kind: NotificationKind) {
        let now = self.tick(epoch);
        self.notifications.push(Notification {
            id: Uuid::new_v4(),
            from_user_id: from,
            to_user_id: to,
            kind,
            read: false,
            created_at: now,
            updated_at: now,
        });
    }

    fn view(&self, post: &Post) -> PostView {
        PostView {
            id: post.id,
            user: self.summary(post.user_id),
            text: post.text.clone(),
            img: post.img.clone(),
            likes: self
                .likes
                .iter()
                .filter(|(p, _, _)| *p == post.id)
                .map(|(_, u, _)| *u)
                .collect(),
            comments: self
                .comments
                .iter()
                .filter(|c| c.post_id == post.id)
                .map(|c| CommentView {
                    id: c.id,
                    text: c.text.clone(),
                    user: self.summary(c.user_id),
                    created_at: c.created_at,
                })
                .collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// In-memory implementation of all repositories
pub struct MemoryStore {
    epoch: DateTime<Utc>,
    inner: Mutex<Inner>,
    fail_lookups: AtomicBool,
    fail_profile_updates: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            epoch: Utc::now(),
            inner: Mutex::new(Inner::default()),
            fail_lookups: AtomicBool::new(false),
            fail_profile_updates: AtomicBool::new(false),
        }
    }
}

impl MemoryStore {
    /// Make identity lookups fail as if the database were down
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make profile writes fail after all checks have passed
    pub fn fail_profile_updates(&self, fail: bool) {
        self.fail_profile_updates.store(fail, Ordering::SeqCst);
    }

    /// Remove a user outright, leaving any session tokens dangling
    pub fn remove_user(&self, id: Uuid) {
        self.inner.lock().unwrap().users.retain(|u| u.id != id);
    }

    pub fn user(&self, id: Uuid) -> User {
        self.inner.lock().unwrap().user(id).expect("user exists")
    }

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn post_count(&self) -> usize {
        self.inner.lock().unwrap().posts.len()
    }

    pub fn notifications_for(&self, to: Uuid) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| n.to_user_id == to)
            .cloned()
            .collect()
    }

    pub fn all_notifications(&self) -> Vec<Notification> {
        self.inner.lock().unwrap().notifications.clone()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.inner.lock().unwrap().user(id))
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| inner.hydrate(u)))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| inner.hydrate(u)))
    }

    async fn exists(&self, id: Uuid) -> RepoResult<bool> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.inner.lock().unwrap().users.iter().any(|u| u.id == id))
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick(self.epoch);
        let user = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            profile_img: String::new(),
            cover_img: String::new(),
            bio: String::new(),
            link: String::new(),
            followers: Vec::new(),
            following: Vec::new(),
            liked_posts: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> RepoResult<User> {
        if self.fail_profile_updates.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick(self.epoch);
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(sqlx::Error::RowNotFound)?;

        let apply = |field: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *field = value;
            }
        };
        apply(&mut user.full_name, changes.full_name);
        apply(&mut user.username, changes.username);
        apply(&mut user.email, changes.email);
        apply(&mut user.password_hash, changes.password_hash);
        apply(&mut user.bio, changes.bio);
        apply(&mut user.link, changes.link);
        apply(&mut user.profile_img, changes.profile_img);
        apply(&mut user.cover_img, changes.cover_img);
        user.updated_at = now;

        let user = user.clone();
        Ok(inner.hydrate(&user))
    }

    async fn suggested(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .filter(|u| u.id != user_id)
            .filter(|u| {
                !inner
                    .follows
                    .iter()
                    .any(|(follower, following, _)| *follower == user_id && *following == u.id)
            })
            .take(limit as usize)
            .map(|u| inner.hydrate(u))
            .collect())
    }
}

#[async_trait::async_trait]
impl RelationshipRepository for MemoryStore {
    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .follows
            .iter()
            .any(|(f, t, _)| *f == follower_id && *t == following_id))
    }

    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .follows
            .iter()
            .any(|(f, t, _)| *f == follower_id && *t == following_id)
        {
            return Ok(false);
        }
        let now = inner.tick(self.epoch);
        inner.follows.push((follower_id, following_id, now));
        inner.notify(self.epoch, follower_id, following_id, NotificationKind::Follow);
        Ok(true)
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.follows.len();
        inner
            .follows
            .retain(|(f, t, _)| !(*f == follower_id && *t == following_id));
        Ok(inner.follows.len() < before)
    }
}

#[async_trait::async_trait]
impl PostRepository for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        text: Option<String>,
        img: Option<String>,
    ) -> RepoResult<Post> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick(self.epoch);
        let post = Post {
            id: Uuid::new_v4(),
            user_id,
            text,
            img,
            created_at: now,
            updated_at: now,
        };
        inner.posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Post>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        inner.likes.retain(|(p, _, _)| *p != id);
        inner.comments.retain(|c| c.post_id != id);
        Ok(inner.posts.len() < before)
    }

    async fn has_liked(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .likes
            .iter()
            .any(|(p, u, _)| *p == post_id && *u == user_id))
    }

    async fn like(&self, post_id: Uuid, user_id: Uuid, owner_id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .likes
            .iter()
            .any(|(p, u, _)| *p == post_id && *u == user_id)
        {
            return Ok(false);
        }
        let now = inner.tick(self.epoch);
        inner.likes.push((post_id, user_id, now));
        inner.notify(self.epoch, user_id, owner_id, NotificationKind::Like);
        Ok(true)
    }

    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.likes.len();
        inner
            .likes
            .retain(|(p, u, _)| !(*p == post_id && *u == user_id));
        Ok(inner.likes.len() < before)
    }

    async fn likes(&self, post_id: Uuid) -> RepoResult<Vec<Uuid>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .likes
            .iter()
            .filter(|(p, _, _)| *p == post_id)
            .map(|(_, u, _)| *u)
            .collect())
    }

    async fn add_comment(&self, post_id: Uuid, user_id: Uuid, text: &str) -> RepoResult<Comment> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick(self.epoch);
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            text: text.to_string(),
            created_at: now,
        };
        inner.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list(&self, filter: PostFilter) -> RepoResult<Vec<PostView>> {
        let inner = self.inner.lock().unwrap();
        let mut posts: Vec<&Post> = inner
            .posts
            .iter()
            .filter(|p| match filter {
                PostFilter::All => true,
                PostFilter::Id(id) => p.id == id,
                PostFilter::Author(id) => p.user_id == id,
                PostFilter::LikedBy(id) => inner
                    .likes
                    .iter()
                    .any(|(post, user, _)| *post == p.id && *user == id),
                PostFilter::FollowedBy(id) => inner
                    .follows
                    .iter()
                    .any(|(follower, following, _)| *follower == id && *following == p.user_id),
            })
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts.into_iter().map(|p| inner.view(p)).collect())
    }
}

#[async_trait::async_trait]
impl NotificationRepository for MemoryStore {
    async fn list_for_recipient(&self, user_id: Uuid) -> RepoResult<Vec<NotificationView>> {
        let inner = self.inner.lock().unwrap();
        let mut views: Vec<NotificationView> = inner
            .notifications
            .iter()
            .filter(|n| n.to_user_id == user_id)
            .map(|n| {
                let sender = inner.summary(n.from_user_id);
                NotificationView {
                    id: n.id,
                    from: NotificationSender {
                        id: sender.id,
                        username: sender.username,
                        profile_img: sender.profile_img,
                    },
                    to: n.to_user_id,
                    kind: n.kind,
                    read: n.read,
                    created_at: n.created_at,
                    updated_at: n.updated_at,
                }
            })
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }

    async fn mark_read(&self, ids: &[Uuid]) -> RepoResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        let now = inner.tick(self.epoch);
        let mut marked = 0;
        for n in inner.notifications.iter_mut() {
            if ids.contains(&n.id) && !n.read {
                n.read = true;
                n.updated_at = now;
                marked += 1;
            }
        }
        Ok(marked)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Notification>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.notifications.len();
        inner.notifications.retain(|n| n.id != id);
        Ok(inner.notifications.len() < before)
    }

    async fn delete_for_recipient(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.notifications.len();
        inner.notifications.retain(|n| n.to_user_id != user_id);
        Ok((before - inner.notifications.len()) as u64)
    }
}

#[async_trait::async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> RepoResult<()> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

/// Media store that keeps URLs in memory
#[derive(Default)]
pub struct FakeMediaStore {
    uploaded: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl FakeMediaStore {
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(&self, payload: &str) -> Result<String, MediaError> {
        let image = parse_data_url(payload, 1024 * 1024)?;
        let url = format!(
            "https://media.test/images/{}.{}",
            Uuid::new_v4(),
            image.extension()
        );
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        self.deleted.lock().unwrap().push(url.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(MediaError::Storage("media service unavailable".to_string()));
        }
        Ok(())
    }
}

pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub media: Arc<FakeMediaStore>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let media = Arc::new(FakeMediaStore::default());
        let state = AppState::from_store(
            store.clone(),
            media.clone(),
            CookieSettings { secure: false },
        );
        Self {
            state,
            store,
            media,
        }
    }

    /// Insert a user directly, bypassing password hashing
    pub async fn user(&self, username: &str) -> User {
        UserRepository::create(
            self.store.as_ref(),
            NewUser {
                full_name: format!("{username} test"),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await
        .expect("create user")
    }

    pub async fn post(&self, author: Uuid, text: &str) -> Post {
        PostRepository::create(self.store.as_ref(), author, Some(text.to_string()), None)
            .await
            .expect("create post")
    }
}
