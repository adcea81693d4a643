//! PostgreSQL repositories
//!
//! Follow and like edges live in `follows` and `post_likes`; the `followers`,
//! `following`, `liked_posts` and `likes` sets are derived from those tables
//! on read, so both directions of an edge always agree.

use super::{
    HealthProbe, NotificationRepository, PostRepository, RelationshipRepository, RepoResult,
    UserRepository,
};
use crate::models::{
    Comment, CommentView, NewUser, Notification, NotificationKind, NotificationSender,
    NotificationView, Post, PostFilter, PostView, ProfileChanges, User, UserSummary,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    u.id, u.full_name, u.username, u.email, u.password_hash,
    u.profile_img, u.cover_img, u.bio, u.link, u.created_at, u.updated_at,
    ARRAY(SELECT f.follower_id FROM follows f WHERE f.following_id = u.id ORDER BY f.created_at) AS followers,
    ARRAY(SELECT f.following_id FROM follows f WHERE f.follower_id = u.id ORDER BY f.created_at) AS following,
    ARRAY(SELECT l.post_id FROM post_likes l WHERE l.user_id = u.id ORDER BY l.created_at) AS liked_posts
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn find_user_where(&self, clause: &str, value: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE {clause}");
        sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
    }
}

#[async_trait::async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_user_where("u.username = $1", username).await
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_user_where("u.email = $1", email).await
    }

    async fn exists(&self, id: Uuid) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, username, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await?;

        UserRepository::find_by_id(self, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> RepoResult<User> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                username = COALESCE($3, username),
                email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                bio = COALESCE($6, bio),
                link = COALESCE($7, link),
                profile_img = COALESCE($8, profile_img),
                cover_img = COALESCE($9, cover_img),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.bio)
        .bind(changes.link)
        .bind(changes.profile_img)
        .bind(changes.cover_img)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        UserRepository::find_by_id(self, id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    async fn suggested(&self, user_id: Uuid, limit: i64) -> RepoResult<Vec<User>> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users u
            WHERE u.id <> $1
              AND NOT EXISTS (
                  SELECT 1 FROM follows f WHERE f.follower_id = $1 AND f.following_id = u.id
              )
            ORDER BY random()
            LIMIT $2
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}

#[async_trait::async_trait]
impl RelationshipRepository for PgStore {
    async fn is_following(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn follow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            insert_notification(&mut tx, follower_id, following_id, NotificationKind::Follow)
                .await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn unfollow(&self, follower_id: Uuid, following_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_notification(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    from_user_id: Uuid,
    to_user_id: Uuid,
    kind: NotificationKind,
) -> RepoResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, from_user_id, to_user_id, kind)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(kind)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    text: Option<String>,
    img: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    username: String,
    full_name: String,
    profile_img: String,
    likes: Vec<Uuid>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    post_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
    user_id: Uuid,
    username: String,
    full_name: String,
    profile_img: String,
}

fn filter_clause(filter: PostFilter) -> (&'static str, Option<Uuid>) {
    match filter {
        PostFilter::All => ("$1::uuid IS NULL", None),
        PostFilter::Id(id) => ("p.id = $1", Some(id)),
        PostFilter::Author(id) => ("p.user_id = $1", Some(id)),
        PostFilter::LikedBy(id) => (
            "EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $1)",
            Some(id),
        ),
        PostFilter::FollowedBy(id) => (
            "p.user_id IN (SELECT f.following_id FROM follows f WHERE f.follower_id = $1)",
            Some(id),
        ),
    }
}

#[async_trait::async_trait]
impl PostRepository for PgStore {
    async fn create(
        &self,
        user_id: Uuid,
        text: Option<String>,
        img: Option<String>,
    ) -> RepoResult<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, user_id, text, img)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, text, img, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(text)
        .bind(img)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Post>> {
        sqlx::query_as::<_, Post>(
            "SELECT id, user_id, text, img, created_at, updated_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_liked(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM post_likes WHERE post_id = $1 AND user_id = $2)",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn like(&self, post_id: Uuid, user_id: Uuid, owner_id: Uuid) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            insert_notification(&mut tx, user_id, owner_id, NotificationKind::Like).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn likes(&self, post_id: Uuid) -> RepoResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM post_likes WHERE post_id = $1 ORDER BY created_at",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_comment(&self, post_id: Uuid, user_id: Uuid, text: &str) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, post_id, user_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING id, post_id, user_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
    }

    async fn list(&self, filter: PostFilter) -> RepoResult<Vec<PostView>> {
        let (clause, param) = filter_clause(filter);
        let query = format!(
            r#"
            SELECT p.id, p.user_id, p.text, p.img, p.created_at, p.updated_at,
                   u.username, u.full_name, u.profile_img,
                   ARRAY(SELECT l.user_id FROM post_likes l WHERE l.post_id = p.id ORDER BY l.created_at) AS likes
            FROM posts p
            JOIN users u ON u.id = p.user_id
            WHERE {clause}
            ORDER BY p.created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, PostRow>(&query)
            .bind(param)
            .fetch_all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT c.id, c.post_id, c.text, c.created_at,
                   u.id AS user_id, u.username, u.full_name, u.profile_img
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = ANY($1)
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut comments: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
        for row in comment_rows {
            comments.entry(row.post_id).or_default().push(CommentView {
                id: row.id,
                text: row.text,
                user: UserSummary {
                    id: row.user_id,
                    username: row.username,
                    full_name: row.full_name,
                    profile_img: row.profile_img,
                },
                created_at: row.created_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| PostView {
                id: row.id,
                comments: comments.remove(&row.id).unwrap_or_default(),
                user: UserSummary {
                    id: row.user_id,
                    username: row.username,
                    full_name: row.full_name,
                    profile_img: row.profile_img,
                },
                text: row.text,
                img: row.img,
                likes: row.likes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    kind: NotificationKind,
    read: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    from_username: String,
    from_profile_img: String,
}

#[async_trait::async_trait]
impl NotificationRepository for PgStore {
    async fn list_for_recipient(&self, user_id: Uuid) -> RepoResult<Vec<NotificationView>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT n.id, n.from_user_id, n.to_user_id, n.kind, n.read, n.created_at, n.updated_at,
                   u.username AS from_username, u.profile_img AS from_profile_img
            FROM notifications n
            JOIN users u ON u.id = n.from_user_id
            WHERE n.to_user_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| NotificationView {
                id: row.id,
                from: NotificationSender {
                    id: row.from_user_id,
                    username: row.from_username,
                    profile_img: row.from_profile_img,
                },
                to: row.to_user_id,
                kind: row.kind,
                read: row.read,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn mark_read(&self, ids: &[Uuid]) -> RepoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE notifications SET read = TRUE, updated_at = NOW()
            WHERE id = ANY($1) AND read = FALSE
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, from_user_id, to_user_id, kind, read, created_at, updated_at
            FROM notifications WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_recipient(&self, user_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM notifications WHERE to_user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait::async_trait]
impl HealthProbe for PgStore {
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }
}
