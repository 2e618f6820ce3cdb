//! Account management: registration, login, profile edits and deletion

use std::sync::Arc;

use tracing::{info, warn};

use crate::db::{CreateUser, StoreRef, UniqueViolation, UpdateUser, UserRecord};
use crate::error::{ApiError, ApiResult};
use crate::pubsub::PubSub;

use super::auth::AuthService;
use super::posts::announce_deleted;
use super::validation;

#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct EditUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A user together with a freshly issued access token
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserRecord,
    pub token: String,
}

/// The store owns email uniqueness; a collision there is the caller's conflict
fn email_taken(err: anyhow::Error) -> ApiError {
    if err.is::<UniqueViolation>() {
        ApiError::Conflict("email is already registered".into())
    } else {
        ApiError::Internal(err)
    }
}

#[derive(Clone)]
pub struct UserService {
    store: StoreRef,
    bus: Arc<PubSub>,
    auth: AuthService,
}

impl UserService {
    pub fn new(store: StoreRef, bus: Arc<PubSub>, auth: AuthService) -> Self {
        Self { store, bus, auth }
    }

    pub async fn register(&self, input: RegisterUser) -> ApiResult<Session> {
        validation::non_empty("name", &input.name)?;
        validation::email(&input.email)?;
        validation::password(&input.password)?;

        let password_hash = self.auth.hash_password(&input.password)?;
        let user = self
            .store
            .create_user(CreateUser {
                name: input.name,
                email: input.email.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(email_taken)?;

        info!(user_id = %user.id, "User registered");
        let token = self.auth.issue_token(&user.id)?;
        Ok(Session { user, token })
    }

    /// `current` is the caller's principal, if any; a logged-in caller is refused
    pub async fn login(&self, current: Option<&str>, email: &str, password: &str) -> ApiResult<Session> {
        if current.is_some() {
            return Err(ApiError::Forbidden("already logged in".into()));
        }

        let invalid = || ApiError::Unauthorized("invalid email or password".into());
        let user = self
            .store
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(invalid)?;
        if !self.auth.verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }

        let token = self.auth.issue_token(&user.id)?;
        Ok(Session { user, token })
    }

    pub async fn update(&self, actor: &str, edit: EditUser) -> ApiResult<UserRecord> {
        if let Some(name) = &edit.name {
            validation::non_empty("name", name)?;
        }
        if let Some(email) = &edit.email {
            validation::email(email)?;
        }
        let password_hash = match &edit.password {
            Some(password) => {
                validation::password(password)?;
                Some(self.auth.hash_password(password)?)
            }
            None => None,
        };

        let revision = self
            .store
            .update_user(
                actor,
                UpdateUser {
                    name: edit.name,
                    email: edit.email.map(|e| e.trim().to_string()),
                    password_hash,
                },
            )
            .await
            .map_err(email_taken)?
            .ok_or_else(|| ApiError::not_found("user", actor))?;

        Ok(revision.after)
    }

    /// Remove the actor's account along with every post and comment tied to it
    pub async fn delete(&self, actor: &str) -> ApiResult<UserRecord> {
        let deletion = self
            .store
            .delete_user(actor)
            .await?
            .ok_or_else(|| ApiError::not_found("user", actor))?;

        info!(
            user_id = %actor,
            posts_removed = deletion.posts.len(),
            comments_removed = deletion.comments_removed,
            "User deleted"
        );
        for post in &deletion.posts {
            announce_deleted(&self.bus, post);
        }
        Ok(deletion.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CommentFilter, Page, PostFilter};
    use crate::pubsub::{AuthorPostTopic, MutationKind, PostTopic};
    use crate::services::posts::NewPost;
    use crate::services::testing;
    use assert_matches::assert_matches;
    use futures::{FutureExt, StreamExt};

    fn register(name: &str) -> RegisterUser {
        RegisterUser {
            name: name.into(),
            email: format!("{}@example.com", name),
            password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (services, _store, _bus) = testing::services();
        let session = services.users.register(register("khalil")).await.unwrap();
        assert_eq!(
            services.auth.verify_token(&session.token).unwrap().sub,
            session.user.id
        );

        let login = services
            .users
            .login(None, "khalil@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(login.user.id, session.user.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (services, _store, _bus) = testing::services();
        let session = services.users.register(register("khalil")).await.unwrap();

        assert_matches!(
            services.users.login(None, "khalil@example.com", "wrong-password").await,
            Err(ApiError::Unauthorized(_))
        );
        assert_matches!(
            services.users.login(None, "nobody@example.com", "secret1").await,
            Err(ApiError::Unauthorized(_))
        );
        assert_matches!(
            services
                .users
                .login(Some(&session.user.id), "khalil@example.com", "secret1")
                .await,
            Err(ApiError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn test_email_conflicts() {
        let (services, _store, _bus) = testing::services();
        services.users.register(register("khalil")).await.unwrap();
        let wissem = services.users.register(register("wissem")).await.unwrap();

        assert_matches!(
            services.users.register(register("khalil")).await,
            Err(ApiError::Conflict(_))
        );
        let steal = EditUser {
            email: Some("khalil@example.com".into()),
            ..Default::default()
        };
        assert_matches!(
            services.users.update(&wissem.user.id, steal).await,
            Err(ApiError::Conflict(_))
        );

        let keep = EditUser {
            email: Some("wissem@example.com".into()),
            name: Some("Wissem".into()),
            ..Default::default()
        };
        let updated = services.users.update(&wissem.user.id, keep).await.unwrap();
        assert_eq!(updated.name, "Wissem");
    }

    #[tokio::test]
    async fn test_sqlite_email_collision_is_conflict() {
        let store: StoreRef = Arc::new(crate::db::Database::connect_in_memory().await.unwrap());
        let services = crate::services::Services::new(store, Arc::new(PubSub::new(8)), testing::auth());
        services.users.register(register("khalil")).await.unwrap();

        let mut shouting = register("khalil");
        shouting.email = "KHALIL@example.com".into();
        assert_matches!(services.users.register(shouting).await, Err(ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let (services, _store, _bus) = testing::services();
        let mut input = register("khalil");
        input.password = "12345".into();
        assert_matches!(services.users.register(input).await, Err(ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_announces_posts() {
        let (services, store, bus) = testing::services();
        let author = testing::user(&services, "khalil").await;
        let reader = testing::user(&services, "wissem").await;

        let mut ids = Vec::new();
        for published in [true, false] {
            let post = services
                .posts
                .create(
                    &author.id,
                    NewPost {
                        title: "graphql".into(),
                        content: String::new(),
                        published,
                    },
                )
                .await
                .unwrap();
            ids.push(post.id);
        }
        services
            .comments
            .create(&reader.id, &ids[0], "like graphql".into())
            .await
            .unwrap();

        let mut public = bus.subscribe::<PostTopic>(None);
        let mut mine = bus.subscribe::<AuthorPostTopic>(Some(&author.id));

        services.users.delete(&author.id).await.unwrap();

        let event = public.next().await.unwrap();
        assert_eq!(event.kind(), MutationKind::Deleted);
        assert_eq!(event.data().id, ids[0]);
        assert!(public.next().now_or_never().is_none());

        let own: Vec<String> = mine.by_ref().take(2).map(|e| e.into_data().id).collect().await;
        assert_eq!(own, ids);

        assert!(store.find_user(&author.id).await.unwrap().is_none());
        let posts = store.list_posts(&PostFilter::default(), Page::all()).await.unwrap();
        assert_eq!(posts.total, 0);
        let comments = store
            .list_comments(&CommentFilter::default(), Page::all())
            .await
            .unwrap();
        assert_eq!(comments.total, 0);
    }
}
