//! Demo data for local development
//!
//! Two users, one published post each and one comment per post. Skipped when
//! the store already has users.

use anyhow::Result;
use tracing::info;

use super::{CreateComment, CreatePost, CreateUser, Page, Store};

struct DemoAuthor {
    name: &'static str,
    email: &'static str,
    title: &'static str,
    content: &'static str,
    comment: &'static str,
}

const DEMO_AUTHORS: &[DemoAuthor] = &[
    DemoAuthor {
        name: "khalil",
        email: "khalil@example.com",
        title: "graphql",
        content: "graphql is awesome",
        comment: "like graphql",
    },
    DemoAuthor {
        name: "wissem",
        email: "wissem@example.com",
        title: "nodejs",
        content: "nodejs is awesome",
        comment: "like nodejs",
    },
];

/// Insert the demo fixtures; every demo user gets `password_hash`
pub async fn run_seeds(store: &dyn Store, password_hash: &str) -> Result<bool> {
    if store.list_users(Page::new(0, 1)).await?.total > 0 {
        info!("Store already has users, skipping demo seed");
        return Ok(false);
    }

    for demo in DEMO_AUTHORS {
        let user = store
            .create_user(CreateUser {
                name: demo.name.to_string(),
                email: demo.email.to_string(),
                password_hash: password_hash.to_string(),
            })
            .await?;
        let post = store
            .create_post(CreatePost {
                author_id: user.id.clone(),
                title: demo.title.to_string(),
                content: demo.content.to_string(),
                published: true,
            })
            .await?;
        store
            .create_comment(CreateComment {
                post_id: post.id,
                user_id: user.id,
                content: demo.comment.to_string(),
            })
            .await?;
    }

    info!(users = DEMO_AUTHORS.len(), "Seeded demo data");
    Ok(true)
}
