//! Topic registry
//!
//! Each topic names its channel on the bus and fixes the payload type carried
//! on it, so publishing a comment event on a post topic does not compile.

use crate::db::{CommentRecord, PostRecord};

use super::{Channel, MutationEvent, PubSub};

pub type PostEvent = MutationEvent<PostRecord>;
pub type CommentEvent = MutationEvent<CommentRecord>;

pub trait Topic: 'static {
    /// Name used in logs, e.g. `postId:comment`
    const NAME: &'static str;
    type Payload: Clone + Send + 'static;

    fn channel(bus: &PubSub) -> &Channel<Self::Payload>;
}

/// Every published post; unkeyed
pub struct PostTopic;

impl Topic for PostTopic {
    const NAME: &'static str = "post";
    type Payload = PostEvent;

    fn channel(bus: &PubSub) -> &Channel<PostEvent> {
        &bus.posts
    }
}

/// One author's posts regardless of visibility; keyed by user id
pub struct AuthorPostTopic;

impl Topic for AuthorPostTopic {
    const NAME: &'static str = "userId:post";
    type Payload = PostEvent;

    fn channel(bus: &PubSub) -> &Channel<PostEvent> {
        &bus.author_posts
    }
}

/// Comments under one post; keyed by post id
pub struct CommentTopic;

impl Topic for CommentTopic {
    const NAME: &'static str = "postId:comment";
    type Payload = CommentEvent;

    fn channel(bus: &PubSub) -> &Channel<CommentEvent> {
        &bus.comments
    }
}
