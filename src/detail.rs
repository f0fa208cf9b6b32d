//! Loads a single post page.

use crate::cms::{self, Gateway, POST_TYPE};
use crate::post::PostDetail;

/// Fetches posts by uid and maps them into [`PostDetail`]s.
pub struct PostDetailView<G> {
    gateway: G,
}

impl<G: Gateway> PostDetailView<G> {
    pub fn new(gateway: G) -> Self {
        PostDetailView { gateway }
    }

    /// Fetches the post whose uid is `uid`. A missing post is reported as
    /// [`cms::Error::NotFound`].
    pub fn load(&self, uid: &str) -> cms::Result<PostDetail> {
        let doc = self.gateway.get_by_uid(POST_TYPE, uid)?;
        Ok(PostDetail::from(&doc))
    }
}
