//! The post listing: a [`PaginationState`] seeded from an already fetched
//! first page, grown one page at a time by [`PostListView::load_more`].

use crate::cms::{self, Gateway, Page};
use crate::date;
use crate::post::PostSummary;
use crate::util::escape_html;
use gtmpl::Value;
use std::collections::HashMap;
use url::Url;

/// The posts listed so far and where to resume.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaginationState {
    /// Every post fetched so far, in the order the CMS returned them.
    pub items: Vec<PostSummary>,

    /// `None` once the last page has been fetched.
    pub next_cursor: Option<String>,
}

impl PaginationState {
    /// Builds a state, treating an empty cursor as "no further pages".
    pub fn new(items: Vec<PostSummary>, next_cursor: Option<String>) -> Self {
        PaginationState {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// Maps a gateway [`Page`] into a state.
    pub fn from_page(page: &Page) -> Self {
        PaginationState::new(
            page.results.iter().map(PostSummary::from).collect(),
            page.next_cursor.clone(),
        )
    }

    /// Fetches the first page of posts. This is the data-loading step that
    /// runs before a [`PostListView`] exists.
    pub fn fetch<G: Gateway>(gateway: &G, page_size: usize) -> cms::Result<Self> {
        let page = gateway.query_posts(page_size, None)?;
        Ok(PaginationState::from_page(&page))
    }
}

/// Owns a [`PaginationState`] and extends it on demand.
pub struct PostListView<G> {
    gateway: G,
    page_size: usize,
    state: PaginationState,
}

impl<G: Gateway> PostListView<G> {
    /// Creates a view over `initial`. No request is made.
    pub fn initialize(gateway: G, page_size: usize, initial: PaginationState) -> Self {
        PostListView {
            gateway,
            page_size,
            state: PaginationState::new(initial.items, initial.next_cursor),
        }
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.state.items
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.state.next_cursor.as_deref()
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Whether "load more" should be offered.
    pub fn can_load_more(&self) -> bool {
        self.state.next_cursor.is_some()
    }

    /// Fetches the page at the stored cursor, appends its posts and replaces
    /// the cursor. Returns the number of posts added; without a cursor this
    /// is a no-op returning zero. On error the state is left untouched so the
    /// call can be retried.
    pub fn load_more(&mut self) -> cms::Result<usize> {
        let cursor = match &self.state.next_cursor {
            Some(cursor) => cursor,
            None => return Ok(0),
        };
        let page = self
            .gateway
            .query_posts(self.page_size, Some(cursor.as_str()))?;

        let added = page.results.len();
        self.state
            .items
            .extend(page.results.iter().map(PostSummary::from));
        self.state.next_cursor = page.next_cursor.filter(|c| !c.is_empty());
        tracing::debug!(
            "Loaded {} more posts ({} total, more: {})",
            added,
            self.state.items.len(),
            self.can_load_more()
        );
        Ok(added)
    }

    /// Builds the rendered entries for the current items. Posts are linked
    /// at `{posts_url}{id}.html`; `posts_url` should end in a slash.
    pub fn entries(&self, posts_url: &Url) -> Result<Vec<ListEntry>, url::ParseError> {
        self.state
            .items
            .iter()
            .enumerate()
            .map(|(i, summary)| ListEntry::new(i, summary, posts_url))
            .collect()
    }
}

/// One rendered item of the listing.
#[derive(Clone, Debug, PartialEq)]
pub struct ListEntry {
    /// The post id, or `#{index}` for posts without a usable one. `#` never
    /// appears in a usable id, so the two can't collide.
    pub key: String,

    /// `None` for posts without a usable id.
    pub url: Option<Url>,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub author: String,
}

impl ListEntry {
    fn new(index: usize, summary: &PostSummary, posts_url: &Url) -> Result<Self, url::ParseError> {
        let (key, url) = match summary.page_id() {
            Some(id) => (id.to_owned(), Some(posts_url.join(&format!("{}.html", id))?)),
            None => (format!("#{}", index), None),
        };
        Ok(ListEntry {
            key,
            url,
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            date: date::format_opt(summary.published_at.as_ref()),
            author: summary.author.clone(),
        })
    }
}

impl From<&ListEntry> for Value {
    /// Converts a [`ListEntry`] into a template [`Value`] with escaped text
    /// fields. `url` is nil for posts that can't be linked.
    fn from(entry: &ListEntry) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("key".to_owned(), Value::String(escape_html(&entry.key)));
        m.insert(
            "url".to_owned(),
            match &entry.url {
                Some(url) => Value::String(url.to_string()),
                None => Value::Nil,
            },
        );
        m.insert("title".to_owned(), Value::String(escape_html(&entry.title)));
        m.insert(
            "subtitle".to_owned(),
            Value::String(escape_html(&entry.subtitle)),
        );
        m.insert("date".to_owned(), Value::String(entry.date.clone()));
        m.insert("author".to_owned(), Value::String(escape_html(&entry.author)));
        Value::Object(m)
    }
}
