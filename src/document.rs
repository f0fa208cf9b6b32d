//! Typed shapes for the CMS documents this crate reads. Deserializing into
//! these types is the validation step: a document missing a required field
//! is rejected at the gateway instead of surfacing as a blank value later.
//! Fields the CMS leaves empty arrive as `null` and fall back to defaults.

use crate::date::{self, Timestamp};
use crate::richtext::Block;
use crate::util::null_as_default;
use serde::{Deserialize, Deserializer};

/// A `post` document as returned by the CMS.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RawDocument {
    #[serde(default)]
    pub uid: Option<String>,

    #[serde(default, deserialize_with = "date::deserialize_opt")]
    pub first_publication_date: Option<Timestamp>,

    pub data: RawPost,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RawPost {
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle: String,

    pub author: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<RawContent>,
}

/// An image field. Prismic sends `{}` for an empty image, so the URL is
/// optional too.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Banner {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// One section of a post: a heading followed by a rich-text body.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RawContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: Heading,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<Block>,
}

/// A content heading. Repositories model it either as a key-text field (a
/// plain string) or as a title field (rich text).
#[derive(Clone, Debug, PartialEq)]
pub enum Heading {
    Plain(String),
    Rich(Vec<Block>),
}

impl Default for Heading {
    fn default() -> Self {
        Heading::Plain(String::default())
    }
}

impl Heading {
    /// Returns the heading's plain text.
    pub fn text(&self) -> String {
        match self {
            Heading::Plain(text) => text.clone(),
            Heading::Rich(blocks) => crate::richtext::as_text(blocks),
        }
    }

    /// Renders the heading as inline HTML: escaped text, with spans applied
    /// for rich headings.
    pub fn html(&self) -> String {
        match self {
            Heading::Plain(text) => crate::util::escape_html(text),
            Heading::Rich(blocks) => crate::richtext::as_inline_html(blocks),
        }
    }
}

impl<'de> Deserialize<'de> for Heading {
    fn deserialize<D>(deserializer: D) -> Result<Heading, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wrapper {
            Plain(String),
            Rich(Vec<Block>),
        }

        Ok(match Wrapper::deserialize(deserializer)? {
            Wrapper::Plain(text) => Heading::Plain(text),
            Wrapper::Rich(blocks) => Heading::Rich(blocks),
        })
    }
}

/// One page of search results.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<RawDocument>,

    #[serde(default)]
    pub next_page: Option<String>,
}
