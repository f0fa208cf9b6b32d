//! Defines the [`Gateway`] trait through which posts are fetched from the
//! CMS, plus the [`Error`] type shared by all gateway implementations. The
//! HTTP implementation lives in [`crate::prismic`].

use crate::document::RawDocument;
use std::fmt;

/// The document type queried for blog posts.
pub const POST_TYPE: &str = "post";

/// One page of query results.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// The documents on this page, in the order the CMS returned them.
    pub results: Vec<RawDocument>,

    /// Where to resume, or `None` when this was the last page.
    pub next_cursor: Option<String>,
}

/// Performs CMS queries. Page size and ordering are the gateway's business;
/// callers only hand back the cursor they were given.
pub trait Gateway {
    /// Fetches a page of `post` documents. `cursor` is `None` for the first
    /// page and the previous page's [`Page::next_cursor`] afterwards.
    fn query_posts(&self, page_size: usize, cursor: Option<&str>) -> Result<Page>;

    /// Fetches the single document of type `doc_type` whose uid is `uid`.
    /// Returns [`Error::NotFound`] when there is no such document.
    fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<RawDocument>;
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn query_posts(&self, page_size: usize, cursor: Option<&str>) -> Result<Page> {
        (**self).query_posts(page_size, cursor)
    }

    fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<RawDocument> {
        (**self).get_by_uid(doc_type, uid)
    }
}

/// The result of a fallible gateway operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failed CMS query.
#[derive(Debug)]
pub enum Error {
    /// Returned when no document matches a uid lookup.
    NotFound { doc_type: String, uid: String },

    /// Returned when the API doesn't advertise a master ref.
    MissingMasterRef,

    /// Returned when the request fails or the server answers with an error
    /// status.
    Http(reqwest::Error),

    /// Returned when a response body doesn't match the expected document
    /// shape.
    Decode(serde_json::Error),

    /// Returned when a request URL can't be built.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound { doc_type, uid } => {
                write!(f, "no `{}` document with uid `{}`", doc_type, uid)
            }
            Error::MissingMasterRef => {
                write!(f, "API response has no master ref")
            }
            Error::Http(err) => fmt::Display::fmt(err, f),
            Error::Decode(err) => write!(f, "decoding CMS response: {}", err),
            Error::UrlParse(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound { .. } => None,
            Error::MissingMasterRef => None,
            Error::Http(err) => Some(err),
            Error::Decode(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for HTTP calls.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Decode(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
