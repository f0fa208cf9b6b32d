//! The library code for the `spacetraveling` blog generator. Posts live in a
//! Prismic repository; the generator fetches them and renders a static site.
//! The architecture can be broken down into three layers:
//!
//! 1. Fetching documents through a [`cms::Gateway`] ([`crate::prismic`] talks
//!    HTTP to the Prismic API) and validating them into
//!    [`document::RawDocument`]s
//! 2. Mapping documents into view models ([`crate::post`]): the listing
//!    ([`crate::listing`]) grows page by page via a cursor, while post pages
//!    ([`crate::detail`]) render their rich-text bodies to HTML
//!    ([`crate::richtext`])
//! 3. Templating the views and writing them to disk ([`crate::write`]),
//!    orchestrated by [`build::build_site`]
//!
//! The listing is written once per "load more" step: `pages/index.html` holds
//! the first page as fetched and `pages/{n}.html` the accumulated listing after
//! `n` further pages, each linking to the next while the CMS reports more.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod cms;
pub mod config;
pub mod date;
pub mod detail;
pub mod document;
pub mod listing;
pub mod post;
pub mod prismic;
pub mod richtext;
mod util;
pub mod write;
