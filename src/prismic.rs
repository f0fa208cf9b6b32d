//! A [`Gateway`] backed by the Prismic REST API (v2).
//!
//! Every search must name a content ref. [`PrismicGateway::connect`] asks the
//! API root for its refs and pins the master ref (the published content) for
//! the lifetime of the gateway. Cursors are Prismic's `next_page` URLs and
//! are followed verbatim.

use crate::cms::{Error, Gateway, Page, Result, POST_TYPE};
use crate::document::{RawDocument, SearchResponse};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

/// Talks to one Prismic repository.
pub struct PrismicGateway {
    client: Client,

    /// The API root, e.g. `https://spacetraveling.cdn.prismic.io/api/v2`.
    endpoint: Url,

    /// The content ref every search is pinned to.
    master_ref: String,

    /// Required for private repositories.
    access_token: Option<String>,

    /// Passed through as the `orderings` search parameter, e.g.
    /// `[document.first_publication_date desc]`.
    orderings: Option<String>,
}

#[derive(Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,

    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicGateway {
    /// Connects to the repository at `endpoint` and looks up its master ref.
    pub fn connect(
        endpoint: Url,
        access_token: Option<String>,
        orderings: Option<String>,
    ) -> Result<PrismicGateway> {
        let client = Client::new();
        let mut root_url = endpoint.clone();
        if let Some(token) = &access_token {
            root_url.query_pairs_mut().append_pair("access_token", token);
        }
        let root: ApiRoot = get_json(&client, root_url)?;
        let master_ref = root
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(Error::MissingMasterRef)?;
        tracing::debug!("Using master ref `{}` for {}", master_ref, endpoint);

        Ok(PrismicGateway::with_ref(
            client,
            endpoint,
            master_ref,
            access_token,
            orderings,
        ))
    }

    /// Builds a gateway pinned to an already known ref.
    pub fn with_ref(
        client: Client,
        endpoint: Url,
        master_ref: String,
        access_token: Option<String>,
        orderings: Option<String>,
    ) -> PrismicGateway {
        PrismicGateway {
            client,
            endpoint,
            master_ref,
            access_token,
            orderings,
        }
    }

    /// Builds the search URL for predicate `q`.
    fn search_url(&self, q: &str, page_size: usize) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/documents/search",
            self.endpoint.as_str().trim_end_matches('/')
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("ref", &self.master_ref)
                .append_pair("q", q)
                .append_pair("pageSize", &page_size.to_string());
            if let Some(orderings) = &self.orderings {
                pairs.append_pair("orderings", orderings);
            }
            if let Some(token) = &self.access_token {
                pairs.append_pair("access_token", token);
            }
        }
        Ok(url)
    }

    fn search(&self, url: Url) -> Result<SearchResponse> {
        get_json(&self.client, url)
    }
}

impl Gateway for PrismicGateway {
    fn query_posts(&self, page_size: usize, cursor: Option<&str>) -> Result<Page> {
        let url = match cursor {
            Some(cursor) => Url::parse(cursor)?,
            None => self.search_url(&type_predicate(POST_TYPE), page_size)?,
        };
        Ok(Page::from(self.search(url)?))
    }

    fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<RawDocument> {
        let url = self.search_url(&uid_predicate(doc_type, uid), 1)?;
        self.search(url)?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                doc_type: doc_type.to_owned(),
                uid: uid.to_owned(),
            })
    }
}

impl From<SearchResponse> for Page {
    /// An empty `next_page` means there are no further pages.
    fn from(response: SearchResponse) -> Page {
        Page {
            results: response.results,
            next_cursor: response.next_page.filter(|next| !next.is_empty()),
        }
    }
}

fn get_json<T: DeserializeOwned>(client: &Client, url: Url) -> Result<T> {
    tracing::debug!("GET {}", url);
    let body = client.get(url).send()?.error_for_status()?.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// Escapes a string literal for use inside a predicate.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn type_predicate(doc_type: &str) -> String {
    format!("[[at(document.type,{})]]", quote(doc_type))
}

fn uid_predicate(doc_type: &str, uid: &str) -> String {
    format!("[[at(my.{}.uid,{})]]", doc_type, quote(uid))
}
