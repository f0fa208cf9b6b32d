//! Defines the view models ([`PostSummary`] and [`PostDetail`]) and the pure
//! mapping from [`RawDocument`]s into them. See [`PostDetail::to_value`] for
//! how a post is converted into a template value.

use crate::date::{self, Timestamp};
use crate::document::RawDocument;
use crate::richtext;
use crate::util::escape_html;
use gtmpl::Value;
use std::collections::HashMap;

/// Reading speed used to estimate [`PostDetail::reading_time`].
const WORDS_PER_MINUTE: usize = 200;

/// The fields of a post shown in the listing.
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary {
    /// The CMS uid. Posts without one can be listed but not linked.
    pub id: Option<String>,
    pub published_at: Option<Timestamp>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// The id, if it can name a post page.
    pub fn page_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| is_page_id(id))
    }
}

/// Whether `id` can name a post page: a single URL path segment with no
/// query or fragment, so `{id}.html` stays inside the posts directory.
pub fn is_page_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(&['/', '\\', '?', '#'][..])
}

impl From<&RawDocument> for PostSummary {
    fn from(doc: &RawDocument) -> PostSummary {
        PostSummary {
            id: doc.uid.clone(),
            published_at: doc.first_publication_date,
            title: doc.data.title.clone(),
            subtitle: doc.data.subtitle.clone(),
            author: doc.data.author.clone(),
        }
    }
}

/// One section of a post page.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentBlock {
    /// The rendered heading. Inserted into pages as-is.
    pub heading_html: String,

    /// The rendered body. Inserted into pages as-is.
    pub body_html: String,
}

/// Everything shown on a post page.
#[derive(Clone, Debug, PartialEq)]
pub struct PostDetail {
    pub id: Option<String>,
    pub published_at: Option<Timestamp>,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub content: Vec<ContentBlock>,

    /// Estimated minutes to read the headings and bodies.
    pub reading_time: usize,
}

impl From<&RawDocument> for PostDetail {
    fn from(doc: &RawDocument) -> PostDetail {
        let mut words = 0;
        let content = doc
            .data
            .content
            .iter()
            .map(|section| {
                words += word_count(&section.heading.text());
                words += word_count(&richtext::as_text(&section.body));
                ContentBlock {
                    heading_html: section.heading.html(),
                    body_html: richtext::as_html(&section.body),
                }
            })
            .collect();

        PostDetail {
            id: doc.uid.clone(),
            published_at: doc.first_publication_date,
            title: doc.data.title.clone(),
            banner_url: doc.data.banner.url.clone(),
            author: doc.data.author.clone(),
            content,
            reading_time: (words + WORDS_PER_MINUTE - 1) / WORDS_PER_MINUTE,
        }
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl PostDetail {
    /// The label shown next to the clock icon.
    pub fn reading_time_label(&self) -> String {
        format!("{} min", self.reading_time)
    }

    /// Converts the post into a template [`Value`]. Text fields are escaped;
    /// `content[].heading` and `content[].body` are rendered rich text and are
    /// passed through.
    /// Fields: `id`, `title`, `banner`, `date`, `author`, `reading_time`, and
    /// `content` (a list of `{heading, body}`).
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "id".to_owned(),
            Value::String(self.id.clone().unwrap_or_default()),
        );
        m.insert("title".to_owned(), Value::String(escape_html(&self.title)));
        m.insert(
            "banner".to_owned(),
            Value::String(escape_html(&self.banner_url)),
        );
        m.insert(
            "date".to_owned(),
            Value::String(date::format_opt(self.published_at.as_ref())),
        );
        m.insert("author".to_owned(), Value::String(escape_html(&self.author)));
        m.insert(
            "reading_time".to_owned(),
            Value::String(self.reading_time_label()),
        );
        m.insert(
            "content".to_owned(),
            Value::Array(
                self.content
                    .iter()
                    .map(|block| {
                        let mut m: HashMap<String, Value> = HashMap::new();
                        m.insert(
                            "heading".to_owned(),
                            Value::String(block.heading_html.clone()),
                        );
                        m.insert(
                            "body".to_owned(),
                            Value::String(block.body_html.clone()),
                        );
                        Value::Object(m)
                    })
                    .collect(),
            ),
        );
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cms::fake::post;

    fn string(value: &Value) -> &str {
        match value {
            Value::String(s) => s,
            _ => panic!("expected a string"),
        }
    }

    #[test]
    fn test_summary_from_document() {
        let summary = PostSummary::from(&post("hooks", "Como utilizar Hooks"));
        assert_eq!(Some("hooks".to_owned()), summary.id);
        assert_eq!("Como utilizar Hooks", summary.title);
        assert_eq!("Como utilizar Hooks subtitle", summary.subtitle);
        assert_eq!("Joseph Oliveira", summary.author);
        assert_eq!(
            "25 mar 2021",
            date::format_opt(summary.published_at.as_ref())
        );
    }

    #[test]
    fn test_mapping_is_pure() {
        let doc = post("hooks", "Como utilizar Hooks");
        assert_eq!(PostSummary::from(&doc), PostSummary::from(&doc));
        assert_eq!(PostDetail::from(&doc), PostDetail::from(&doc));
    }

    #[test]
    fn test_detail_from_document() {
        let detail = PostDetail::from(&post("hooks", "Como utilizar Hooks"));
        assert_eq!("https://images.prismic.io/hooks.png", detail.banner_url);
        assert_eq!(
            vec![ContentBlock {
                heading_html: "Introdução".to_owned(),
                body_html: "<p>Lorem ipsum dolor sit amet</p>".to_owned(),
            }],
            detail.content
        );
        assert_eq!(1, detail.reading_time);
        assert_eq!("1 min", detail.reading_time_label());
    }

    #[test]
    fn test_headings_are_rendered() {
        let mut doc = post("x", "X");
        doc.data.content = serde_json::from_value(serde_json::json!([
            {"heading": "Prós & contras", "body": []},
            {"heading": [{"type": "heading2", "text": "Usando Hooks", "spans": [
                {"start": 7, "end": 12, "type": "strong"}
            ]}], "body": []}
        ]))
        .unwrap();
        let detail = PostDetail::from(&doc);
        assert_eq!("Prós &amp; contras", detail.content[0].heading_html);
        assert_eq!("Usando <strong>Hooks</strong>", detail.content[1].heading_html);
    }

    #[test]
    fn test_page_id() {
        assert!(is_page_id("como-utilizar-hooks"));
        assert!(!is_page_id(""));
        assert!(!is_page_id(".."));
        assert!(!is_page_id("../etc/passwd"));
        assert!(!is_page_id("a/b"));
        assert!(!is_page_id("a\\b"));
        assert!(!is_page_id("a#b"));
        assert!(!is_page_id("a?b"));

        let mut summary = PostSummary::from(&post("hooks", "Hooks"));
        assert_eq!(Some("hooks"), summary.page_id());
        summary.id = Some("a/b".to_owned());
        assert_eq!(None, summary.page_id());
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let mut doc = post("long", "Long");
        let text = vec!["palavra"; 401].join(" ");
        doc.data.content = serde_json::from_value(serde_json::json!([
            {"heading": "", "body": [{"type": "paragraph", "text": text, "spans": []}]}
        ]))
        .unwrap();
        assert_eq!(3, PostDetail::from(&doc).reading_time);
    }

    #[test]
    fn test_to_value_escapes_text_but_not_body() {
        let mut doc = post("x", "Tom & Jerry");
        doc.data.content[0].body = serde_json::from_str(
            r#"[{"type": "paragraph", "text": "<b>", "spans": []}]"#,
        )
        .unwrap();
        let value = PostDetail::from(&doc).to_value();
        let m = match value {
            Value::Object(m) => m,
            _ => panic!("expected an object"),
        };
        assert_eq!("Tom &amp; Jerry", string(&m["title"]));
        assert_eq!("25 mar 2021", string(&m["date"]));
        match &m["content"] {
            Value::Array(blocks) => match &blocks[0] {
                Value::Object(block) => {
                    assert_eq!("<p>&lt;b&gt;</p>", string(&block["body"]))
                }
                _ => panic!("expected an object"),
            },
            _ => panic!("expected an array"),
        }
    }
}
