//! Templates and writes HTML pages to disk.

use crate::listing::ListEntry;
use crate::post::{is_page_id, PostDetail};
use gtmpl::{Template, Value};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Responsible for templating listing and post pages and writing them to
/// disk.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The base URL for listing pages. The first listing page is located at
    /// `{index_base_url}/index.html`, the listing after `n` "load more" steps
    /// at `{index_base_url}/{n}.html`.
    pub index_base_url: &'a Url,

    /// The directory in which listing HTML files are written, mirroring
    /// `index_base_url`.
    pub index_output_directory: &'a Path,

    /// The directory in which post HTML files are written. A post is written
    /// to `{posts_output_directory}/{id}.html`.
    pub posts_output_directory: &'a Path,

    /// The site title. Made available to both templates.
    pub title: &'a str,

    /// The URL for the site's home page. Made available to both templates,
    /// typically as the destination for the header logo link.
    pub home_page: &'a Url,

    /// The URL for the static assets. Made available to both templates,
    /// typically for the theme's stylesheet and logo.
    pub static_url: &'a Url,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert(
                "site_title".to_owned(),
                Value::String(crate::util::escape_html(self.title)),
            );
            obj.insert(
                "home_page".to_owned(),
                Value::String(self.home_page.to_string()),
            );
            obj.insert(
                "static_url".to_owned(),
                Value::String(self.static_url.to_string()),
            );
        }
        if let Some(dir) = page.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        page.template.execute(
            &mut std::fs::File::create(&page.file_path)?,
            &gtmpl::Context::from(value)?,
        )?;
        tracing::debug!("Wrote {}", page.file_path.display());
        Ok(())
    }

    /// Writes the listing as it stands after `step` "load more" steps.
    /// `more` says whether another step follows, in which case the page
    /// links to it as `next`.
    pub fn write_listing(&self, step: usize, entries: &[ListEntry], more: bool) -> Result<()> {
        self.write_page(&Page {
            item: Value::Array(entries.iter().map(Value::from).collect()),
            file_path: self.index_output_directory.join(listing_file_name(step)),
            prev: None,
            next: match more {
                true => Some(self.index_base_url.join(&listing_file_name(step + 1))?),
                false => None,
            },
            template: self.index_template,
        })
    }

    /// Writes a post page. `prev` and `next` are the URLs of the neighbouring
    /// posts in listing order. Ids that aren't a single path segment are
    /// rejected with [`Error::InvalidPostId`].
    pub fn write_post(
        &self,
        id: &str,
        post: &PostDetail,
        prev: Option<Url>,
        next: Option<Url>,
    ) -> Result<()> {
        if !is_page_id(id) {
            return Err(Error::InvalidPostId(id.to_owned()));
        }
        self.write_page(&Page {
            item: post.to_value(),
            file_path: self.posts_output_directory.join(format!("{}.html", id)),
            prev,
            next,
            template: self.posts_template,
        })
    }
}

/// The file name of the listing after `step` "load more" steps.
pub fn listing_file_name(step: usize) -> String {
    match step {
        0 => String::from("index.html"),
        _ => format!("{}.html", step),
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, and `next` (see [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error building a page URL.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),

    /// A post id that can't be used as a file name.
    InvalidPostId(String),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => fmt::Display::fmt(err, f),
            Error::UrlParse(err) => fmt::Display::fmt(err, f),
            Error::Io(err) => fmt::Display::fmt(err, f),
            Error::InvalidPostId(id) => write!(f, "Invalid post id `{}`", id),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::InvalidPostId(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cms::fake::post;

    fn template(source: &str) -> Template {
        let mut template = Template::default();
        template.parse(source).unwrap();
        template
    }

    #[test]
    fn test_listing_file_name() {
        assert_eq!("index.html", listing_file_name(0));
        assert_eq!("3.html", listing_file_name(3));
    }

    #[test]
    fn test_write_listing_and_post() {
        let dir = tempfile::tempdir().unwrap();
        let index_template =
            template("{{.site_title}}|{{range .item}}{{.title}};{{end}}|{{if .next}}{{.next}}{{end}}");
        let posts_template = template("{{.item.title}}|{{.item.date}}|{{.prev}}");
        let index_url = Url::parse("https://example.com/pages/").unwrap();
        let home_page = Url::parse("https://example.com/").unwrap();
        let static_url = Url::parse("https://example.com/static/").unwrap();
        let index_output_directory = dir.path().join("pages");
        let posts_output_directory = dir.path().join("post");
        let writer = Writer {
            posts_template: &posts_template,
            index_template: &index_template,
            index_base_url: &index_url,
            index_output_directory: &index_output_directory,
            posts_output_directory: &posts_output_directory,
            title: "spacetraveling",
            home_page: &home_page,
            static_url: &static_url,
        };

        let entry = ListEntry {
            key: "a".to_owned(),
            url: None,
            title: "A & B".to_owned(),
            subtitle: String::new(),
            date: String::new(),
            author: String::new(),
        };
        writer.write_listing(0, &[entry.clone()], true).unwrap();
        writer.write_listing(1, &[entry.clone(), entry], false).unwrap();
        assert_eq!(
            "spacetraveling|A &amp; B;|https://example.com/pages/1.html",
            std::fs::read_to_string(index_output_directory.join("index.html")).unwrap()
        );
        assert_eq!(
            "spacetraveling|A &amp; B;A &amp; B;|",
            std::fs::read_to_string(index_output_directory.join("1.html")).unwrap()
        );

        let detail = PostDetail::from(&post("hooks", "Hooks"));
        writer
            .write_post(
                "hooks",
                &detail,
                Some(Url::parse("https://example.com/post/prev.html").unwrap()),
                None,
            )
            .unwrap();
        assert_eq!(
            "Hooks|25 mar 2021|https://example.com/post/prev.html",
            std::fs::read_to_string(posts_output_directory.join("hooks.html")).unwrap()
        );

        let result = writer.write_post("../hooks", &detail, None, None);
        assert!(matches!(result, Err(Error::InvalidPostId(_))));
        assert!(!dir.path().join("hooks.html").exists());
    }
}
