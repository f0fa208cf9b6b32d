//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: fetching the first page of
//! posts, writing one listing page per "load more" step ([`crate::listing`]),
//! writing a page per post ([`crate::detail`]), and copying the theme's
//! static directory into the output directory.

use crate::cms::{Error as CmsError, Gateway};
use crate::config::Config;
use crate::detail::PostDetailView;
use crate::listing::{PaginationState, PostListView};
use crate::post::PostDetail;
use crate::write::{Error as WriteError, Writer};
use gtmpl::Template;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// Builds the site from a [`Config`] object, reading posts through
/// `gateway`. Everything is fetched before the output directories are
/// cleaned, so a failed fetch leaves the previous build in place.
pub fn build_site<G: Gateway>(config: &Config, gateway: &G) -> Result<()> {
    // Parse the template files before touching the network or the disk.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    let initial = PaginationState::fetch(gateway, config.page_size)?;
    tracing::info!("Fetched first page ({} posts)", initial.items.len());

    // One listing per step: the first page as fetched, then the accumulated
    // listing after each "load more".
    let mut listing = PostListView::initialize(gateway, config.page_size, initial);
    let mut steps = vec![listing.entries(&config.posts_url)?];
    let mut seen = HashSet::new();
    while let Some(cursor) = listing.next_cursor() {
        if !seen.insert(cursor.to_owned()) {
            tracing::warn!("CMS returned cursor `{}` twice, stopping", cursor);
            break;
        }
        if listing.load_more()? == 0 {
            if listing.can_load_more() {
                tracing::warn!("CMS returned an empty page with a further cursor, stopping");
            }
            break;
        }
        steps.push(listing.entries(&config.posts_url)?);
    }
    tracing::info!(
        "Fetched {} listing steps ({} posts)",
        steps.len(),
        listing.items().len()
    );

    let ids: Vec<&str> = listing
        .items()
        .iter()
        .filter_map(|summary| summary.page_id())
        .collect();
    let details = PostDetailView::new(gateway);
    let posts = ids
        .iter()
        .map(|id| details.load(id))
        .collect::<std::result::Result<Vec<PostDetail>, CmsError>>()?;
    let skipped = listing.items().len() - ids.len();
    if skipped > 0 {
        tracing::warn!("Skipped {} posts without a usable uid", skipped);
    }

    // Blow away the old output directories so we don't have any collisions.
    // The root output directory is left alone in case it was passed by
    // mistake.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;

    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        posts_output_directory: &config.posts_output_directory,
        title: &config.title,
        home_page: &config.home_page,
        static_url: &config.static_url,
    };

    for (step, entries) in steps.iter().enumerate() {
        writer.write_listing(step, entries, step + 1 < steps.len())?;
    }
    tracing::info!("Wrote {} listing pages", steps.len());

    // write the post pages, linking each to its neighbours in listing order
    let post_url = |id: &str| config.posts_url.join(&format!("{}.html", id));
    for (i, (id, post)) in ids.iter().zip(&posts).enumerate() {
        let prev: Option<Url> = match i {
            0 => None,
            _ => Some(post_url(ids[i - 1])?),
        };
        let next: Option<Url> = match ids.get(i + 1) {
            Some(next) => Some(post_url(*next)?),
            None => None,
        };
        writer.write_post(id, post, prev, next)?;
    }
    tracing::info!("Wrote {} post pages", ids.len());

    // copy static directory
    if config.static_source_directory.is_dir() {
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    }

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    use walkdir::WalkDir;
    for result in WalkDir::new(src) {
        let entry = result?;
        // strip_prefix shouldn't fail since `src` is always an ancestor of
        // the entry
        let target = match entry.path().strip_prefix(src) {
            Ok(relative) => dst.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

// Loads the template file contents, concatenates them, and parses the result
// into a template.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during fetching,
/// writing, cleaning output directories, parsing template files, and other
/// I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors querying the CMS.
    Cms(CmsError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned when a post URL can't be built.
    UrlParse(url::ParseError),

    /// Returned for errors walking the static directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Cms(err) => fmt::Display::fmt(err, f),
            Error::Write(err) => fmt::Display::fmt(err, f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => fmt::Display::fmt(err, f),
            Error::UrlParse(err) => fmt::Display::fmt(err, f),
            Error::WalkDir(err) => fmt::Display::fmt(err, f),
            Error::Io(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Cms(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<CmsError> for Error {
    /// Converts [`CmsError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: CmsError) -> Error {
        Error::Cms(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}
