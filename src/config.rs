//! Loads the project configuration. A project is a directory containing a
//! `spacetraveling.yaml` file and a `theme/` directory:
//!
//! ```text
//! spacetraveling.yaml
//! theme/
//!     theme.yaml      # lists the index and post template files
//!     index.html
//!     post.html
//!     static/         # copied verbatim to `{output}/static/`
//! ```

use crate::util::open;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// The project file name searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "spacetraveling.yaml";

/// Consulted when the project file doesn't set `prismic.access_token`.
pub const ACCESS_TOKEN_VAR: &str = "PRISMIC_ACCESS_TOKEN";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(1)
    }
}

#[derive(Deserialize)]
struct Project {
    #[serde(default = "default_title")]
    title: String,
    site_root: Url,
    prismic: Prismic,
}

fn default_title() -> String {
    String::from("spacetraveling")
}

#[derive(Deserialize)]
struct Prismic {
    endpoint: Url,

    #[serde(default)]
    access_token: Option<String>,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    orderings: Option<String>,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// Everything needed to build the site.
pub struct Config {
    /// The site title, shown in page titles.
    pub title: String,

    /// The URL for the home page (the first listing page).
    pub home_page: Url,

    /// The base URL for listing pages (`{site_root}/pages/`).
    pub index_url: Url,

    /// The base URL for post pages (`{site_root}/post/`).
    pub posts_url: Url,

    /// The base URL for static assets (`{site_root}/static/`).
    pub static_url: Url,

    /// The Prismic API root.
    pub prismic_endpoint: Url,
    pub access_token: Option<String>,
    pub orderings: Option<String>,

    /// The number of posts fetched per request.
    pub page_size: usize,

    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub static_source_directory: PathBuf,
    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub posts_output_directory: PathBuf,
    pub static_output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads it.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::MissingProjectFile),
            }
        }
    }

    /// Loads the project file at `path` and the theme next to it.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|e| Error::Annotated(format!("parsing `{}`", path.display()), Box::new(e.into())))?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::InvalidProjectPath(path.to_owned()))?;

        let theme_dir = project_root.join("theme");
        let theme_path = theme_dir.join("theme.yaml");
        let theme: Theme = serde_yaml::from_reader(open(&theme_path, "theme")?).map_err(|e| {
            Error::Annotated(
                format!("parsing `{}`", theme_path.display()),
                Box::new(e.into()),
            )
        })?;

        let site_root = with_trailing_slash(project.site_root);
        let access_token = project
            .prismic
            .access_token
            .or_else(|| std::env::var(ACCESS_TOKEN_VAR).ok())
            .filter(|token| !token.is_empty());
        let index_url = site_root.join("pages/")?;

        Ok(Config {
            title: project.title,
            home_page: site_root.clone(),
            posts_url: site_root.join("post/")?,
            static_url: site_root.join("static/")?,
            index_url,
            prismic_endpoint: project.prismic.endpoint,
            access_token,
            orderings: project.prismic.orderings,
            page_size: project.prismic.page_size.0.max(1),
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            static_source_directory: theme_dir.join("static"),
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            posts_output_directory: output_directory.join("post"),
            static_output_directory: output_directory.join("static"),
        })
    }
}

// `Url::join` treats the last path segment as a file name unless the path
// ends in a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no ancestor directory contains a [`PROJECT_FILE`].
    MissingProjectFile,

    /// Returned when the project file path has no parent directory.
    InvalidProjectPath(PathBuf),

    /// Returned when a configuration file isn't valid YAML or is missing
    /// fields.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a configured URL can't be joined.
    UrlParse(url::ParseError),

    /// Returned for I/O problems reading configuration files.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingProjectFile => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::InvalidProjectPath(path) => write!(
                f,
                "Can't get parent directory for project file path '{}'",
                path.display()
            ),
            Error::DeserializeYaml(err) => fmt::Display::fmt(err, f),
            Error::UrlParse(err) => fmt::Display::fmt(err, f),
            Error::Io(err) => fmt::Display::fmt(err, f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingProjectFile => None,
            Error::InvalidProjectPath(_) => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn write_project(root: &Path, project: &str) {
        fs::create_dir_all(root.join("theme")).unwrap();
        fs::write(root.join(PROJECT_FILE), project).unwrap();
        fs::write(
            root.join("theme").join("theme.yaml"),
            "index_template: [base.html, index.html]\nposts_template: [base.html, post.html]\n",
        )
        .unwrap();
    }

    #[test]
    fn test_from_directory_searches_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        write_project(
            dir.path(),
            "site_root: https://blog.example.com\n\
             prismic:\n  endpoint: https://spacetraveling.cdn.prismic.io/api/v2\n  access_token: secret\n",
        );
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested, Path::new("/tmp/out")).unwrap();
        assert_eq!("spacetraveling", config.title);
        assert_eq!("https://blog.example.com/", config.home_page.as_str());
        assert_eq!("https://blog.example.com/pages/", config.index_url.as_str());
        assert_eq!("https://blog.example.com/post/", config.posts_url.as_str());
        assert_eq!("https://blog.example.com/static/", config.static_url.as_str());
        assert_eq!(Some("secret".to_owned()), config.access_token);
        assert_eq!(1, config.page_size);
        assert_eq!(
            vec![
                dir.path().join("theme").join("base.html"),
                dir.path().join("theme").join("index.html"),
            ],
            config.index_template
        );
        assert_eq!(PathBuf::from("/tmp/out/post"), config.posts_output_directory);
    }

    #[test]
    fn test_from_project_file_options() {
        let dir = tempfile::tempdir().unwrap();
        write_project(
            dir.path(),
            "title: Space\n\
             site_root: https://example.com/blog/\n\
             prismic:\n  endpoint: https://x.cdn.prismic.io/api/v2\n  access_token: t\n  page_size: 5\n  \
             orderings: \"[document.first_publication_date desc]\"\n",
        );
        let config =
            Config::from_project_file(&dir.path().join(PROJECT_FILE), Path::new("out")).unwrap();
        assert_eq!("Space", config.title);
        assert_eq!(5, config.page_size);
        assert_eq!("https://example.com/blog/post/", config.posts_url.as_str());
        assert_eq!(
            Some("[document.first_publication_date desc]".to_owned()),
            config.orderings
        );
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path(), "site_root: https://example.com/\n");
        let result = Config::from_project_file(&dir.path().join(PROJECT_FILE), Path::new("out"));
        assert!(matches!(result, Err(Error::Annotated(_, _))));
    }
}
