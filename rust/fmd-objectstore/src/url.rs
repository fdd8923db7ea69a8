//! URL handling for locating fragment metadata objects in an `ObjectStore`.
//!
//! All URLs accepted here must be absolute, canonical and clean:
//! - no credentials in the authority component,
//! - no query and no fragment component,
//! - no path traversal sequences,
//! - the form `scheme ":" ["//" authority] path`, with a non-empty path.
//!
//! A URL whose path ends in a slash ("/") denotes a container ("folder"); any
//! other URL denotes an object inside its parent container.

use std::borrow::Cow;

use fmd_common::{ErrorKind, Result};
use url::Url;

macro_rules! verify {
    ($expr:expr) => {{
        let result = $expr;
        verify(result, stringify!($expr), None, None)?;
    }};

    ($expr:expr, $url:expr) => {{
        let result = $expr;
        verify(result, stringify!($expr), Some($url), None)?;
    }};
}

/// A URL that has been parsed and verified according to the `ObjectStore` rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(Url);

impl ObjectUrl {
    /// Creates a new `ObjectUrl` from an already parsed `Url` after verifying it.
    pub fn new(url: Url) -> Result<ObjectUrl> {
        Self::verify_url(&url)?;
        Ok(Self(url))
    }

    /// Parses and verifies a URL string.
    ///
    /// The string must already be in canonical form: parsing and re-serializing
    /// it must produce the same text, which rules out path traversals and
    /// non-normalized encodings.
    pub fn parse(url_str: &str) -> Result<ObjectUrl> {
        let url = Url::parse(url_str).map_err(|e| {
            make_err(
                &format!("failed to parse url, error: {e}"),
                Some(url_str),
                None,
            )
        })?;
        Self::verify_url(&url)?;
        verify!(url.as_str() == url_str, url_str);
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> Url {
        self.0
    }

    /// Resolves a relative path against the container of this URL, refusing any
    /// result that escapes the container.
    pub fn resolve_relative(&self, rel_path: RelativePath) -> Result<ObjectUrl> {
        verify!(!rel_path.is_empty());
        let container = self.get_container()?;
        let resolved = container.join(&rel_path).map_err(|_| {
            make_err(
                "failed to join relative path",
                Some(self.as_str()),
                Some(rel_path.0),
            )
        })?;
        verify!(resolved.as_str().starts_with(container.as_str()), self.as_str());
        Ok(ObjectUrl(resolved))
    }

    /// Makes `url` relative to the container of this URL.
    ///
    /// Returns `None` if `url` is a container itself or lies outside this
    /// container.
    pub fn make_relative(&self, url: &ObjectUrl) -> Option<String> {
        if url.is_container() {
            return None;
        }
        let container = self.get_container().ok()?;
        if url.as_str().starts_with(container.as_str()) {
            container.0.make_relative(url)
        } else {
            None
        }
    }

    /// Returns the container URL for this URL: the URL itself when it already
    /// denotes a container, its parent otherwise.
    pub fn get_container(&self) -> Result<Cow<'_, ObjectUrl>> {
        if self.is_container() {
            Ok(Cow::Borrowed(self))
        } else {
            let parent = self
                .join("./")
                .map_err(|_| make_err("failed to determine parent", Some(self.as_str()), None))?;
            Ok(Cow::Owned(ObjectUrl(parent)))
        }
    }

    pub fn is_container(&self) -> bool {
        self.path().ends_with('/')
    }

    /// Verifies that the given `Url` satisfies the `ObjectStore` rules.
    pub fn verify_url(url: &Url) -> Result<()> {
        verify!(url.username().is_empty(), url.as_str());
        verify!(url.password().is_none(), url.as_str());
        verify!(url.query().is_none(), url.as_str());
        verify!(url.fragment().is_none(), url.as_str());
        verify!(url.path_segments().is_some(), url.as_str());
        verify!(url.path().starts_with('/'), url.as_str());
        Ok(())
    }
}

impl std::ops::Deref for ObjectUrl {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<&str> for ObjectUrl {
    type Error = fmd_common::Error;

    fn try_from(url_str: &str) -> std::result::Result<Self, Self::Error> {
        ObjectUrl::parse(url_str)
    }
}

/// A relative path verified to contain no traversal sequences and no scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativePath<'a>(&'a str);

impl<'a> RelativePath<'a> {
    pub fn new(path: &'a str) -> Result<RelativePath<'a>> {
        verify!(Self::is_valid(path), path);
        Ok(RelativePath(path))
    }

    pub fn is_valid(s: &str) -> bool {
        !s.starts_with('/') && s.split('/').all(Self::is_valid_segment) && !has_scheme(s)
    }

    fn is_valid_segment(segment: &str) -> bool {
        let lowered = segment.to_ascii_lowercase();
        !matches!(
            lowered.as_str(),
            "." | ".." | "%2e" | "%2e%2e" | "%2e." | ".%2e"
        )
    }
}

impl std::ops::Deref for RelativePath<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

/// Checks whether `s` starts with `scheme ":"`, per RFC 3986 scheme syntax.
fn has_scheme(s: &str) -> bool {
    let Some(colon) = s.find(':') else {
        return false;
    };
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

fn verify(predicate: bool, condition: &str, url: Option<&str>, relative: Option<&str>) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(make_err(condition, url, relative))
    }
}

fn make_err(reason: &str, url: Option<&str>, relative: Option<&str>) -> fmd_common::Error {
    ErrorKind::ResolveUrl {
        url: url.map(String::from).unwrap_or_default(),
        relative: relative.map(String::from),
        reason: reason.to_string(),
    }
    .into()
}
