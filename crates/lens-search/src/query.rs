//! Turning user input into a search query.
//!
//! URL input is handled locally from the URL's path or host. Image input goes
//! through visual recognition first and falls back to the file name.

use crate::image::VisualRecognizer;
use crate::SearchError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lens_commerce::{SearchType, ShoppingResult};
use lens_observability::Diagnostics;
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Substituted when nothing usable can be derived.
pub const PLACEHOLDER_QUERY: &str = "Unidentified product";
/// Used for URLs whose only usable label is `www`.
pub const URL_PLACEHOLDER: &str = "product";
/// Used for images whose name says nothing, and for the generic retry.
pub const GENERIC_QUERY: &str = "popular products";
/// Unparseable URL text is cut to this many characters.
pub const MAX_RAW_QUERY_CHARS: usize = 50;

static IMAGE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp)$").expect("valid image extension regex")
});

static CAMERA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(img|image|photo|pic|picture|dsc|dscn|pxl|screenshot)[\s\d]*$")
        .expect("valid camera name regex")
});

static BOOK_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(books?|novels?|edition|hardcover|paperback|author|isbn|kindle|audiobook)\b")
        .expect("valid book title regex")
});

static BOOK_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(books?|novels?|authors?)\b").expect("valid book filename regex")
});

static ISBN13: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b97[89]\d{10}\b").expect("valid isbn regex"));

static PAREN_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[(\[](?:[A-Za-z]+\.?\s+)?(?:\d{1,2},?\s+)?\d{4}[)\]]")
        .expect("valid publication date regex")
});

static PAREN_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[(\[](?:paperback|hardcover|hardback|kindle(?: edition)?|audiobook|ebook|audio cd|mass market paperback)[)\]]")
        .expect("valid format regex")
});

static FORMAT_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[-:,|]\s*(?:paperback|hardcover|hardback|kindle(?: edition)?|audiobook|ebook|audio cd|mass market paperback|board book)\b.*$")
        .expect("valid format suffix regex")
});

static EDITION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[-:,(\[]\s*(?:[\w']+\s+){0,3}edition\b[)\]]?.*$")
        .expect("valid edition suffix regex")
});

/// An image the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageFile {
    /// Wrap in-memory bytes. The MIME type is guessed from the file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            bytes,
            mime_type,
        }
    }

    /// Read an image from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SearchError::ImageRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(file_name, bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:{mime};base64,...`, the form the image endpoint accepts inline.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// What the user submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchInput {
    Image(ImageFile),
    Url(String),
}

impl SearchInput {
    pub fn url(url: impl Into<String>) -> Self {
        SearchInput::Url(url.into())
    }

    pub fn image(image: ImageFile) -> Self {
        SearchInput::Image(image)
    }

    pub fn search_type(&self) -> SearchType {
        match self {
            SearchInput::Image(_) => SearchType::Image,
            SearchInput::Url(_) => SearchType::Url,
        }
    }

    /// Reject input that cannot be searched at all.
    pub fn validate(&self) -> Result<(), SearchError> {
        match self {
            SearchInput::Url(url) if url.trim().is_empty() => {
                Err(SearchError::InvalidInput("Please enter a valid URL".to_string()))
            }
            SearchInput::Image(image) if image.is_empty() => Err(SearchError::InvalidInput(
                format!("Image '{}' is empty", image.file_name),
            )),
            _ => Ok(()),
        }
    }
}

/// Where a derived query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuerySource {
    /// Last path segment of a URL.
    UrlPath,
    /// First label of a URL's host.
    UrlHost,
    /// Text that did not parse as a URL.
    RawText,
    /// Title of a visual match.
    Recognition,
    /// The image's file name.
    FileName,
    /// Nothing usable was found.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedQuery {
    pub query: String,
    pub source: QuerySource,
    /// Whether downstream search should use the book parameter set.
    pub is_book: bool,
}

impl DerivedQuery {
    fn new(query: String, source: QuerySource) -> Self {
        let (query, source) = ensure_meaningful(query, source);
        let is_book = crate::synthetic::is_book_query(&query);
        Self {
            query,
            source,
            is_book,
        }
    }

    /// Placeholders are not worth remembering in the history.
    pub fn is_meaningful(&self) -> bool {
        self.source != QuerySource::Placeholder
    }
}

/// Query from a URL: last path segment, else host label, else raw text.
pub fn query_from_url(raw: &str) -> (String, QuerySource) {
    let raw = raw.trim();
    let parsed = match url::Url::parse(raw) {
        Ok(url) => url,
        Err(_) => {
            let truncated: String = raw.chars().take(MAX_RAW_QUERY_CHARS).collect();
            return (truncated, QuerySource::RawText);
        }
    };

    let from_path = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| {
            let spaced = segment.replace(['-', '_'], " ");
            IMAGE_EXTENSION.replace(&spaced, "").trim().to_string()
        })
        .unwrap_or_default();

    if from_path.chars().count() >= 3 {
        return (from_path, QuerySource::UrlPath);
    }

    match parsed.host_str().and_then(|host| host.split('.').next()) {
        Some(label) if !label.is_empty() && !label.eq_ignore_ascii_case("www") => {
            (label.replace(['-', '_'], " "), QuerySource::UrlHost)
        }
        _ => (URL_PLACEHOLDER.to_string(), QuerySource::UrlHost),
    }
}

/// Query from an image file name, used when recognition gives nothing.
pub fn query_from_filename(file_name: &str) -> (String, QuerySource) {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
        _ => file_name,
    };
    let name = stem.replace(['-', '_'], " ").trim().to_string();

    if name.chars().count() <= 3 || CAMERA_NAME.is_match(&name) {
        return (GENERIC_QUERY.to_string(), QuerySource::Placeholder);
    }

    if BOOK_FILENAME.is_match(&name) && !crate::synthetic::is_book_query(&name) {
        return (format!("{} book", name), QuerySource::FileName);
    }
    (name, QuerySource::FileName)
}

/// Whether a visual match looks like a book listing.
pub fn is_book_like(candidate: &ShoppingResult) -> bool {
    BOOK_TITLE.is_match(&candidate.title) || ISBN13.is_match(&candidate.link)
}

/// Pick the title to search for: the first book-like match, else the first
/// titled match. `matches` must already be in exact-then-visual order.
pub fn choose_title(matches: &[ShoppingResult]) -> Option<&ShoppingResult> {
    let titled = || matches.iter().filter(|m| !m.title.trim().is_empty());
    titled().find(|m| is_book_like(m)).or_else(|| titled().next())
}

/// Strip format/edition suffixes and parenthetical publication dates.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = PAREN_DATE.replace_all(title, "").into_owned();
    cleaned = PAREN_FORMAT.replace_all(&cleaned, "").into_owned();
    cleaned = FORMAT_SUFFIX.replace(&cleaned, "").into_owned();
    cleaned = EDITION_SUFFIX.replace(&cleaned, "").into_owned();
    let cleaned = cleaned.trim().trim_end_matches([',', '-', ':', '|']).trim();

    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

/// Anything shorter than two characters becomes the placeholder.
pub fn ensure_meaningful(query: String, source: QuerySource) -> (String, QuerySource) {
    let trimmed = query.trim();
    if trimmed.chars().count() < 2 {
        (PLACEHOLDER_QUERY.to_string(), QuerySource::Placeholder)
    } else if trimmed.len() == query.len() {
        (query, source)
    } else {
        (trimmed.to_string(), source)
    }
}

/// Derives a [`DerivedQuery`] from [`SearchInput`].
pub struct QueryExtractor {
    recognizer: Arc<dyn VisualRecognizer>,
    timeout: Duration,
    diagnostics: Diagnostics,
}

impl QueryExtractor {
    pub fn new(recognizer: Arc<dyn VisualRecognizer>, timeout: Duration, diagnostics: Diagnostics) -> Self {
        Self {
            recognizer,
            timeout,
            diagnostics,
        }
    }

    /// Derive a query. The result is never empty. `mock` is passed to the
    /// recognizer as a per-call override of the demo-data mode.
    pub async fn derive_query(
        &self,
        input: &SearchInput,
        mock: Option<bool>,
    ) -> Result<DerivedQuery, SearchError> {
        input.validate()?;
        let derived = match input {
            SearchInput::Url(url) => {
                let (query, source) = query_from_url(url);
                DerivedQuery::new(query, source)
            }
            SearchInput::Image(image) => self.derive_from_image(image, mock).await,
        };
        tracing::debug!(query = %derived.query, source = ?derived.source, is_book = derived.is_book, "derived query");
        Ok(derived)
    }

    async fn derive_from_image(&self, image: &ImageFile, mock: Option<bool>) -> DerivedQuery {
        let data_uri = image.to_data_uri();
        match tokio::time::timeout(self.timeout, self.recognizer.recognize(&data_uri, mock)).await {
            Err(_) => {
                self.diagnostics.record(
                    "query.recognition_timeout",
                    format!("image recognition took longer than {:?}", self.timeout),
                );
            }
            Ok(found) if found.is_synthetic_data => {
                tracing::debug!("ignoring synthetic visual matches for query extraction");
            }
            Ok(found) => {
                if let Some(best) = choose_title(&found.matches) {
                    let mut derived =
                        DerivedQuery::new(clean_title(&best.title), QuerySource::Recognition);
                    derived.is_book = derived.is_book || is_book_like(best);
                    return derived;
                }
                if found.failure.is_none() {
                    self.diagnostics
                        .record("query.no_matches", "image recognition returned no titled matches");
                }
            }
        }

        let (query, source) = query_from_filename(&image.file_name);
        DerivedQuery::new(query, source)
    }
}
