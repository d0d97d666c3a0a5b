//! URL filter — excludes downloadable files and non-content URLs before
//! they reach discovery output, and provides the normalization used when
//! matching selected URLs against crawl-map keys.

use url::Url;

use crate::types::PageType;

/// File extensions that indicate a download, not a content page.
const DOWNLOADABLE_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "rar", "tar", "gz", "7z", "dmg",
    "exe", "msi", "csv", "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "mp3", "mp4", "avi",
    "mov", "webm", "woff", "woff2", "ttf", "eot",
];

/// Path fragments that mark auth, commerce, admin, search, and API URLs.
const EXCLUDED_PATH_KEYWORDS: &[&str] = &[
    "/login", "/signin", "/sign-in", "/signup", "/sign-up", "/register", "/logout", "/account",
    "/cart", "/checkout", "/basket", "/admin", "/wp-admin", "/wp-login", "/search", "/api/",
    "/feed", "/rss", "/cdn-cgi/",
];

/// Whether a URL points at a downloadable file rather than a page.
pub fn is_downloadable_file(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    };
    match path.rsplit_once('.') {
        Some((_, ext)) => DOWNLOADABLE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Whether a discovered URL is worth crawling: http(s), same host as the
/// audit target, not a download, not an auth/cart/admin/search/API path,
/// and not a bare fragment link.
pub fn is_crawlable(url: &str, base: &Url) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }
    if parsed.host_str() != base.host_str() {
        return false;
    }
    // Fragment-only links resolve to the page they sit on; skip them.
    if parsed.fragment().is_some() && parsed.path() == base.path() {
        return false;
    }
    if is_downloadable_file(url) {
        return false;
    }

    let path = parsed.path().to_lowercase();
    !EXCLUDED_PATH_KEYWORDS.iter().any(|kw| path.contains(kw))
}

/// Canonical form used as crawl-map key and for selection matching:
/// fragment stripped, trailing slash removed (except for the root path).
pub fn normalize_url(url: &str) -> String {
    let without_fragment = match url.split_once('#') {
        Some((before, _)) => before,
        None => url,
    };

    if let Ok(parsed) = Url::parse(without_fragment) {
        if parsed.path() == "/" && parsed.query().is_none() {
            return without_fragment.trim_end_matches('/').to_string() + "/";
        }
    }

    without_fragment.trim_end_matches('/').to_string()
}

/// Trailing-slash-tolerant equality used when matching selected URLs
/// against crawl-map keys.
pub fn urls_match(a: &str, b: &str) -> bool {
    normalize_url(a) == normalize_url(b)
}

/// Estimate a page's category from its URL path.
pub fn estimate_page_type(url: &str) -> PageType {
    let path = match Url::parse(url) {
        Ok(u) => u.path().to_lowercase(),
        Err(_) => return PageType::Other,
    };

    if path == "/" || path.is_empty() {
        return PageType::Home;
    }

    const PATTERNS: &[(&str, PageType)] = &[
        ("about", PageType::About),
        ("team", PageType::About),
        ("service", PageType::Services),
        ("product", PageType::Products),
        ("shop", PageType::Products),
        ("pricing", PageType::Pricing),
        ("plans", PageType::Pricing),
        ("contact", PageType::Contact),
        ("blog", PageType::Blog),
        ("news", PageType::Blog),
        ("article", PageType::Blog),
        ("testimonial", PageType::Testimonials),
        ("review", PageType::Testimonials),
        ("case-stud", PageType::Testimonials),
        ("portfolio", PageType::Portfolio),
        ("work", PageType::Portfolio),
        ("project", PageType::Portfolio),
        ("privacy", PageType::Legal),
        ("terms", PageType::Legal),
        ("legal", PageType::Legal),
    ];

    for (pattern, page_type) in PATTERNS {
        if path.contains(pattern) {
            return *page_type;
        }
    }
    PageType::Other
}
