//! Regex-based HTML scanning helpers shared by the adapters.
//!
//! This is deliberately not a DOM parser: the adapters only need meta
//! content, tag attributes, anchor targets, and rough text extraction,
//! and partial or malformed markup must never fail a scan.

use std::sync::LazyLock;

use regex::Regex;

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid regex"));
static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b[^>]*>").expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static SCRIPT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").expect("valid regex"));
static STYLE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("valid regex"));

/// Extracts the value of `attr` from a single tag's source text.
pub(crate) fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!(r#"(?is)\b{}\s*=\s*["']([^"']*)["']"#, regex::escape(attr));
    let re = Regex::new(&pattern).expect("valid attr regex");
    re.captures(tag)
        .and_then(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
}

/// Finds `<meta {key_attr}="{key_value}" content="...">` and returns the
/// content, matching the key case-insensitively.
pub(crate) fn find_meta_content(html: &str, key_attr: &str, key_value: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let key = extract_attr(tag, key_attr)?;
        if key.eq_ignore_ascii_case(key_value) {
            extract_attr(tag, "content").filter(|c| !c.is_empty())
        } else {
            None
        }
    })
}

/// The trimmed `<title>` text, if present and non-empty.
pub(crate) fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|t| !t.is_empty())
}

/// `alt` text of the first `<img>` whose `class` or `id` contains `"logo"`.
pub(crate) fn logo_alt_text(html: &str) -> Option<String> {
    IMG_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let marker = [extract_attr(tag, "class"), extract_attr(tag, "id")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        if marker.contains("logo") {
            extract_attr(tag, "alt").filter(|alt| !alt.is_empty())
        } else {
            None
        }
    })
}

/// All anchor `href` values, raw (not absolutized).
pub(crate) fn anchor_hrefs(html: &str) -> Vec<String> {
    ANCHOR_TAG_RE
        .find_iter(html)
        .filter_map(|m| extract_attr(m.as_str(), "href"))
        .filter(|href| !href.is_empty())
        .collect()
}

/// Resolves `candidate` against `base_url`, tolerating relative links.
pub(crate) fn absolutize_url(base_url: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.replace("&amp;", "&");
    let base = reqwest::Url::parse(base_url).ok()?;
    base.join(&candidate).ok().map(|u| u.to_string())
}

/// Strips script/style blocks and tags, collapses whitespace.
pub(crate) fn strip_tags(html: &str) -> String {
    let without_scripts = SCRIPT_BLOCK_RE.replace_all(html, " ");
    let without_styles = STYLE_BLOCK_RE.replace_all(&without_scripts, " ");
    let without_tags = TAG_RE.replace_all(&without_styles, " ");
    clean_text(&without_tags)
}

pub(crate) fn clean_text(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw, " ").trim().to_string()
}

/// Inner text of elements where `attr` contains any of `fragments`
/// (case-insensitive). Matches open/close pairs of the same tag name;
/// nested same-name markup is beyond this scanner and simply truncates
/// at the first closing tag.
pub(crate) fn texts_with_attr_fragment(html: &str, attr: &str, fragments: &[&str]) -> Vec<String> {
    let pattern = format!(
        r#"(?is)<(\w+)[^>]*\b{}\s*=\s*["']([^"']*)["'][^>]*>(.*?)</\1>"#,
        regex::escape(attr)
    );
    let re = Regex::new(&pattern).expect("valid element regex");
    re.captures_iter(html)
        .filter_map(|caps| {
            let value = caps.get(2)?.as_str().to_ascii_lowercase();
            if fragments.iter().any(|f| value.contains(f)) {
                Some(strip_tags(caps.get(3)?.as_str()))
            } else {
                None
            }
        })
        .collect()
}

/// Inner text of elements whose `class` contains any of `fragments`.
pub(crate) fn texts_with_class_fragment(html: &str, fragments: &[&str]) -> Vec<String> {
    texts_with_attr_fragment(html, "class", fragments)
}

/// Number of elements whose `class` contains any of `fragments`.
pub(crate) fn count_class_fragment(html: &str, fragments: &[&str]) -> usize {
    texts_with_class_fragment(html, fragments).len()
}

/// Inner text of every `<li>` element.
pub(crate) fn list_item_texts(html: &str) -> Vec<String> {
    LIST_ITEM_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| strip_tags(m.as_str())))
        .collect()
}

/// Inner text of every `<{name}>` element, e.g. `address`.
pub(crate) fn named_element_texts(html: &str, name: &str) -> Vec<String> {
    let pattern = format!(
        r"(?is)<{0}\b[^>]*>(.*?)</{0}>",
        regex::escape(name)
    );
    let re = Regex::new(&pattern).expect("valid element regex");
    re.captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| strip_tags(m.as_str())))
        .collect()
}
