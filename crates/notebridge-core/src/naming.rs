//! Filename rules
//!
//! A note's filename is derived from its first level-1 heading. There is no
//! separate title field on disk: the title shown in lists is the filename
//! without its extension.

use chrono::{DateTime, Utc};

use crate::storage::{StoreError, StoreResult};

/// Extension every note file carries
pub const NOTE_EXTENSION: &str = ".md";

/// Characters that cannot appear in a filename on any host platform
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip characters illegal in filenames and trim whitespace
///
/// Nothing is substituted for removed characters: `A/B:C` becomes `ABC`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Text of the first `# <text>` line, if any
pub fn first_heading(content: &str) -> Option<&str> {
    content
        .lines()
        .filter_map(|line| line.strip_prefix("# "))
        .find(|text| !text.is_empty())
}

/// Generated name for a note without a usable heading
pub fn untitled_filename(now: DateTime<Utc>) -> String {
    format!("Untitled_{}{}", now.timestamp_millis(), NOTE_EXTENSION)
}

/// Pick the filename an explicit save writes to
///
/// 1. the sanitized first heading plus `.md`, when non-empty
/// 2. otherwise the filename already assigned
/// 3. otherwise `Untitled_<millis>.md`
pub fn derive_filename(content: &str, current: Option<&str>, now: DateTime<Utc>) -> String {
    if let Some(heading) = first_heading(content) {
        let sanitized = sanitize_title(heading);
        if !sanitized.is_empty() {
            return format!("{}{}", sanitized, NOTE_EXTENSION);
        }
    }

    match current {
        Some(name) => name.to_string(),
        None => untitled_filename(now),
    }
}

/// Display title for a filename
pub fn title_from_filename(filename: &str) -> String {
    filename
        .strip_suffix(NOTE_EXTENSION)
        .unwrap_or(filename)
        .to_string()
}

pub fn has_md_extension(name: &str) -> bool {
    name.ends_with(NOTE_EXTENSION)
}

pub fn ensure_md_extension(name: &str) -> String {
    if has_md_extension(name) {
        name.to_string()
    } else {
        format!("{}{}", name, NOTE_EXTENSION)
    }
}

/// First free variant of `candidate`: `Name.md`, `Name (2).md`, `Name (3).md`, ...
pub fn unique_filename(candidate: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(candidate) {
        return candidate.to_string();
    }

    let stem = title_from_filename(candidate);
    let ext = if has_md_extension(candidate) {
        NOTE_EXTENSION
    } else {
        ""
    };

    (2..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|name| !taken(name))
        .unwrap_or_else(|| candidate.to_string())
}

/// Reject names that would escape the notes directory or cannot be stored
pub fn validate_filename(name: &str) -> StoreResult<()> {
    if name.trim().is_empty() {
        return Err(StoreError::invalid_name(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(StoreError::invalid_name(name, "name is a directory reference"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(StoreError::invalid_name(name, "contains a path separator"));
    }
    if name.contains('\0') {
        return Err(StoreError::invalid_name(name, "contains a NUL byte"));
    }
    Ok(())
}

/// What a clicked link in the preview points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Handed to the host to open outside the app
    External(String),
    /// In-document fragment; nothing to navigate
    Anchor,
    /// Another note, by (possibly extensionless) name
    Note(String),
}

impl LinkTarget {
    pub fn parse(href: &str) -> Self {
        let href = href.trim();
        let lower = href.to_ascii_lowercase();

        if ["http://", "https://", "mailto:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            return LinkTarget::External(href.to_string());
        }

        let path = href.split('#').next().unwrap_or_default();
        if path.is_empty() {
            return LinkTarget::Anchor;
        }

        let mut path = path;
        while let Some(rest) = path.strip_prefix("./") {
            path = rest;
        }

        let decoded = urlencoding::decode(path)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| path.to_string());

        LinkTarget::Note(decoded)
    }
}

/// Match a link target against the known note filenames
///
/// Exact filename first, then the target with `.md` appended when it lacks it.
pub fn resolve_link<'a, I>(target: &str, known: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let known: Vec<&str> = known.into_iter().collect();

    if let Some(exact) = known.iter().find(|name| **name == target) {
        return Some(exact.to_string());
    }

    if has_md_extension(target) {
        return None;
    }

    let with_ext = format!("{}{}", target, NOTE_EXTENSION);
    known
        .iter()
        .find(|name| **name == with_ext)
        .map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_derive_from_heading() {
        let name = derive_filename("# My Note\nbody", None, fixed_now());
        assert_eq!(name, "My Note.md");
    }

    #[test]
    fn test_derive_strips_illegal_characters() {
        let name = derive_filename("# A/B:C\n", None, fixed_now());
        assert_eq!(name, "ABC.md");
    }

    #[test]
    fn test_derive_uses_first_level_one_heading_only() {
        let content = "intro\n## Section\n# Real Title\n# Second";
        assert_eq!(derive_filename(content, None, fixed_now()), "Real Title.md");
    }

    #[test]
    fn test_derive_without_heading_generates_untitled() {
        let name = derive_filename("just text", None, fixed_now());
        assert_eq!(name, "Untitled_1700000000123.md");

        let digits = name
            .strip_prefix("Untitled_")
            .and_then(|s| s.strip_suffix(".md"))
            .unwrap();
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_derive_keeps_current_when_heading_sanitizes_to_empty() {
        let name = derive_filename("# ???\n", Some("Kept.md"), fixed_now());
        assert_eq!(name, "Kept.md");

        let name = derive_filename("# :/:\n", None, fixed_now());
        assert!(name.starts_with("Untitled_"));
    }

    #[test]
    fn test_heading_requires_text_after_marker() {
        assert_eq!(first_heading("#\n# \n#Tag\n# Found"), Some("Found"));
        assert_eq!(first_heading("no headings"), None);
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("Plan.md"), "Plan");
        assert_eq!(title_from_filename("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_unique_filename() {
        let taken = ["Plan.md", "Plan (2).md"];
        let name = unique_filename("Plan.md", |n| taken.contains(&n));
        assert_eq!(name, "Plan (3).md");
        assert_eq!(unique_filename("Free.md", |n| taken.contains(&n)), "Free.md");
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("Ok.md").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("a/b.md").is_err());
        assert!(validate_filename("a\\b.md").is_err());
    }

    #[test]
    fn test_link_target_parse() {
        assert_eq!(
            LinkTarget::parse("https://example.com"),
            LinkTarget::External("https://example.com".to_string())
        );
        assert_eq!(
            LinkTarget::parse("mailto:me@example.com"),
            LinkTarget::External("mailto:me@example.com".to_string())
        );
        assert_eq!(LinkTarget::parse("#top"), LinkTarget::Anchor);
        assert_eq!(LinkTarget::parse("./Other"), LinkTarget::Note("Other".to_string()));
        assert_eq!(
            LinkTarget::parse("My%20Note.md#part"),
            LinkTarget::Note("My Note.md".to_string())
        );
    }

    #[test]
    fn test_resolve_link() {
        let known = ["Other.md", "Exact"];
        assert_eq!(resolve_link("Other", known), Some("Other.md".to_string()));
        assert_eq!(resolve_link("Other.md", known), Some("Other.md".to_string()));
        assert_eq!(resolve_link("Exact", known), Some("Exact".to_string()));
        assert_eq!(resolve_link("Missing", known), None);
        assert_eq!(resolve_link("Missing.md", known), None);
    }
}
