//! Anchor extraction from an HTML bookmark export

use std::collections::HashSet;
use std::path::Path;

use rand::{Rng, distributions::Alphanumeric};
use scraper::{Html, node::Element};
use thiserror::Error;

use crate::data::NewBookmark;

/// Length of generated placeholder tokens
const TOKEN_LENGTH: usize = 10;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("bookmark file could not be read: {0}")]
    Unreadable(#[from] std::io::Error),
}

/// An `add_date` attribute that is not an integer
struct InvalidAddDate(String);

/// Random alphanumeric string used for placeholder URLs
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Read a bookmark export from disk and parse it
///
/// # Errors
/// Returns `ParseError` if the file cannot be read
pub fn read_bookmark_file(path: &Path, owner_id: &str) -> Result<Vec<NewBookmark>, ParseError> {
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Reading bookmark file");
    Ok(parse_bookmarks(&bytes, owner_id))
}

/// Extract one bookmark per `<a>` element, in document order
///
/// Every anchor in the tree is visited, including anchors below other
/// anchors. A single `add_date` that is not an integer discards the whole
/// document: the result is empty, not an error. Byte sequences that are
/// not UTF-8 become U+FFFD and the rest of the document still parses.
pub fn parse_bookmarks(bytes: &[u8], owner_id: &str) -> Vec<NewBookmark> {
    let text = String::from_utf8_lossy(bytes);
    let document = Html::parse_document(&text);

    let mut bookmarks = Vec::new();
    // `descendants` walks the node arena depth-first in pre-order
    for node in document.tree.root().descendants() {
        let Some(element) = node.value().as_element() else {
            continue;
        };
        if element.name() != "a" {
            continue;
        }

        let name = node
            .children()
            .find_map(|child| child.value().as_text().map(|text| (**text).to_owned()))
            .unwrap_or_default();

        match anchor_to_bookmark(element, name, owner_id) {
            Ok(bookmark) => bookmarks.push(bookmark),
            Err(InvalidAddDate(raw)) => {
                tracing::warn!(
                    add_date = %raw,
                    parsed = bookmarks.len(),
                    "Invalid add_date in bookmark file, discarding import"
                );
                return Vec::new();
            }
        }
    }

    bookmarks
}

fn anchor_to_bookmark(
    element: &Element,
    name: String,
    owner_id: &str,
) -> Result<NewBookmark, InvalidAddDate> {
    let url = match element.attr("href") {
        Some(href) if !href.is_empty() => href.to_string(),
        _ => format!("#{}", random_token()),
    };

    let add_date = match element.attr("add_date") {
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| InvalidAddDate(raw.to_string()))?,
        None => 0,
    };

    Ok(NewBookmark {
        user_id: owner_id.to_string(),
        folder: String::new(),
        url,
        add_date,
        icon: element.attr("icon").unwrap_or_default().to_string(),
        name,
    })
}

/// Drop bookmarks whose URL already appeared earlier in the batch
pub fn unique_by_url(bookmarks: Vec<NewBookmark>) -> Vec<NewBookmark> {
    let mut seen = HashSet::new();
    bookmarks
        .into_iter()
        .filter(|bookmark| seen.insert(bookmark.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1600000000" LAST_MODIFIED="1600000100">Toolbar</H3>
    <DL><p>
        <DT><A HREF="https://www.rust-lang.org/" ADD_DATE="1600000001" ICON="data:image/png;base64,AAAA">Rust</A>
        <DT><A HREF="https://docs.rs/" ADD_DATE="1600000002">Docs</A>
    </DL><p>
    <DT><A HREF="https://crates.io/" ADD_DATE="1600000003">Crates</A>
</DL><p>
"#;

    fn urls(bookmarks: &[NewBookmark]) -> Vec<&str> {
        bookmarks.iter().map(|b| b.url.as_str()).collect()
    }

    fn bookmark(url: &str) -> NewBookmark {
        NewBookmark {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_browser_export_in_document_order() {
        let bookmarks = parse_bookmarks(EXPORT.as_bytes(), "owner-1");

        assert_eq!(
            urls(&bookmarks),
            vec![
                "https://www.rust-lang.org/",
                "https://docs.rs/",
                "https://crates.io/"
            ]
        );
        assert_eq!(
            bookmarks.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
            vec!["Rust", "Docs", "Crates"]
        );
        assert_eq!(
            bookmarks.iter().map(|b| b.add_date).collect::<Vec<_>>(),
            vec![1_600_000_001, 1_600_000_002, 1_600_000_003]
        );
    }

    #[test]
    fn stamps_owner_and_copies_icon() {
        let bookmarks = parse_bookmarks(EXPORT.as_bytes(), "owner-1");

        assert!(bookmarks.iter().all(|b| b.user_id == "owner-1"));
        assert!(bookmarks.iter().all(|b| b.folder.is_empty()));
        assert_eq!(bookmarks[0].icon, "data:image/png;base64,AAAA");
        assert_eq!(bookmarks[1].icon, "");
    }

    #[test]
    fn missing_add_date_defaults_to_zero() {
        let html = r#"<a href="https://example.com">Example</a>"#;
        let bookmarks = parse_bookmarks(html.as_bytes(), "owner");

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].add_date, 0);
    }

    #[test]
    fn one_bad_add_date_discards_the_whole_document() {
        let html = r#"
            <DL>
                <DT><A HREF="https://a.example" ADD_DATE="1">A</A>
                <DT><A HREF="https://b.example" ADD_DATE="yesterday">B</A>
                <DT><A HREF="https://c.example" ADD_DATE="3">C</A>
            </DL>"#;

        let bookmarks = parse_bookmarks(html.as_bytes(), "owner");
        assert!(bookmarks.is_empty());
    }

    #[test]
    fn empty_add_date_also_discards_the_document() {
        let html = r#"<a href="https://a.example" add_date="">A</a>"#;
        assert!(parse_bookmarks(html.as_bytes(), "owner").is_empty());
    }

    #[test]
    fn empty_or_missing_href_gets_placeholder_url() {
        let html = r#"<a href="">First</a><a>Second</a>"#;
        let bookmarks = parse_bookmarks(html.as_bytes(), "owner");

        assert_eq!(bookmarks.len(), 2);
        for bookmark in &bookmarks {
            assert!(bookmark.url.starts_with('#'));
            assert_eq!(bookmark.url.len(), 11);
            assert!(bookmark.url[1..].chars().all(|c| c.is_ascii_alphanumeric()));
        }
        assert_ne!(bookmarks[0].url, bookmarks[1].url);
    }

    #[test]
    fn name_is_first_direct_text_child() {
        let html = r#"<a href="https://a.example"><b>Bold</b> tail</a><a href="https://b.example"></a>"#;
        let bookmarks = parse_bookmarks(html.as_bytes(), "owner");

        assert_eq!(bookmarks[0].name, " tail");
        assert_eq!(bookmarks[1].name, "");
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let html = r#"<A HREF="https://a.example" Add_Date="42" ICON="icon-uri">A</A>"#;
        let bookmarks = parse_bookmarks(html.as_bytes(), "owner");

        assert_eq!(bookmarks[0].add_date, 42);
        assert_eq!(bookmarks[0].icon, "icon-uri");
    }

    #[test]
    fn malformed_markup_is_tolerated() {
        let html = r#"<dl><p><dt><a href="https://a.example" add_date="1">A</a><dt><a href="https://b.example">B"#;
        let bookmarks = parse_bookmarks(html.as_bytes(), "owner");

        assert_eq!(urls(&bookmarks), vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn document_without_anchors_yields_nothing() {
        let bookmarks = parse_bookmarks(b"<html><body><p>none</p></body></html>", "owner");
        assert!(bookmarks.is_empty());
    }

    #[test]
    fn latin1_title_is_imported_with_replacement_character() {
        let html = b"<DL><DT><A HREF=\"https://cafe.example\" ADD_DATE=\"1\">Caf\xE9</A></DL>";
        let bookmarks = parse_bookmarks(html, "owner");

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].url, "https://cafe.example");
        assert_eq!(bookmarks[0].add_date, 1);
        assert_eq!(bookmarks[0].name, "Caf\u{FFFD}");
    }

    #[test]
    fn stray_bytes_outside_anchors_do_not_stop_parsing() {
        let mut html = vec![0xff, 0xfe];
        html.extend_from_slice(br#"<a href="https://a.example">A</a>"#);
        html.push(0x80);
        html.extend_from_slice(br#"<a href="https://b.example">B</a>"#);

        let bookmarks = parse_bookmarks(&html, "owner");
        assert_eq!(urls(&bookmarks), vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn read_bookmark_file_parses_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("export.html");
        std::fs::write(&path, EXPORT).unwrap();

        let bookmarks = read_bookmark_file(&path, "owner-1").unwrap();
        assert_eq!(bookmarks.len(), 3);
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = read_bookmark_file(&dir.path().join("absent.html"), "owner");
        assert!(matches!(result, Err(ParseError::Unreadable(_))));
    }

    #[test]
    fn unique_by_url_keeps_first_occurrence_in_order() {
        let mut first_a = bookmark("a");
        first_a.name = "first".to_string();
        let mut second_a = bookmark("a");
        second_a.name = "second".to_string();

        let unique = unique_by_url(vec![first_a, bookmark("b"), second_a, bookmark("c")]);

        assert_eq!(urls(&unique), vec!["a", "b", "c"]);
        assert_eq!(unique[0].name, "first");
    }

    #[test]
    fn random_token_is_alphanumeric() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token());
    }
}
