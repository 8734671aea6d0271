//! Browser bookmark import
//!
//! Reads the HTML bookmark export produced by browsers
//! (`<!DOCTYPE NETSCAPE-Bookmark-file-1>`) and turns every anchor into a
//! bookmark record.

mod parser;

pub use parser::{ParseError, parse_bookmarks, random_token, read_bookmark_file, unique_by_url};
