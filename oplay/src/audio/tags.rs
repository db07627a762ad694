//! "Now playing" line built from stream comment tags
//!
//! Recognised keys (case-insensitive): `Artist`, `Title`, `Album`, `Date`.
//! Every field is capped on a UTF-8 boundary; oversized comments are skipped.

use std::fmt;
use std::path::Path;

/// Comments longer than this are ignored outright
const MAX_COMMENT_LEN: usize = MAX_KEY_LEN + MAX_VALUE_LEN;
const MAX_KEY_LEN: usize = 40;
const MAX_VALUE_LEN: usize = 200;

const ARTIST_CAP: usize = 79;
const TITLE_CAP: usize = 199;
const ALBUM_CAP: usize = 79;
const DATE_CAP: usize = 15;
const LINE_CAP: usize = 399;

/// Display text for the stream being played.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NowPlaying {
    artist: String,
    title: String,
    album: String,
    date: String,
    fallback: String,
}

impl NowPlaying {
    /// Build from the stream path and its `(key, value)` comments.
    ///
    /// Later comments for the same key replace earlier ones.
    pub fn from_tags<'a, I>(path: &Path, tags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut now = NowPlaying {
            fallback: truncated(&path.display().to_string(), LINE_CAP),
            ..Default::default()
        };

        for (key, value) in tags {
            // key + '=' + value
            if key.len() + 1 + value.len() > MAX_COMMENT_LEN {
                continue;
            }
            if key.is_empty() || key.len() >= MAX_KEY_LEN || value.len() >= MAX_VALUE_LEN {
                continue;
            }

            let (slot, cap) = if key.eq_ignore_ascii_case("artist") {
                (&mut now.artist, ARTIST_CAP)
            } else if key.eq_ignore_ascii_case("title") {
                (&mut now.title, TITLE_CAP)
            } else if key.eq_ignore_ascii_case("album") {
                (&mut now.album, ALBUM_CAP)
            } else if key.eq_ignore_ascii_case("date") {
                (&mut now.date, DATE_CAP)
            } else {
                continue;
            };
            *slot = truncated(value, cap);
        }

        now
    }

    fn render(&self) -> String {
        let mut line = if !self.artist.is_empty() && !self.title.is_empty() {
            format!("{} - {}", self.artist, self.title)
        } else {
            self.fallback.clone()
        };

        match (self.album.is_empty(), self.date.is_empty()) {
            (false, false) => line.push_str(&format!(" ({}, {})", self.album, self.date)),
            (false, true) => line.push_str(&format!(" ({})", self.album)),
            (true, false) => line.push_str(&format!(" ({})", self.date)),
            (true, true) => {}
        }

        truncated(&line, LINE_CAP)
    }
}

impl fmt::Display for NowPlaying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Copy of `s` holding at most `cap` bytes, cut on a char boundary.
fn truncated(s: &str, cap: usize) -> String {
    if s.len() <= cap {
        return s.to_string();
    }
    let mut end = cap;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}
