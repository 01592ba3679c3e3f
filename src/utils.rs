use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, RngCore, distr::Alphanumeric};
use sha2::{Digest, Sha256};

/// Separates a keyword from its artist constraint in CLI input.
pub const CONSTRAINT_SEPARATOR: &str = "::";

const MAX_SESSION_ID_LEN: usize = 64;

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// 32 random bytes, URL-safe base64 without padding.
pub fn generate_state_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Session ids end up in the state token and in headers, so they are limited
/// to `[A-Za-z0-9_-]` and must not contain the `.` token separator.
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Compares two secrets without short-circuiting on the first differing byte.
///
/// Both sides are hashed first so the comparison length does not depend on
/// the inputs either.
pub fn secrets_match(expected: &str, received: &str) -> bool {
    let a = Sha256::digest(expected.as_bytes());
    let b = Sha256::digest(received.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Case-insensitive exact comparison of artist names, ignoring surrounding
/// whitespace.
pub fn artist_names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Parses `title :: artist1, artist2` into the keyword and its optional
/// artist constraint. Returns `None` for a blank keyword.
pub fn parse_keyword(input: &str) -> Option<(String, Option<Vec<String>>)> {
    let (keyword, artists) = match input.split_once(CONSTRAINT_SEPARATOR) {
        Some((keyword, artists)) => (keyword, Some(artists)),
        None => (input, None),
    };

    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }

    let artists = artists
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty());

    Some((keyword.to_string(), artists))
}

/// Parses one keyword per line, skipping blank lines and `#` comments.
pub fn parse_keyword_lines(content: &str) -> Vec<(String, Option<Vec<String>>)> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(parse_keyword)
        .collect()
}
