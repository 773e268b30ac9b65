//! Composite cache keys.
//!
//! Several logical parts are packed into one string key using `#` as an
//! unescaped separator. Parts must not contain `#`, otherwise [`split`] cannot
//! recover them; use [`try_join`] when the parts come from untrusted input.

use thiserror::Error;

pub const SEPARATOR: char = '#';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key part {index} contains the reserved separator: {part:?}")]
    ReservedSeparator { index: usize, part: String },
}

/// Join parts into a single key: `["a", "b"]` becomes `"a#b"`.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(part.as_ref());
    }
    key
}

/// Like [`join`], but refuses parts that would make the key ambiguous.
pub fn try_join<S: AsRef<str>>(parts: &[S]) -> Result<String, KeyError> {
    if let Some((index, part)) = parts
        .iter()
        .enumerate()
        .find(|(_, p)| p.as_ref().contains(SEPARATOR))
    {
        return Err(KeyError::ReservedSeparator { index, part: part.as_ref().to_string() });
    }
    Ok(join(parts))
}

/// Split a key back into its parts.
pub fn split(key: &str) -> Vec<String> {
    key.split(SEPARATOR).map(str::to_string).collect()
}
