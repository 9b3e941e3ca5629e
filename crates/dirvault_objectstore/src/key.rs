use super::{KeyError, Result};

/// Longest object key S3 accepts, in bytes.
const MAX_KEY_LEN: usize = 1024;

/// A wrapper around [`String`] that rejects unsavory object key names.
///
/// The following rules are applied during the [`TryFrom<&str>`] implementation:
///
/// * keys must not be empty or longer than 1024 bytes
/// * keys must not start with `/`
/// * keys are delimited by `/` and must not contain empty segments (ie `//`)
/// * keys must not contain relative segments (ie `.` or `..`)
///
/// A trailing `/` is only allowed on prefixes, which are never keys on their own, so it is
/// rejected here as an empty segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    key: String,
}

impl Key {
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl TryFrom<&str> for Key {
    type Error = super::Error;

    fn try_from(s: &str) -> Result<Key> {
        if s.is_empty() {
            return Err(KeyError::Empty.into());
        }
        if s.len() > MAX_KEY_LEN {
            return Err(KeyError::TooLong(s.len()).into());
        }
        if s.starts_with('/') {
            return Err(KeyError::RootDirNotAllowed.into());
        }
        for segment in s.split('/') {
            validate_segment(segment)?;
        }
        Ok(Key { key: s.to_string() })
    }
}

impl TryFrom<String> for Key {
    type Error = super::Error;

    fn try_from(s: String) -> Result<Key> {
        Key::try_from(s.as_str())
    }
}

impl From<&Key> for String {
    fn from(k: &Key) -> String {
        k.key.clone()
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

fn validate_segment(segment: &str) -> std::result::Result<(), KeyError> {
    match segment {
        "" => Err(KeyError::EmptySegment),
        "." => Err(KeyError::CurDirNotAllowed),
        ".." => Err(KeyError::ParentDirNotAllowed),
        _ => Ok(()),
    }
}
