//! Archive path normalization

use crate::error::{ArchiveError, ArchiveResult};
use serde::{Deserialize, Serialize};

/// Case applied to relative paths before they are stored or looked up
///
/// Recorded in the archive header so readers normalize lookups the same way
/// the writer normalized stored paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilePathCase {
    /// Fold to lowercase
    #[default]
    Lowercase,
    /// Fold to uppercase
    Uppercase,
    /// Keep the case the caller supplied
    Preserve,
}

impl FilePathCase {
    /// Header byte
    pub const fn to_raw(self) -> u8 {
        match self {
            Self::Lowercase => 0,
            Self::Uppercase => 1,
            Self::Preserve => 2,
        }
    }

    /// Decode the header byte
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Lowercase),
            1 => Some(Self::Uppercase),
            2 => Some(Self::Preserve),
            _ => None,
        }
    }
}

/// Normalize a caller supplied path into its stored form
///
/// Backslashes become `/`, empty and `.` segments are dropped (which also
/// strips leading `./` and `/`), then `case` is applied. A path with nothing
/// left is rejected.
pub fn normalize_path(path: &str, case: FilePathCase) -> ArchiveResult<String> {
    let unified = path.replace('\\', "/");
    let joined = unified
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return Err(ArchiveError::InvalidPath(path.to_string()));
    }

    Ok(match case {
        FilePathCase::Lowercase => joined.to_lowercase(),
        FilePathCase::Uppercase => joined.to_uppercase(),
        FilePathCase::Preserve => joined,
    })
}
