use std::fmt;

use crate::error::{PapertrailError, Result};

/// Semantic release version with a literal `v` prefix (e.g. "v1.2.3")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Semantic-version component a release must increment.
///
/// Ordered so that aggregating over a batch of changes is a plain `max`:
/// `Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpLevel {
    Patch,
    Minor,
    Major,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string of the form "vMAJOR.MINOR.PATCH".
    ///
    /// The `v` prefix is required; the three components must be plain
    /// non-negative integers.
    ///
    /// # Returns
    /// * `Ok(Version)` - Successfully parsed version
    /// * `Err` - If the prefix is missing or the triplet is malformed
    pub fn parse(s: &str) -> Result<Self> {
        let bare = s.strip_prefix('v').ok_or_else(|| {
            PapertrailError::version(format!(
                "invalid version {:?} (expected vMAJOR.MINOR.PATCH)",
                s
            ))
        })?;

        let parts: Vec<&str> = bare.split('.').collect();
        if parts.len() != 3 {
            return Err(PapertrailError::version(format!(
                "invalid version {:?} (expected vMAJOR.MINOR.PATCH)",
                s
            )));
        }

        let component = |part: &str| -> Result<u32> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(PapertrailError::version(format!(
                    "invalid version {:?} (expected vMAJOR.MINOR.PATCH)",
                    s
                )));
            }
            part.parse::<u32>().map_err(|_| {
                PapertrailError::version(format!("version component out of range in {:?}", s))
            })
        };

        Ok(Version {
            major: component(parts[0])?,
            minor: component(parts[1])?,
            patch: component(parts[2])?,
        })
    }

    /// Apply a bump level, zeroing the lower components:
    /// - **Major**: major += 1, minor = 0, patch = 0
    /// - **Minor**: minor += 1, patch = 0
    /// - **Patch**: patch += 1
    pub fn bump(&self, level: BumpLevel) -> Self {
        match level {
            BumpLevel::Major => Version {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            BumpLevel::Minor => Version {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
            },
            BumpLevel::Patch => Version {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
            },
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}
