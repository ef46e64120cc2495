//! Name matching policy

use crate::error::ConfigError;
use crate::fs::DirEntry;
use std::ffi::OsString;

/// Which entry types may satisfy a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatchMode {
    /// Anything that is not a directory
    Files,
    /// Directories only
    Directories,
    /// Any entry
    #[default]
    Any,
}

impl MatchMode {
    fn accepts(&self, entry: &DirEntry) -> bool {
        match self {
            MatchMode::Files => entry.entry_type.is_file_like(),
            MatchMode::Directories => entry.is_dir(),
            MatchMode::Any => true,
        }
    }
}

/// Compares directory entries against the target name
#[derive(Debug, Clone)]
pub struct NameMatcher {
    target: OsString,

    /// Lowercased target when matching case-insensitively
    folded: Option<String>,

    mode: MatchMode,
}

impl NameMatcher {
    /// Build a matcher, rejecting names that can never match an entry
    pub fn new(target: &str, mode: MatchMode, case_sensitive: bool) -> Result<Self, ConfigError> {
        validate_target(target)?;

        Ok(Self {
            target: OsString::from(target),
            folded: (!case_sensitive).then(|| target.to_lowercase()),
            mode,
        })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Check whether `entry` is the thing being searched for
    pub fn matches(&self, entry: &DirEntry) -> bool {
        if !self.mode.accepts(entry) {
            return false;
        }

        match &self.folded {
            None => entry.name() == self.target,
            Some(folded) => entry.name().to_string_lossy().to_lowercase() == *folded,
        }
    }
}

/// Check that `name` is a bare entry name
pub fn validate_target(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidTarget {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }
    if name.chars().any(std::path::is_separator) {
        return Err(ConfigError::InvalidTarget {
            name: name.to_string(),
            reason: "expected a bare name, not a path".into(),
        });
    }
    if name == "." || name == ".." {
        return Err(ConfigError::InvalidTarget {
            name: name.to_string(),
            reason: "special directory names never match".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_modes() {
        let file = DirEntry::file("target");
        let dir = DirEntry::dir("target");

        let any = NameMatcher::new("target", MatchMode::Any, true).unwrap();
        assert!(any.matches(&file));
        assert!(any.matches(&dir));

        let files = NameMatcher::new("target", MatchMode::Files, true).unwrap();
        assert!(files.matches(&file));
        assert!(!files.matches(&dir));

        let dirs = NameMatcher::new("target", MatchMode::Directories, true).unwrap();
        assert!(!dirs.matches(&file));
        assert!(dirs.matches(&dir));
    }

    #[test]
    fn test_case_sensitivity() {
        let entry = DirEntry::file("README.md");

        let exact = NameMatcher::new("readme.md", MatchMode::Any, true).unwrap();
        assert!(!exact.matches(&entry));

        let folded = NameMatcher::new("readme.md", MatchMode::Any, false).unwrap();
        assert!(folded.matches(&entry));
    }

    #[test]
    fn test_invalid_targets() {
        assert!(validate_target("").is_err());
        assert!(validate_target("a/b").is_err());
        assert!(validate_target("..").is_err());
        assert!(validate_target("target.txt").is_ok());
    }
}
