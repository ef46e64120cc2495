//! Configuration types for treefind
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use crate::walker::matcher::validate_target;
use crate::walker::pool::DEFAULT_GRACE;
use clap::Parser;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::walker::matcher::MatchMode;

/// Maximum reasonable thread count
const MAX_THREADS: usize = 512;

/// Default thread cap regardless of core count
///
/// Listing is I/O bound; past this point extra threads mostly contend.
const DEFAULT_THREAD_CAP: usize = 8;

/// Parallel filesystem search for an entry by name
#[derive(Parser, Debug, Clone)]
#[command(
    name = "treefind",
    version,
    about = "Parallel filesystem search for an entry by name",
    long_about = "Searches a directory tree for an entry with the given name.\n\n\
                  Directories are listed by a pool of worker threads; the first accepted \
                  match stops every worker. With several matches in different branches, \
                  which one is reported is not deterministic.",
    after_help = "EXAMPLES:\n    \
        treefind / --name hosts\n    \
        treefind ~/src -n Cargo.toml -m files -t 4\n    \
        treefind /data -n CACHE -i -m directories --exclude '\\.snapshot'"
)]
pub struct CliArgs {
    /// Directory to search from
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Entry name to look for (prompted on stdin if omitted)
    #[arg(short = 'n', long, value_name = "NAME")]
    pub name: Option<String>,

    /// Number of worker threads
    #[arg(
        short = 't',
        long,
        default_value_t = default_threads(),
        value_name = "NUM"
    )]
    pub threads: usize,

    /// Which entry types may match
    #[arg(short = 'm', long, value_enum, default_value_t = MatchMode::Any)]
    pub match_mode: MatchMode,

    /// Compare names case-insensitively
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Maximum directory depth (unlimited if not set)
    #[arg(short = 'd', long, value_name = "NUM")]
    pub max_depth: Option<usize>,

    /// Do not descend into directories matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Follow symlinks to directories (guards against link cycles)
    #[arg(short = 'L', long)]
    pub follow_links: bool,

    /// Seconds to wait for workers to stop before giving up
    #[arg(long, default_value = "10", value_name = "SECS")]
    pub grace_secs: u64,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show skipped directories)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Default thread cap: hardware concurrency, at most eight
pub fn default_threads() -> usize {
    num_cpus::get().clamp(1, DEFAULT_THREAD_CAP)
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Absolute directory to search from
    pub root: PathBuf,

    /// Entry name to look for, if given up front
    pub target: Option<String>,

    /// Number of worker threads
    pub threads: usize,

    /// Which entry types may match
    pub match_mode: MatchMode,

    /// Exact-case comparison
    pub case_sensitive: bool,

    /// Maximum traversal depth
    pub max_depth: Option<usize>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Follow directory symlinks
    pub follow_links: bool,

    /// Grace period for joining workers
    pub grace: Duration,

    /// Show progress indicator
    pub show_progress: bool,
}

impl SearchConfig {
    /// Defaults for searching under `root`, without validation
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            target: None,
            threads: default_threads(),
            match_mode: MatchMode::Any,
            case_sensitive: true,
            max_depth: None,
            exclude_patterns: Vec::new(),
            follow_links: false,
            grace: DEFAULT_GRACE,
            show_progress: false,
        }
    }

    /// Set the target name
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the thread count
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the match mode
    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Set the depth bound
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        validate_threads(args.threads)?;

        if args.grace_secs == 0 {
            return Err(ConfigError::InvalidGracePeriod);
        }

        let root = validate_root(&args.root)?;

        if let Some(name) = &args.name {
            validate_target(name)?;
        }

        // Compile exclude patterns
        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root,
            target: args.name,
            threads: args.threads,
            match_mode: args.match_mode,
            case_sensitive: !args.ignore_case,
            max_depth: args.max_depth,
            exclude_patterns,
            follow_links: args.follow_links,
            grace: Duration::from_secs(args.grace_secs),
            show_progress: !args.quiet,
        })
    }

    /// Check if a directory should not be descended into
    pub fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        let path = path.to_string_lossy();
        self.exclude_patterns.iter().any(|re| re.is_match(&path))
    }

    /// Check if a directory at `depth` may be scanned
    pub fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }
}

/// Thread cap must be in `1..=MAX_THREADS`
pub fn validate_threads(threads: usize) -> Result<(), ConfigError> {
    if threads == 0 || threads > MAX_THREADS {
        return Err(ConfigError::InvalidThreadCap {
            count: threads,
            max: MAX_THREADS,
        });
    }
    Ok(())
}

/// Root must be an existing directory; returned absolute
fn validate_root(root: &Path) -> Result<PathBuf, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };

    let meta = std::fs::metadata(root).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".into()));
    }

    // Listing the root up front turns "inaccessible" into a startup error
    std::fs::read_dir(root).map_err(|e| invalid(e.to_string()))?;

    std::path::absolute(root).map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(root: &Path) -> CliArgs {
        CliArgs::parse_from(["treefind", root.to_str().unwrap(), "-n", "target.txt"])
    }

    #[test]
    fn test_from_args_defaults() {
        let dir = tempdir().unwrap();
        let config = SearchConfig::from_args(args(dir.path())).unwrap();

        assert!(config.root.is_absolute());
        assert_eq!(config.target.as_deref(), Some("target.txt"));
        assert_eq!(config.match_mode, MatchMode::Any);
        assert!(config.case_sensitive);
        assert!(config.threads >= 1 && config.threads <= DEFAULT_THREAD_CAP);
        assert_eq!(config.grace, Duration::from_secs(10));
    }

    #[test]
    fn test_match_mode_flag() {
        let dir = tempdir().unwrap();
        let args = CliArgs::parse_from([
            "treefind",
            dir.path().to_str().unwrap(),
            "-m",
            "directories",
            "-i",
        ]);
        let config = SearchConfig::from_args(args).unwrap();
        assert_eq!(config.match_mode, MatchMode::Directories);
        assert!(!config.case_sensitive);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_invalid_thread_count() {
        let dir = tempdir().unwrap();
        let mut cli = args(dir.path());
        cli.threads = 0;
        assert!(matches!(
            SearchConfig::from_args(cli),
            Err(ConfigError::InvalidThreadCap { count: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_root() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            SearchConfig::from_args(args(&missing)),
            Err(ConfigError::InvalidRoot { .. })
        ));

        let file = dir.path().join("file");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            SearchConfig::from_args(args(&file)),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_invalid_target_and_pattern() {
        let dir = tempdir().unwrap();
        let mut cli = args(dir.path());
        cli.name = Some("a/b".into());
        assert!(matches!(
            SearchConfig::from_args(cli),
            Err(ConfigError::InvalidTarget { .. })
        ));

        let mut cli = args(dir.path());
        cli.exclude_patterns = vec!["(".into()];
        assert!(matches!(
            SearchConfig::from_args(cli),
            Err(ConfigError::InvalidExcludePattern { .. })
        ));
    }

    #[test]
    fn test_validate_threads() {
        assert!(validate_threads(1).is_ok());
        assert!(validate_threads(MAX_THREADS).is_ok());
        assert!(matches!(
            validate_threads(MAX_THREADS + 1),
            Err(ConfigError::InvalidThreadCap { count: 513, max: 512 })
        ));
    }

    #[test]
    fn test_exclude_pattern() {
        let mut config = SearchConfig::new("/data");
        config.exclude_patterns = vec![Regex::new(r"\.snapshot").unwrap()];

        assert!(config.is_excluded(Path::new("/data/.snapshot/hourly.0")));
        assert!(!config.is_excluded(Path::new("/data/projects")));
    }

    #[test]
    fn test_depth_bound() {
        let config = SearchConfig::new("/").with_max_depth(2);
        assert!(config.within_depth(2));
        assert!(!config.within_depth(3));
        assert!(SearchConfig::new("/").within_depth(1_000));
    }
}
