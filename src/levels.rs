// Level store: puzzle definitions read from `level<N>.json` files.
//
// Every call re-scans the directory. Level files are authored outside this
// service and never written here.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::LevelError;

/// Positive level number, as used in `level<N>.json`.
pub type LevelId = u64;

const FILE_PREFIX: &str = "level";
const FILE_SUFFIX: &str = ".json";

/// Build the canonical file name for a level.
pub fn level_file_name(id: LevelId) -> String {
    format!("{FILE_PREFIX}{id}{FILE_SUFFIX}")
}

/// Parse a file name following the `level<N>.json` convention.
///
/// Only canonical names are accepted: no sign, no leading zeros, `N > 0`.
/// Anything else is not a level.
pub fn parse_level_file_name(name: &str) -> Option<LevelId> {
    let digits = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// A level's raw file content, passed through unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelContent {
    pub id: LevelId,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct LevelStore {
    dir: PathBuf,
}

impl LevelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List level ids in directory order. Not sorted.
    pub fn list_levels(&self) -> Vec<LevelId> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Cannot read levels directory {}: {e}", self.dir.display());
                return Vec::new();
            }
        };

        entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().and_then(parse_level_file_name))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.list_levels().len()
    }

    /// Fetch a level's content if it is part of the current listing.
    pub fn get_level(&self, id: LevelId) -> Result<LevelContent, LevelError> {
        if !self.list_levels().contains(&id) {
            return Err(LevelError::NotFound(id));
        }
        self.read_level(id)
    }

    /// Pick a uniformly random level from a single listing snapshot and read it.
    pub fn random_level<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<LevelContent, LevelError> {
        let ids = self.list_levels();
        let id = *ids.choose(rng).ok_or(LevelError::NoLevels)?;
        self.read_level(id)
    }

    fn read_level(&self, id: LevelId) -> Result<LevelContent, LevelError> {
        let path = self.dir.join(level_file_name(id));
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(LevelContent { id, raw }),
            // Removed between listing and read.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LevelError::NotFound(id)),
            Err(source) => Err(LevelError::Io { path, source }),
        }
    }
}
