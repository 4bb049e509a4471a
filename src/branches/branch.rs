/*!
 * Branch
 * One backing directory tree and its participation mode
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::errors::{PoolError, PoolResult};

/// How a branch participates in the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BranchMode {
    /// Read-write; eligible for every policy category
    #[default]
    RW,
    /// Read-only; only searched
    RO,
    /// No-create; existing entries may be modified but nothing new lands here
    NC,
}

impl BranchMode {
    #[inline]
    pub const fn allows_create(self) -> bool {
        matches!(self, BranchMode::RW)
    }

    #[inline]
    pub const fn allows_action(self) -> bool {
        !matches!(self, BranchMode::RO)
    }
}

impl FromStr for BranchMode {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RW" => Ok(BranchMode::RW),
            "RO" => Ok(BranchMode::RO),
            "NC" => Ok(BranchMode::NC),
            _ => Err(PoolError::InvalidConfig(format!("unknown branch mode '{}'", s))),
        }
    }
}

impl fmt::Display for BranchMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BranchMode::RW => write!(f, "RW"),
            BranchMode::RO => write!(f, "RO"),
            BranchMode::NC => write!(f, "NC"),
        }
    }
}

/// A backing branch
///
/// Immutable once part of a published branch set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Branch {
    pub path: PathBuf,
    pub mode: BranchMode,
    /// Overrides the pool-wide minimum free space for create policies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_free_space: Option<u64>,
}

impl Branch {
    pub fn new<P: Into<PathBuf>>(path: P, mode: BranchMode) -> Self {
        Self {
            path: path.into(),
            mode,
            min_free_space: None,
        }
    }

    pub fn rw<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(path, BranchMode::RW)
    }

    pub fn ro<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(path, BranchMode::RO)
    }

    pub fn nc<P: Into<PathBuf>>(path: P) -> Self {
        Self::new(path, BranchMode::NC)
    }

    pub fn with_min_free_space(mut self, bytes: u64) -> Self {
        self.min_free_space = Some(bytes);
        self
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.path
    }

    /// Parse `<path>[=<MODE>[,<min-free-space>]]`
    pub fn parse(spec: &str) -> PoolResult<Self> {
        let spec = spec.trim();
        let (path, options) = match spec.rsplit_once('=') {
            Some((path, options)) => (path, Some(options)),
            None => (spec, None),
        };
        if path.is_empty() {
            return Err(PoolError::InvalidConfig(format!("empty branch path in '{}'", spec)));
        }

        let mut branch = Branch::rw(path);
        if let Some(options) = options {
            let mut parts = options.splitn(2, ',');
            if let Some(mode) = parts.next().filter(|m| !m.is_empty()) {
                branch.mode = mode.parse()?;
            }
            if let Some(size) = parts.next() {
                branch.min_free_space = Some(parse_size(size)?);
            }
        }
        Ok(branch)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.path.display(), self.mode)?;
        if let Some(bytes) = self.min_free_space {
            write!(f, ",{}", bytes)?;
        }
        Ok(())
    }
}

/// Parse a byte size with optional `K`, `M`, `G` or `T` suffix (powers of 1024)
pub fn parse_size(s: &str) -> PoolResult<u64> {
    let s = s.trim();
    let invalid = || PoolError::InvalidConfig(format!("invalid size '{}'", s));
    let (digits, shift) = match s.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&s[..s.len() - 1], 10),
        Some('M') => (&s[..s.len() - 1], 20),
        Some('G') => (&s[..s.len() - 1], 30),
        Some('T') => (&s[..s.len() - 1], 40),
        Some(_) => (s, 0),
        None => return Err(invalid()),
    };
    let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
    value.checked_mul(1u64 << shift).ok_or_else(invalid)
}
