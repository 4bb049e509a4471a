/*!
 * Pool Functions
 * The operations that consult a policy, and the category each belongs to
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::policy::Category;

/// Operation that selects branches through a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Func {
    Getattr,
    Open,
    Opendir,
    Link,
    Chmod,
    Chown,
    Ioctl,
    Rmdir,
    Unlink,
    Utimens,
    Create,
    Mkdir,
    Symlink,
}

impl Func {
    pub const ALL: [Func; 13] = [
        Func::Getattr,
        Func::Open,
        Func::Opendir,
        Func::Link,
        Func::Chmod,
        Func::Chown,
        Func::Ioctl,
        Func::Rmdir,
        Func::Unlink,
        Func::Utimens,
        Func::Create,
        Func::Mkdir,
        Func::Symlink,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Func::Getattr => "getattr",
            Func::Open => "open",
            Func::Opendir => "opendir",
            Func::Link => "link",
            Func::Chmod => "chmod",
            Func::Chown => "chown",
            Func::Ioctl => "ioctl",
            Func::Rmdir => "rmdir",
            Func::Unlink => "unlink",
            Func::Utimens => "utimens",
            Func::Create => "create",
            Func::Mkdir => "mkdir",
            Func::Symlink => "symlink",
        }
    }

    pub const fn category(self) -> Category {
        match self {
            Func::Getattr | Func::Open | Func::Opendir | Func::Link => Category::Search,
            Func::Chmod | Func::Chown | Func::Ioctl | Func::Rmdir | Func::Unlink | Func::Utimens => {
                Category::Action
            }
            Func::Create | Func::Mkdir | Func::Symlink => Category::Create,
        }
    }

    /// Whether results over several targets are folded by an aggregate rule
    pub const fn is_broadcast(self) -> bool {
        matches!(
            self,
            Func::Ioctl
                | Func::Unlink
                | Func::Rmdir
                | Func::Chmod
                | Func::Chown
                | Func::Utimens
                | Func::Mkdir
                | Func::Symlink
        )
    }

    /// Policy used when neither `[func]` nor `[policy]` says otherwise
    ///
    /// `None` means the category default.
    pub const fn default_policy(self) -> Option<&'static str> {
        match self {
            Func::Symlink => Some("ff"),
            _ => None,
        }
    }
}

impl FromStr for Func {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Func::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown function: {}", s))
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
