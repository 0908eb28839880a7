//! Group allowlist/blocklist filtering.

use burrow_core::{BurrowError, Result};
use regex::Regex;

/// Per-sink group filter. The blocklist wins over the allowlist; with no
/// allowlist every group not blocked is considered.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    allowlist: Option<Regex>,
    blocklist: Option<Regex>,
}

impl GroupFilter {
    pub fn new(allowlist: Option<&str>, blocklist: Option<&str>) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| BurrowError::Config(format!("invalid group filter regex: {}", e)))
        };
        Ok(GroupFilter {
            allowlist: allowlist.map(compile).transpose()?,
            blocklist: blocklist.map(compile).transpose()?,
        })
    }

    pub fn matches(&self, group: &str) -> bool {
        if let Some(blocklist) = &self.blocklist {
            if blocklist.is_match(group) {
                return false;
            }
        }
        match &self.allowlist {
            Some(allowlist) => allowlist.is_match(group),
            None => true,
        }
    }
}
