//! Ban registry
//!
//! Persisted block-list, one `<user_id>|<reason>` record per line. Blank
//! lines and `#` comments are ignored on load; every mutation rewrites the
//! whole file. Insertion order is preserved for listing.

use std::path::PathBuf;

use regex::Regex;
use tracing::{error, info, warn};

use crate::utils::validators::name_contains_link;

/// Persisted block-list with a link-in-name heuristic
#[derive(Debug)]
pub struct BanRegistry {
    path: PathBuf,
    entries: Vec<(i64, String)>,
    default_reason: String,
    link_pattern: Regex,
}

impl BanRegistry {
    /// Load the registry from disk; a missing or unreadable file yields an
    /// empty list
    pub fn load(
        path: impl Into<PathBuf>,
        default_reason: String,
        link_pattern: Regex,
    ) -> Self {
        let path = path.into();
        let mut entries = Vec::new();
        match std::fs::read_to_string(&path) {
            Ok(raw) => {
                for line in raw.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    let (id_part, reason_part) = match line.split_once('|') {
                        Some((id, reason)) => (id, reason.trim()),
                        None => (line, ""),
                    };
                    match id_part.trim().parse::<i64>() {
                        Ok(user_id) => {
                            let reason = if reason_part.is_empty() {
                                default_reason.clone()
                            } else {
                                reason_part.to_string()
                            };
                            entries.push((user_id, reason));
                        }
                        Err(_) => {
                            warn!(line = %line, "Skipping malformed ban record");
                        }
                    }
                }
                info!(banned = entries.len(), "Loaded ban registry");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read ban file, starting empty");
            }
        }
        Self {
            path,
            entries,
            default_reason,
            link_pattern,
        }
    }

    fn save(&self) {
        let mut out = String::new();
        for (user_id, reason) in &self.entries {
            out.push_str(&format!("{}|{}\n", user_id, reason));
        }
        let result = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(&self.path, out));
        if let Err(e) = result {
            error!(path = %self.path.display(), error = %e, "Failed to save ban file");
        }
    }

    pub fn is_banned(&self, user_id: i64) -> bool {
        self.entries.iter().any(|(id, _)| *id == user_id)
    }

    pub fn reason(&self, user_id: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, reason)| reason.as_str())
    }

    /// Ban a user, replacing the reason if already banned
    pub fn ban(&mut self, user_id: i64, reason: Option<String>) {
        let reason = reason.unwrap_or_else(|| self.default_reason.clone());
        match self.entries.iter_mut().find(|(id, _)| *id == user_id) {
            Some(entry) => entry.1 = reason.clone(),
            None => self.entries.push((user_id, reason.clone())),
        }
        self.save();
        info!(user_id = user_id, reason = %reason, "User banned");
    }

    /// Unban a user, reporting whether an entry was removed
    pub fn unban(&mut self, user_id: i64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| *id != user_id);
        let removed = self.entries.len() != before;
        if removed {
            self.save();
            info!(user_id = user_id, "User unbanned");
        }
        removed
    }

    /// Banned users in insertion order
    pub fn list(&self) -> &[(i64, String)] {
        &self.entries
    }

    /// Advisory check: does a display name look like link spam
    pub fn name_contains_link(&self, name: &str) -> bool {
        name_contains_link(&self.link_pattern, name)
    }
}
