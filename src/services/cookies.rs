//! Cookie jar loading from Netscape/Mozilla `cookies.txt` exports.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;

use crate::error::Result;

/// Read-only cookie name/value pairs sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cookie file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content, Utc::now().timestamp()))
    }

    /// Load a cookie file, or return an empty jar if it is missing or unreadable.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(jar) => {
                log::debug!("Loaded {} cookies from {}", jar.len(), path.display());
                jar
            }
            Err(e) => {
                log::warn!(
                    "Cookies not loaded from {}: {}. Some sites require cookies.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Parse the tab-separated Netscape format.
    ///
    /// Session cookies (expiry 0) and cookies expired at `now` are skipped.
    pub fn parse(content: &str, now: i64) -> Self {
        let mut cookies = BTreeMap::new();

        for line in content.lines() {
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split('\t').collect();
            if parts.len() != 7 {
                log::debug!("Skipping malformed cookie line: {line}");
                continue;
            }

            let expires: i64 = parts[4].trim().parse().unwrap_or(0);
            if expires == 0 || expires <= now {
                continue;
            }

            cookies.insert(parts[5].to_string(), parts[6].trim_end().to_string());
        }

        Self { cookies }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Value for a `Cookie` request header, `None` when the jar is empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
