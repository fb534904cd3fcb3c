//! Crawl output, flattened profile records and per-target reports.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::record::FieldMap;

/// Canonical profile URL field.
pub const URL_FIELD: &str = "URL";
/// Request URL, set when it differs from the canonical profile URL.
pub const URL_SECONDARY_FIELD: &str = "URL_secondary";
/// Sentinel field marking a soft-blocked site.
pub const ERROR_FIELD: &str = "Error";
/// Label added to every flattened record.
pub const PLATFORM_FIELD: &str = "platform";

/// Per-site fields for one identifier, in the order sites were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteResults {
    sites: Vec<(String, FieldMap)>,
}

impl SiteResults {
    /// Record a site result. A repeated site name is qualified with the probe kind.
    pub fn insert(&mut self, kind: &str, site: &str, fields: FieldMap) {
        let name = if self.get(site).is_some() {
            format!("{kind}_{site}")
        } else {
            site.to_string()
        };
        self.sites.push((name, fields));
    }

    pub fn get(&self, site: &str) -> Option<&FieldMap> {
        self.sites
            .iter()
            .find(|(name, _)| name == site)
            .map(|(_, fields)| fields)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldMap)> {
        self.sites.iter().map(|(name, fields)| (name.as_str(), fields))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl Serialize for SiteResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sites.len()))?;
        for (name, fields) in &self.sites {
            map.serialize_entry(name, fields)?;
        }
        map.end()
    }
}

/// Every identifier probed during one run, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlOutput {
    order: Vec<String>,
    entries: HashMap<String, SiteResults>,
}

impl CrawlOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Site results for an identifier, created on first access.
    pub fn entry(&mut self, identifier: &str) -> &mut SiteResults {
        if !self.entries.contains_key(identifier) {
            self.order.push(identifier.to_string());
        }
        self.entries.entry(identifier.to_string()).or_default()
    }

    pub fn get(&self, identifier: &str) -> Option<&SiteResults> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SiteResults)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|sites| (id.as_str(), sites)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Serialize for CrawlOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for (id, sites) in self.iter() {
            map.serialize_entry(id, sites)?;
        }
        map.end()
    }
}

/// One (identifier, site) pair that returned something.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProfileRecord {
    pub identifier: String,
    pub platform: String,
    pub fields: FieldMap,
}

impl ProfileRecord {
    /// Whether the record is a soft-block marker rather than profile data.
    pub fn is_blocked(&self) -> bool {
        self.fields.contains_key(ERROR_FIELD)
    }
}

/// A site that was checked but had nothing for an identifier.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NotFound {
    pub identifier: String,
    pub platform: String,
}

/// Everything found for one target.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TargetReport {
    pub target: String,
    pub records: Vec<ProfileRecord>,
    pub not_found: Vec<NotFound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TargetReport {
    pub fn blocked_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_blocked()).count()
    }
}

impl fmt::Display for TargetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Target {}:", self.target)?;

        for record in &self.records {
            writeln!(f, "[+] {} ({})", record.platform, record.identifier)?;
            if let Some(url) = record.fields.get(URL_FIELD) {
                writeln!(f, "    URL: {url}")?;
            }
            for (name, value) in &record.fields {
                if name == URL_FIELD || name == PLATFORM_FIELD || value.is_empty() {
                    continue;
                }
                writeln!(f, "    {}: {}", humanize(name), value)?;
            }
        }

        for missing in &self.not_found {
            writeln!(f, "[-] {} ({}): Not found.", missing.platform, missing.identifier)?;
        }

        if let Some(error) = &self.error {
            writeln!(f, "(error: {error})")?;
        }
        Ok(())
    }
}

/// Turn a snake_case key into a title-cased label: `collections_api` -> `Collections Api`.
pub fn humanize(name: &str) -> String {
    let mut label = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if word_start {
                label.extend(c.to_uppercase());
            } else {
                label.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            label.push(if c == '_' { ' ' } else { c });
            word_start = true;
        }
    }
    label
}
