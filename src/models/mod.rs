// src/models/mod.rs

//! Domain models for the seeker.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod identifier;
mod output;
mod record;

// Re-export all public types
pub use config::{Config, CrawlerConfig, DiscoveryConfig, ExpansionPolicy};
pub use identifier::{Identifier, Target, USERNAME_FIELD};
pub use output::{
    CrawlOutput, ERROR_FIELD, NotFound, PLATFORM_FIELD, ProfileRecord, SiteResults, TargetReport,
    URL_FIELD, URL_SECONDARY_FIELD, humanize,
};
pub use record::{FieldMap, FieldValue, IdentifierRecord};
