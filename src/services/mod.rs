//! Service layer for the seeker.
//!
//! This module contains the collaborators a crawl run calls into:
//! - Identifier probes and the site catalogue (`IdentifierProbe`, `ProbeRegistry`)
//! - Fetching and field shaping (`FetchContext`)
//! - Network transport (`Transport`, `HttpTransport`)
//! - Body extraction (`Extractor`, `ProfileExtractor`)
//! - Cookie loading (`CookieJar`)

pub mod catalogue;
mod cookies;
mod extractor;
mod fetcher;
mod probe;
mod transport;

pub use catalogue::default_registry;
pub use cookies::CookieJar;
pub use extractor::{Extractor, ProfileExtractor};
pub use fetcher::FetchContext;
pub use probe::{
    CatalogueProbe, IdentifierProbe, ProbeRegistry, ProfileLink, Site, SiteOutcome, SiteRequest,
    ValueFormat,
};
pub use transport::{Headers, HttpTransport, RawResponse, Transport};
