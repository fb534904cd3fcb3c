// src/pipeline/projection.rs

//! Flattening of a crawl output into presentable records.

use crate::models::{
    CrawlOutput, Identifier, NotFound, PLATFORM_FIELD, ProfileRecord, SiteResults, humanize,
};

/// One record per (identifier, site) pair with a non-empty result.
///
/// The seed's sites come first, then every other identifier in discovery order.
/// Each record is labelled with the humanized site name, also stored under `platform`.
pub fn flatten(seed: &Identifier, output: &CrawlOutput) -> Vec<ProfileRecord> {
    ordered(seed, output)
        .flat_map(|(identifier, sites)| {
            sites
                .iter()
                .filter(|(_, fields)| !fields.is_empty())
                .map(move |(site, fields)| {
                    let platform = humanize(site);
                    let mut fields = fields.clone();
                    fields.insert(PLATFORM_FIELD.to_string(), platform.clone());
                    ProfileRecord {
                        identifier: identifier.to_string(),
                        platform,
                        fields,
                    }
                })
        })
        .collect()
}

/// Every (identifier, site) pair that came back empty.
pub fn not_found(seed: &Identifier, output: &CrawlOutput) -> Vec<NotFound> {
    ordered(seed, output)
        .flat_map(|(identifier, sites)| {
            sites
                .iter()
                .filter(|(_, fields)| fields.is_empty())
                .map(move |(site, _)| NotFound {
                    identifier: identifier.to_string(),
                    platform: humanize(site),
                })
        })
        .collect()
}

fn ordered<'a>(
    seed: &'a Identifier,
    output: &'a CrawlOutput,
) -> impl Iterator<Item = (&'a str, &'a SiteResults)> {
    let first = output.get(seed.value()).map(|sites| (seed.value(), sites));
    let rest = output.iter().filter(move |(id, _)| *id != seed.value());
    first.into_iter().chain(rest)
}
