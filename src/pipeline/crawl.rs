// src/pipeline/crawl.rs

//! Recursive identifier-graph crawler.
//!
//! One run starts from a seed identifier, probes every site of every matching
//! identifier type, aggregates what came back and recurses into the values it
//! discovered. A per-run visited set guarantees each value is probed at most
//! once, which keeps cyclic back-references finite.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

use crate::models::{
    CrawlOutput, DiscoveryConfig, ERROR_FIELD, ExpansionPolicy, FieldMap, Identifier,
    IdentifierRecord, PLATFORM_FIELD, URL_FIELD, URL_SECONDARY_FIELD,
};
use crate::services::{FetchContext, IdentifierProbe, ProbeRegistry, Site, SiteOutcome};

/// Fields the fetch layer adds itself; never offered as identifiers under `all_fields`.
const BOOKKEEPING_FIELDS: [&str; 4] = [URL_FIELD, URL_SECONDARY_FIELD, ERROR_FIELD, PLATFORM_FIELD];

/// State owned by one crawl run.
#[derive(Debug, Default)]
pub struct CrawlRun {
    output: CrawlOutput,
    visited: HashSet<String>,
}

impl CrawlRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, value: &str) -> bool {
        self.visited.contains(value)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn output(&self) -> &CrawlOutput {
        &self.output
    }

    pub fn into_output(self) -> CrawlOutput {
        self.output
    }
}

/// Crawler shared by all runs of a process; holds only read-only state.
pub struct GraphCrawler {
    registry: Arc<ProbeRegistry>,
    context: Arc<FetchContext>,
    expansion: ExpansionPolicy,
    max_identifiers: Option<usize>,
    site_concurrency: usize,
}

impl GraphCrawler {
    pub fn new(
        registry: Arc<ProbeRegistry>,
        context: Arc<FetchContext>,
        discovery: &DiscoveryConfig,
        site_concurrency: usize,
    ) -> Self {
        if discovery.expansion == ExpansionPolicy::AllFields {
            log::info!("Expansion policy all_fields: every discovered value is a candidate");
        }
        Self {
            registry,
            context,
            expansion: discovery.expansion,
            max_identifiers: discovery.max_identifiers,
            site_concurrency: site_concurrency.max(1),
        }
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Crawl everything reachable from `seed` with a fresh visited set.
    pub async fn run(&self, seed: &Identifier) -> CrawlOutput {
        let mut run = CrawlRun::new();
        self.crawl(seed.clone(), &mut run).await;
        log::info!(
            "Crawl for {} probed {} identifier(s), {} site result(s)",
            seed,
            run.visited_count(),
            run.output().iter().map(|(_, sites)| sites.len()).sum::<usize>()
        );
        run.into_output()
    }

    /// Probe `identifier` if it is new to this run, then recurse into its fields.
    pub fn crawl<'a>(&'a self, identifier: Identifier, run: &'a mut CrawlRun) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let value = identifier.value();
            if run.is_visited(value) {
                return;
            }

            let probes = self.matching_probes(&identifier);
            if probes.is_empty() {
                return;
            }

            if let Some(max) = self.max_identifiers
                && run.visited.len() >= max
            {
                log::warn!("Identifier limit {max} reached, not probing {identifier}");
                return;
            }

            run.visited.insert(value.to_string());
            log::debug!(
                "Probing {} as {}",
                identifier,
                probes.iter().map(|p| p.kind()).collect::<Vec<_>>().join(", ")
            );

            let record = self.probe(value, &probes, &mut run.output).await;

            for (field, aggregated) in record.iter() {
                for discovered in aggregated.values() {
                    self.crawl(Identifier::new(field, discovered), run).await;
                }
            }
        })
    }

    fn matching_probes(&self, identifier: &Identifier) -> Vec<Arc<dyn IdentifierProbe>> {
        match self.expansion {
            ExpansionPolicy::Matched => self
                .registry
                .matching(identifier.field(), identifier.value()),
            ExpansionPolicy::AllFields => {
                if BOOKKEEPING_FIELDS.contains(&identifier.field()) {
                    return Vec::new();
                }
                self.registry.matching_value(identifier.value())
            }
        }
    }

    /// Fetch every site of every matching probe and aggregate the results.
    ///
    /// Sites run concurrently, but results are folded in catalogue order, one
    /// whole site at a time.
    async fn probe(
        &self,
        value: &str,
        probes: &[Arc<dyn IdentifierProbe>],
        output: &mut CrawlOutput,
    ) -> IdentifierRecord {
        let jobs: Vec<(&dyn IdentifierProbe, &Site)> = probes
            .iter()
            .flat_map(|probe| probe.sites().iter().map(move |site| (probe.as_ref(), site)))
            .collect();

        let context = self.context.as_ref();
        let fetches: Vec<BoxFuture<'_, (&str, &str, SiteOutcome)>> = jobs
            .into_iter()
            .map(|(probe, site)| -> BoxFuture<'_, _> {
                Box::pin(async move {
                    let outcome = probe.fetch(site, value, context).await;
                    (probe.kind(), site.name.as_str(), outcome)
                })
            })
            .collect();
        let results: Vec<(&str, &str, SiteOutcome)> = stream::iter(fetches)
            .buffered(self.site_concurrency)
            .collect()
            .await;

        let mut record = IdentifierRecord::new();
        let sites = output.entry(value);
        for (kind, site, outcome) in results {
            let fields = Self::settle(kind, site, value, outcome);
            record.aggregate_site(&fields);
            sites.insert(kind, site, fields);
        }
        record
    }

    fn settle(kind: &str, site: &str, value: &str, outcome: SiteOutcome) -> FieldMap {
        match &outcome {
            SiteOutcome::Found(fields) => {
                log::debug!("{kind}/{site} found {} field(s) for {value}", fields.len());
            }
            SiteOutcome::NotFound => log::debug!("{kind}/{site} has nothing for {value}"),
            SiteOutcome::Blocked => log::warn!("{kind}/{site} blocked the request for {value}"),
            SiteOutcome::Unavailable(e) => {
                log::warn!("{kind}/{site} unavailable for {value}: {e}")
            }
            SiteOutcome::ExtractionFailed(e) => {
                log::warn!("{kind}/{site} returned unreadable data for {value}: {e}")
            }
        }
        outcome.into_fields()
    }
}
