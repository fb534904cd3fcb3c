//! Pipeline entry points for seeker operations.
//!
//! - `GraphCrawler`: Expand one seed identifier into every linked profile
//! - `TaskExecutor`: Run many crawls with bounded concurrency
//! - `projection`: Flatten crawl output into presentable records
//! - `Seeker`: Wire the above together for a batch of targets

pub mod crawl;
pub mod executor;
pub mod projection;

use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};

use crate::error::Result;
use crate::models::{Config, Target, TargetReport};
use crate::services::{
    CookieJar, FetchContext, HttpTransport, ProbeRegistry, ProfileExtractor, Transport,
    default_registry,
};

pub use crawl::{CrawlRun, GraphCrawler};
pub use executor::{ConsoleProgress, ProgressObserver, TaskExecutor};
pub use projection::{flatten, not_found};

/// Crawls a batch of targets and reports on each one.
pub struct Seeker {
    crawler: GraphCrawler,
    executor: TaskExecutor,
}

impl Seeker {
    pub fn new(crawler: GraphCrawler, executor: TaskExecutor) -> Self {
        Self { crawler, executor }
    }

    /// Build a seeker with the HTTP transport and the default catalogue.
    pub fn from_config(config: &Config, cookies: CookieJar, show_progress: bool) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.crawler)?);
        Ok(Self::with_transport(
            config,
            transport,
            default_registry(),
            cookies,
            show_progress,
        ))
    }

    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
        registry: ProbeRegistry,
        cookies: CookieJar,
        show_progress: bool,
    ) -> Self {
        if registry.is_empty() {
            log::warn!("No identifier probes registered, every target will come back empty");
        }
        let context = FetchContext::new(
            transport,
            Arc::new(ProfileExtractor),
            Arc::new(cookies),
            &config.discovery,
        );
        let crawler = GraphCrawler::new(
            Arc::new(registry),
            Arc::new(context),
            &config.discovery,
            config.crawler.max_concurrent_sites,
        );

        let limit = config.crawler.max_concurrent_jobs;
        let executor = if show_progress {
            TaskExecutor::with_progress(limit, Arc::new(ConsoleProgress))
        } else {
            TaskExecutor::simple(limit)
        };

        Self::new(crawler, executor)
    }

    /// Crawl every target; `reports[i]` belongs to `targets[i]`.
    pub async fn process(&self, targets: &[Target]) -> Vec<TargetReport> {
        log::info!(
            "Seeking {} target(s) with {} probe type(s) across {} site(s)",
            targets.len(),
            self.crawler.registry().len(),
            self.crawler.registry().site_count()
        );

        let jobs: Vec<BoxFuture<'_, Result<TargetReport>>> = targets
            .iter()
            .map(|target| self.request(target).boxed())
            .collect();
        let results = self.executor.run(jobs).await;

        targets
            .iter()
            .zip(results)
            .map(|(target, result)| {
                result.unwrap_or_else(|e| {
                    log::error!("Target {} failed: {}", target.input(), e);
                    let now = Utc::now();
                    TargetReport {
                        target: target.input().to_string(),
                        records: Vec::new(),
                        not_found: Vec::new(),
                        error: Some(e.to_string()),
                        started_at: now,
                        finished_at: now,
                    }
                })
            })
            .collect()
    }

    /// One crawl run for one target, projected into a report.
    pub async fn request(&self, target: &Target) -> Result<TargetReport> {
        let started_at = Utc::now();
        let seed = target.identifier();
        let output = self.crawler.run(seed).await;

        let records = flatten(seed, &output);
        let missing = not_found(seed, &output);
        log::info!(
            "Target {}: {} profile(s), {} empty site(s)",
            target.input(),
            records.len(),
            missing.len()
        );

        Ok(TargetReport {
            target: target.input().to_string(),
            records,
            not_found: missing,
            error: None,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{URL_FIELD, USERNAME_FIELD};
    use crate::services::{CatalogueProbe, IdentifierProbe, Site, ValueFormat};
    use crate::testing::MockTransport;

    fn registry() -> ProbeRegistry {
        ProbeRegistry::new(vec![
            Arc::new(CatalogueProbe::new(
                "username",
                &[USERNAME_FIELD],
                ValueFormat::Any,
                vec![Site::get("siteA", "http://a/{id}")],
            )) as Arc<dyn IdentifierProbe>,
            Arc::new(CatalogueProbe::new(
                "public_id",
                &["id"],
                ValueFormat::Any,
                vec![Site::get("siteB", "http://b/{id}")],
            )),
        ])
    }

    fn seeker(transport: MockTransport) -> Seeker {
        Seeker::with_transport(
            &Config::default(),
            Arc::new(transport),
            registry(),
            CookieJar::new(),
            false,
        )
    }

    #[tokio::test]
    async fn test_alice_links_to_public_id() {
        let transport = MockTransport::new()
            .with_body("http://a/alice", r#"{"id": "123"}"#)
            .with_body("http://b/123", r#"{"name": "Alice"}"#);
        let target = Target::parse("alice@example.com").unwrap();

        let reports = seeker(transport).process(&[target]).await;
        assert_eq!(reports.len(), 1);

        let report = &reports[0];
        assert_eq!(report.target, "alice@example.com");
        assert!(report.error.is_none());
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].identifier, "alice");
        assert_eq!(report.records[0].platform, "Sitea");
        assert_eq!(
            report.records[0].fields.get("id").map(String::as_str),
            Some("123")
        );
        assert_eq!(report.records[1].identifier, "123");
        assert_eq!(
            report.records[1].fields.get(URL_FIELD).map(String::as_str),
            Some("http://b/123")
        );
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_reports_follow_target_order() {
        let transport = MockTransport::new()
            .with_body("http://a/bob", r#"{"name": "Bob"}"#)
            .with_body("http://a/carol", r#"{"name": "Carol"}"#);
        let targets = vec![
            Target::parse("carol").unwrap(),
            Target::parse("nobody").unwrap(),
            Target::parse("bob").unwrap(),
        ];

        let reports = seeker(transport).process(&targets).await;
        let names: Vec<_> = reports.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(names, vec!["carol", "nobody", "bob"]);
        assert!(reports[1].records.is_empty());
        assert_eq!(reports[1].not_found.len(), 1);
        assert_eq!(reports[2].records.len(), 1);
    }

    #[tokio::test]
    async fn test_report_renders_found_profile() {
        let transport = MockTransport::new().with_body("http://a/alice", r#"{"full_name": "A"}"#);
        let reports = seeker(transport)
            .process(&[Target::parse("alice").unwrap()])
            .await;

        let text = reports[0].to_string();
        assert!(text.starts_with("Target alice:"));
        assert!(text.contains("[+] Sitea (alice)"));
        assert!(text.contains("    URL: http://a/alice"));
        assert!(text.contains("    Full Name: A"));
    }
}
