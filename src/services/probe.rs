//! Identifier probes: per-type validation, site catalogue and fetch dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{ERROR_FIELD, FieldMap};
use crate::services::FetchContext;

/// How a site is queried. Templates use `{id}` for the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteRequest {
    Get { url: String },
    /// Multipart form POST; `{id}` in form values is JSON-escaped.
    PostForm {
        url: String,
        form: Vec<(String, String)>,
    },
}

impl SiteRequest {
    pub fn url_template(&self) -> &str {
        match self {
            SiteRequest::Get { url } | SiteRequest::PostForm { url, .. } => url,
        }
    }
}

/// Where the `URL` field of a found profile points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileLink {
    /// The request URL itself.
    #[default]
    Request,
    /// A human-facing page, templated on the identifier.
    Page(String),
    /// Built from an extracted field; `{value}` is the field value.
    Field { field: String, template: String },
}

/// One named profile source for an identifier type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub name: String,
    pub request: SiteRequest,
    pub headers: Vec<(String, String)>,
    pub link: ProfileLink,
}

impl Site {
    pub fn get(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: SiteRequest::Get { url: url.into() },
            headers: Vec::new(),
            link: ProfileLink::Request,
        }
    }

    pub fn post_form(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: SiteRequest::PostForm {
                url: url.into(),
                form: Vec::new(),
            },
            headers: Vec::new(),
            link: ProfileLink::Request,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let SiteRequest::PostForm { form, .. } = &mut self.request {
            form.push((name.into(), value.into()));
        }
        self
    }

    pub fn with_page(mut self, template: impl Into<String>) -> Self {
        self.link = ProfileLink::Page(template.into());
        self
    }

    pub fn with_field_link(mut self, field: impl Into<String>, template: impl Into<String>) -> Self {
        self.link = ProfileLink::Field {
            field: field.into(),
            template: template.into(),
        };
        self
    }
}

/// Result of probing one site for one identifier.
#[derive(Debug)]
pub enum SiteOutcome {
    Found(FieldMap),
    NotFound,
    /// A known anti-automation challenge was served.
    Blocked,
    /// Transport fault.
    Unavailable(AppError),
    /// Extraction fault.
    ExtractionFailed(AppError),
}

impl SiteOutcome {
    /// Message stored under the sentinel field for blocked sites.
    pub const BLOCKED_MESSAGE: &'static str = "Captcha detected";

    /// Fields recorded for this site: data, the sentinel error, or nothing.
    pub fn into_fields(self) -> FieldMap {
        match self {
            SiteOutcome::Found(fields) => fields,
            SiteOutcome::Blocked => {
                FieldMap::from([(ERROR_FIELD.to_string(), Self::BLOCKED_MESSAGE.to_string())])
            }
            SiteOutcome::NotFound
            | SiteOutcome::Unavailable(_)
            | SiteOutcome::ExtractionFailed(_) => FieldMap::new(),
        }
    }
}

/// The capability set of one identifier type.
#[async_trait]
pub trait IdentifierProbe: Send + Sync {
    /// Type tag, e.g. `username`.
    fn kind(&self) -> &str;

    /// Whether `field` is one of this type's canonical identifying fields.
    fn accepts_field(&self, field: &str) -> bool;

    /// Format constraint on values of this type.
    fn accepts_value(&self, _value: &str) -> bool {
        true
    }

    fn validate(&self, field: &str, value: &str) -> bool {
        self.accepts_field(field) && self.accepts_value(value)
    }

    /// Static, ordered site catalogue.
    fn sites(&self) -> &[Site];

    /// Probe one site. Faults never escape; they become outcomes.
    async fn fetch(&self, site: &Site, identifier: &str, ctx: &FetchContext) -> SiteOutcome;
}

/// Value format accepted by a catalogue probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Any,
    /// 36 characters with `-` separators.
    Guid,
}

impl ValueFormat {
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ValueFormat::Any => !value.trim().is_empty(),
            ValueFormat::Guid => value.chars().count() == 36 && value.contains('-'),
        }
    }
}

/// Probe described entirely by data: fields, value format and sites.
#[derive(Debug, Clone)]
pub struct CatalogueProbe {
    kind: String,
    fields: Vec<String>,
    format: ValueFormat,
    sites: Vec<Site>,
}

impl CatalogueProbe {
    pub fn new(
        kind: impl Into<String>,
        fields: &[&str],
        format: ValueFormat,
        sites: Vec<Site>,
    ) -> Self {
        Self {
            kind: kind.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            format,
            sites,
        }
    }
}

#[async_trait]
impl IdentifierProbe for CatalogueProbe {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn accepts_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn accepts_value(&self, value: &str) -> bool {
        self.format.accepts(value)
    }

    fn sites(&self) -> &[Site] {
        &self.sites
    }

    async fn fetch(&self, site: &Site, identifier: &str, ctx: &FetchContext) -> SiteOutcome {
        ctx.fetch(site, identifier).await
    }
}

/// Closed list of probe types consulted by the crawler, in registration order.
#[derive(Clone, Default)]
pub struct ProbeRegistry {
    probes: Vec<Arc<dyn IdentifierProbe>>,
}

impl ProbeRegistry {
    pub fn new(probes: Vec<Arc<dyn IdentifierProbe>>) -> Self {
        Self { probes }
    }

    pub fn register(&mut self, probe: Arc<dyn IdentifierProbe>) {
        self.probes.push(probe);
    }

    /// Probes whose `validate(field, value)` holds.
    pub fn matching(&self, field: &str, value: &str) -> Vec<Arc<dyn IdentifierProbe>> {
        self.probes
            .iter()
            .filter(|p| p.validate(field, value))
            .cloned()
            .collect()
    }

    /// Probes whose value format accepts `value`, regardless of field name.
    pub fn matching_value(&self, value: &str) -> Vec<Arc<dyn IdentifierProbe>> {
        self.probes
            .iter()
            .filter(|p| p.accepts_value(value))
            .cloned()
            .collect()
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.kind()).collect()
    }

    pub fn site_count(&self) -> usize {
        self.probes.iter().map(|p| p.sites().len()).sum()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(kind: &str, fields: &[&str], format: ValueFormat) -> Arc<dyn IdentifierProbe> {
        Arc::new(CatalogueProbe::new(
            kind,
            fields,
            format,
            vec![Site::get("site", "http://x/{id}")],
        ))
    }

    #[test]
    fn test_guid_format() {
        assert!(ValueFormat::Guid.accepts("0d6a5a8e-7f6c-4b4c-9b7e-2f1a3c4d5e6f"));
        assert!(!ValueFormat::Guid.accepts("0d6a5a8e7f6c4b4c9b7e2f1a3c4d5e6f1234"));
        assert!(!ValueFormat::Guid.accepts("short-id"));
    }

    #[test]
    fn test_guid_length_counts_characters() {
        let wide = format!("{}-", "ё".repeat(35));
        assert_eq!(wide.len(), 71);
        assert!(ValueFormat::Guid.accepts(&wide));
        let narrow = format!("{}-a", "ё".repeat(17));
        assert_eq!(narrow.len(), 36);
        assert!(!ValueFormat::Guid.accepts(&narrow));
    }

    #[test]
    fn test_register_appends_in_order() {
        let mut registry = ProbeRegistry::default();
        assert!(registry.is_empty());
        registry.register(probe("username", &["username"], ValueFormat::Any));
        registry.register(probe("public_id", &["id"], ValueFormat::Any));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.kinds(), vec!["username", "public_id"]);
    }

    #[test]
    fn test_validate_needs_field_and_format() {
        let guid = probe("messenger_guid", &["yandex_messenger_guid"], ValueFormat::Guid);
        let value = "0d6a5a8e-7f6c-4b4c-9b7e-2f1a3c4d5e6f";
        assert!(guid.validate("yandex_messenger_guid", value));
        assert!(!guid.validate("yandex_messenger_guid", "alice"));
        assert!(!guid.validate("id", value));
    }

    #[test]
    fn test_registry_matching() {
        let registry = ProbeRegistry::new(vec![
            probe("username", &["username"], ValueFormat::Any),
            probe("public_id", &["yandex_public_id", "id"], ValueFormat::Any),
            probe("messenger_guid", &["yandex_messenger_guid"], ValueFormat::Guid),
        ]);

        let kinds = |probes: Vec<Arc<dyn IdentifierProbe>>| {
            probes.iter().map(|p| p.kind().to_string()).collect::<Vec<_>>()
        };
        assert_eq!(kinds(registry.matching("id", "123")), vec!["public_id"]);
        assert!(registry.matching("name", "Alice").is_empty());
        assert_eq!(kinds(registry.matching_value("alice")), vec!["username", "public_id"]);
        assert_eq!(registry.site_count(), 3);
    }

    #[test]
    fn test_blocked_outcome_has_sentinel_field() {
        let fields = SiteOutcome::Blocked.into_fields();
        assert_eq!(
            fields.get(ERROR_FIELD).map(String::as_str),
            Some(SiteOutcome::BLOCKED_MESSAGE)
        );
        assert!(SiteOutcome::NotFound.into_fields().is_empty());
        assert!(
            SiteOutcome::Unavailable(AppError::transport("http://x", "down"))
                .into_fields()
                .is_empty()
        );
    }

    #[test]
    fn test_site_builders() {
        let site = Site::post_form("messenger", "https://x/api")
            .with_form_field("request", "{\"q\": \"{id}\"}")
            .with_field_link("guid", "https://x/chat/{value}");
        assert_eq!(site.request.url_template(), "https://x/api");
        assert!(matches!(site.link, ProfileLink::Field { .. }));
        match &site.request {
            SiteRequest::PostForm { form, .. } => assert_eq!(form.len(), 1),
            SiteRequest::Get { .. } => panic!("expected form request"),
        }
    }
}
