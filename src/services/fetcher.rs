//! Shared fetch context: runs one site request and shapes its fields.

use std::sync::Arc;

use crate::models::{DiscoveryConfig, FieldMap, URL_FIELD, URL_SECONDARY_FIELD};
use crate::services::{
    CookieJar, Extractor, ProfileLink, Site, SiteOutcome, SiteRequest, Transport,
};

/// Read-only state shared by every fetch in the process.
#[derive(Clone)]
pub struct FetchContext {
    transport: Arc<dyn Transport>,
    extractor: Arc<dyn Extractor>,
    cookies: Arc<CookieJar>,
    soft_block_markers: Vec<String>,
}

impl FetchContext {
    pub fn new(
        transport: Arc<dyn Transport>,
        extractor: Arc<dyn Extractor>,
        cookies: Arc<CookieJar>,
        discovery: &DiscoveryConfig,
    ) -> Self {
        Self {
            transport,
            extractor,
            cookies,
            soft_block_markers: discovery.soft_block_markers.clone(),
        }
    }

    /// Retrieve `site` for `identifier` and extract its fields.
    pub async fn fetch(&self, site: &Site, identifier: &str) -> SiteOutcome {
        let url = render_url(site.request.url_template(), identifier);
        let headers: Vec<(String, String)> = site
            .headers
            .iter()
            .map(|(name, value)| (name.clone(), render_url(value, identifier)))
            .collect();

        let response = match &site.request {
            SiteRequest::Get { .. } => self.transport.get(&url, &headers, &self.cookies).await,
            SiteRequest::PostForm { form, .. } => {
                let form: Vec<(String, String)> = form
                    .iter()
                    .map(|(name, value)| (name.clone(), render_json(value, identifier)))
                    .collect();
                self.transport
                    .post_form(&url, &headers, &self.cookies, &form)
                    .await
            }
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return SiteOutcome::Unavailable(e),
        };

        // challenge pages often come with 403/429
        if self.is_soft_blocked(&response.body) {
            return SiteOutcome::Blocked;
        }
        if !response.is_success() {
            return SiteOutcome::NotFound;
        }

        let mut fields = match self.extractor.extract(&response.body) {
            Ok(fields) => fields,
            Err(e) => return SiteOutcome::ExtractionFailed(e),
        };
        if fields.is_empty() {
            return SiteOutcome::NotFound;
        }

        let is_get = matches!(site.request, SiteRequest::Get { .. });
        apply_link(&site.link, identifier, &url, is_get, &mut fields);
        SiteOutcome::Found(fields)
    }

    fn is_soft_blocked(&self, body: &str) -> bool {
        self.soft_block_markers.iter().any(|m| body.contains(m.as_str()))
    }
}

/// Add `URL` and, for GET requests routed through another URL, `URL_secondary`.
fn apply_link(
    link: &ProfileLink,
    identifier: &str,
    request_url: &str,
    is_get: bool,
    fields: &mut FieldMap,
) {
    match link {
        ProfileLink::Request => {
            fields.insert(URL_FIELD.to_string(), request_url.to_string());
        }
        ProfileLink::Page(template) => {
            let page = render_url(template, identifier);
            if is_get && page != request_url {
                fields.insert(URL_SECONDARY_FIELD.to_string(), request_url.to_string());
            }
            fields.insert(URL_FIELD.to_string(), page);
        }
        ProfileLink::Field { field, template } => {
            if let Some(value) = fields.get(field).cloned() {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                fields.insert(URL_FIELD.to_string(), template.replace("{value}", &encoded));
            }
        }
    }
}

fn render_url(template: &str, identifier: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(identifier.as_bytes()).collect();
    template.replace("{id}", &encoded)
}

fn render_json(template: &str, identifier: &str) -> String {
    let quoted = serde_json::Value::String(identifier.to_string()).to_string();
    template.replace("{id}", &quoted[1..quoted.len() - 1])
}
