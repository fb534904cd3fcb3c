//! Turns raw response bodies into profile fields.

use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::FieldMap;

/// Extraction service: raw body in, field name/value pairs out.
pub trait Extractor: Send + Sync {
    fn extract(&self, body: &str) -> Result<FieldMap>;
}

/// Meta tag prefixes read from HTML pages.
const META_PREFIXES: [&str; 2] = ["og:", "profile:"];

/// Raw JSON keys that also populate a canonical identifying field.
const KEY_ALIASES: [(&str, &str); 3] = [
    ("public_id", "yandex_public_id"),
    ("publicId", "yandex_public_id"),
    ("guid", "yandex_messenger_guid"),
];

/// Default extractor.
///
/// JSON bodies are walked depth-first and every scalar leaf is kept under its
/// own key (first occurrence wins), plus its canonical name for the keys in
/// `KEY_ALIASES`. Anything else is parsed as HTML and its
/// `og:`/`profile:` meta tags are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileExtractor;

impl ProfileExtractor {
    fn extract_json(value: &Value, fields: &mut FieldMap) {
        match value {
            Value::Object(map) => {
                for (key, inner) in map {
                    match inner {
                        Value::Object(_) | Value::Array(_) => Self::extract_json(inner, fields),
                        _ => {
                            if let Some(text) = Self::scalar(inner) {
                                if let Some((_, canonical)) =
                                    KEY_ALIASES.iter().find(|(raw, _)| *raw == key.as_str())
                                {
                                    fields
                                        .entry(canonical.to_string())
                                        .or_insert_with(|| text.clone());
                                }
                                fields.entry(key.clone()).or_insert(text);
                            }
                        }
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    Self::extract_json(item, fields);
                }
            }
            _ => {}
        }
    }

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn extract_html(body: &str) -> Result<FieldMap> {
        let document = Html::parse_document(body);
        let selector = Selector::parse("meta[content]")
            .map_err(|e| AppError::extraction(format!("meta selector: {e:?}")))?;

        let mut fields = FieldMap::new();
        for meta in document.select(&selector) {
            let element = meta.value();
            let Some(key) = element.attr("property").or_else(|| element.attr("name")) else {
                continue;
            };
            let Some(name) = META_PREFIXES.iter().find_map(|p| key.strip_prefix(p)) else {
                continue;
            };
            let content = element.attr("content").unwrap_or_default().trim();
            if name.is_empty() || content.is_empty() {
                continue;
            }
            fields
                .entry(name.replace(':', "_"))
                .or_insert_with(|| content.to_string());
        }
        Ok(fields)
    }
}

impl Extractor for ProfileExtractor {
    fn extract(&self, body: &str) -> Result<FieldMap> {
        let trimmed = body.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let value: Value = serde_json::from_str(trimmed)?;
            let mut fields = FieldMap::new();
            Self::extract_json(&value, &mut fields);
            return Ok(fields);
        }
        Self::extract_html(body)
    }
}
