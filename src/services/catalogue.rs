//! Default probe catalogue.
//!
//! Pure data: which identifier types exist, which fields name them and which
//! sites are queried for each.

use std::sync::Arc;

use crate::services::{CatalogueProbe, ProbeRegistry, Site, ValueFormat};

const MESSENGER_API: &str = "https://yandex.ru/messenger/api/registry/api/";
const MESSENGER_CHAT: &str = "https://yandex.ru/chat#/user/";

/// Registry with the username, public id and messenger guid probes.
pub fn default_registry() -> ProbeRegistry {
    let mut registry = ProbeRegistry::default();
    registry.register(Arc::new(username_probe()));
    registry.register(Arc::new(public_id_probe()));
    registry.register(Arc::new(messenger_guid_probe()));
    registry
}

pub fn username_probe() -> CatalogueProbe {
    CatalogueProbe::new(
        "username",
        &["username"],
        ValueFormat::Any,
        vec![
            Site::get(
                "collections_api",
                "https://yandex.ru/collections/api/users/{id}",
            )
            .with_page("https://yandex.ru/collections/user/{id}/"),
            Site::get(
                "music",
                "https://music.yandex.ru/handlers/library.jsx?owner={id}",
            )
            .with_header("referer", "https://music.yandex.ru/users/{id}/playlists")
            .with_page("https://music.yandex.ru/users/{id}/playlists"),
            Site::get("bugbounty", "https://yandex.ru/bugbounty/researchers/{id}/"),
            Site::post_form("messenger_search", MESSENGER_API)
                .with_form_field(
                    "request",
                    r#"{"method": "search", "params": {"query": "{id}", "limit": 10, "entities": ["messages", "users_and_chats"]}}"#,
                )
                .with_field_link(
                    "yandex_messenger_guid",
                    format!("{MESSENGER_CHAT}{{value}}"),
                ),
            Site::get("music_api", "https://api.music.yandex.net/users/{id}"),
        ],
    )
}

pub fn public_id_probe() -> CatalogueProbe {
    CatalogueProbe::new(
        "public_id",
        &["yandex_public_id", "id"],
        ValueFormat::Any,
        vec![
            Site::get(
                "collections_api",
                "https://yandex.ru/collections/api/users/{id}",
            )
            .with_page("https://yandex.ru/collections/user/{id}/"),
            Site::get("reviews", "https://reviews.yandex.ru/user/{id}"),
            Site::get("znatoki", "https://yandex.ru/q/profile/{id}/"),
            Site::get("zen", "https://zen.yandex.ru/user/{id}"),
            Site::get("market", "https://market.yandex.ru/user/{id}/reviews"),
            Site::get("o", "http://o.yandex.ru/profile/{id}/"),
            Site::get("kinopoisk", "https://www.kinopoisk.ru/user/{id}/"),
        ],
    )
}

pub fn messenger_guid_probe() -> CatalogueProbe {
    CatalogueProbe::new(
        "messenger_guid",
        &["yandex_messenger_guid"],
        ValueFormat::Guid,
        vec![
            Site::post_form("messenger", MESSENGER_API)
                .with_form_field(
                    "request",
                    r#"{"method": "get_users_data", "params": {"guids": ["{id}"]}}"#,
                )
                .with_page(format!("{MESSENGER_CHAT}{{id}}")),
        ],
    )
}
