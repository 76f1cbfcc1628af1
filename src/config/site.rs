//! Typed privacy and services settings read from a resolved store.

use super::key_path::KeyPath;
use super::store::ConfigStore;
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Disqus {
    pub disable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAnalytics {
    pub disable: bool,
    #[serde(rename = "respectdonottrack")]
    pub respect_do_not_track: bool,
    #[serde(rename = "anonymizeip")]
    pub anonymize_ip: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instagram {
    pub disable: bool,
    /// Render a simpler, script-free embed.
    pub simple: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Twitter {
    pub disable: bool,
    #[serde(rename = "enablednt")]
    pub enable_dnt: bool,
    pub simple: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vimeo {
    pub disable: bool,
    pub simple: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTube {
    pub disable: bool,
    #[serde(rename = "privacyenhanced")]
    pub privacy_enhanced: bool,
}

/// Privacy settings for built-in embeds and trackers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Privacy {
    pub disqus: Disqus,
    #[serde(rename = "googleanalytics")]
    pub google_analytics: GoogleAnalytics,
    pub instagram: Instagram,
    pub twitter: Twitter,
    pub vimeo: Vimeo,
    pub youtube: YouTube,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisqusService {
    pub shortname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleAnalyticsService {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedService {
    #[serde(rename = "disableinlinecss")]
    pub disable_inline_css: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rss {
    /// Maximum items per feed; negative means unlimited.
    pub limit: i64,
}

/// Settings for third-party services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Services {
    pub disqus: DisqusService,
    #[serde(rename = "googleanalytics")]
    pub google_analytics: GoogleAnalyticsService,
    pub instagram: EmbedService,
    pub twitter: EmbedService,
    pub rss: Rss,
}

/// Site-level settings exposed to templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub privacy: Privacy,
    pub services: Services,
}

fn decode_section<T: DeserializeOwned + Default>(
    store: &ConfigStore,
    key: &str,
) -> Result<T, ConfigError> {
    let key = KeyPath::new([key]);
    match store.get(&key) {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

impl SiteConfig {
    pub fn decode(store: &ConfigStore) -> Result<Self, ConfigError> {
        let privacy: Privacy = decode_section(store, "privacy")?;
        let mut services: Services = decode_section(store, "services")?;

        // Older top-level spellings.
        if services.disqus.shortname.is_empty() {
            services.disqus.shortname = store.get_string(&KeyPath::new(["disqusshortname"]));
        }
        if services.google_analytics.id.is_empty() {
            services.google_analytics.id = store.get_string(&KeyPath::new(["googleanalytics"]));
        }
        if services.rss.limit == 0 {
            services.rss.limit = store.get_i64(&KeyPath::new(["rsslimit"])).unwrap_or_default();
        }

        Ok(Self { privacy, services })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn store_from(value: Value) -> ConfigStore {
        let Value::Object(map) = value else {
            panic!("not an object")
        };
        let mut store = ConfigStore::new();
        store.merge_config_map(map).unwrap();
        store
    }

    #[test]
    fn test_privacy_flags() {
        let store = store_from(json!({
            "privacy": {
                "googleAnalytics": {"anonymizeIP": true, "respectDoNotTrack": true},
                "twitter": {"enableDNT": true},
                "youTube": {"privacyEnhanced": true},
                "vimeo": {"disable": true}
            }
        }));
        let config = SiteConfig::decode(&store).unwrap();
        assert!(config.privacy.google_analytics.anonymize_ip);
        assert!(config.privacy.google_analytics.respect_do_not_track);
        assert!(config.privacy.twitter.enable_dnt);
        assert!(config.privacy.youtube.privacy_enhanced);
        assert!(config.privacy.vimeo.disable);
        assert!(!config.privacy.disqus.disable);
    }

    #[test]
    fn test_services_fall_back_to_legacy_keys() {
        let store = store_from(json!({
            "disqusShortname": "legacy",
            "googleAnalytics": "UA-1",
            "rssLimit": 20
        }));
        let config = SiteConfig::decode(&store).unwrap();
        assert_eq!(config.services.disqus.shortname, "legacy");
        assert_eq!(config.services.google_analytics.id, "UA-1");
        assert_eq!(config.services.rss.limit, 20);
    }

    #[test]
    fn test_services_section_wins() {
        let store = store_from(json!({
            "disqusShortname": "legacy",
            "services": {
                "disqus": {"shortname": "modern"},
                "rss": {"limit": 5},
                "instagram": {"disableInlineCSS": true}
            }
        }));
        let config = SiteConfig::decode(&store).unwrap();
        assert_eq!(config.services.disqus.shortname, "modern");
        assert_eq!(config.services.rss.limit, 5);
        assert!(config.services.instagram.disable_inline_css);
    }

    #[test]
    fn test_invalid_section() {
        let store = store_from(json!({"privacy": {"twitter": {"disable": "sometimes"}}}));
        let err = SiteConfig::decode(&store).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
