//! Offline resolver: substring lookup against the station directory.
//!
//! Used when no provider credential is configured. Composes replies from
//! templates and waits a fixed, configurable delay so the assistant panel
//! shows its pending state the same way it does online.

use std::time::Duration;

use async_trait::async_trait;

use gridmap_core::config::AssistantConfig;
use gridmap_core::{Station, StationDirectory};

use super::{QueryResolver, ResolverMode, NOT_FOUND_REPLY};
use crate::annotator::entity_token;

/// A query shorter than this only matches when it contains a whole name.
const MIN_PARTIAL_QUERY_LEN: usize = 3;

/// Template-based resolver over the in-memory directory.
#[derive(Debug, Clone)]
pub struct OfflineResolver {
    delay: Duration,
    max_similar: usize,
}

impl OfflineResolver {
    pub fn new(delay: Duration, max_similar: usize) -> Self {
        Self { delay, max_similar }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        Self::new(
            Duration::from_millis(config.offline_delay_ms),
            config.max_similar,
        )
    }

    /// Stations matching the query, in directory order.
    ///
    /// A station matches when its name is contained in the query, when the
    /// query (at least three characters) is contained in its name, or when
    /// its code is contained in the query. Comparisons ignore case.
    pub fn candidates<'a>(&self, query: &str, directory: &'a StationDirectory) -> Vec<&'a Station> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Vec::new();
        }
        let allow_partial = normalized.chars().count() >= MIN_PARTIAL_QUERY_LEN;

        directory
            .iter()
            .filter(|station| {
                let name = station.name.trim().to_lowercase();
                if name.is_empty() {
                    return false;
                }
                let code_hit = station.code.as_deref().is_some_and(|code| {
                    let code = code.trim().to_lowercase();
                    !code.is_empty() && normalized.contains(&code)
                });
                normalized.contains(&name)
                    || (allow_partial && name.contains(&normalized))
                    || code_hit
            })
            .collect()
    }

    /// Compose the reply text for a candidate list.
    pub fn compose(&self, candidates: &[&Station]) -> String {
        let Some((main, rest)) = candidates.split_first() else {
            return NOT_FOUND_REPLY.to_string();
        };

        let mut reply = format!(
            "{} é uma {} localizada na zona {}.",
            main.name,
            main.kind.descriptor(),
            main.zone.label()
        );
        if let Some(address) = main.address.as_deref().filter(|a| !a.trim().is_empty()) {
            reply.push_str(&format!(" Endereço: {}.", address));
        }
        reply.push(' ');
        reply.push_str(&entity_token(&main.id));

        if !rest.is_empty() && self.max_similar > 0 {
            let similar: Vec<&str> = rest
                .iter()
                .take(self.max_similar)
                .map(|s| s.name.as_str())
                .collect();
            reply.push_str("\n\nResultados semelhantes: ");
            reply.push_str(&similar.join(", "));
        }
        reply
    }
}

#[async_trait]
impl QueryResolver for OfflineResolver {
    fn mode(&self) -> ResolverMode {
        ResolverMode::Offline
    }

    async fn resolve(&self, query: &str, directory: &StationDirectory) -> String {
        let candidates = self.candidates(query, directory);
        tracing::debug!(
            candidates = candidates.len(),
            main = candidates.first().map(|s| s.id.as_str()),
            "Offline query resolved"
        );
        let reply = self.compose(&candidates);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmap_core::{StationKind, Zone};

    fn resolver() -> OfflineResolver {
        OfflineResolver::new(Duration::ZERO, 3)
    }

    fn station(id: &str, name: &str, zone: Zone) -> Station {
        Station {
            id: id.to_string(),
            name: name.to_string(),
            kind: StationKind::Etd,
            zone,
            lat: -23.5,
            lng: -46.6,
            code: None,
            address: None,
            voltage: None,
            description: None,
        }
    }

    fn directory() -> StationDirectory {
        StationDirectory::builtin().unwrap()
    }

    #[tokio::test]
    async fn test_resolve_barueri() {
        let dir = directory();
        let reply = resolver().resolve("Barueri", &dir).await;
        assert!(reply.contains("{{STATION_ID:w1}}"), "reply: {reply}");
        assert!(reply.contains("Oeste"));
        assert!(reply.contains("subestação"));
        assert!(reply.contains("Endereço: Av. Henriqueta Mendes Guerra, Barueri - SP."));
    }

    #[tokio::test]
    async fn test_resolve_full_sentence_containing_name() {
        let dir = directory();
        let reply = resolver().resolve("Onde fica a ETD Barueri?", &dir).await;
        assert!(reply.starts_with("ETD Barueri é uma subestação"));
        assert!(reply.contains("{{STATION_ID:w1}}"));
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let dir = directory();
        let reply = resolver().resolve("zzz-nonexistent-zzz", &dir).await;
        assert_eq!(reply, NOT_FOUND_REPLY);
        assert!(!reply.contains("{{STATION_ID:"));
    }

    #[tokio::test]
    async fn test_resolve_empty_and_whitespace_queries() {
        let dir = directory();
        assert_eq!(resolver().resolve("", &dir).await, NOT_FOUND_REPLY);
        assert_eq!(resolver().resolve("   \n\t", &dir).await, NOT_FOUND_REPLY);
    }

    #[tokio::test]
    async fn test_resolve_similar_list_capped_at_three() {
        let dir = StationDirectory::from_stations(vec![
            station("a", "ETD Vila Alfa", Zone::West),
            station("b", "ETD Vila Beta", Zone::East),
            station("c", "ETD Vila Gama", Zone::East),
            station("d", "ETD Vila Delta", Zone::SouthAbc),
            station("x", "ETD Centro", Zone::NorthCentral),
        ])
        .unwrap();
        let reply = resolver().resolve("vila", &dir).await;

        assert!(reply.starts_with("ETD Vila Alfa é uma subestação localizada na zona Oeste."));
        assert!(reply.contains("{{STATION_ID:a}}"));
        let (_, similar) = reply.split_once("Resultados semelhantes: ").unwrap();
        let names: Vec<&str> = similar.split(", ").collect();
        assert_eq!(names, vec!["ETD Vila Beta", "ETD Vila Gama", "ETD Vila Delta"]);
        // Only the main station carries a tag
        assert_eq!(reply.matches("{{STATION_ID:").count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_more_than_four_matches_still_three_similar() {
        let dir = directory();
        let reply = resolver().resolve("ETD", &dir).await;
        let (_, similar) = reply.split_once("Resultados semelhantes: ").unwrap();
        assert_eq!(similar.split(", ").count(), 3);
    }

    #[test]
    fn test_single_match_has_no_similar_section() {
        let dir = directory();
        let candidates = resolver().candidates("alphaville", &dir);
        let reply = resolver().compose(&candidates);
        assert!(!reply.contains("Resultados semelhantes"));
        assert!(reply.contains("{{STATION_ID:w2}}"));
    }

    #[test]
    fn test_candidates_by_code() {
        let dir = directory();
        let ids: Vec<&str> = resolver()
            .candidates("dados da ALP por favor", &dir)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["w2"]);
    }

    #[test]
    fn test_nonsense_query_against_loaded_file_is_not_found() {
        let toml = r#"
[[stations]]
id = "w1"
name = "ETD Barueri"
type = "ETD"
zone = "WEST"
lat = -23.51
lng = -46.87
"#;
        let dir = StationDirectory::from_toml_str(toml).unwrap();
        assert!(resolver().candidates("qwerty uiop", &dir).is_empty());
        assert!(StationDirectory::from_toml_str(&toml.replace("ETD Barueri", "")).is_err());
    }

    #[test]
    fn test_short_query_does_not_match_every_name() {
        let dir = directory();
        assert!(resolver().candidates("a", &dir).is_empty());
        assert!(resolver().candidates("e", &dir).is_empty());
    }

    #[test]
    fn test_candidates_keep_directory_order() {
        let dir = directory();
        let ids: Vec<&str> = resolver()
            .candidates("osasco", &dir)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["w3", "w4"]);
    }

    #[test]
    fn test_descriptor_by_kind() {
        let dir = directory();
        let base = resolver().compose(&resolver().candidates("Base Operacional Barra Funda", &dir));
        assert!(base.contains("base operacional"));
        let esd = resolver().compose(&resolver().candidates("ESD Cotia", &dir));
        assert!(esd.starts_with("ESD Cotia é uma ESD localizada na zona Oeste."));
    }

    #[test]
    fn test_zero_max_similar_omits_list() {
        let dir = directory();
        let r = OfflineResolver::new(Duration::ZERO, 0);
        let reply = r.compose(&r.candidates("ETD", &dir));
        assert!(!reply.contains("Resultados semelhantes"));
    }

    #[tokio::test]
    async fn test_resolve_waits_configured_delay() {
        let dir = directory();
        let r = OfflineResolver::new(Duration::from_millis(30), 3);
        let started = std::time::Instant::now();
        r.resolve("Barueri", &dir).await;
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_mode_is_offline() {
        assert_eq!(resolver().mode(), ResolverMode::Offline);
    }
}
