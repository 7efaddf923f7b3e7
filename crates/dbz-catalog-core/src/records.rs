//! Record types served by the public API, the first-party backend and the local catalog.

use crate::pipeline::{normalize_metric, Listable, Metric};
use serde::{Deserialize, Deserializer, Serialize};

/// Character as published by the public Dragon Ball API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: u64,
    pub name: String,
    /// Noisy power string, e.g. `"60.000.000"` or `"unknown"`.
    #[serde(default)]
    pub ki: String,
    #[serde(default)]
    pub max_ki: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl Listable for Character {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn group_label(&self) -> Option<&str> {
        Some(self.race.as_str()).filter(|r| !r.is_empty())
    }

    fn metric(&self) -> Metric {
        normalize_metric(&self.ki)
    }
}

/// Pagination block of the public API envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub item_count: u64,
    #[serde(default)]
    pub items_per_page: u64,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub current_page: u64,
}

/// `{ items, meta }` envelope used by the public API and the backend transformations listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub meta: ApiMeta,
}

/// Page envelope of the first-party backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendPage<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Accepts a JSON number or a noisy string; anything unreadable becomes 0.
fn lenient_ki<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        serde_json::Value::String(s) => normalize_metric(&s)
            .map(|m| u64::try_from(m).unwrap_or(u64::MAX))
            .unwrap_or(0),
        _ => 0,
    })
}

/// Character stored in the first-party backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalCharacter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub nombre: String,
    #[serde(default)]
    pub especie: String,
    #[serde(default)]
    pub genero: String,
    #[serde(default, deserialize_with = "lenient_ki")]
    pub base_ki: u64,
    #[serde(default, deserialize_with = "lenient_ki")]
    pub total_ki: u64,
    #[serde(default)]
    pub afiliacion: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    /// Stored file path, when an image was uploaded.
    #[serde(default)]
    pub imagen: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    /// Final URL resolved by the backend.
    #[serde(default)]
    pub imagen_src: Option<String>,
}

impl LocalCharacter {
    /// Resolved image, falling back to the external URL.
    pub fn image(&self) -> Option<&str> {
        self.imagen_src
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.imagen_url.as_deref().filter(|s| !s.is_empty()))
    }
}

impl Listable for LocalCharacter {
    fn display_name(&self) -> &str {
        &self.nombre
    }

    fn group_label(&self) -> Option<&str> {
        Some(self.especie.as_str()).filter(|e| !e.is_empty())
    }

    fn metric(&self) -> Metric {
        Some(u128::from(self.base_ki))
    }
}

/// Result of the backend's two-character comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub personajes: Vec<LocalCharacter>,
    #[serde(default)]
    pub comparacion: serde_json::Value,
}

/// One row of the backend's per-affiliation statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffiliationStatsRow {
    pub nombre: String,
    #[serde(default, deserialize_with = "lenient_ki")]
    pub base_ki: u64,
    #[serde(default, deserialize_with = "lenient_ki")]
    pub total_ki: u64,
    #[serde(default)]
    pub imagen_src: Option<String>,
    #[serde(default)]
    pub imagen: Option<String>,
}

/// Home dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub characters: u64,
    pub transformations: u64,
    pub sagas: u64,
    pub episodes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    pub id: u64,
    pub name: String,
}

/// Character row of the transformations screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterWithTransformations {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
}

impl Listable for CharacterWithTransformations {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn group_label(&self) -> Option<&str> {
        Some(self.race.as_str()).filter(|r| !r.is_empty())
    }

    fn metric(&self) -> Metric {
        Some(self.transformations.len() as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_character_decodes_camel_case() {
        let c: Character = serde_json::from_str(
            r#"{"id":1,"name":"Goku","ki":"60.000.000","maxKi":"90 Septillion","race":"Saiyan",
                "gender":"Male","affiliation":"Z Fighter","image":"https://x/goku.webp","deletedAt":null}"#,
        )
        .unwrap();
        assert_eq!(c.max_ki, "90 Septillion");
        assert_eq!(c.metric(), Some(60_000_000));
        assert_eq!(c.group_label(), Some("Saiyan"));
        assert_eq!(c.description, "");
    }

    #[test]
    fn test_local_character_accepts_noisy_ki() {
        let c: LocalCharacter = serde_json::from_str(
            r#"{"id":3,"nombre":"Krilin","base_ki":"1,000","total_ki":12.7,"imagen_url":"https://x/k.png"}"#,
        )
        .unwrap();
        assert_eq!(c.base_ki, 1000);
        assert_eq!(c.total_ki, 12);
        assert_eq!(c.image(), Some("https://x/k.png"));
        assert_eq!(c.metric(), Some(1000));
    }

    #[test]
    fn test_local_character_prefers_resolved_image() {
        let c = LocalCharacter {
            id: None,
            nombre: "Gohan".into(),
            especie: String::new(),
            genero: String::new(),
            base_ki: 0,
            total_ki: 0,
            afiliacion: String::new(),
            descripcion: None,
            imagen: None,
            imagen_url: Some("https://ext/gohan.png".into()),
            imagen_src: Some("/media/gohan.png".into()),
        };
        assert_eq!(c.image(), Some("/media/gohan.png"));
        assert_eq!(c.group_label(), None);
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_backend_page_defaults() {
        let page: BackendPage<LocalCharacter> = serde_json::from_str(r#"{"count":0}"#).unwrap();
        assert!(page.results.is_empty());
        assert!(page.next.is_none());
    }
}
