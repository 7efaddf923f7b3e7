//! HTTP clients for the two catalog sources: the public Dragon Ball API and the
//! first-party backend reached through its proxy prefix.

use crate::config::CatalogConfig;
use crate::draft::CharacterDraft;
use crate::error::{CatalogError, CatalogResult};
use crate::records::{
    AffiliationStatsRow, ApiPage, BackendPage, Character, CharacterWithTransformations, Comparison,
    DashboardStats, LocalCharacter,
};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Check the status, then decode the body. 404 maps to `NotFound`.
async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> CatalogResult<T> {
    let status = res.status();
    let url = res.url().to_string();
    let text = res.text().await?;
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(CatalogError::NotFound(url));
    }
    if !status.is_success() {
        return Err(CatalogError::Status(status.as_u16(), text));
    }
    Ok(serde_json::from_str(&text)?)
}

fn build_http(timeout: Duration) -> CatalogResult<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Client for `https://dragonball-api.com/api`.
#[derive(Debug, Clone)]
pub struct PublicApiClient {
    http: reqwest::Client,
    base: String,
}

impl PublicApiClient {
    pub fn new(base: &str, timeout: Duration) -> CatalogResult<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &CatalogConfig) -> CatalogResult<Self> {
        Self::new(&cfg.public_api_url, cfg.request_timeout())
    }

    /// Whole character list in one request (`?limit=N`), unwrapped from the envelope.
    pub async fn characters(&self, limit: u32) -> CatalogResult<Vec<Character>> {
        let page = self.characters_page(limit, None).await?;
        tracing::debug!(count = page.items.len(), "public API characters fetched");
        Ok(page.items)
    }

    /// One page with its `meta` block. `page` is 1-based.
    pub async fn characters_page(&self, limit: u32, page: Option<u32>) -> CatalogResult<ApiPage<Character>> {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
        if let Some(p) = page {
            query.push(("page", p.max(1).to_string()));
        }
        let res = self
            .http
            .get(format!("{}/characters", self.base))
            .query(&query)
            .send()
            .await?;
        decode(res).await
    }
}

/// Query for the backend transformations listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationQuery {
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub race: Option<String>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
}

impl TransformationQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.max(1).to_string()),
            ("pageSize", self.page_size.max(1).to_string()),
        ];
        let optional = [
            ("search", &self.search),
            ("race", &self.race),
            ("orderBy", &self.order_by),
            ("orderDir", &self.order_dir),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                params.push((key, v.to_string()));
            }
        }
        params
    }
}

/// Client for the first-party backend (`{backend_url}/api/...`).
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: String,
}

impl BackendClient {
    pub fn new(base: &str, timeout: Duration) -> CatalogResult<Self> {
        Ok(Self {
            http: build_http(timeout)?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(cfg: &CatalogConfig) -> CatalogResult<Self> {
        Self::new(&cfg.backend_url, cfg.request_timeout())
    }

    fn personajes(&self) -> String {
        format!("{}/api/personajes/", self.base)
    }

    fn personaje(&self, id: u64) -> String {
        format!("{}/api/personajes/{}/", self.base, id)
    }

    /// List characters. `ordering` is forwarded as-is (`nombre`, `-base_ki`, ...).
    pub async fn list(&self, ordering: Option<&str>) -> CatalogResult<BackendPage<LocalCharacter>> {
        let mut req = self.http.get(self.personajes());
        if let Some(o) = ordering.filter(|o| !o.is_empty()) {
            req = req.query(&[("ordering", o)]);
        }
        decode(req.send().await?).await
    }

    pub async fn get(&self, id: u64) -> CatalogResult<LocalCharacter> {
        decode(self.http.get(self.personaje(id)).send().await?).await
    }

    /// Create from a validated draft. JSON when there is no file, multipart otherwise.
    pub async fn create(&self, draft: &CharacterDraft) -> CatalogResult<LocalCharacter> {
        let req = self.http.post(self.personajes());
        decode(Self::with_body(req, draft).send().await?).await
    }

    /// Partial update (PATCH) from a validated draft.
    pub async fn update(&self, id: u64, draft: &CharacterDraft) -> CatalogResult<LocalCharacter> {
        let req = self.http.patch(self.personaje(id));
        decode(Self::with_body(req, draft).send().await?).await
    }

    pub async fn delete(&self, id: u64) -> CatalogResult<()> {
        let res = self.http.delete(self.personaje(id)).send().await?;
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(format!("personaje {}", id)));
        }
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(CatalogError::Status(status.as_u16(), text));
        }
        Ok(())
    }

    /// Both characters plus the backend's ki differences.
    pub async fn compare(&self, a: u64, b: u64) -> CatalogResult<Comparison> {
        let res = self
            .http
            .get(format!("{}comparar/", self.personajes()))
            .query(&[("ids", format!("{},{}", a, b))])
            .send()
            .await?;
        decode(res).await
    }

    /// Per-affiliation rows, in the order the backend lists the groups.
    pub async fn affiliation_stats(&self) -> CatalogResult<IndexMap<String, Vec<AffiliationStatsRow>>> {
        let res = self
            .http
            .get(format!("{}estadisticas/", self.personajes()))
            .send()
            .await?;
        decode(res).await
    }

    pub async fn dashboard(&self) -> CatalogResult<DashboardStats> {
        let res = self
            .http
            .get(format!("{}/api/statistics/dashboard/", self.base))
            .send()
            .await?;
        decode(res).await
    }

    /// Server-paginated characters with their transformations.
    pub async fn transformations(&self, q: &TransformationQuery) -> CatalogResult<ApiPage<CharacterWithTransformations>> {
        let res = self
            .http
            .get(format!("{}/api/personajes/with-transformations", self.base))
            .query(&q.params())
            .send()
            .await?;
        decode(res).await
    }

    fn with_body(req: reqwest::RequestBuilder, draft: &CharacterDraft) -> reqwest::RequestBuilder {
        match &draft.image_file {
            None => req.json(draft),
            Some(upload) => {
                let mut form = reqwest::multipart::Form::new();
                for (key, value) in draft.form_fields() {
                    form = form.text(key, value);
                }
                let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone());
                req.multipart(form.part("imagen", part))
            }
        }
    }
}
