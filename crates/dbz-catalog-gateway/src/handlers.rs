//! Route handlers. List endpoints never fail on upstream errors: they log, serve an
//! empty page and report `loaded: false`.

use crate::AppState;
use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dbz_catalog_core::{
    pipeline::page_count,
    sagas::PagedSagas,
    stats::{series_from_backend, series_from_characters},
    transformations::decorate_all,
    CatalogError, CatalogResult, Character, CharacterDraft, CharacterWithTransformations,
    ChartPanel, DashboardStats, FieldError, ImageTickOptions, ImageUpload, Listable, ListView,
    LocalCharacter, QueryEvent, QueryState, ResultPage, Saga, SagaOrder, Screen, SortKey,
    TransformationQuery,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub type ApiError = (StatusCode, Json<Value>);

/// Map a catalog error to a status code and JSON body.
pub fn api_error(err: CatalogError) -> ApiError {
    let status = match &err {
        CatalogError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        CatalogError::Status(code, _) if (400..500).contains(code) => {
            StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        CatalogError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::warn!(error = %err, "upstream call failed");
    }
    let body = match &err {
        CatalogError::Validation(fields) => json!({ "error": err.to_string(), "fields": fields }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() })))
}

/// List query string. `page` is 0-based.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub group: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListParams {
    /// One-shot view for `screen` seeded from the query string.
    pub fn view(&self, state: &AppState, screen: Screen) -> ListView {
        let profile = screen.profile(state.config.page_size);
        let mut query = profile.initial_state();
        query.query = self.q.as_deref().map(str::trim).unwrap_or_default().to_string();
        query.group = self
            .group
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string);
        query.sort = profile.sort_or_default(self.sort.as_deref());
        query.page_index = self.page.unwrap_or(0);
        if let Some(size) = self.page_size {
            query.page_size = size.max(1);
        }
        ListView::with_state(profile, query)
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    #[serde(flatten)]
    pub page: ResultPage<T>,
    pub query: QueryState,
    pub loaded: bool,
}

fn respond<T: Listable + Serialize>(mut view: ListView, records: &[T], loaded: bool) -> Response {
    let page = view.render(records);
    Json(ListResponse {
        page,
        query: view.state().clone(),
        loaded,
    })
    .into_response()
}

/// Render against the stored view for `screen`, keeping any page correction.
fn respond_stored<T: Listable + Serialize>(state: &AppState, screen: Screen, records: &[T], loaded: bool) -> Response {
    let mut view = state
        .views
        .entry(screen)
        .or_insert_with(|| state.new_view(screen));
    let page = view.render(records);
    let query = view.state().clone();
    drop(view);
    Json(ListResponse { page, query, loaded }).into_response()
}

fn or_empty<T>(result: CatalogResult<Vec<T>>, source: &str) -> (Vec<T>, bool) {
    match result {
        Ok(items) => (items, true),
        Err(e) => {
            tracing::warn!(source, error = %e, "source unavailable; serving an empty list");
            (Vec::new(), false)
        }
    }
}

async fn load_characters(state: &AppState) -> (Vec<Character>, bool) {
    or_empty(
        state.public_api.characters(state.config.fetch_limit).await,
        "public_api",
    )
}

async fn load_personajes(state: &AppState, sort: SortKey) -> (Vec<LocalCharacter>, bool) {
    let result = state
        .backend
        .list(sort.backend_ordering())
        .await
        .map(|page| page.results);
    or_empty(result, "backend")
}

async fn load_transformations(state: &AppState) -> (Vec<CharacterWithTransformations>, bool) {
    let (characters, loaded) = load_characters(state).await;
    (decorate_all(&characters), loaded)
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_characters(State(state): State<Arc<AppState>>, Query(params): Query<ListParams>) -> Response {
    let (records, loaded) = load_characters(&state).await;
    respond(params.view(&state, Screen::Characters), &records, loaded)
}

pub async fn list_personajes(State(state): State<Arc<AppState>>, Query(params): Query<ListParams>) -> Response {
    let view = params.view(&state, Screen::Personajes);
    let (records, loaded) = load_personajes(&state, view.state().sort).await;
    respond(view, &records, loaded)
}

pub async fn list_sagas(State(state): State<Arc<AppState>>, Query(params): Query<ListParams>) -> Response {
    respond(params.view(&state, Screen::Sagas), state.sagas.all(), true)
}

#[derive(Debug, Deserialize)]
pub struct PagedSagaParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    #[serde(default)]
    pub order: SagaOrder,
}

/// 1-based catalog paging with series-grouped alphabetical orders.
pub async fn paged_sagas(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PagedSagaParams>,
) -> Json<PagedSagas> {
    Json(state.sagas.paged(
        params.page.unwrap_or(1),
        params.page_size.unwrap_or(state.config.page_size),
        params.search.as_deref(),
        params.order,
    ))
}

pub async fn get_saga(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> Result<Json<Saga>, ApiError> {
    state
        .sagas
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| api_error(CatalogError::NotFound(format!("saga {}", id))))
}

/// Server-paginated transformations. An overflowing page restarts at the first page.
async fn backend_transformations(state: &AppState, query: &QueryState) -> (ResultPage<CharacterWithTransformations>, bool) {
    let page_size = u32::try_from(query.page_size).unwrap_or(u32::MAX);
    // An index with no 1-based u32 page is past any upstream population; it
    // restarts at page 1 like any other overflowing page.
    let requested = u32::try_from(query.page_index)
        .ok()
        .and_then(|index| index.checked_add(1));
    let mut tq = TransformationQuery {
        page: requested.unwrap_or(1),
        page_size,
        search: Some(query.query.clone()),
        race: query.group.clone(),
        order_by: Some("name".to_string()),
        order_dir: Some("asc".to_string()),
    };
    let mut result = state.backend.transformations(&tq).await;
    if let Ok(resp) = &result {
        if resp.items.is_empty() && resp.meta.total_items > 0 && tq.page > 1 {
            tq.page = 1;
            result = state.backend.transformations(&tq).await;
        }
    }
    match result {
        Ok(resp) => {
            let total = resp.meta.total_items as usize;
            let page = ResultPage {
                items: resp.items,
                total_count: total,
                page_index: tq.page as usize - 1,
                page_size: page_size as usize,
                page_count: page_count(total, page_size as usize),
            };
            (page, true)
        }
        Err(e) => {
            tracing::warn!(source = "backend", error = %e, "transformations unavailable");
            (ResultPage::empty(query.page_index, query.page_size), false)
        }
    }
}

pub async fn list_transformations(State(state): State<Arc<AppState>>, Query(params): Query<ListParams>) -> Response {
    let view = params.view(&state, Screen::Transformations);
    if state.config.use_backend_transformations {
        let (page, loaded) = backend_transformations(&state, view.state()).await;
        let mut query = view.state().clone();
        query.page_index = page.page_index;
        query.page_size = page.page_size;
        return Json(ListResponse { page, query, loaded }).into_response();
    }
    let (records, loaded) = load_transformations(&state).await;
    respond(view, &records, loaded)
}

pub async fn get_personaje(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<LocalCharacter>, ApiError> {
    state.backend.get(id).await.map(Json).map_err(api_error)
}

/// Character draft from a JSON body, or from `multipart/form-data` with the image
/// file in the `imagen` part.
pub struct DraftPayload(pub CharacterDraft);

fn rejection(status: StatusCode, message: String) -> ApiError {
    (status, Json(json!({ "error": message })))
}

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for DraftPayload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));
        if !is_multipart {
            let Json(draft) = Json::<CharacterDraft>::from_request(req, state)
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            return Ok(DraftPayload(draft));
        }
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        draft_from_multipart(multipart).await.map(DraftPayload)
    }
}

async fn draft_from_multipart(mut multipart: Multipart) -> Result<CharacterDraft, ApiError> {
    let mut draft = CharacterDraft::default();
    let mut errors: Vec<FieldError> = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejection(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "imagen" {
            let file_name = field.file_name().unwrap_or("imagen").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| rejection(e.status(), e.body_text()))?;
            if !bytes.is_empty() {
                draft.image_file = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| rejection(e.status(), e.body_text()))?;
        if let Err(e) = draft.set_form_field(&name, value) {
            errors.push(e);
        }
    }
    if errors.is_empty() {
        Ok(draft)
    } else {
        Err(api_error(CatalogError::Validation(errors)))
    }
}

pub async fn create_personaje(
    State(state): State<Arc<AppState>>,
    DraftPayload(draft): DraftPayload,
) -> Result<(StatusCode, Json<LocalCharacter>), ApiError> {
    let draft = draft.validate().map_err(api_error)?;
    let created = state.backend.create(&draft).await.map_err(api_error)?;
    tracing::info!(id = ?created.id, nombre = %created.nombre, "personaje created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_personaje(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    DraftPayload(draft): DraftPayload,
) -> Result<Json<LocalCharacter>, ApiError> {
    let draft = draft.validate().map_err(api_error)?;
    let updated = state.backend.update(id, &draft).await.map_err(api_error)?;
    tracing::info!(id, "personaje updated");
    Ok(Json(updated))
}

pub async fn delete_personaje(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> Result<StatusCode, ApiError> {
    state.backend.delete(id).await.map_err(api_error)?;
    tracing::info!(id, "personaje deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub ids: String,
}

/// `ids=a,b` → both ids, or a 400.
fn parse_pair(raw: &str) -> Result<(u64, u64), ApiError> {
    let ids: Vec<u64> = raw
        .split(',')
        .map(|s| s.trim().parse::<u64>())
        .collect::<Result<_, _>>()
        .map_err(|_| bad_request(format!("ids must be numeric: {}", raw)))?;
    match ids.as_slice() {
        [a, b] => Ok((*a, *b)),
        _ => Err(bad_request("ids must name exactly two characters")),
    }
}

pub async fn compare_personajes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompareParams>,
) -> Result<Json<Value>, ApiError> {
    let (a, b) = parse_pair(&params.ids)?;
    let cmp = state.backend.compare(a, b).await.map_err(api_error)?;
    Ok(Json(json!(cmp)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub source: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse {
    pub panels: Vec<ChartPanel>,
    pub loaded: bool,
}

pub async fn affiliation_charts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChartParams>,
) -> Result<Json<ChartsResponse>, ApiError> {
    let width = params.width.filter(|w| *w > 0.0).unwrap_or(960.0);
    let height = params.height.filter(|h| *h > 0.0).unwrap_or(420.0);
    let placeholder = state.config.placeholder_image.as_str();

    let (series, opts, loaded) = match params.source.as_deref().unwrap_or("api") {
        "api" => {
            let (characters, loaded) = load_characters(&state).await;
            (series_from_characters(&characters, placeholder), ImageTickOptions::default(), loaded)
        }
        "backend" => match state.backend.affiliation_stats().await {
            Ok(groups) => (series_from_backend(&groups, placeholder), ImageTickOptions::emphasized(), true),
            Err(e) => {
                tracing::warn!(source = "backend", error = %e, "statistics unavailable");
                (Vec::new(), ImageTickOptions::emphasized(), false)
            }
        },
        other => return Err(bad_request(format!("unknown source: {}", other))),
    };

    let panels = series
        .into_iter()
        .map(|s| ChartPanel::new(s, width, height, &opts))
        .collect();
    Ok(Json(ChartsResponse { panels, loaded }))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub loaded: bool,
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    match state.backend.dashboard().await {
        Ok(stats) => Json(DashboardResponse { stats, loaded: true }),
        Err(e) => {
            tracing::warn!(source = "backend", error = %e, "dashboard counters unavailable");
            Json(DashboardResponse {
                stats: DashboardStats::default(),
                loaded: false,
            })
        }
    }
}

/// Load the records for `screen` and render them through its stored view.
async fn render_screen(state: &AppState, screen: Screen, query: QueryState) -> Response {
    match screen {
        Screen::Characters => {
            let (records, loaded) = load_characters(state).await;
            respond_stored(state, screen, &records, loaded)
        }
        Screen::Personajes => {
            let (records, loaded) = load_personajes(state, query.sort).await;
            respond_stored(state, screen, &records, loaded)
        }
        Screen::Sagas => respond_stored(state, screen, state.sagas.all(), true),
        Screen::Transformations if state.config.use_backend_transformations => {
            let (page, loaded) = backend_transformations(state, &query).await;
            let mut query = query;
            if page.page_index != query.page_index {
                query.page_index = page.page_index;
                if let Some(mut view) = state.views.get_mut(&screen) {
                    view.apply(QueryEvent::Page {
                        index: page.page_index,
                        size: query.page_size,
                    });
                }
            }
            Json(ListResponse { page, query, loaded }).into_response()
        }
        Screen::Transformations => {
            let (records, loaded) = load_transformations(state).await;
            respond_stored(state, screen, &records, loaded)
        }
    }
}

pub async fn current_view(State(state): State<Arc<AppState>>, Path(screen): Path<Screen>) -> Response {
    let query = state
        .views
        .entry(screen)
        .or_insert_with(|| state.new_view(screen))
        .state()
        .clone();
    render_screen(&state, screen, query).await
}

/// Reduce one event into the stored view, then render the resulting page.
pub async fn view_event(
    State(state): State<Arc<AppState>>,
    Path(screen): Path<Screen>,
    Json(event): Json<QueryEvent>,
) -> Response {
    let query = {
        let mut view = state
            .views
            .entry(screen)
            .or_insert_with(|| state.new_view(screen));
        view.apply(event);
        view.state().clone()
    };
    render_screen(&state, screen, query).await
}
