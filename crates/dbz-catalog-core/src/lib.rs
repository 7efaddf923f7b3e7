//! Dragon Ball catalog core library.
//! List pipeline, per-screen list views, record types, the local saga catalog,
//! chart layout for the statistics screens and clients for both catalog sources.

pub mod client;
pub mod config;
pub mod draft;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod sagas;
pub mod stats;
pub mod transformations;
pub mod view;

pub use client::{BackendClient, PublicApiClient, TransformationQuery};
pub use config::CatalogConfig;
pub use draft::{CharacterDraft, ImageUpload};
pub use error::{CatalogError, CatalogResult, FieldError};
pub use pipeline::{normalize_metric, paginate, Listable, Metric, QueryState, ResultPage, SortKey};
pub use records::{
    AffiliationStatsRow, ApiMeta, ApiPage, BackendPage, Character, CharacterWithTransformations,
    Comparison, DashboardStats, LocalCharacter, Transformation,
};
pub use sagas::{Saga, SagaCatalog, SagaOrder, Series};
pub use stats::{BarSeries, ChartArea, ChartPanel, ImageTickOptions, UNAFFILIATED};
pub use view::{ListProfile, ListView, OverflowPolicy, QueryEvent, Screen};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
