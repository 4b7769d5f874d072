//! Resource catalog for the skydeck console.
//!
//! [`CatalogService`] is the root of the data layer: it loads every
//! resource collection from the active data source (mock fixtures or the
//! live API), caches results through [`sd_store::ResourceStorage`], and
//! gates all write operations on the active mode. [`WizardState`] drives
//! the multi-step server-creation flow; [`ResourceGenerator`] synthesizes
//! the server records it produces.

pub mod catalog;
pub mod generator;
pub mod labels;
pub mod naming;
pub mod pricing;
pub mod wizard;

pub use catalog::{CatalogService, EndpointCall, LoadState};
pub use generator::{CreateConfig, ResourceGenerator, estimate_monthly_price};
pub use labels::parse_labels;
pub use naming::validate_server_name;
pub use pricing::monthly_price;
pub use sd_store::models::ApiMode;
pub use wizard::WizardState;
