//! Provider system for spiderhook
//!
//! Providers come in three ordered collections held by the
//! [`ProviderRegistry`]: download providers (backends fetching links, see
//! [`crate::download`]), source providers (recognize webhook sources) and
//! private tracker providers (introspection only).
//!
//! ## Key Components
//!
//! - [`Provider`] - Name and enabled flag shared by every collection
//! - [`SourceProvider`] - Capability contract used by the webhook router
//! - [`PatternProvider`] - Disposable, downloads the source itself
//! - [`PageScrapeProvider`] - Disposable, downloads every link found on the source page
//! - [`WatchListProvider`] - Persistent, feeds the periodic server
//!
//! ## Example
//!
//! ```rust,ignore
//! use spiderhook::providers::ProviderRegistry;
//!
//! let registry = ProviderRegistry::from_config(&config, client)?;
//! for provider in registry.enabled_source_providers() {
//!     println!("{} -> {:?}", provider.name(), provider.listen_type());
//! }
//! ```

mod page_scrape;
mod pattern;
mod registry;
mod traits;
mod types;
mod watch_list;

pub use page_scrape::PageScrapeProvider;
pub use pattern::PatternProvider;
pub use registry::{ProviderRegistry, PtProviderEntry, RegistryError, provider_status};
pub use traits::{Provider, ProviderError, SourceProvider};
pub use types::{FileType, LinkDescriptor, LinkType, ListenType};
pub use watch_list::{WatchListProvider, WatchState};
