//! Source adapters.
//!
//! | Adapter | Sources |
//! |---------|---------|
//! | [`HttpSourceAdapter`] | every [`SourceSpec`](crate::catalog::SourceSpec) in the catalog |
//! | [`RenderedPageAdapter`] | `sbv-rendered`, through a headless browser |

mod http;
mod rendered;

pub use http::HttpSourceAdapter;
pub use rendered::{find_browser, RenderedPageAdapter};
