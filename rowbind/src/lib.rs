//! rowbind: an Active-Record row mapper.
//!
//! This facade crate re-exports the rowbind sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use rowbind::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature  | Default | Crate                        |
//! |----------|---------|------------------------------|
//! | `data`   | **yes** | `rowbind-data`               |
//! | `sqlite` | no      | `rowbind-data-sqlx` (SQLite) |
//! | `full`   | no      | All of the above             |

pub extern crate rowbind_cache;
pub extern crate rowbind_core;

// Re-export everything from rowbind-core at the top level for convenience.
pub use rowbind_core::*;

#[cfg(feature = "data")]
pub use rowbind_data;

#[cfg(feature = "sqlite")]
pub use rowbind_data_sqlx;

/// Unified prelude. Import everything with `use rowbind::prelude::*`.
pub mod prelude {
    pub use rowbind_core::prelude::*;

    #[cfg(feature = "data")]
    pub use rowbind_data::prelude::*;

    #[cfg(feature = "sqlite")]
    pub use rowbind_data_sqlx::prelude::*;
}
