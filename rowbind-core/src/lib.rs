//! # rowbind-core
//!
//! Foundation types shared by every rowbind crate:
//!
//! | Module         | Contents |
//! |----------------|----------|
//! | [`value`]      | [`Value`] and [`Record`], the row representation |
//! | [`error`]      | [`ErrorRecord`] and the single/multiple [`ErrorContainer`] |
//! | [`validation`] | Declarative [`RuleSet`]s, the [`Validator`] contract and [`ValidationBridge`] |
//! | [`config`]     | YAML + `.env` + environment [`Config`] |
//! | [`logging`]    | `tracing` subscriber initialisation |

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;
pub mod value;

pub use config::{Config, ConfigError, ConfigValue, FromConfigValue};
pub use error::{ErrorContainer, ErrorMode, ErrorRecord, DEFAULT_ERROR_CODE};
pub use validation::{FieldRules, RuleSet, RuleValidator, ValidationBridge, Validator};
pub use value::{Record, Value};

pub mod prelude {
    //! Re-exports of the most commonly used core types.
    pub use crate::{record, ErrorRecord, FieldRules, Record, RuleSet, Value};
}
