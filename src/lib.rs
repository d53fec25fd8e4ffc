//! STAC validation engine.
//!
//! Validates STAC Catalogs, Collections and Items against their versioned
//! core JSON Schemas plus any extension schemas the document declares in
//! `stac_extensions`. Schemas are fetched on first use (remote, local
//! mirror, or per-identifier override) and cached, compiled, for the rest
//! of the run. API list responses (`/collections`, items endpoints) are
//! validated entry by entry, with failures isolated per entry.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use stac_validate::{validate, ValidationConfig};
//!
//! let config = ValidationConfig::new();
//!
//! // No declared stac_version: the document is skipped, not failed.
//! let report = validate(json!({ "type": "Catalog", "id": "demo" }), &config);
//! assert!(report.skipped);
//! assert_eq!(report.valid, None);
//! assert_eq!(report.messages, vec!["No STAC version found"]);
//! ```
//!
//! Validating against a local schema mirror instead of the network:
//!
//! ```no_run
//! use stac_validate::{validate, ValidationConfig};
//!
//! let config = ValidationConfig::new()
//!     .schema_folder("./stac-spec")
//!     .map_schema(
//!         "https://stac-extensions.github.io/eo/v1.0.0/schema.json",
//!         "./schemas/eo.json",
//!     );
//! let report = validate("./catalog.json", &config);
//! println!("valid: {:?}", report.summary());
//! ```

mod classifier;
mod custom;
mod error;
mod lint;
mod loader;
mod report;
mod resolver;
mod types;
mod validator;

pub use classifier::{classify_payload, classify_type, Payload, TypeOutcome};
pub use custom::{Assertions, CustomValidator};
pub use error::{ConfigError, DocumentError, SchemaError};
pub use lint::{lint_file, LintResult};
pub use loader::{load_file, normalize_path, DefaultLoader, DocumentLoader, SchemaCache};
pub use report::{tidy_issues, Issue, Report, Results, Summary};
pub use resolver::{
    check_version, core_schema_url, extension_schema_url, is_http_url, VersionGate,
    KNOWN_SHORTCUTS,
};
pub use types::{
    ExtensionPolicy, Input, LintMode, ObjectType, ValidationConfig, MIN_STAC_VERSION, SCHEMA_HOST,
};
pub use validator::{validate, validate_with_cache};

#[cfg(feature = "remote")]
pub use loader::load_url;
