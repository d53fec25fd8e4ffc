//! Document and schema loading.
//!
//! [`DocumentLoader`] fetches JSON by path or URL. [`SchemaCache`] sits on
//! top of it: it rewrites schema identifiers through the configured schema
//! map and schema folder, caches raw schema JSON and compiled validators by
//! canonical identifier, and feeds nested `$ref` resolution back through
//! itself via the compiler's retriever hook.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use tracing::debug;

use crate::custom::CustomValidator;
use crate::error::{DocumentError, SchemaError};
use crate::types::{ValidationConfig, SCHEMA_HOST};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Loads JSON documents and schemas by path or URL.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, uri: &str) -> Result<Value, DocumentError>;
}

/// Filesystem and HTTP(S) loader. HTTP requires the `remote` feature
/// (enabled by default).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoader;

impl DocumentLoader for DefaultLoader {
    fn load(&self, uri: &str) -> Result<Value, DocumentError> {
        match scheme(uri) {
            Some(s) if s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https") => {
                #[cfg(feature = "remote")]
                {
                    load_url(uri)
                }
                #[cfg(not(feature = "remote"))]
                {
                    Err(DocumentError::UnsupportedProtocol {
                        scheme: s.to_string(),
                    })
                }
            }
            // Single letters are Windows drive prefixes, not protocols
            Some(s) if s.len() > 1 && !s.eq_ignore_ascii_case("file") => {
                Err(DocumentError::UnsupportedProtocol {
                    scheme: s.to_string(),
                })
            }
            _ => load_file(Path::new(uri.strip_prefix("file://").unwrap_or(uri))),
        }
    }
}

/// Read and parse a local JSON file.
pub fn load_file(path: &Path) -> Result<Value, DocumentError> {
    if !path.exists() {
        return Err(DocumentError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DocumentError::InvalidJson { source })
}

/// Fetch and parse JSON over HTTP(S).
#[cfg(feature = "remote")]
pub fn load_url(url: &str) -> Result<Value, DocumentError> {
    let network = |source| DocumentError::Network {
        url: url.to_string(),
        source,
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;
    let response = client.get(url).send().map_err(network)?;
    let response = response.error_for_status().map_err(network)?;
    response.json().map_err(network)
}

fn scheme(uri: &str) -> Option<&str> {
    let idx = uri.find("://")?;
    let scheme = &uri[..idx];
    let valid = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+-.".contains(c));
    valid.then_some(scheme)
}

/// Forward slashes, no trailing slash. Used for report ids.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_end_matches('/').to_string()
}

/// Where a schema identifier actually loads from after substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Remote(String),
    Local(PathBuf),
}

impl Location {
    fn as_loader_uri(&self) -> String {
        match self {
            Location::Remote(url) => url.clone(),
            Location::Local(path) => path.display().to_string(),
        }
    }
}

/// Apply the schema map and schema folder to an identifier.
///
/// Schema map entries are checked in declaration order; the first prefix
/// match wins. The schema folder stands in for the canonical
/// `https://schemas.stacspec.org/v{version}` prefix.
fn substitute(
    uri: &str,
    schema_map: &[(String, PathBuf)],
    schema_folder: Option<&Path>,
) -> Location {
    for (prefix, target) in schema_map {
        if let Some(remainder) = uri.strip_prefix(prefix.as_str()) {
            let remainder = remainder.trim_start_matches('/');
            return if remainder.is_empty() {
                Location::Local(target.clone())
            } else {
                Location::Local(target.join(remainder))
            };
        }
    }
    if let Some(folder) = schema_folder {
        let versioned = format!("{SCHEMA_HOST}/v");
        if let Some(rest) = uri.strip_prefix(&versioned) {
            if let Some(slash) = rest.find('/') {
                return Location::Local(folder.join(rest[slash..].trim_start_matches('/')));
            }
        }
    }
    Location::Remote(uri.to_string())
}

/// Fetches raw schema JSON, shared between the cache and the compiler's
/// `$ref` retriever. Identifiers are canonical (pre-substitution); failed
/// loads are cached so they are reported once and never re-attempted.
struct SchemaFetcher {
    schema_map: Vec<(String, PathBuf)>,
    schema_folder: Option<PathBuf>,
    loader: Arc<dyn DocumentLoader>,
    raw: Mutex<HashMap<String, Value>>,
    failed: Mutex<HashMap<String, SchemaError>>,
}

impl SchemaFetcher {
    fn fetch(&self, uri: &str) -> Result<Value, SchemaError> {
        if let Some(schema) = self.raw.lock().unwrap().get(uri) {
            return Ok(schema.clone());
        }
        if let Some(error) = self.failed.lock().unwrap().get(uri) {
            return Err(error.clone());
        }

        let location = substitute(uri, &self.schema_map, self.schema_folder.as_deref());
        debug!(identifier = uri, location = %location.as_loader_uri(), "loading schema");
        let mut schema = self
            .loader
            .load(&location.as_loader_uri())
            .map_err(|error| {
                let error = SchemaError::load(uri, &error);
                self.failed
                    .lock()
                    .unwrap()
                    .insert(uri.to_string(), error.clone());
                error
            })?;

        // Keep internal $refs and the cache addressed canonically even when
        // the bytes came from a local mirror.
        if let Value::Object(object) = &mut schema {
            object
                .entry("$id")
                .or_insert_with(|| Value::String(uri.to_string()));
        }

        self.raw
            .lock()
            .unwrap()
            .insert(uri.to_string(), schema.clone());
        Ok(schema)
    }
}

/// Routes the compiler's external `$ref` lookups through the fetcher, so
/// nested references hit the same substitution rules and caches.
struct RefRetriever(Arc<SchemaFetcher>);

impl Retrieve for RefRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.fetch(uri.as_str())?)
    }
}

/// Process-wide cache of compiled validators, keyed by canonical schema
/// identifier. Create one per run and share it across all documents.
pub struct SchemaCache {
    fetcher: Arc<SchemaFetcher>,
    validators: HashMap<String, Arc<Validator>>,
    custom: Option<Arc<dyn CustomValidator>>,
}

impl SchemaCache {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            fetcher: Arc::new(SchemaFetcher {
                schema_map: config.schema_map.clone(),
                schema_folder: config.schema_folder.clone(),
                loader: config.loader.clone(),
                raw: Mutex::new(HashMap::new()),
                failed: Mutex::new(HashMap::new()),
            }),
            validators: HashMap::new(),
            custom: config.custom.clone(),
        }
    }

    /// Return the compiled validator for a schema identifier, fetching and
    /// compiling on first use.
    pub fn validator(&mut self, uri: &str) -> Result<Arc<Validator>, SchemaError> {
        if let Some(validator) = self.validators.get(uri) {
            return Ok(validator.clone());
        }

        let schema = self.fetcher.fetch(uri)?;
        let mut options = jsonschema::options();
        options.with_retriever(RefRetriever(self.fetcher.clone()));
        if let Some(custom) = &self.custom {
            options = custom.configure_compiler(options);
        }
        let validator = options.build(&schema).map_err(|error| SchemaError::Compile {
            uri: uri.to_string(),
            message: error.to_string(),
        })?;

        let validator = Arc::new(validator);
        self.validators.insert(uri.to_string(), validator.clone());
        Ok(validator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, NamedTempFile};

    struct CountingLoader {
        schemas: HashMap<String, Value>,
        calls: AtomicUsize,
    }

    impl CountingLoader {
        fn new(schemas: HashMap<String, Value>) -> Self {
            Self {
                schemas,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentLoader for CountingLoader {
        fn load(&self, uri: &str) -> Result<Value, DocumentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.schemas
                .get(uri)
                .cloned()
                .ok_or_else(|| DocumentError::FileNotFound {
                    path: PathBuf::from(uri),
                })
        }
    }

    fn config_with_loader(loader: Arc<CountingLoader>) -> ValidationConfig {
        ValidationConfig::new().loader(loader)
    }

    #[test]
    fn load_file_valid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "Catalog"}}"#).unwrap();
        let value = load_file(file.path()).unwrap();
        assert_eq!(value["type"], "Catalog");
    }

    #[test]
    fn load_file_not_found() {
        let result = load_file(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(DocumentError::FileNotFound { .. })));
    }

    #[test]
    fn load_file_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let result = load_file(file.path());
        assert!(matches!(result, Err(DocumentError::InvalidJson { .. })));
    }

    #[test]
    fn default_loader_rejects_unknown_protocol() {
        let result = DefaultLoader.load("ftp://example.com/catalog.json");
        assert!(matches!(
            result,
            Err(DocumentError::UnsupportedProtocol { scheme }) if scheme == "ftp"
        ));
    }

    #[test]
    fn default_loader_treats_drive_letters_as_paths() {
        // "c://foo" must not be rejected as protocol "c"
        let result = DefaultLoader.load("c://no/such/file.json");
        assert!(matches!(result, Err(DocumentError::FileNotFound { .. })));
    }

    #[test]
    fn normalize_path_cases() {
        assert_eq!(normalize_path("a\\b\\c.json"), "a/b/c.json");
        assert_eq!(normalize_path("a/b/"), "a/b");
        assert_eq!(normalize_path("a/b.json"), "a/b.json");
    }

    #[test]
    fn substitute_prefers_first_map_entry() {
        let map = vec![
            ("https://x.example/".to_string(), PathBuf::from("/one")),
            ("https://x.example/sub/".to_string(), PathBuf::from("/two")),
        ];
        let location = substitute("https://x.example/sub/s.json", &map, None);
        assert_eq!(location, Location::Local(PathBuf::from("/one/sub/s.json")));
    }

    #[test]
    fn substitute_whole_identifier_maps_to_file() {
        let map = vec![(
            "https://x.example/s.json".to_string(),
            PathBuf::from("/local/s.json"),
        )];
        let location = substitute("https://x.example/s.json", &map, None);
        assert_eq!(location, Location::Local(PathBuf::from("/local/s.json")));
    }

    #[test]
    fn substitute_schema_folder_replaces_versioned_prefix() {
        let location = substitute(
            "https://schemas.stacspec.org/v1.0.0/item-spec/json-schema/item.json",
            &[],
            Some(Path::new("/schemas")),
        );
        assert_eq!(
            location,
            Location::Local(PathBuf::from("/schemas/item-spec/json-schema/item.json"))
        );
    }

    #[test]
    fn substitute_leaves_other_urls_remote() {
        let location = substitute(
            "https://stac-extensions.github.io/eo/v1.0.0/schema.json",
            &[],
            Some(Path::new("/schemas")),
        );
        assert_eq!(
            location,
            Location::Remote("https://stac-extensions.github.io/eo/v1.0.0/schema.json".into())
        );
    }

    #[test]
    fn validator_is_cached_per_identifier() {
        let uri = "https://x.example/s.json";
        let loader = Arc::new(CountingLoader::new(HashMap::from([(
            uri.to_string(),
            json!({ "type": "object" }),
        )])));
        let config = config_with_loader(loader.clone());
        let mut cache = SchemaCache::new(&config);

        cache.validator(uri).unwrap();
        cache.validator(uri).unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_not_reattempted() {
        let loader = Arc::new(CountingLoader::new(HashMap::new()));
        let config = config_with_loader(loader.clone());
        let mut cache = SchemaCache::new(&config);

        let first = cache.validator("https://x.example/missing.json");
        let second = cache.validator("https://x.example/missing.json");
        assert!(matches!(first, Err(SchemaError::NotFound { .. })));
        assert!(matches!(second, Err(SchemaError::NotFound { .. })));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_self_identifier_is_assigned() {
        let uri = "https://x.example/s.json";
        let loader = Arc::new(CountingLoader::new(HashMap::from([(
            uri.to_string(),
            json!({ "type": "object" }),
        )])));
        let config = config_with_loader(loader);
        let cache = SchemaCache::new(&config);

        let schema = cache.fetcher.fetch(uri).unwrap();
        assert_eq!(schema["$id"], uri);
    }

    #[test]
    fn existing_self_identifier_is_kept() {
        let uri = "https://x.example/s.json";
        let loader = Arc::new(CountingLoader::new(HashMap::from([(
            uri.to_string(),
            json!({ "$id": "https://elsewhere.example/canonical.json", "type": "object" }),
        )])));
        let config = config_with_loader(loader);
        let cache = SchemaCache::new(&config);

        let schema = cache.fetcher.fetch(uri).unwrap();
        assert_eq!(schema["$id"], "https://elsewhere.example/canonical.json");
    }

    #[test]
    fn nested_refs_resolve_through_the_same_loader() {
        let root = "https://x.example/root.json";
        let leaf = "https://x.example/leaf.json";
        let loader = Arc::new(CountingLoader::new(HashMap::from([
            (
                root.to_string(),
                json!({
                    "$id": root,
                    "type": "object",
                    "properties": { "name": { "$ref": leaf } }
                }),
            ),
            (leaf.to_string(), json!({ "$id": leaf, "type": "string" })),
        ])));
        let config = config_with_loader(loader.clone());
        let mut cache = SchemaCache::new(&config);

        let validator = cache.validator(root).unwrap();
        assert!(validator.is_valid(&json!({ "name": "ok" })));
        assert!(!validator.is_valid(&json!({ "name": 1 })));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn schema_map_redirects_to_local_mirror() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("schema.json");
        std::fs::write(
            &local,
            r#"{ "type": "object", "required": ["id"] }"#,
        )
        .unwrap();

        let uri = "https://ext.example/v1.0.0/schema.json";
        let config = ValidationConfig::new().map_schema(uri, &local);
        let mut cache = SchemaCache::new(&config);

        let validator = cache.validator(uri).unwrap();
        assert!(validator.is_valid(&json!({ "id": "a" })));
        assert!(!validator.is_valid(&json!({})));
    }
}
