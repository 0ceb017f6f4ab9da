//! Display names, slugs and keyspace identifiers for saved databases.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::archive::BundleSource;
use crate::bundle::read_bundle_config;

/// Config keys that may carry a database name, in priority order.
const NAME_KEYS: [&str; 6] = [
    "database_name",
    "databaseName",
    "db",
    "keyspace",
    "name",
    "cluster_name",
];

/// Used when neither config nor filename yields anything usable.
const FALLBACK_NAME: &str = "database";

const BUNDLE_PREFIX: &str = "secure-connect-";
const BUNDLE_SUFFIX: &str = "-bundle";

static NON_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9-]+").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]").expect("valid regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

/// Derive a filesystem- and key-safe slug from a display name.
///
/// Lowercases, turns whitespace into hyphens, drops anything outside
/// `[a-z0-9-]`, collapses hyphen runs and trims edge hyphens. A name that
/// reduces to nothing gets a timestamp placeholder (`db-<millis>`), so the
/// result is never empty. Applying it twice gives the same result.
pub fn slugify(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    let hyphenated = WHITESPACE.replace_all(&lower, "-");
    let stripped = NON_SLUG_CHARS.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&stripped, "-");
    let slug = collapsed.trim_matches('-');

    if slug.is_empty() {
        format!("db-{}", chrono::Utc::now().timestamp_millis())
    } else {
        slug.to_string()
    }
}

/// First non-blank string among `keys` at the top level of `config`.
fn first_string<'a>(config: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| config.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Database name carried by an embedded bundle config, if any.
pub fn name_from_config(config: &Value) -> Option<String> {
    first_string(config, &NAME_KEYS).map(str::to_string)
}

/// Human-readable name from a bundle filename.
///
/// `secure-connect-shop-bundle.zip` becomes `shop`. The prefix is matched
/// case-insensitively.
pub fn name_from_filename(bundle_path: &Path) -> String {
    let stem = bundle_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut base = stem.as_str();
    if base.len() >= BUNDLE_PREFIX.len()
        && base.is_char_boundary(BUNDLE_PREFIX.len())
        && base[..BUNDLE_PREFIX.len()].eq_ignore_ascii_case(BUNDLE_PREFIX)
    {
        base = &base[BUNDLE_PREFIX.len()..];
    }
    if let Some(stripped) = base.strip_suffix(BUNDLE_SUFFIX) {
        base = stripped;
    }

    let underscored = base.replace('_', "-");
    let cleaned = NON_NAME_CHARS.replace_all(&underscored, "-");
    let trimmed = cleaned.trim_matches('-');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Keyspace carried by an embedded bundle config: `keyspace`, then the first
/// entry of `keyspaces`, then `connection_info.keyspace`.
pub fn keyspace_from_config(config: &Value) -> Option<String> {
    if let Some(ks) = first_string(config, &["keyspace"]) {
        return Some(ks.to_string());
    }
    if let Some(ks) = config
        .get("keyspaces")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Some(ks.to_string());
    }
    config
        .get("connection_info")
        .and_then(|info| first_string(info, &["keyspace"]))
        .map(str::to_string)
}

/// Resolve the display name for a bundle.
///
/// A non-blank explicit name wins (trimmed). Otherwise the embedded config
/// is consulted, then the filename. Unreadable bundles fall through to the
/// filename rule.
pub async fn derive_name(bundle_path: &Path, explicit: Option<&str>) -> String {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    match read_bundle_config(&BundleSource::from(bundle_path)).await {
        Ok(Some(config)) => {
            if let Some(name) = name_from_config(&config) {
                return name;
            }
        }
        Ok(None) => {}
        Err(e) => tracing::debug!(bundle = %bundle_path.display(), error = %e, "bundle config unreadable"),
    }

    name_from_filename(bundle_path)
}

/// Resolve the keyspace for a bundle, or an empty string when none is declared.
pub async fn derive_keyspace(bundle_path: &Path) -> String {
    match read_bundle_config(&BundleSource::from(bundle_path)).await {
        Ok(Some(config)) => keyspace_from_config(&config).unwrap_or_default(),
        Ok(None) => String::new(),
        Err(e) => {
            tracing::debug!(bundle = %bundle_path.display(), error = %e, "bundle config unreadable");
            String::new()
        }
    }
}
