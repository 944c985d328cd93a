use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::document::RulesDocument;
use crate::error::RulesError;
use crate::registry::Rules;

const DEFAULT_RULES_JSON: &str = include_str!("../data/default_rules.json");
const RULES_ENV_VAR: &str = "WBMAP_RULES";

static DEFAULT_RULES: OnceLock<Rules> = OnceLock::new();

/// Returns the embedded rule set, compiled on first use.
pub fn default_rules() -> Result<&'static Rules, RulesError> {
    if let Some(rules) = DEFAULT_RULES.get() {
        return Ok(rules);
    }
    let rules = Rules::from_json_str(DEFAULT_RULES_JSON)?;
    tracing::debug!("compiled embedded auto-mapper rules");
    Ok(DEFAULT_RULES.get_or_init(|| rules))
}

/// Rule document path configured through the environment, if any.
pub fn rules_path_from_env() -> Option<PathBuf> {
    std::env::var_os(RULES_ENV_VAR).map(PathBuf::from)
}

pub fn load_rules(path: &Path) -> Result<Rules, RulesError> {
    let document = load_rules_document(path)?;
    let rules = Rules::from_document(&document)?;
    tracing::info!(path = %path.display(), "loaded auto-mapper rules");
    Ok(rules)
}

pub fn load_rules_document(path: &Path) -> Result<RulesDocument, RulesError> {
    let contents = std::fs::read_to_string(path).map_err(|e| RulesError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|source| RulesError::Json {
        path: path.to_path_buf(),
        source,
    })
}
