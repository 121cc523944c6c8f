#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::fs;

use log::{info, warn};

use crate::utils::errors::Errors;

// ***************************************************************************
//                              ResponseStore
// ***************************************************************************
/** Immutable mapping of category name to its candidate answers.
 *
 * The store is built once at startup from a JSON object whose values are
 * arrays of non-empty strings, for example:
 *
 *   {"greeting": ["hi", "hello"], "farewell": ["bye"]}
 *
 * Categories with an empty answer list are dropped during loading so that
 * every category reported by lookup() has at least one answer.  Duplicate
 * keys in the document follow the JSON parser: the last one wins.
 */
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseStore {
    responses: BTreeMap<String, Vec<String>>,
}

impl ResponseStore {
    // ---------------------------------------------------------------------------
    // load:
    // ---------------------------------------------------------------------------
    /** Read and parse the responses file.  Any failure is a ConfigError. */
    pub fn load(path: &str) -> Result<Self, Errors> {
        info!("Loading responses from {}.", path);
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => return Err(Errors::ConfigError(path.to_string(), e.to_string())),
        };
        Self::from_json_str(&contents, path)
    }

    // ---------------------------------------------------------------------------
    // from_json_str:
    // ---------------------------------------------------------------------------
    /** Parse a responses document.  The source name is only used in messages. */
    pub fn from_json_str(contents: &str, source: &str) -> Result<Self, Errors> {
        let parsed: BTreeMap<String, Vec<String>> = match serde_json::from_str(contents) {
            Ok(m) => m,
            Err(e) => return Err(Errors::ConfigError(source.to_string(), e.to_string())),
        };

        let mut responses = BTreeMap::new();
        for (category, answers) in parsed {
            if answers.is_empty() {
                warn!("Ignoring category '{}' in {}: it has no answers.", category, source);
                continue;
            }
            if answers.iter().any(|a| a.is_empty()) {
                let msg = format!("category '{}' contains an empty answer", category);
                return Err(Errors::ConfigError(source.to_string(), msg));
            }
            responses.insert(category, answers);
        }

        Ok(Self {responses})
    }

    // ---------------------------------------------------------------------------
    // lookup:
    // ---------------------------------------------------------------------------
    /** Exact, case-sensitive category match.  None means the category is unknown. */
    pub fn lookup(&self, category: &str) -> Option<&[String]> {
        self.responses.get(category).map(|v| v.as_slice())
    }

    /// Category names in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.responses.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

// Answer lists can be long, so only their sizes are shown.
impl fmt::Debug for ResponseStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut m = f.debug_map();
        for (category, answers) in &self.responses {
            m.entry(category, &answers.len());
        }
        m.finish()
    }
}
