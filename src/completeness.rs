//! Score an element's tags against the required tags configured for a run
//!
//! For example check every shop in an extract for `name` and `opening_hours`

use linear_map::LinearMap;
use serde::{Deserialize, Serialize};

use crate::element::TagMap;

/// The tag rules an element is scored against
///
/// Deserializes from a json object mapping each required key to its allowed
/// values, e.g. `{"amenity": ["cafe", "bar"], "name": []}`. An empty value
/// list accepts any value for that key. Rules are checked in insertion order,
/// which keeps the error list deterministic.
#[derive(Serialize, Deserialize, Default, Debug)]
#[serde(transparent)]
pub struct RequiredTags {
    pub rules: LinearMap<String, Vec<String>>,
}

/// Outcome of scoring one element
#[derive(Debug, PartialEq, Eq)]
pub struct Completeness {
    /// One message per violated rule, in rule order
    pub errors: Vec<String>,
    /// Messages from the name casing check
    pub warnings: Vec<String>,
    /// 0 to 100 inclusive, unaffected by warnings
    pub percentage: u8,
}

impl Completeness {
    /// No errors and no warnings
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

impl RequiredTags {
    /// Score a tag map
    ///
    /// Each rule contributes one error when its key is missing or its value
    /// is not allowed. The percentage is `100 - floor(errors * 100 / rules)`,
    /// capped at 99 while any error remains; without any rules everything is
    /// 100% complete.
    pub fn evaluate(&self, tags: &TagMap) -> Completeness {
        let mut errors = Vec::new();
        for (key, allowed) in &self.rules {
            match tags.get(key) {
                None => errors.push(format!("{key} not found")),
                Some(value) if !allowed.is_empty() && !allowed.contains(value) => {
                    errors.push(format!("{value} not allowed for {key}"));
                }
                Some(_) => {}
            }
        }

        let percentage = if errors.is_empty() {
            100
        } else {
            // Over 100 rules can floor the quotient to zero; an element
            // with errors must stay below the 100% tier.
            ((100 - errors.len() * 100 / self.rules.len()) as u8).min(99)
        };

        Completeness {
            errors,
            warnings: name_warnings(tags),
            percentage,
        }
    }
}

/// Warn about shouted or mumbled `name` values
fn name_warnings(tags: &TagMap) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(name) = tags.get("name") {
        if is_all_uppercase(name) {
            warnings.push(format!("{name} is all uppercase"));
        } else if is_all_lowercase(name) {
            warnings.push(format!("{name} is all lowercase"));
        }
    }
    warnings
}

// Both casing checks ignore uncased characters (digits, spaces, punctuation)
// and require at least one cased character, so a value can never trigger both.

fn is_all_uppercase(value: &str) -> bool {
    let mut cased = false;
    for char in value.chars() {
        if char.is_lowercase() {
            return false;
        }
        cased |= char.is_uppercase();
    }
    cased
}

fn is_all_lowercase(value: &str) -> bool {
    let mut cased = false;
    for char in value.chars() {
        if char.is_uppercase() {
            return false;
        }
        cased |= char.is_lowercase();
    }
    cased
}
