use std::str::FromStr;
use serde::Deserialize;

/// What to do when a pending create resolves but the path is already gone.
///
/// - `Emit`: log an error and still emit a best-effort event. A missing path
///   is not a directory, so this yields `CreateFile` (default behaviour).
/// - `Suppress`: log an error and emit nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingCreatePolicy {
    Emit,
    Suppress,
}

impl Default for MissingCreatePolicy {
    fn default() -> Self {
        MissingCreatePolicy::Emit
    }
}

impl FromStr for MissingCreatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emit" => Ok(MissingCreatePolicy::Emit),
            "suppress" => Ok(MissingCreatePolicy::Suppress),
            other => Err(format!(
                "invalid missing_on_create: {other} (expected \"emit\" or \"suppress\")"
            )),
        }
    }
}
