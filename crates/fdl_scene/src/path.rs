//! Scene paths and name sanitising

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Absolute path of a scene node, e.g. `/Plant_01/Hall_A/Pump_01`
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenePath(String);

impl ScenePath {
    /// Path of a top-level node; `name` is sanitised
    pub fn root(name: &str) -> Self {
        Self(format!("/{}", sanitize_name(name)))
    }

    /// Path of a child node; `name` is sanitised
    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}/{}", self.0, sanitize_name(name)))
    }

    /// Last path element
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Enclosing path, `None` for a top-level node
    pub fn parent(&self) -> Option<Self> {
        match self.0.rfind('/') {
            Some(0) | None => None,
            Some(i) => Some(Self(self.0[..i].to_string())),
        }
    }

    /// Number of path elements
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ScenePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScenePath({})", self.0)
    }
}

impl fmt::Display for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map a name onto `[A-Za-z_][A-Za-z0-9_]*`
///
/// Every other character becomes `_`; a leading digit or an empty name gets
/// a `_` prefix.
pub fn sanitize_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
