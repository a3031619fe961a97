use std::fmt;

/// Stable identifier for a provider implementation (for example `claude`).
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    /// Creates a provider id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the provider id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Fixed alias table mapping short model names to vendor model ids.
#[derive(Clone, Copy, Debug)]
pub struct ModelAliases {
    entries: &'static [(&'static str, &'static str)],
}

impl ModelAliases {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    /// Resolves an alias to a full model id.
    ///
    /// `None` means "use the vendor default" and is returned for absent or
    /// blank input. Unknown names pass through unchanged.
    pub fn resolve(&self, alias: Option<&str>) -> Option<String> {
        let alias = alias.map(str::trim).filter(|a| !a.is_empty())?;
        let resolved = self
            .entries
            .iter()
            .find(|(name, _)| *name == alias)
            .map_or(alias, |(_, id)| id);
        Some(resolved.to_string())
    }

    /// Alias names in table order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }
}
