//! Invocation settings shared by every CLI-backed vendor.

use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::errors::HarnessError;

/// Names and defaults that differ between vendor CLIs.
pub trait CliVendor {
    /// Executable looked up on `PATH` when nothing is configured.
    const DEFAULT_BINARY: &'static str;
    const BIN_VAR: &'static str;
    const ARGS_VAR: &'static str;
    const WORKDIR_VAR: &'static str;
}

/// How to invoke a vendor CLI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig<V> {
    /// Executable name or path, looked up on `PATH` when relative.
    pub binary: PathBuf,
    /// Extra arguments placed before the prompt on every call.
    pub extra_args: Vec<String>,
    /// Working directory for the vendor process; inherits ours when `None`.
    pub working_dir: Option<PathBuf>,
    vendor: PhantomData<V>,
}

impl<V: CliVendor> Default for CliConfig<V> {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(V::DEFAULT_BINARY),
            extra_args: Vec::new(),
            working_dir: None,
            vendor: PhantomData,
        }
    }
}

impl<V: CliVendor> CliConfig<V> {
    /// Builds a config from the vendor's `*_BIN`, `*_ARGS` and `*_WORKDIR`
    /// variables.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HarnessError> {
        let mut config = Self::default();
        if let Some(binary) = lookup(V::BIN_VAR) {
            if binary.trim().is_empty() {
                return Err(HarnessError::Config(format!(
                    "{} must not be empty",
                    V::BIN_VAR
                )));
            }
            config.binary = PathBuf::from(binary.trim());
        }
        if let Some(args) = lookup(V::ARGS_VAR) {
            config.extra_args = args.split_whitespace().map(str::to_string).collect();
        }
        config.working_dir = lookup(V::WORKDIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(|dir| PathBuf::from(dir.trim()));
        Ok(config)
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Reads `null` as the type's default; `#[serde(default)]` alone only covers
/// absent fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Fake;

    impl CliVendor for Fake {
        const DEFAULT_BINARY: &'static str = "fake-agent";
        const BIN_VAR: &'static str = "FAKE_BIN";
        const ARGS_VAR: &'static str = "FAKE_ARGS";
        const WORKDIR_VAR: &'static str = "FAKE_WORKDIR";
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_vendor_binary_on_path() {
        let config = CliConfig::<Fake>::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.binary, PathBuf::from("fake-agent"));
        assert_eq!(config.working_dir, None);
    }

    #[test]
    fn reads_binary_args_and_workdir() {
        let config = CliConfig::<Fake>::from_lookup(lookup(&[
            ("FAKE_BIN", " /opt/fake/bin/agent "),
            ("FAKE_ARGS", "--permission-mode  acceptEdits"),
            ("FAKE_WORKDIR", "/srv/repo"),
        ]))
        .expect("config");
        assert_eq!(config.binary, PathBuf::from("/opt/fake/bin/agent"));
        assert_eq!(config.extra_args, vec!["--permission-mode", "acceptEdits"]);
        assert_eq!(config.working_dir, Some(PathBuf::from("/srv/repo")));
    }

    #[test]
    fn blank_binary_is_rejected_but_blank_args_are_empty() {
        let config =
            CliConfig::<Fake>::from_lookup(lookup(&[("FAKE_ARGS", "   ")])).expect("config");
        assert!(config.extra_args.is_empty());
        let err = CliConfig::<Fake>::from_lookup(lookup(&[("FAKE_BIN", "  ")])).expect_err("blank");
        assert!(matches!(err, HarnessError::Config(msg) if msg.contains("FAKE_BIN")));
    }

    #[derive(Debug, Deserialize)]
    struct Counts {
        #[serde(default, deserialize_with = "null_as_default")]
        tokens: u64,
        #[serde(default, deserialize_with = "null_as_default")]
        label: String,
    }

    #[test]
    fn null_fields_read_as_defaults() {
        let counts: Counts =
            serde_json::from_str(r#"{"tokens": null, "label": null}"#).expect("parse");
        assert_eq!(counts.tokens, 0);
        assert_eq!(counts.label, "");
        let counts: Counts = serde_json::from_str("{}").expect("parse");
        assert_eq!(counts.tokens, 0);
    }
}
