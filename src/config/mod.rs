//! Load-time configuration for the [`Fabric`](crate::Fabric) façade.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Verbosity of user-visible reporting.
///
/// `Off` reports info, warnings and errors; `Terse` only warnings and
/// errors; `Deep` only errors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Silent {
    #[default]
    Off,
    Terse,
    Deep,
}

impl Silent {
    pub fn allows_info(self) -> bool {
        matches!(self, Silent::Off)
    }

    pub fn allows_warn(self) -> bool {
        !matches!(self, Silent::Deep)
    }
}

impl std::str::FromStr for Silent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terse" => Ok(Silent::Terse),
            "deep" => Ok(Silent::Deep),
            "" | "off" => Ok(Silent::Off),
            other => Err(format!("unknown silent mode: {other}")),
        }
    }
}

/// Configuration recognized on load.
#[derive(Clone, Debug)]
pub struct FabricConfig {
    /// Directories searched for source feature files and compiled stores,
    /// in order. The first location holding sources is where a store is
    /// compiled to.
    pub locations: Vec<PathBuf>,
    pub silent: Silent,
    /// Restricts the loadable feature set; `None` means everything the
    /// store carries.
    pub modules: Option<BTreeSet<String>>,
    /// When true, a requested feature that is not present is an error
    /// instead of a warning.
    pub strict: bool,
    /// Worker count for per-feature parallel compilation.
    pub workers: usize,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            locations: Vec::new(),
            silent: Silent::default(),
            modules: None,
            strict: false,
            workers: num_cpus::get(),
        }
    }
}

impl FabricConfig {
    /// Configuration for a single location with defaults everywhere else.
    pub fn at(location: impl Into<PathBuf>) -> Self {
        Self {
            locations: vec![location.into()],
            ..Self::default()
        }
    }

    pub fn with_silent(mut self, silent: Silent) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_modules(mut self, modules: impl IntoIterator<Item = String>) -> Self {
        self.modules = Some(modules.into_iter().collect());
        self
    }
}
