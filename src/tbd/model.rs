//! Data handed from the Mach-O pipeline to the tbd serializer.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Current version reported for a slice without LC_ID_DYLIB.
pub const DEFAULT_CURRENT_VERSION: &str = "275.0";

/// Target platform written into the stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    /// iOS
    #[default]
    Ios,
    /// macOS
    Macosx,
}

impl Platform {
    /// Returns the platform name as written in a tbd file.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Macosx => "macosx",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ios" => Ok(Platform::Ios),
            "macosx" => Ok(Platform::Macosx),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// Classified exports of one architecture slice.
///
/// Every list is sorted lexicographically except `reexports`, which is
/// ordered by decreasing path length with ties kept in command order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchitectureRecord {
    /// Architecture name (e.g. "arm64")
    pub name: String,
    /// Exported symbols
    pub symbols: Vec<String>,
    /// Objective-C classes
    pub classes: Vec<String>,
    /// Objective-C instance variables
    pub ivars: Vec<String>,
    /// Weak-definition symbols
    pub weak: Vec<String>,
    /// Re-exported library paths
    pub reexports: Vec<String>,
}

/// Identity of a library as recorded by LC_ID_DYLIB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DylibIdentity {
    /// Install name
    pub install_name: String,
    /// Current version, `MAJOR.MINOR.PATCH`
    pub current_version: String,
    /// Compatibility version, `MAJOR.MINOR.PATCH`
    pub compatibility_version: String,
}

impl Default for DylibIdentity {
    fn default() -> Self {
        Self {
            install_name: String::new(),
            current_version: DEFAULT_CURRENT_VERSION.to_string(),
            compatibility_version: String::new(),
        }
    }
}

/// Everything the serializer needs to render one tbd file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryDescriptor {
    /// One record per surviving slice, in container order
    pub archs: Vec<ArchitectureRecord>,
    /// Install name
    pub install_name: String,
    /// Current version
    pub current_version: String,
    /// Compatibility version
    pub compatibility_version: String,
    /// Target platform
    pub platform: Platform,
}

impl LibraryDescriptor {
    /// Creates an empty descriptor for the given platform.
    pub fn new(platform: Platform) -> Self {
        let identity = DylibIdentity::default();
        Self {
            archs: Vec::new(),
            install_name: identity.install_name,
            current_version: identity.current_version,
            compatibility_version: identity.compatibility_version,
            platform,
        }
    }

    /// Overwrites the identity fields.
    pub fn set_identity(&mut self, identity: DylibIdentity) {
        self.install_name = identity.install_name;
        self.current_version = identity.current_version;
        self.compatibility_version = identity.compatibility_version;
    }

    /// Returns the architecture names in record order.
    pub fn arch_names(&self) -> impl Iterator<Item = &str> {
        self.archs.iter().map(|a| a.name.as_str())
    }
}

/// A recoverable problem found while parsing.
#[derive(Debug)]
pub struct Warning {
    /// Index of the universal slice, if the file is universal
    pub slice: Option<usize>,
    /// Architecture name, if it was identified
    pub arch: Option<String>,
    /// What went wrong
    pub error: Error,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.slice, &self.arch) {
            (Some(index), Some(arch)) => write!(f, "slice {} ({}): {}", index, arch, self.error),
            (Some(index), None) => write!(f, "slice {}: {}", index, self.error),
            (None, Some(arch)) => write!(f, "{}: {}", arch, self.error),
            (None, None) => write!(f, "{}", self.error),
        }
    }
}

/// The parsed library plus every warning collected along the way.
#[derive(Debug)]
pub struct ParseReport {
    /// The library descriptor
    pub descriptor: LibraryDescriptor,
    /// Recoverable problems, in the order they were found
    pub warnings: Vec<Warning>,
}
