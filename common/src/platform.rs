//! Install target description.
//!
//! A [`Platform`] identifies the runner a toolchain is being installed onto.
//! Its `version` is an operating-system release identifier (for example the
//! Ubuntu release `22.04`), never a Swift version.

use std::fmt;
use std::str::FromStr;

/// Operating-system families the installer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Apple macOS with Xcode toolchains.
    MacOs,
    /// Ubuntu Linux.
    Ubuntu,
    /// Microsoft Windows.
    Windows,
}

impl Os {
    /// Return the display name used in tool cache keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use common::platform::Os;
    ///
    /// assert_eq!(Os::MacOs.display_name(), "macOS");
    /// assert_eq!(Os::Ubuntu.display_name(), "Ubuntu");
    /// ```
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Ubuntu => "Ubuntu",
            Self::Windows => "Windows",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when an operating-system name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operating system '{0}'; expected one of: macos, ubuntu, windows")]
pub struct UnknownOs(String);

impl FromStr for Os {
    type Err = UnknownOs;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "macos" | "darwin" | "osx" => Ok(Self::MacOs),
            "ubuntu" | "linux" => Ok(Self::Ubuntu),
            "windows" => Ok(Self::Windows),
            _ => Err(UnknownOs(value.to_owned())),
        }
    }
}

/// The runner an installation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: Os,
    version: String,
}

impl Platform {
    /// Create a platform for release `version` of `os`.
    ///
    /// # Examples
    ///
    /// ```
    /// use common::platform::{Os, Platform};
    ///
    /// let platform = Platform::new(Os::Ubuntu, "22.04");
    /// assert_eq!(platform.name(), "Ubuntu");
    /// assert_eq!(platform.version(), "22.04");
    /// ```
    #[must_use]
    pub fn new(os: Os, version: impl Into<String>) -> Self {
        Self {
            os,
            version: version.into(),
        }
    }

    /// Return the operating-system family.
    #[must_use]
    pub const fn os(&self) -> Os {
        self.os
    }

    /// Return the operating-system release identifier.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Return the platform name used in tool cache keys.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.os.display_name()
    }

    /// Return only the ASCII digits of the release identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use common::platform::{Os, Platform};
    ///
    /// assert_eq!(Platform::new(Os::Ubuntu, "22.04").version_digits(), "2204");
    /// ```
    #[must_use]
    pub fn version_digits(&self) -> String {
        self.version.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.version)
    }
}
