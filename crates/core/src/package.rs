//! Package identifier types and parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A package identifier: name plus exact version.
///
/// The canonical textual form is `name-version` (e.g. `mylib-1.0`); it is
/// used both in URLs and in backup entry labels. Names may themselves
/// contain hyphens, so parsing splits at the last hyphen whose suffix is a
/// valid version.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId {
    name: String,
    version: String,
}

impl PackageId {
    /// Parse the canonical `name-version` form.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if !s.is_ascii() {
            return Err(crate::Error::InvalidPackageId(
                "package id contains non-ASCII characters".to_string(),
            ));
        }

        let sep = s.rfind('-').ok_or_else(|| {
            crate::Error::InvalidPackageId(format!("expected 'name-version', got: {s}"))
        })?;
        let (name, version) = (&s[..sep], &s[sep + 1..]);
        Self::new(name, version)
    }

    /// Create from components, validating both.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        let version = version.into();

        if name.is_empty() {
            return Err(crate::Error::InvalidPackageId(
                "name cannot be empty".to_string(),
            ));
        }
        for c in name.chars() {
            if !matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_') {
                return Err(crate::Error::InvalidPackageId(format!(
                    "invalid character in name: {c}"
                )));
            }
        }
        if name.ends_with('-') {
            return Err(crate::Error::InvalidPackageId(
                "name cannot end with '-'".to_string(),
            ));
        }

        if version.is_empty() {
            return Err(crate::Error::InvalidPackageId(
                "version cannot be empty".to_string(),
            ));
        }
        for c in version.chars() {
            if !matches!(c, '0'..='9' | '.') {
                return Err(crate::Error::InvalidPackageId(format!(
                    "invalid character in version: {c}"
                )));
            }
        }
        if version.split('.').any(str::is_empty) {
            return Err(crate::Error::InvalidPackageId(format!(
                "version has an empty component: {version}"
            )));
        }

        Ok(Self { name, version })
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the package version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The conventional archive root label (`name-version-docs`), used for
    /// display in diagnostics only.
    pub fn docs_root_label(&self) -> String {
        format!("{self}-docs")
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageId({self})")
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}
