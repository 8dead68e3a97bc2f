//! Normalized game asset paths.
//!
//! Every target asset lives under the character folder of the game's content
//! root. Users may paste the path in several forms (with or without the
//! `/RED/Content/` prefix, with or without the `.uasset` suffix); they all
//! normalize to the same `Chara/...` path.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::AssetPathError;

/// Top-level folder every target asset is rooted at.
pub const CHARA_ROOT: &str = "Chara/";

/// Content root inside the game's package store.
pub const CONTENT_ROOT: &str = "/RED/Content/";

/// Package file suffix stripped from user input.
pub const UASSET_SUFFIX: &str = ".uasset";

/// Symbols that may not appear anywhere in an asset path.
///
/// The path ends up inside comma-separated files and quoted engine arguments.
pub const PROHIBITED_SYMBOLS: [&str; 6] = ["..", "*", "?", ",", "'", "\""];

/// A validated `Chara/...` asset path split into stub directory and leaf name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath {
    path: String,
    split: usize,
}

impl AssetPath {
    /// Normalizes and validates a user-supplied asset path.
    ///
    /// # Example
    /// ```
    /// use charpak_spec::AssetPath;
    ///
    /// let asset = AssetPath::parse("/RED/Content/Chara/RAM/Costume01/Mesh/ram_body.uasset").unwrap();
    /// assert_eq!(asset.as_str(), "Chara/RAM/Costume01/Mesh/ram_body");
    /// assert_eq!(asset.stub(), "Chara/RAM/Costume01/Mesh");
    /// assert_eq!(asset.name(), "ram_body");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, AssetPathError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AssetPathError::Empty);
        }
        if raw.contains('\\') {
            return Err(AssetPathError::Backslash(raw.to_string()));
        }

        let value = raw.strip_suffix(UASSET_SUFFIX).unwrap_or(raw);
        let start = value
            .find(CHARA_ROOT)
            .ok_or_else(|| AssetPathError::MissingCharaRoot(raw.to_string()))?;
        let value = &value[start..];

        for symbol in PROHIBITED_SYMBOLS {
            if value.contains(symbol) {
                return Err(AssetPathError::ProhibitedSymbol {
                    symbol,
                    path: raw.to_string(),
                });
            }
        }

        if value.split('/').any(|segment| segment.trim().is_empty()) {
            return Err(AssetPathError::EmptySegment(raw.to_string()));
        }

        // CHARA_ROOT guarantees at least one separator.
        let split = value.rfind('/').unwrap_or(0);

        Ok(Self {
            path: value.to_string(),
            split,
        })
    }

    /// The full normalized path, e.g. `Chara/RAM/Costume01/Mesh/ram_body`.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The directory portion, e.g. `Chara/RAM/Costume01/Mesh`.
    pub fn stub(&self) -> &str {
        &self.path[..self.split]
    }

    /// The leaf file name, e.g. `ram_body`.
    pub fn name(&self) -> &str {
        &self.path[self.split + 1..]
    }

    /// The path as addressed inside the game's package store.
    pub fn package_path(&self) -> String {
        format!("{}{}", CONTENT_ROOT, self.path)
    }
}

impl Serialize for AssetPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl FromStr for AssetPath {
    type Err = AssetPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_path() {
        let asset = AssetPath::parse("Chara/RAM/Costume01/Mesh/ram_body").unwrap();
        assert_eq!(asset.as_str(), "Chara/RAM/Costume01/Mesh/ram_body");
        assert_eq!(asset.stub(), "Chara/RAM/Costume01/Mesh");
        assert_eq!(asset.name(), "ram_body");
    }

    #[test]
    fn test_parse_strips_prefix_and_suffix() {
        let asset = AssetPath::parse("/RED/Content/Chara/SOL/Costume01/Mesh/sol_body.uasset").unwrap();
        assert_eq!(asset.as_str(), "Chara/SOL/Costume01/Mesh/sol_body");
        assert_eq!(
            asset.package_path(),
            "/RED/Content/Chara/SOL/Costume01/Mesh/sol_body"
        );
    }

    #[test]
    fn test_parse_rejects_backslashes() {
        let err = AssetPath::parse("Chara\\RAM\\ram_body").unwrap_err();
        assert!(matches!(err, AssetPathError::Backslash(_)));
    }

    #[test]
    fn test_parse_rejects_paths_outside_chara() {
        let err = AssetPath::parse("Stage/Mesh/arena").unwrap_err();
        assert!(matches!(err, AssetPathError::MissingCharaRoot(_)));
    }

    #[test]
    fn test_parse_rejects_traversal_and_symbols() {
        let err = AssetPath::parse("Chara/../Secrets/x").unwrap_err();
        assert!(matches!(
            err,
            AssetPathError::ProhibitedSymbol { symbol: "..", .. }
        ));

        let err = AssetPath::parse("Chara/RAM/ram,body").unwrap_err();
        assert!(matches!(err, AssetPathError::ProhibitedSymbol { symbol: ",", .. }));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(matches!(
            AssetPath::parse("Chara/RAM//ram_body"),
            Err(AssetPathError::EmptySegment(_))
        ));
        assert!(matches!(
            AssetPath::parse("Chara/RAM/"),
            Err(AssetPathError::EmptySegment(_))
        ));
        assert_eq!(AssetPath::parse("   "), Err(AssetPathError::Empty));
    }

    #[test]
    fn test_from_str_and_display() {
        let asset: AssetPath = "Chara/KYK/Costume01/Mesh/kyk_body".parse().unwrap();
        assert_eq!(asset.to_string(), "Chara/KYK/Costume01/Mesh/kyk_body");
    }
}
