//! The extractor's package listing and the character manifests built from it.
//!
//! `-list` prints one block per package, separated by blank lines: the
//! package path, then one row per contained object:
//!
//! ```text
//! /RED/Content/Chara/RAM/Costume01/Mesh/ram_body.uasset
//!   0   1A4F   2C00  SkeletalMesh   ram_body
//!   1   4850    120  Skeleton       ram_body_Skeleton
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use crate::asset_path::AssetPath;
use crate::error::ParseError;

/// Object class of a skeletal mesh in the listing.
pub const SKELETAL_MESH_CLASS: &str = "SkeletalMesh";

/// Listing pattern matching every character's costume meshes.
pub const MESH_LIST_PATTERN: &str = "/RED/Content/Chara/*/Costume01/Mesh/*.uasset";

/// One object row of a listed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub index: usize,
    pub offset: u64,
    pub size: u64,
    pub class: String,
    pub name: String,
}

impl ListedObject {
    /// Parses `index offset size class name`; offset and size are hex.
    pub fn parse(row: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = row.split_whitespace().collect();
        let malformed = || ParseError::MalformedListingRow(row.trim().to_string());
        let [index, offset, size, class, name, ..] = parts[..] else {
            return Err(malformed());
        };

        Ok(Self {
            index: index.parse().map_err(|_| malformed())?,
            offset: parse_hex(offset).ok_or_else(malformed)?,
            size: parse_hex(size).ok_or_else(malformed)?,
            class: class.to_string(),
            name: name.to_string(),
        })
    }
}

fn parse_hex(field: &str) -> Option<u64> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    u64::from_str_radix(digits, 16).ok()
}

/// A package and the objects it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPackage {
    pub path: String,
    pub objects: Vec<ListedObject>,
}

impl ListedPackage {
    pub fn contains(&self, class: &str) -> bool {
        self.objects.iter().any(|o| o.class == class)
    }
}

/// Parses the extractor's `-list` output.
///
/// Blocks that do not start with a content path (banners, warnings) are
/// skipped, as are object rows shorter than two characters.
pub fn parse_listing(stdout: &str) -> Result<Vec<ListedPackage>, ParseError> {
    let stdout = stdout.replace("\r\n", "\n");
    let mut packages = Vec::new();

    for block in stdout.split("\n\n") {
        let block = block.trim_start_matches('\n');
        if !block.starts_with("/RED/") {
            continue;
        }

        let mut lines = block.lines();
        let path = lines.next().unwrap_or_default().trim().to_string();
        let objects = lines
            .filter(|line| line.trim().len() > 1)
            .map(ListedObject::parse)
            .collect::<Result<Vec<_>, _>>()?;
        packages.push(ListedPackage { path, objects });
    }

    Ok(packages)
}

/// What part of a character a mesh is, judged from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshRole {
    Body,
    HeadHigh,
    HeadLow,
    Weapon,
    Other,
}

impl MeshRole {
    /// Classifies by the suffix following the character's name, e.g.
    /// `ram_head_high` for `RAM`. The prefix itself is not compared.
    pub fn classify(character: &str, mesh_name: &str) -> Self {
        let suffix = mesh_name.get(character.len()..).unwrap_or_default();
        match suffix {
            s if s.starts_with("_weapon") => MeshRole::Weapon,
            "_body" => MeshRole::Body,
            "_head_high" => MeshRole::HeadHigh,
            "_head_low" => MeshRole::HeadLow,
            _ => MeshRole::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeshRole::Body => "body",
            MeshRole::HeadHigh => "head_high",
            MeshRole::HeadLow => "head_low",
            MeshRole::Weapon => "weapon",
            MeshRole::Other => "other",
        }
    }
}

/// The skeletal meshes of one character, sorted by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterManifest {
    pub name: String,
    pub body: Option<AssetPath>,
    pub head_high: Option<AssetPath>,
    pub head_low: Option<AssetPath>,
    pub weapons: Vec<AssetPath>,
    pub others: Vec<AssetPath>,
}

impl CharacterManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: None,
            head_high: None,
            head_low: None,
            weapons: Vec::new(),
            others: Vec::new(),
        }
    }

    /// Files `mesh` under its role. A later body or head replaces an
    /// earlier one.
    pub fn add_mesh(&mut self, mesh: AssetPath) {
        match MeshRole::classify(&self.name, mesh.name()) {
            MeshRole::Body => self.body = Some(mesh),
            MeshRole::HeadHigh => self.head_high = Some(mesh),
            MeshRole::HeadLow => self.head_low = Some(mesh),
            MeshRole::Weapon => self.weapons.push(mesh),
            MeshRole::Other => self.others.push(mesh),
        }
    }

    /// Every mesh with its role, body first.
    pub fn meshes(&self) -> Vec<(MeshRole, &AssetPath)> {
        let singles = [
            (MeshRole::Body, &self.body),
            (MeshRole::HeadHigh, &self.head_high),
            (MeshRole::HeadLow, &self.head_low),
        ];
        singles
            .into_iter()
            .filter_map(|(role, mesh)| mesh.as_ref().map(|m| (role, m)))
            .chain(self.weapons.iter().map(|m| (MeshRole::Weapon, m)))
            .chain(self.others.iter().map(|m| (MeshRole::Other, m)))
            .collect()
    }
}

/// Character folder of a `Chara/<character>/...` asset.
pub fn character_of(asset: &AssetPath) -> &str {
    asset.as_str().split('/').nth(1).unwrap_or_default()
}

/// Groups mesh assets into per-character manifests keyed by character name.
pub fn group_by_character(
    meshes: impl IntoIterator<Item = AssetPath>,
) -> BTreeMap<String, CharacterManifest> {
    let mut manifests: BTreeMap<String, CharacterManifest> = BTreeMap::new();
    for mesh in meshes {
        let character = character_of(&mesh).to_string();
        manifests
            .entry(character.clone())
            .or_insert_with(|| CharacterManifest::new(character))
            .add_mesh(mesh);
    }
    manifests
}
