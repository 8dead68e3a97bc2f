//! Asset info extraction.
//!
//! Dumps the original game asset with the extractor tool and reduces the dump
//! to the canonical [`SlotInfo`]: material slot names in declaration order,
//! each tagged with the outline type its mesh sections use.
//!
//! The same tool's package listing drives [`scan_characters`], which is how
//! users find a target asset path in the first place.

use std::collections::BTreeMap;
use std::path::Path;

use charpak_spec::listing::{
    group_by_character, parse_listing, ListedPackage, MESH_LIST_PATTERN, SKELETAL_MESH_CLASS,
};
use charpak_spec::{AssetPath, CharacterManifest, Slot, SlotInfo, OUTLINE_UNSET};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Tool;
use crate::error::{PipelineError, PipelineResult};
use crate::process::CommandLine;
use crate::stages::{create_dir_all, read_file, remove_file_if_exists, write_file, StageContext};

/// Game profile passed to the extractor.
pub const EXTRACTOR_GAME: &str = "ue4.25";

/// Metadata dump of one skeletal mesh, as written by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetDump {
    #[serde(default)]
    pub skeletal_materials: Vec<DumpMaterial>,
    #[serde(default, rename = "LODModels")]
    pub lod_models: Vec<DumpLod>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DumpMaterial {
    pub material_slot_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DumpLod {
    #[serde(default)]
    pub sections: Vec<DumpSection>,
    /// Outline type per section, positionally aligned with `sections`.
    #[serde(default)]
    pub outline_material_indices: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DumpSection {
    pub material_index: usize,
}

impl AssetDump {
    pub fn from_json(json: &str) -> PipelineResult<Self> {
        serde_json::from_str(json).map_err(|e| PipelineError::parse("asset dump", e))
    }
}

/// Reduces a dump to the canonical slot list.
///
/// Every slot starts unset; each LOD's (outline type, section) pairs then tag
/// the slot the section uses. Later LODs overwrite earlier ones. Slot order is
/// never changed.
pub fn slot_info_from_dump(dump: &AssetDump) -> PipelineResult<SlotInfo> {
    let mut slots: Vec<Slot> = dump
        .skeletal_materials
        .iter()
        .map(|m| Slot::new(m.material_slot_name.clone(), OUTLINE_UNSET))
        .collect();
    let slot_count = slots.len();

    for lod in &dump.lod_models {
        for (&outline_type, section) in lod.outline_material_indices.iter().zip(&lod.sections) {
            let slot = slots.get_mut(section.material_index).ok_or_else(|| {
                PipelineError::parse(
                    "asset dump",
                    format!(
                        "section uses material {} but the asset has {} slots",
                        section.material_index, slot_count
                    ),
                )
            })?;
            slot.outline_type = outline_type;
        }
    }

    SlotInfo::new(slots).map_err(|e| PipelineError::parse("asset dump", e))
}

/// Reads a slot-info file written by [`extract`].
pub fn load_slot_info(path: &Path) -> PipelineResult<SlotInfo> {
    let text = read_file(path)?;
    SlotInfo::from_wire(&text).map_err(|e| PipelineError::parse(path.display().to_string(), e))
}

/// Extractor invocation with the game profile, archive path and key.
fn extractor_command(ctx: &StageContext<'_>, verb: &str) -> CommandLine {
    let command = ctx
        .command(Tool::Extractor)
        .arg(verb)
        .arg(format!("-game={}", EXTRACTOR_GAME))
        .arg(format!("-path={}", ctx.game.paks_dir().display()));
    match &ctx.config.aes_key {
        Some(key) => command.arg(format!("-aes={}", key)),
        None => command,
    }
}

/// Lists the packages matching `pattern` and the objects inside them.
pub fn list_packages(ctx: &StageContext<'_>, pattern: &str) -> PipelineResult<Vec<ListedPackage>> {
    let command = extractor_command(ctx, "-list").arg(pattern);
    let stdout = ctx.run_tool(Tool::Extractor, &command, true, ctx.config.timeouts.extract)?;
    parse_listing(&stdout).map_err(|e| PipelineError::parse("package listing", e))
}

/// Finds every character's skeletal meshes and sorts them by role.
///
/// Packages whose path is not a usable asset path are logged and skipped.
pub fn scan_characters(
    ctx: &StageContext<'_>,
) -> PipelineResult<BTreeMap<String, CharacterManifest>> {
    let packages = list_packages(ctx, MESH_LIST_PATTERN)?;
    let meshes = packages
        .iter()
        .filter(|p| p.contains(SKELETAL_MESH_CLASS))
        .filter_map(|p| match AssetPath::parse(&p.path) {
            Ok(asset) => Some(asset),
            Err(e) => {
                warn!("Skipping listed package {}: {}", p.path, e);
                None
            }
        });
    let manifests = group_by_character(meshes);

    info!(
        "Scanned {} packages, found meshes for {} characters",
        packages.len(),
        manifests.len()
    );
    Ok(manifests)
}

/// Dumps `asset` from the game archives and writes its slot-info file.
pub fn extract(ctx: &StageContext<'_>, asset: &AssetPath) -> PipelineResult<SlotInfo> {
    let dump_dir = ctx.work.dump_dir();
    let dump_json = ctx.work.dump_json(asset);
    let details = ctx.work.details_file(asset);

    create_dir_all(&dump_dir)?;
    remove_file_if_exists(&dump_json)?;
    remove_file_if_exists(&details)?;

    let command = extractor_command(ctx, "-dump")
        .arg(format!("-out={}", dump_dir.display()))
        .arg(asset.package_path());

    ctx.run_tool(Tool::Extractor, &command, false, ctx.config.timeouts.extract)?;

    if !dump_json.is_file() {
        return Err(PipelineError::target(format!(
            "target asset not found or undumpable: {}",
            asset
        )));
    }

    let dump = AssetDump::from_json(&read_file(&dump_json)?)?;
    let slot_info = slot_info_from_dump(&dump)?;
    write_file(&details, slot_info.to_wire())?;

    info!(
        "Extracted {} material slots from {}: {}",
        slot_info.len(),
        asset,
        slot_info.names().join(", ")
    );
    Ok(slot_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessError;
    use crate::test_support::{FakeRunner, Fixture};
    use pretty_assertions::assert_eq;

    const DUMP: &str = r#"{
        "SkeletalMaterials": [
            {"MaterialSlotName": "ram_body"},
            {"MaterialSlotName": "ram_face"},
            {"MaterialSlotName": "ram_eye"}
        ],
        "LODModels": [
            {"Sections": [{"MaterialIndex": 0}, {"MaterialIndex": 1}], "OutlineMaterialIndices": [2, 0]},
            {"Sections": [{"MaterialIndex": 0}], "OutlineMaterialIndices": [1]}
        ]
    }"#;

    #[test]
    fn test_slot_info_from_dump_later_lods_win() {
        let dump = AssetDump::from_json(DUMP).unwrap();
        let info = slot_info_from_dump(&dump).unwrap();
        assert_eq!(info.names(), vec!["ram_body", "ram_face", "ram_eye"]);
        assert_eq!(info.outline_types(), vec![1, 0, OUTLINE_UNSET]);
    }

    #[test]
    fn test_slot_info_from_dump_rejects_bad_section() {
        let dump = AssetDump::from_json(
            r#"{"SkeletalMaterials":[{"MaterialSlotName":"a"}],
                "LODModels":[{"Sections":[{"MaterialIndex":3}],"OutlineMaterialIndices":[1]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            slot_info_from_dump(&dump),
            Err(PipelineError::ParseFailure { .. })
        ));
    }

    #[test]
    fn test_slot_info_from_dump_without_materials() {
        let dump = AssetDump::from_json("{}").unwrap();
        assert!(slot_info_from_dump(&dump).is_err());
    }

    #[test]
    fn test_extract_writes_details_file() {
        let fixture = Fixture::new();
        let runner = FakeRunner::new(|command| {
            let out = command
                .argv()
                .iter()
                .find_map(|a| a.strip_prefix("-out=").map(str::to_string))
                .unwrap();
            let json = Path::new(&out).join("Chara/RAM/Costume01/Mesh/ram_body.json");
            std::fs::create_dir_all(json.parent().unwrap()).unwrap();
            std::fs::write(json, DUMP).unwrap();
            Ok(String::new())
        });
        let ctx = StageContext::new(&fixture.config, &runner);

        let info = extract(&ctx, &fixture.target.asset).unwrap();
        assert_eq!(info.len(), 3);

        let details = ctx.work.details_file(&fixture.target.asset);
        assert_eq!(load_slot_info(&details).unwrap(), info);

        let argv = runner.calls()[0].argv();
        assert_eq!(argv[0], "-dump");
        assert_eq!(argv[1], "-game=ue4.25");
        assert!(argv.contains(&"-aes=0xABCD".to_string()));
        assert_eq!(
            argv.last().unwrap(),
            "/RED/Content/Chara/RAM/Costume01/Mesh/ram_body"
        );
    }

    #[test]
    fn test_extract_missing_dump_is_target_error() {
        let fixture = Fixture::new();
        let runner = FakeRunner::new(|_| Ok(String::new()));
        let ctx = StageContext::new(&fixture.config, &runner);

        let err = extract(&ctx, &fixture.target.asset).unwrap_err();
        assert!(err
            .to_string()
            .contains("target asset not found or undumpable"));
    }

    #[test]
    fn test_extract_tool_failure() {
        let fixture = Fixture::new();
        let runner = FakeRunner::new(|_| {
            Err(ProcessError::NonZeroExit {
                program: "umodel".to_string(),
                exit_code: 1,
            })
        });
        let ctx = StageContext::new(&fixture.config, &runner);

        assert!(matches!(
            extract(&ctx, &fixture.target.asset),
            Err(PipelineError::ToolFailed {
                tool: "Extractor",
                ..
            })
        ));
    }

    const LISTING: &str = "\
/RED/Content/Chara/RAM/Costume01/Mesh/ram_body.uasset
  0   1A4F   2C00  SkeletalMesh   ram_body

/RED/Content/Chara/RAM/Costume01/Mesh/ram_head_high.uasset
  0   1A4F   2C00  SkeletalMesh   ram_head_high

/RED/Content/Chara/RAM/Costume01/Mesh/ram_body_PhysicsAsset.uasset
  0    900    3F0  PhysicsAsset   ram_body_PhysicsAsset

/RED/Content/Chara/SOL/Costume01/Mesh/sol_weapon01.uasset
  0    A00   1000  SkeletalMesh   sol_weapon01
";

    #[test]
    fn test_scan_characters_groups_meshes() {
        let fixture = Fixture::new();
        let runner = FakeRunner::new(|_| Ok(LISTING.to_string()));
        let ctx = StageContext::new(&fixture.config, &runner);

        let manifests = scan_characters(&ctx).unwrap();
        assert_eq!(manifests.len(), 2);

        let ram = &manifests["RAM"];
        assert_eq!(ram.body.as_ref().unwrap().as_str(), "Chara/RAM/Costume01/Mesh/ram_body");
        assert_eq!(
            ram.head_high.as_ref().unwrap().as_str(),
            "Chara/RAM/Costume01/Mesh/ram_head_high"
        );
        assert!(ram.others.is_empty());
        assert_eq!(manifests["SOL"].weapons.len(), 1);

        let argv = runner.calls()[0].argv();
        assert_eq!(argv[0], "-list");
        assert!(argv.contains(&"-aes=0xABCD".to_string()));
        assert_eq!(argv.last().unwrap(), MESH_LIST_PATTERN);
    }

    #[test]
    fn test_scan_characters_bad_listing_is_parse_failure() {
        let fixture = Fixture::new();
        let runner =
            FakeRunner::new(|_| Ok("/RED/Content/Chara/RAM/x.uasset\n  0 1A4F\n".to_string()));
        let ctx = StageContext::new(&fixture.config, &runner);

        assert!(matches!(
            scan_characters(&ctx),
            Err(PipelineError::ParseFailure { .. })
        ));
    }
}
