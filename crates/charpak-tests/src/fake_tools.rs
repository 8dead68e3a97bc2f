//! Shell-script stand-ins for the external tools.
//!
//! The scripts follow the real tools' command lines closely enough that a
//! full run through [`SystemRunner`](charpak_pipeline::SystemRunner) produces
//! an installed archive: arguments are parsed the way each tool receives
//! them, including the engine's one-token script argument.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use charpak_pipeline::ToolPaths;

use crate::fixtures::{DUMP_JSON, PACKAGE_LISTING};

const EXTRACTOR: &str = r#"#!/bin/sh
if [ "$1" = "-list" ]; then
  cat <<'LIST'
@LISTING@
LIST
  exit 0
fi
out=""
pkg=""
for a in "$@"; do
  case "$a" in
    -out=*) out="${a#-out=}" ;;
  esac
  pkg="$a"
done
rel="${pkg#/RED/Content/}"
mkdir -p "$out/$(dirname "$rel")"
cat > "$out/$rel.json" <<'JSON'
@DUMP@
JSON
echo "Exported $pkg"
"#;

const BLENDER: &str = r#"#!/bin/sh
while [ "$#" -gt 0 ] && [ "$1" != "--" ]; do shift; done
shift
work="$1"
asset="$2"
name=$(basename "$asset")
mkdir -p "$work/Blender_Fast_Build"
echo fbx > "$work/Blender_Fast_Build/$name.fbx"
echo "Exporting $asset"
echo "CHUNKING:1,2"
"#;

const UNREAL_EDITOR: &str = r#"#!/bin/sh
project_dir=$(dirname "$1")
shift
cook=0
script=""
for a in "$@"; do
  case "$a" in
    -run=cook) cook=1 ;;
    -ExecutePythonScript=*) script="${a#-ExecutePythonScript=}" ;;
  esac
done

if [ "$cook" = 1 ]; then
  asset=$(cat "$project_dir/last_import.txt") || exit 2
  dir="$project_dir/Saved/Cooked/WindowsNoEditor/Unreal_Fast_Build/Content/$(dirname "$asset")"
  mkdir -p "$dir"
  name=$(basename "$asset")
  echo uasset > "$dir/$name.uasset"
  echo uexp > "$dir/$name.uexp"
  echo "Cook finished"
  exit 0
fi

set -- $script
name=$(basename "$2" .fbx)
stub="$3"
mkdir -p "$project_dir/Content/$stub"
echo imported > "$project_dir/Content/$stub/$name.uasset"
echo "$stub/$name" > "$project_dir/last_import.txt"
echo "LogPython: chunks $5"
echo "LogPython: Successfully exported $name"
"#;

const UNREAL_PAK: &str = r#"#!/bin/sh
pak="$1"
list="${2#-create=}"
if [ ! -f "$list" ]; then
  echo "missing file list $list" >&2
  exit 3
fi
mkdir -p "$(dirname "$pak")"
cp "$list" "$pak"
"#;

/// Writes executable fake tools under `dir` and returns their paths.
///
/// The archiver copies its file list into the archive, so the installed
/// file shows what was packed.
pub fn write_fake_tools(dir: &Path) -> ToolPaths {
    fs::create_dir_all(dir).expect("Failed to create tools dir");
    let extractor = EXTRACTOR
        .replace("@DUMP@", DUMP_JSON)
        .replace("@LISTING@", PACKAGE_LISTING);

    ToolPaths {
        extractor: write_tool(dir, "umodel", &extractor),
        blender: write_tool(dir, "blender", BLENDER),
        blender_hook: write_plain(dir, "blender_hook.py"),
        unreal_editor: write_tool(dir, "UE4Editor-Cmd", UNREAL_EDITOR),
        unreal_hook: write_plain(dir, "unreal_hook.py"),
        unreal_pak: write_tool(dir, "UnrealPak", UNREAL_PAK),
    }
}

/// Writes an executable script that exits with `code` after printing `stdout`.
pub fn write_failing_tool(dir: &Path, name: &str, stdout: &str, code: i32) -> PathBuf {
    let body = format!("#!/bin/sh\necho '{}'\nexit {}\n", stdout.replace('\'', ""), code);
    write_tool(dir, name, &body)
}

/// Writes an executable shell script named `name` under `dir`.
pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("Failed to write fake tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make fake tool executable");
    path
}

fn write_plain(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"# hook\n").expect("Failed to write hook");
    path
}
