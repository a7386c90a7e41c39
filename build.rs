//! Build-time hints for locating FFmpeg.
//!
//! `ffmpeg-sys-next` finds FFmpeg through pkg-config on Unix, which needs no
//! help. On Windows it needs `FFMPEG_DIR`; when that is missing, point at a
//! vcpkg install if one can be found.

use std::{env, path::PathBuf};

const WATCHED_VARIABLES: [&str; 3] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"];
const DEFAULT_TRIPLET: &str = "x64-windows";

fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_ffmpeg_dir() {
        Some(dir) if dir.exists() => warn(&format!(
            "FFMPEG_DIR is not set; found FFmpeg under vcpkg, build with FFMPEG_DIR={}",
            dir.display()
        )),
        Some(dir) => warn(&format!(
            "FFMPEG_DIR is not set and {} does not exist; run `vcpkg install ffmpeg`",
            dir.display()
        )),
        None => warn("FFMPEG_DIR is not set; framedump needs FFmpeg development libraries"),
    }
}

fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| DEFAULT_TRIPLET.to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn warn(message: &str) {
    println!("cargo:warning={message}");
}
