use std::env;
use std::path::Path;

/// Environment variables that change how `ffmpeg-sys-next` finds FFmpeg.
const DISCOVERY_VARIABLES: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn warn(message: impl AsRef<str>) {
    println!("cargo:warning={}", message.as_ref());
}

fn main() {
    for variable in DISCOVERY_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    // pkg-config finds FFmpeg everywhere except Windows.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        warn("framegrab needs FFmpeg: set FFMPEG_DIR, or install it with vcpkg and set VCPKG_ROOT.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install = Path::new(&vcpkg_root).join("installed").join(triplet);
    if !install.exists() {
        warn(format!("no vcpkg FFmpeg install at {}", install.display()));
        return;
    }

    warn(format!("using vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to skip this lookup", install.display()));
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        warn("dynamic vcpkg FFmpeg builds also need VCPKGRS_DYNAMIC=1");
    }
}
