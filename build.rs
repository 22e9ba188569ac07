//! This build script records the current UTC time as the watch's initial clock
//! reference and, for firmware builds, copies the `memory.x` file from the crate
//! root into a directory where the linker can always find it at build time.

use std::{env, fs::File, io::Write, path::PathBuf};

fn main() {
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    // Create rs file with current UTC time
    File::create(out.join("build_time.rs"))
        .unwrap()
        .write_fmt(format_args!(
            "/// Seconds since the Unix epoch at which the crate was built.\npub const BUILD_UTC_EPOCH: i64 = {:?};\n",
            chrono::Utc::now().timestamp()
        ))
        .unwrap();

    // Put memory layout in the output directory and ensure it's on the linker search path.
    if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        File::create(out.join("memory.x"))
            .unwrap()
            .write_all(include_bytes!("memory.x"))
            .unwrap();
        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // No `rerun-if-changed`, so the clock reference is refreshed on every build
}
