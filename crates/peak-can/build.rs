//! Build script for the PCAN-Basic backend
//!
//! Links the vendor PCANBasic library when the `ffi` feature is enabled.
//! Set `PCANBASIC_LIB_DIR` if the library is not on the default search path.

fn main() {
    println!("cargo:rerun-if-env-changed=PCANBASIC_LIB_DIR");

    if std::env::var_os("CARGO_FEATURE_FFI").is_none() {
        return;
    }

    if let Some(dir) = std::env::var_os("PCANBASIC_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
    }

    // Windows ships PCANBasic.dll, Linux/macOS ship libpcanbasic
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "windows" {
        println!("cargo:rustc-link-lib=dylib=PCANBasic");
    } else {
        println!("cargo:rustc-link-lib=dylib=pcanbasic");
    }
}
