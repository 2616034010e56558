fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();

    match target_os.as_str() {
        "linux" => {
            println!(
                "cargo:rustc-cdylib-link-arg=-Wl,--version-script={}/linker/wrap.lds",
                manifest_dir
            );
            println!("cargo:rerun-if-changed=linker/wrap.lds");
        }
        "macos" => {
            // All symbols are exported by default on macOS
        }
        _ => {}
    }
}
