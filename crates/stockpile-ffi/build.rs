//! Regenerates `stockpile.h` whenever the exported API changes.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");

    let Ok(crate_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let header = PathBuf::from(&crate_dir).join("stockpile.h");

    let mut config = cbindgen::Config::default();
    config.language = cbindgen::Language::C;
    config.header = Some("/* Generated from stockpile-ffi. Do not edit. */".to_string());
    config.include_guard = Some("STOCKPILE_H".to_string());
    config.cpp_compat = true;
    config.documentation = true;
    // C enumerators share one namespace; StockpileEventKind_SessionEnded etc.
    config.enumeration = cbindgen::EnumConfig {
        prefix_with_name: true,
        ..Default::default()
    };

    match cbindgen::generate_with_config(&crate_dir, config) {
        Ok(bindings) => {
            bindings.write_to_file(header);
        }
        // keep the previous header rather than failing the library build
        Err(e) => println!("cargo:warning=stockpile.h not regenerated: {}", e),
    }
}
