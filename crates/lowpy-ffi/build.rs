//! Regenerates `include/lowpy.h` from the crate's exported items.

use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let crate_dir = Path::new(&manifest_dir);
    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .unwrap_or_else(|e| panic!("invalid cbindgen.toml: {e}"));

    // Header failures warn; the library still builds.
    match cbindgen::generate_with_config(crate_dir, config) {
        Ok(bindings) => {
            let include = crate_dir.join("include");
            std::fs::create_dir_all(&include)
                .unwrap_or_else(|e| panic!("cannot create {}: {e}", include.display()));
            bindings.write_to_file(include.join("lowpy.h"));
        }
        Err(e) => println!("cargo:warning=lowpy.h was not regenerated: {e}"),
    }
}
