use std::env;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src/rust/ffi.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let output_dir = Path::new(&crate_dir).join("include");
    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        println!("cargo:warning=Unable to create {}: {}", output_dir.display(), e);
        return;
    }

    let config = cbindgen::Config::from_file(Path::new(&crate_dir).join("cbindgen.toml"))
        .unwrap_or_default();

    // Header generation is best effort; the library builds without it.
    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(output_dir.join("ftbridge.h"));
        }
        Err(e) => println!("cargo:warning=Unable to generate C bindings: {}", e),
    }
}
