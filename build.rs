use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-env-changed=BUILDINC_DIRECTORY");
    println!("cargo:rustc-check-cfg=cfg(kusddrphy)");
    println!("cargo:rustc-check-cfg=cfg(ddrphy_wlevel)");

    // Host builds (and tests) have no gateware; they fall back to the 7-series preset.
    let out_dir = match env::var("BUILDINC_DIRECTORY") {
        Ok(dir) => dir,
        Err(_) => return
    };
    let cfg_path = Path::new(&out_dir).join("generated").join("rust-cfg");
    println!("cargo:rerun-if-changed={}", cfg_path.display());

    let f = match File::open(&cfg_path) {
        Ok(f) => BufReader::new(f),
        Err(err) => panic!("cannot open {}: {}", cfg_path.display(), err)
    };
    for line in f.lines() {
        let line = line.expect("rust-cfg is not valid UTF-8");
        let line = line.trim();
        if !line.is_empty() {
            println!("cargo:rustc-cfg={}", line);
        }
    }
}
