fn main() {
    println!("cargo:rerun-if-env-changed=TEXDEP_VERSION");

    if option_env!("TEXDEP_VERSION").is_none() {
        println!("cargo:rustc-env=TEXDEP_VERSION={}", env!("CARGO_PKG_VERSION"));
    }
}
