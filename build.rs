// Linker scripts are only needed for the firmware image; host builds of the
// library and its tests link normally.

fn main() {
    if std::env::var_os("CARGO_FEATURE_FIRMWARE").is_none() {
        return;
    }

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    if std::env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
