fn main() {
    println!("cargo:rerun-if-changed=config/reader-node.json");
    println!("cargo:rerun-if-changed=config/relay-node.json");

    // ESP-IDF link arguments are only needed for the firmware binaries.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
