fn main() {
    // ESP-IDF link arguments are only needed for the device build; host
    // tests run with `--no-default-features`.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
