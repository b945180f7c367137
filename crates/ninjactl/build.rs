// Build script for ninjactl - embeds version at compile time

fn main() {
    // Release builds may override the version through the environment
    let version =
        std::env::var("NINJA_VERSION").unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());
    println!("cargo:rustc-env=NINJA_VERSION={}", version);

    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=NINJA_BUILD_DATE={}", build_date);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=NINJA_VERSION");
}
