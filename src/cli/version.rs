/// Display version information
pub fn execute() {
    println!("sigvault {}", env!("CARGO_PKG_VERSION"));
    println!("Multi-signature vault engine");
    println!("Snapshot format: v{}", sigvault::vault::SNAPSHOT_VERSION);
}
