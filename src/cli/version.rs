/// Display version information
pub fn execute() {
    println!("ppcc {}", env!("CARGO_PKG_VERSION"));
    println!("Privacy-preserving contact chaining across telecom partitions");
}
