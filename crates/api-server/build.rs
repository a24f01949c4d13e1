fn main() {
    // Re-embed the dashboard page when it changes
    println!("cargo:rerun-if-changed=../../frontend/");
}
