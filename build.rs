fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=proto/mcp.proto");
    prost_build::Config::new().compile_protos(&["proto/mcp.proto"], &["proto"])
}
