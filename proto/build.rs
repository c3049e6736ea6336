fn main() -> std::io::Result<()> {
    let mut config = prost_build::Config::new();
    config
        .type_attribute(".", "#[derive(serde::Serialize, serde::Deserialize)]")
        .bytes([".scheduler.TaskStatus.uuid", ".scheduler.Call.Acknowledge.uuid"]);
    config.compile_protos(&["proto/scheduler.proto"], &["proto/"])?;
    Ok(())
}
