use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use prost::Message;

const PROTO_DIR: &str = "proto";

/// Top-level schema files; imports are resolved from `PROTO_DIR`.
const PROTO_FILES: &[&str] = &[
    "osi_groundtruth.proto",
    "osi_sensordata.proto",
    "osi_sensorview.proto",
    "osi_sensorviewconfiguration.proto",
    "osi_hostvehicledata.proto",
    "osi_trafficcommand.proto",
    "osi_trafficcommandupdate.proto",
    "osi_trafficupdate.proto",
    "osi_motionrequest.proto",
    "osi_streamingupdate.proto",
];

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={PROTO_DIR}");

    let files: Vec<PathBuf> = PROTO_FILES
        .iter()
        .map(|file| PathBuf::from(PROTO_DIR).join(file))
        .collect();
    let descriptor_set = protox::compile(&files, [PROTO_DIR])?;

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    fs::write(
        out_dir.join("osi3_descriptor.bin"),
        descriptor_set.encode_to_vec(),
    )?;

    prost_build::Config::new().compile_fds(descriptor_set)?;
    Ok(())
}
