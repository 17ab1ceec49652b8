use osi_trace_file::TRACE_FILE_SPEC_VERSION;
use osi_trace_message::{interface_version_string, PROTOBUF_VERSION};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("osi-trace {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: osi-trace");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("OSI_TRACE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("osi_version: {}", interface_version_string());
    println!("protobuf_version: {PROTOBUF_VERSION}");
    println!("trace_file_version: {TRACE_FILE_SPEC_VERSION}");

    Ok(SUCCESS)
}
