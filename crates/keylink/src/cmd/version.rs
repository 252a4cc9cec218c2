use keylink_session::{DEFAULT_HANDSHAKE_INTERVAL, SENTINEL};
use keylink_transport::DEFAULT_BAUD_RATE;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("keylink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: keylink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("KEYLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("default_baud: {DEFAULT_BAUD_RATE}");
    println!(
        "handshake: sentinel=0x{SENTINEL:02x} interval={}ms",
        DEFAULT_HANDSHAKE_INTERVAL.as_millis()
    );

    Ok(SUCCESS)
}
