use keylink_transport::SerialTransport;
use tracing::debug;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let mut ports = SerialTransport::available_ports()
        .map_err(|err| transport_error("port enumeration failed", err))?;
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(count = ports.len(), "enumerated serial ports");

    print_ports(&ports, format);
    Ok(SUCCESS)
}
