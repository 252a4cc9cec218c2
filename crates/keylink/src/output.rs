use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use keylink_frame::{Payload, Value};
use keylink_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PayloadOutput<'a> {
    event: &'a str,
    port: &'a str,
    key: u16,
    kind: &'static str,
    value: serde_json::Value,
    timestamp: String,
}

impl<'a> PayloadOutput<'a> {
    fn new(event: &'a str, port: &'a str, payload: &Payload) -> Self {
        Self {
            event,
            port,
            key: payload.key().get(),
            kind: payload.kind().name(),
            value: json_value(payload.value()),
            timestamp: now_unix_seconds(),
        }
    }
}

/// Print a payload that was received from, or sent to, `port`.
pub fn print_payload(event: &str, port: &str, payload: &Payload, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PayloadOutput::new(event, port, payload);
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "PORT", "KEY", "TYPE", "VALUE"])
                .add_row(vec![
                    event.to_string(),
                    port.to_string(),
                    payload.key().get().to_string(),
                    payload.kind().name().to_string(),
                    payload.value().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{event} key={} ({}) value={} port={port}",
                payload.key(),
                payload.kind(),
                payload.value()
            );
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    vid: Option<String>,
    pid: Option<String>,
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
    serial_number: Option<&'a str>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        Self {
            name: &port.name,
            kind: port.kind,
            vid: port.vid.map(usb_id),
            pid: port.pid.map(usb_id),
            manufacturer: port.manufacturer.as_deref(),
            product: port.product.as_deref(),
            serial_number: port.serial_number.as_deref(),
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports.iter().map(PortOutput::from).collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    vid_pid(port),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in ports {
                println!("{} [{}] {}", port.name, port.kind, vid_pid(port));
            }
        }
    }
}

fn json_value(value: Value) -> serde_json::Value {
    match value {
        Value::Integer(v) => serde_json::Value::from(v),
        // NaN and infinities have no JSON number form.
        Value::Float(v) => serde_json::Number::from_f64(f64::from(v))
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(v.to_string())),
    }
}

fn usb_id(id: u16) -> String {
    format!("{id:04x}")
}

fn vid_pid(port: &PortInfo) -> String {
    match (port.vid, port.pid) {
        (Some(vid), Some(pid)) => format!("{}:{}", usb_id(vid), usb_id(pid)),
        _ => "-".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_json_carries_key_and_kind() {
        let payload = Payload::float(3, 1.5).unwrap();
        let out = PayloadOutput::new("received", "/dev/ttyUSB0", &payload);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["key"], 3);
        assert_eq!(json["kind"], "float");
        assert_eq!(json["value"], 1.5);
        assert_eq!(json["port"], "/dev/ttyUSB0");
    }

    #[test]
    fn non_finite_float_becomes_string() {
        assert_eq!(json_value(Value::Float(f32::NAN)), serde_json::json!("NaN"));
        assert_eq!(json_value(Value::Integer(-3)), serde_json::json!(-3));
    }

    #[test]
    fn usb_ids_are_hex() {
        let port = PortInfo {
            name: "/dev/ttyACM0".to_string(),
            kind: "usb",
            vid: Some(0x2341),
            pid: Some(0x0043),
            manufacturer: None,
            product: Some("Uno".to_string()),
            serial_number: None,
        };
        assert_eq!(vid_pid(&port), "2341:0043");
        let json = serde_json::to_value(PortOutput::from(&port)).unwrap();
        assert_eq!(json["vid"], "2341");
        assert_eq!(json["product"], "Uno");
    }
}
