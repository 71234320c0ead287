use bactlv_core::encoding::boxed::BoxOptions;
use bactlv_tools::{dump, parse_hex, DecodeTarget, ObjectTypeArg, OutputFormat, ToolError};
use clap::{Parser, Subcommand};
use std::io::Read;

#[derive(Parser, Debug)]
#[command(name = "tlvdump", about = "Decode a hex-encoded BACnet TLV capture")]
struct Args {
    #[command(subcommand)]
    target: Target,
    /// Hex bytes to decode; read from stdin when omitted.
    #[arg(long, global = true)]
    hex: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Boxed, global = true)]
    format: OutputFormat,
    /// Maximum line width for boxed output.
    #[arg(long, default_value_t = 120, global = true)]
    width: usize,
    /// Show bit position and length under each box.
    #[arg(long, global = true)]
    positions: bool,
    /// Fold boxes holding a single child into their parent.
    #[arg(long, global = true)]
    merge: bool,
}

#[derive(Subcommand, Debug)]
enum Target {
    /// Application-tagged values back to back.
    Application,
    /// A property value: identifier, optional index, value, optional priority.
    PropertyValue {
        #[arg(long, value_enum)]
        object_type: ObjectTypeArg,
    },
    /// A log-datum choice inside an opening/closing tag pair.
    LogData {
        #[arg(long, default_value_t = 1)]
        tag: u8,
    },
}

fn main() -> Result<(), ToolError> {
    env_logger::init();
    let args = Args::parse();
    let text = match args.hex {
        Some(hex) => hex,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let bytes = parse_hex(&text)?;
    let target = match args.target {
        Target::Application => DecodeTarget::Application,
        Target::PropertyValue { object_type } => {
            DecodeTarget::PropertyValue(object_type.into_object_type())
        }
        Target::LogData { tag } => DecodeTarget::LogData(tag),
    };
    let options = BoxOptions {
        width: args.width,
        merge_single_boxes: args.merge,
        pos_length_footer: args.positions,
        ..BoxOptions::default()
    };
    match dump(&bytes, target, args.format, &options) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("decode failed: {e}");
            std::process::exit(1);
        }
    }
    Ok(())
}
