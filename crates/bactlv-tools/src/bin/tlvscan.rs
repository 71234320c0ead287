use bactlv_tools::{parse_hex, scan, ToolError};
use clap::Parser;
use std::io::Read;

#[derive(Parser, Debug)]
#[command(name = "tlvscan", about = "List the raw tag headers of a hex-encoded capture")]
struct Args {
    /// Hex bytes to scan; read from stdin when omitted.
    hex: Option<String>,
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
    match scan(&bytes) {
        Ok(listing) => print!("{listing}"),
        Err(e) => {
            eprintln!("scan failed: {e}");
            std::process::exit(1);
        }
    }
    Ok(())
}
