//! # sm-migrate tool
//!
//! Offline helpers for inspecting the identifiers a migration uses.

use anyhow::{Context, Result};
use sm_migrate_adapter_aas::{
    decode_id_base64url, encode_id_base64url, encode_submodel_id, submodel_urn,
    DescriptorBuilder,
};
use std::env;

const DEFAULT_URN_PREFIX: &str = "urn:ag.em:sm:";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "urn" => {
            if args.len() < 4 {
                eprintln!("Usage: sm-migrate-tool urn <asset> <suffix> [prefix]");
                std::process::exit(1);
            }
            let prefix = args.get(4).map_or(DEFAULT_URN_PREFIX, String::as_str);
            let urn = submodel_urn(prefix, &args[2], &args[3]);
            println!("{urn}");
            println!("{}", encode_submodel_id(&urn));
        }
        "encode" => {
            if args.len() < 3 {
                eprintln!("Usage: sm-migrate-tool encode <identifier>");
                std::process::exit(1);
            }
            println!("{}", encode_id_base64url(&args[2]));
        }
        "decode" => {
            if args.len() < 3 {
                eprintln!("Usage: sm-migrate-tool decode <encoded>");
                std::process::exit(1);
            }
            let decoded = decode_id_base64url(&args[2]).context("Failed to decode")?;
            println!("{decoded}");
        }
        "descriptor" => {
            if args.len() < 5 {
                eprintln!(
                    "Usage: sm-migrate-tool descriptor <data-plane-url> <asset> <submodel-id>..."
                );
                std::process::exit(1);
            }
            let builder = DescriptorBuilder::new(&args[2], "<id>", "<dspEndpoint>");
            let descriptor = builder
                .shell_descriptor(&args[3], &args[4..])
                .context("Invalid descriptor input")?;
            let json = serde_json::to_string_pretty(&descriptor)
                .context("Failed to serialize descriptor")?;
            println!("{json}");
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"sm-migrate tool

USAGE:
    sm-migrate-tool <COMMAND> [OPTIONS]

COMMANDS:
    urn <asset> <suffix> [prefix]               Derive a submodel URN and its encoded path segment
    encode <id>                                 Encode a submodel id to base64url (no padding)
    decode <encoded>                            Decode a base64url-encoded id
    descriptor <data-plane> <asset> <id>...     Preview the shell descriptor for an asset
    help                                        Show this help message

EXAMPLES:
    sm-migrate-tool urn train.1 :pcf:1.0.0
    sm-migrate-tool encode "sm-1"
    sm-migrate-tool decode "c20tMQ"
"#
    );
}
