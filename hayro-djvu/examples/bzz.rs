//! This example decompresses a BZZ stream, such as the payload of an `ANTz`,
//! `TXTz` or `DIRM` chunk, and writes the result to stdout.

#![allow(missing_docs)]

use std::io::Write;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.bzz>", args[0]);

        return ExitCode::FAILURE;
    }

    let data = match std::fs::read(&args[1]) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("Failed to read input file: {err}");

            return ExitCode::FAILURE;
        }
    };

    let decoded = match hayro_djvu::decode_bzz(&data) {
        Ok(decoded) => decoded,
        Err(err) => {
            eprintln!("Failed to decode BZZ: {err}");

            return ExitCode::FAILURE;
        }
    };

    eprintln!("Decoded: {} bytes to {} bytes", data.len(), decoded.len());

    if let Err(err) = std::io::stdout().lock().write_all(&decoded) {
        eprintln!("Failed to write output: {err}");

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
