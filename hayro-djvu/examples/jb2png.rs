//! This example shows you how to convert a JB2 page into a PNG file.
//!
//! The input is the raw payload of an `Sjbz` chunk. Pages that share symbols
//! with other pages also need the payload of the `Djbz` chunk they include.

#![allow(missing_docs)]

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let (input_path, dictionary_path, output_path) = match args.as_slice() {
        [_, input, output] => (input, None, output),
        [_, input, dictionary, output] => (input, Some(dictionary), output),
        _ => {
            eprintln!("Usage: {} <input.sjbz> [shared.djbz] <output.png>", args[0]);

            return ExitCode::FAILURE;
        }
    };

    let read = |path: &String| match std::fs::read(path) {
        Ok(data) => Some(data),
        Err(err) => {
            eprintln!("Failed to read {path}: {err}");

            None
        }
    };

    let Some(data) = read(input_path) else {
        return ExitCode::FAILURE;
    };

    let dictionary_data = match dictionary_path.map(read) {
        Some(None) => return ExitCode::FAILURE,
        Some(Some(data)) => Some(data),
        None => None,
    };

    let dictionary = match dictionary_data.as_deref().map(hayro_djvu::decode_jb2_dictionary) {
        Some(Ok(dictionary)) => {
            println!("Dictionary: {} symbols", dictionary.library().len());

            Some(dictionary)
        }
        Some(Err(err)) => {
            eprintln!("Failed to decode dictionary: {err}");

            return ExitCode::FAILURE;
        }
        None => None,
    };

    let page = match hayro_djvu::decode_jb2(&data, dictionary.as_ref()) {
        Ok(page) => page,
        Err(err) => {
            eprintln!("Failed to decode JB2: {err}");

            return ExitCode::FAILURE;
        }
    };

    if page.is_empty() {
        eprintln!("The stream contains no page");

        return ExitCode::FAILURE;
    }

    println!("Decoded: {}x{} page", page.width(), page.height());

    if let Err(err) = page.to_image().save(output_path) {
        eprintln!("Failed to save PNG: {err}");

        return ExitCode::FAILURE;
    }

    eprintln!("Saved: {output_path}");

    ExitCode::SUCCESS
}
