// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Copies row colors from one workbook onto another.
//!
//! ```bash
//! cargo run --example transfer -- palette.xlsx Palette report.xlsx Report
//! ```
//!
//! With a single argument it lists the sheets of a workbook instead.

use std::env;
use std::process::ExitCode;

use teinte::{apply_colors, sheet_names};

fn main() -> ExitCode {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [book] => match sheet_names(book) {
            Ok(names) => {
                for name in names {
                    println!("{name}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("cannot list {book}: {e}");
                ExitCode::FAILURE
            }
        },
        [source, source_sheet, target, target_sheet] => {
            match apply_colors(source, source_sheet, target, target_sheet) {
                Ok(()) => {
                    println!("painted {target}!{target_sheet} from {source}!{source_sheet}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("transfer failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("usage: transfer <book.xlsx>");
            eprintln!("       transfer <source.xlsx> <sheet> <target.xlsx> <sheet>");
            ExitCode::FAILURE
        }
    }
}
