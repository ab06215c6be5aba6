// /////////////////////////////////////////////////////////////////////////////
// Streamy
// Copyright (c) 2026 Streamy Contributors
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

mod cli;
mod commands;
mod exit_code;
mod logger;

use logger::LogFormat;

#[tokio::main]
async fn main() {
    let cli = cli::parse_cli();
    let format = if cli.json { LogFormat::Json } else { LogFormat::Pretty };
    logger::init(cli.verbose, format);

    let exit = commands::run(cli).await;
    std::process::exit(exit.code());
}
