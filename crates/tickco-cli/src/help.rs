// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Help text for CLI commands.

use crate::demos::DEMOS;
use crate::output;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn print_usage() {
    println!(
        "{} {} - Tick-driven cooperative coroutines",
        output::title("tickco"),
        output::version(VERSION)
    );
    println!();
    println!(
        "{}: {} {} {}",
        output::section_header("Usage"),
        output::command("tickco"),
        output::arg("<command>"),
        output::arg("[options]")
    );
    println!();
    println!("{}", output::section_header("Commands:"));
    println!("  {} {}    Run one demo until idle or timeout", output::command("run"), output::arg("<demo>"));
    println!("  {}           Interactive demo panel on stdin", output::command("panel"));
    println!("  {}           List available demos", output::command("demos"));
    println!("  {}            Show this help", output::command("help"));
    println!("  {}         Show version", output::command("version"));
    println!();
    println!("{}", output::section_header("Options:"));
    println!("  {} {}  Load settings from a JSON file", output::arg("--config"), output::arg("<file>"));
    println!("  {} {}    Tick interval in milliseconds (default 16)", output::arg("--interval"), output::arg("<ms>"));
    println!("  {} {}   Timeout for `run` (default 5)", output::arg("--seconds"), output::arg("<n>"));
    println!("  {}              Print task status as JSON", output::arg("--json"));
    println!("  {}      Debug logging (or set RUST_LOG)", output::arg("-v, --verbose"));
}

pub fn print_demos() {
    println!("{}", output::section_header("Demos:"));
    for (name, about) in DEMOS {
        println!("  {:<12} {}", output::command(name), about);
    }
}

pub fn print_panel_help() {
    println!("{}", output::section_header("Panel commands:"));
    let rows: &[(&str, &str)] = &[
        ("start-name", "Start `Example` by registered name"),
        ("start-func", "Start `Example` directly, remembering its handle"),
        ("stop-name", "Stop every task named `Example`"),
        ("stop-func", "Stop the task from the last start-func"),
        ("stop-type", "Stop every `Example`, however it was started"),
        ("fetch", "Start the fetch demo"),
        ("nested", "Start the nested demo"),
        ("wait", "Reset the switch and start the wait demo"),
        ("toggle", "Flip the switch the wait demo watches"),
        ("stop-all", "Stop every task of this panel"),
        ("status", "Show live tasks"),
        ("sleep <secs>", "Keep ticking without reading input"),
        ("help", "Show this list"),
        ("quit", "Stop everything and exit"),
    ];
    for (cmd, about) in rows {
        println!("  {:<14} {}", output::command(cmd), about);
    }
}
