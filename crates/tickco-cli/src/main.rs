// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! tickco CLI - demo panel and scripted demo runs.

mod config;
mod demos;
mod help;
mod output;
mod panel;

use std::cell::Cell;
use std::env;
use std::path::Path;
use std::process;
use std::rc::Rc;
use std::time::Duration;

use tickco_rt::{drive, DriveOptions, DriveOutcome, Owner, Scheduler, StartError, TaskHandle};

use config::CliConfig;
use demos::{ExampleWww, Nested, Toggler, WaitUntilWhile, EXAMPLE};

struct Options {
    command: Option<String>,
    rest: Vec<String>,
    config: CliConfig,
    seconds: f64,
    json: bool,
    verbose: bool,
}

fn main() {
    output::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("{}: {}", output::error_label(), msg);
            eprintln!(
                "{}: {}",
                output::hint_label(),
                output::hint_text("run `tickco help` for usage")
            );
            process::exit(1);
        }
    };
    init_logging(opts.verbose);

    match opts.command.as_deref() {
        None | Some("help") => help::print_usage(),
        Some("version") => println!("tickco {}", help::VERSION),
        Some("demos") => help::print_demos(),
        Some("panel") => {
            let mut sched = Scheduler::new(opts.config.scheduler.clone());
            panel::run(&mut sched, &opts.config, opts.json);
        }
        Some("run") => {
            let Some(name) = opts.rest.first() else {
                eprintln!("Usage: tickco run <demo>");
                help::print_demos();
                process::exit(1);
            };
            cmd_run(name, &opts);
        }
        Some(other) => {
            eprintln!("{}: unknown command `{}`", output::error_label(), other);
            help::print_usage();
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut opts = Options {
        command: None,
        rest: Vec::new(),
        config: CliConfig::default(),
        seconds: 5.0,
        json: false,
        verbose: false,
    };
    let mut interval_ms = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or("--config needs a file")?;
                opts.config = CliConfig::load(Path::new(path))?;
            }
            "--interval" => {
                let ms = iter.next().ok_or("--interval needs milliseconds")?;
                interval_ms = Some(
                    ms.parse::<u64>()
                        .map_err(|e| format!("--interval {}: {}", ms, e))?,
                );
            }
            "--seconds" => {
                let secs = iter.next().ok_or("--seconds needs a number")?;
                opts.seconds = secs
                    .parse()
                    .map_err(|e| format!("--seconds {}: {}", secs, e))?;
            }
            "--json" => opts.json = true,
            "-v" | "--verbose" => opts.verbose = true,
            "-h" | "--help" => opts.command = Some("help".to_string()),
            "-V" | "--version" => opts.command = Some("version".to_string()),
            flag if flag.starts_with('-') => return Err(format!("unknown option `{}`", flag)),
            word => {
                if opts.command.is_none() {
                    opts.command = Some(word.to_string());
                } else {
                    opts.rest.push(word.to_string());
                }
            }
        }
    }

    // Command line wins over the config file.
    if let Some(ms) = interval_ms {
        opts.config.interval_ms = ms;
    }
    Ok(opts)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .try_init()
        .ok();
}

fn cmd_run(name: &str, opts: &Options) {
    let mut sched = Scheduler::new(opts.config.scheduler.clone());
    let owner = Owner::new(format!("run:{}", name));
    demos::register(&owner);

    let started = match start_demo(&mut sched, &owner, name, &opts.config) {
        Some(result) => result,
        None => {
            eprintln!("{}: unknown demo `{}`", output::error_label(), name);
            help::print_demos();
            process::exit(1);
        }
    };
    if let Err(e) = started {
        eprintln!("{}: {}", output::error_label(), e);
        process::exit(1);
    }

    let timeout = Duration::try_from_secs_f64(opts.seconds).unwrap_or(Duration::ZERO);
    let outcome = drive(
        &mut sched,
        DriveOptions {
            interval: opts.config.interval(),
            timeout: Some(timeout),
        },
    );

    if opts.json {
        match serde_json::to_string_pretty(&sched.snapshot()) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}: {}", output::error_label(), e),
        }
    }
    match outcome {
        DriveOutcome::Idle { ticks } => {
            println!("{}", output::banner_ok(name, &format!("idle after {} ticks", ticks)));
        }
        DriveOutcome::TimedOut { ticks, live } => {
            if !opts.json {
                for info in sched.snapshot() {
                    println!("{}", output::task_row(&info));
                }
            }
            println!(
                "{}",
                output::banner_stopped(
                    name,
                    &format!("{} after {} ticks", output::live_count(live), ticks)
                )
            );
        }
    }
}

/// Start the named demo. `None` if there is no such demo.
fn start_demo(
    sched: &mut Scheduler,
    owner: &Owner,
    name: &str,
    config: &CliConfig,
) -> Option<Result<TaskHandle, StartError>> {
    let result = match name {
        "example" => sched.start_named(owner, EXAMPLE),
        "www" => sched.start(owner, ExampleWww::new(config.fetch_source())),
        "nested" => sched.start(owner, Nested::default()),
        "wait" => {
            let status = Rc::new(Cell::new(false));
            let waiter = sched.start(owner, WaitUntilWhile::new(status.clone()));
            if waiter.is_ok() {
                let toggler = Toggler::new(status, Duration::from_secs(1), 2);
                if let Err(e) = sched.start(owner, toggler) {
                    return Some(Err(e));
                }
            }
            waiter
        }
        "count-twice" => sched.start_named(owner, "CountTwice"),
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_command_and_flags() {
        let opts = parse_args(&args(&["run", "nested", "--seconds", "2.5", "--json", "-v"])).unwrap();
        assert_eq!(opts.command.as_deref(), Some("run"));
        assert_eq!(opts.rest, vec!["nested".to_string()]);
        assert_eq!(opts.seconds, 2.5);
        assert!(opts.json && opts.verbose);
    }

    #[test]
    fn interval_flag_overrides_default() {
        let opts = parse_args(&args(&["panel", "--interval", "40"])).unwrap();
        assert_eq!(opts.config.interval(), Duration::from_millis(40));
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
        assert!(parse_args(&args(&["--interval"])).is_err());
        assert!(parse_args(&args(&["--seconds", "soon"])).is_err());
    }

    #[test]
    fn every_listed_demo_starts() {
        let config = CliConfig {
            offline: true,
            ..CliConfig::default()
        };
        for (name, _) in demos::DEMOS {
            let mut sched = Scheduler::default();
            let owner = Owner::new("test");
            demos::register(&owner);
            let started = start_demo(&mut sched, &owner, name, &config);
            assert!(matches!(started, Some(Ok(_))), "demo {} failed to start", name);
        }
        let mut sched = Scheduler::default();
        let owner = Owner::new("test");
        assert!(start_demo(&mut sched, &owner, "missing", &config).is_none());
    }
}
