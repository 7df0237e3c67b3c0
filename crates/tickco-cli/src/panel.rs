// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Interactive demo panel.
//!
//! Each stdin line is one button press. A reader thread forwards lines
//! over a channel; the main thread keeps ticking between presses, so
//! running tasks make progress while the panel waits for input.

use std::cell::Cell;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tickco_rt::{Coroutines, Owner, Scheduler, TaskHandle};

use crate::config::CliConfig;
use crate::demos::{self, Example, ExampleWww, Nested, Source, WaitUntilWhile, EXAMPLE};
use crate::help;
use crate::output;

/// What the loop should do after a command.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Continue,
    /// Tick without reading input until this much time has passed.
    Sleep(Duration),
    Quit,
}

pub struct Panel {
    owner: Owner,
    /// Handle from the last `start-func`.
    last: Option<TaskHandle>,
    /// Switch watched by the wait demo.
    status: Rc<Cell<bool>>,
    fetch: Source,
    json: bool,
}

impl Panel {
    pub fn new(config: &CliConfig, json: bool) -> Self {
        let owner = Owner::new("CoroutinePanel");
        demos::register(&owner);
        Self {
            owner,
            last: None,
            status: Rc::new(Cell::new(false)),
            fetch: config.fetch_source(),
            json,
        }
    }

    pub fn status(&self) -> bool {
        self.status.get()
    }

    pub fn dispatch(&mut self, sched: &mut Scheduler, line: &str) -> Result<Flow, String> {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else {
            return Ok(Flow::Continue);
        };
        debug!("panel: {}", line.trim());

        match cmd {
            "start-name" => {
                self.owner.start_coroutine_named(sched, EXAMPLE);
            }
            "start-func" => {
                self.last = self.owner.start_coroutine(sched, Example::default());
            }
            "stop-name" => {
                let n = self.owner.stop_coroutine_named(sched, EXAMPLE);
                info!("stopped {} task(s) named {}", n, EXAMPLE);
            }
            "stop-func" => match self.last.take() {
                Some(handle) => {
                    if !self.owner.stop_coroutine(sched, &handle) {
                        info!("{} already finished", handle.id());
                    }
                }
                None => warn!("no task from start-func to stop"),
            },
            "stop-type" => {
                let n = self.owner.stop_coroutine_like(sched, &Example::default());
                info!("stopped {} Example task(s)", n);
            }
            "fetch" => {
                self.owner
                    .start_coroutine(sched, ExampleWww::new(self.fetch.clone()));
            }
            "nested" => {
                self.owner.start_coroutine(sched, Nested::default());
            }
            "wait" => {
                self.status.set(false);
                self.owner
                    .start_coroutine(sched, WaitUntilWhile::new(self.status.clone()));
            }
            "toggle" => {
                self.status.set(!self.status.get());
                info!(
                    "switch for wait until/while: {}",
                    if self.status.get() { "On" } else { "Off" }
                );
            }
            "stop-all" => {
                let n = self.owner.stop_all_coroutines(sched);
                info!("stopped {} task(s)", n);
            }
            "status" => self.print_status(sched)?,
            "sleep" => {
                let secs: f64 = words
                    .next()
                    .ok_or("usage: sleep <secs>")?
                    .parse()
                    .map_err(|e| format!("sleep: {}", e))?;
                let d = Duration::try_from_secs_f64(secs).map_err(|e| format!("sleep: {}", e))?;
                return Ok(Flow::Sleep(d));
            }
            "help" | "?" => help::print_panel_help(),
            "quit" | "exit" => return Ok(Flow::Quit),
            other => return Err(format!("unknown panel command `{}`", other)),
        }
        Ok(Flow::Continue)
    }

    fn print_status(&self, sched: &Scheduler) -> Result<(), String> {
        let snapshot = sched.snapshot();
        if self.json {
            let text = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
            println!("{}", text);
            return Ok(());
        }
        println!("{}", output::separator(60));
        for info in &snapshot {
            println!("{}", output::task_row(info));
        }
        println!(
            "  {} · switch {}",
            output::live_count(snapshot.len()),
            if self.status() { "on" } else { "off" }
        );
        println!("{}", output::separator(60));
        Ok(())
    }

    /// Stop whatever is still running on behalf of the panel.
    pub fn close(self, sched: &mut Scheduler) -> usize {
        self.owner.stop_all_coroutines(sched)
    }
}

/// Run the panel until `quit` or end of input.
pub fn run(sched: &mut Scheduler, config: &CliConfig, json: bool) {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut panel = Panel::new(config, json);
    let interval = config.interval();
    let mut paused_until: Option<Instant> = None;
    help::print_panel_help();

    loop {
        if paused_until.map_or(true, |t| Instant::now() >= t) {
            paused_until = None;
            match rx.try_recv() {
                Ok(line) => match panel.dispatch(sched, &line) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Sleep(d)) => paused_until = Some(Instant::now() + d),
                    Ok(Flow::Quit) => break,
                    Err(msg) => eprintln!("{}: {}", output::error_label(), msg),
                },
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => break,
            }
        }
        sched.on_tick();
        thread::sleep(interval);
    }

    let stopped = panel.close(sched);
    debug!("panel closed, stopped {} task(s)", stopped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickco_rt::{ManualClock, SchedulerConfig, TaskState};

    fn setup() -> (Panel, Scheduler, ManualClock) {
        let clock = ManualClock::new();
        let sched = Scheduler::with_clock(SchedulerConfig::default(), clock.clone());
        let config = CliConfig {
            offline: true,
            ..CliConfig::default()
        };
        (Panel::new(&config, false), sched, clock)
    }

    #[test]
    fn start_and_stop_by_name() {
        let (mut panel, mut sched, _) = setup();
        panel.dispatch(&mut sched, "start-name").unwrap();
        panel.dispatch(&mut sched, "start-name").unwrap();
        assert_eq!(sched.len(), 2);
        panel.dispatch(&mut sched, "stop-name").unwrap();
        assert!(sched.is_empty());
    }

    #[test]
    fn stop_func_targets_only_its_handle() {
        let (mut panel, mut sched, _) = setup();
        panel.dispatch(&mut sched, "start-name").unwrap();
        panel.dispatch(&mut sched, "start-func").unwrap();
        let handle = panel.last.clone().unwrap();
        panel.dispatch(&mut sched, "stop-func").unwrap();
        assert_eq!(handle.state(), TaskState::Stopped);
        assert_eq!(sched.len(), 1);
        // Nothing left to stop; still not an error.
        panel.dispatch(&mut sched, "stop-func").unwrap();
    }

    #[test]
    fn stop_type_catches_direct_starts_only() {
        let (mut panel, mut sched, _) = setup();
        panel.dispatch(&mut sched, "start-func").unwrap();
        panel.dispatch(&mut sched, "start-name").unwrap();
        panel.dispatch(&mut sched, "nested").unwrap();
        panel.dispatch(&mut sched, "stop-type").unwrap();
        // Both Example tasks share a type; the nested one survives.
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn wait_and_toggle() {
        let (mut panel, mut sched, _) = setup();
        panel.dispatch(&mut sched, "wait").unwrap();
        sched.advance(Duration::ZERO);
        assert_eq!(sched.len(), 1);
        panel.dispatch(&mut sched, "toggle").unwrap();
        assert!(panel.status());
        sched.advance(Duration::ZERO);
        panel.dispatch(&mut sched, "toggle").unwrap();
        sched.advance(Duration::ZERO);
        assert!(sched.is_empty());
    }

    #[test]
    fn flow_commands() {
        let (mut panel, mut sched, _) = setup();
        assert_eq!(panel.dispatch(&mut sched, "   ").unwrap(), Flow::Continue);
        assert_eq!(
            panel.dispatch(&mut sched, "sleep 0.5").unwrap(),
            Flow::Sleep(Duration::from_millis(500))
        );
        assert!(panel.dispatch(&mut sched, "sleep").is_err());
        assert!(panel.dispatch(&mut sched, "launch").is_err());
        assert_eq!(panel.dispatch(&mut sched, "quit").unwrap(), Flow::Quit);
    }

    #[test]
    fn stop_all_then_close() {
        let (mut panel, mut sched, _) = setup();
        panel.dispatch(&mut sched, "start-name").unwrap();
        panel.dispatch(&mut sched, "fetch").unwrap();
        panel.dispatch(&mut sched, "stop-all").unwrap();
        assert!(sched.is_empty());
        panel.dispatch(&mut sched, "start-func").unwrap();
        assert_eq!(panel.close(&mut sched), 1);
    }
}
