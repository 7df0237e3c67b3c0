// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Demo routines shown by the panel and `tickco run`.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use tickco_rt::{AsyncOp, Context, Owner, Routine, Step, Yield};

/// Name the repeating greeter is registered under.
pub const EXAMPLE: &str = "Example";

/// Demos selectable with `tickco run <name>`.
pub const DEMOS: &[(&str, &str)] = &[
    ("example", "Log a greeting every 2 seconds, forever"),
    ("www", "Fetch a page, log it, wait 2 seconds, repeat (see `offline`)"),
    ("nested", "Three-level chain of nested tasks"),
    ("wait", "Wait until a flag turns on, then while it stays on"),
    ("count-twice", "Wait one second by name, then complete"),
];

/// Register the routines the panel starts by name.
pub fn register(owner: &Owner) {
    owner.register(EXAMPLE, Example::default);
    owner.register("CountTwice", CountTwice::default);
}

/// Logs a greeting every two seconds until stopped.
#[derive(Default)]
pub struct Example {
    greeted: u32,
}

impl Routine for Example {
    fn resume(&mut self, _cx: &mut Context<'_>) -> Step {
        self.greeted += 1;
        info!("Hello tickco! ({})", self.greeted);
        Step::Yield(Yield::seconds(2.0))
    }
}

/// Where `ExampleWww` gets its page from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Real GET on a worker thread.
    Http(String),
    /// Canned body after a fixed delay; for tests and offline runs.
    Simulated { url: String, latency: Duration },
}

/// Background download. Completed by a worker thread; polled by the
/// scheduler through `AsyncOp`.
#[derive(Clone, Default)]
pub struct Download {
    body: Arc<Mutex<Option<Result<String, String>>>>,
}

impl Download {
    pub fn start(source: &Source) -> Self {
        let download = Download::default();
        let slot = download.body.clone();
        let source = source.clone();
        thread::spawn(move || {
            let result = match source {
                Source::Http(url) => http_get(&url),
                Source::Simulated { url, latency } => {
                    thread::sleep(latency);
                    Ok(format!("<html><title>{}</title></html>", url))
                }
            };
            if let Ok(mut slot) = slot.lock() {
                *slot = Some(result);
            }
        });
        download
    }

    /// Body once finished; `None` while in flight.
    pub fn result(&self) -> Option<Result<String, String>> {
        self.body.lock().ok().and_then(|b| b.clone())
    }
}

fn http_get(url: &str) -> Result<String, String> {
    let response = reqwest::blocking::get(url).map_err(|e| format!("{}: {}", url, e))?;
    if !response.status().is_success() {
        return Err(format!("{}: HTTP {}", url, response.status()));
    }
    response
        .text()
        .map_err(|e| format!("reading response: {}", e))
}

impl AsyncOp for Download {
    fn is_done(&self) -> bool {
        // A poisoned worker will never finish; don't hang the task on it.
        self.body.lock().map_or(true, |b| b.is_some())
    }
}

enum WwwState {
    Fetch,
    Received(Download),
}

/// Fetch, log the body, wait two seconds, repeat.
pub struct ExampleWww {
    source: Source,
    state: WwwState,
}

impl ExampleWww {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            state: WwwState::Fetch,
        }
    }
}

impl Routine for ExampleWww {
    fn resume(&mut self, _cx: &mut Context<'_>) -> Step {
        match std::mem::replace(&mut self.state, WwwState::Fetch) {
            WwwState::Fetch => {
                let download = Download::start(&self.source);
                self.state = WwwState::Received(download.clone());
                Step::Yield(Yield::fetch(download))
            }
            WwwState::Received(download) => {
                match download.result() {
                    Some(Ok(text)) => info!("Hello tickco! {}", preview(&text)),
                    Some(Err(e)) => warn!("fetch failed: {}", e),
                    None => warn!("fetch finished without a body"),
                }
                Step::Yield(Yield::seconds(2.0))
            }
        }
    }

    fn label(&self) -> Option<&str> {
        Some("ExampleWWW")
    }
}

/// First line of a page, capped so logs stay readable.
fn preview(text: &str) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let line = line.trim();
    match line.char_indices().nth(80) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}

/// Outer loop of the nested demo: wait, log, then hold on a one-layer
/// child until it finishes.
#[derive(Default)]
pub struct Nested {
    waited: bool,
}

impl Routine for Nested {
    fn resume(&mut self, cx: &mut Context<'_>) -> Step {
        if !self.waited {
            self.waited = true;
            return Step::Yield(Yield::seconds(2.0));
        }
        self.waited = false;
        info!("I'm not nested");
        let owner = cx.owner().clone();
        match cx.start(&owner, NestedLayer::new(1)) {
            Ok(child) => Step::Yield(child.into()),
            Err(_) => Step::Done,
        }
    }
}

/// One level of nesting. Depth 1 spawns depth 2, depth 2 is the leaf.
pub struct NestedLayer {
    depth: u32,
    waited: bool,
    spawned: bool,
}

impl NestedLayer {
    pub fn new(depth: u32) -> Self {
        Self {
            depth,
            waited: false,
            spawned: false,
        }
    }
}

impl Routine for NestedLayer {
    fn resume(&mut self, cx: &mut Context<'_>) -> Step {
        if !self.waited {
            self.waited = true;
            return Step::Yield(Yield::seconds(2.0));
        }
        if self.spawned {
            return Step::Done;
        }
        self.spawned = true;
        match self.depth {
            1 => info!("I'm one layer nested"),
            2 => info!("I'm two layers nested"),
            n => info!("I'm {} layers nested", n),
        }
        if self.depth >= 2 {
            return Step::Done;
        }
        let owner = cx.owner().clone();
        match cx.start(&owner, NestedLayer::new(self.depth + 1)) {
            Ok(child) => Step::Yield(child.into()),
            Err(_) => Step::Done,
        }
    }
}

/// Wait until `status` turns on, then while it stays on.
pub struct WaitUntilWhile {
    status: Rc<Cell<bool>>,
    stage: u8,
}

impl WaitUntilWhile {
    pub fn new(status: Rc<Cell<bool>>) -> Self {
        Self { status, stage: 0 }
    }
}

impl Routine for WaitUntilWhile {
    fn resume(&mut self, _cx: &mut Context<'_>) -> Step {
        let status = self.status.clone();
        self.stage += 1;
        match self.stage {
            1 => Step::Yield(Yield::until(move || status.get())),
            2 => {
                info!("Switch On");
                Step::Yield(Yield::while_(move || status.get()))
            }
            _ => {
                info!("Switch Off");
                Step::Done
            }
        }
    }
}

/// Flips `status` after each `every` interval, `times` times. Stands in
/// for the panel's toggle button during scripted runs.
pub struct Toggler {
    status: Rc<Cell<bool>>,
    every: Duration,
    left: u32,
    started: bool,
}

impl Toggler {
    pub fn new(status: Rc<Cell<bool>>, every: Duration, times: u32) -> Self {
        Self {
            status,
            every,
            left: times,
            started: false,
        }
    }
}

impl Routine for Toggler {
    fn resume(&mut self, _cx: &mut Context<'_>) -> Step {
        if self.started {
            self.status.set(!self.status.get());
            self.left -= 1;
            info!("switch {}", if self.status.get() { "on" } else { "off" });
        }
        self.started = true;
        if self.left == 0 {
            return Step::Done;
        }
        Step::Yield(Yield::Seconds(self.every))
    }
}

/// Wait one second, then complete.
#[derive(Default)]
pub struct CountTwice {
    waited: bool,
}

impl Routine for CountTwice {
    fn resume(&mut self, _cx: &mut Context<'_>) -> Step {
        if !self.waited {
            self.waited = true;
            info!("CountTwice: waiting one second");
            return Step::Yield(Yield::seconds(1.0));
        }
        info!("CountTwice: done");
        Step::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickco_rt::{ManualClock, Scheduler, SchedulerConfig, TaskState};

    fn scheduler() -> (Scheduler, ManualClock) {
        let clock = ManualClock::new();
        (
            Scheduler::with_clock(SchedulerConfig::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn nested_chain_runs_three_levels_then_loops() {
        let (mut sched, clock) = scheduler();
        let owner = Owner::new("panel");
        sched.start(&owner, Nested::default()).unwrap();
        assert_eq!(sched.len(), 1);

        clock.advance_secs(2.0);
        sched.on_tick();
        assert_eq!(sched.len(), 2);

        clock.advance_secs(2.0);
        sched.on_tick();
        assert_eq!(sched.len(), 3);

        // Leaf finishes, then each parent resumes a tick later at most.
        clock.advance_secs(2.0);
        for _ in 0..3 {
            sched.on_tick();
        }
        assert_eq!(sched.len(), 1);
        assert_eq!(sched.snapshot()[0].wait, "timer");
    }

    #[test]
    fn wait_until_while_follows_flag() {
        let (mut sched, _) = scheduler();
        let owner = Owner::new("panel");
        let status = Rc::new(Cell::new(false));
        let h = sched
            .start(&owner, WaitUntilWhile::new(status.clone()))
            .unwrap();

        sched.advance(Duration::ZERO);
        assert!(!h.is_finished());
        status.set(true);
        sched.advance(Duration::ZERO);
        sched.advance(Duration::ZERO);
        assert!(!h.is_finished());
        status.set(false);
        sched.advance(Duration::ZERO);
        assert_eq!(h.state(), TaskState::Completed);
    }

    #[test]
    fn toggler_drives_wait_demo() {
        let (mut sched, clock) = scheduler();
        let owner = Owner::new("runner");
        let status = Rc::new(Cell::new(false));
        let h = sched
            .start(&owner, WaitUntilWhile::new(status.clone()))
            .unwrap();
        sched
            .start(&owner, Toggler::new(status, Duration::from_secs(1), 2))
            .unwrap();
        for _ in 0..6 {
            clock.advance_secs(0.5);
            sched.on_tick();
        }
        assert_eq!(h.state(), TaskState::Completed);
        assert!(sched.is_empty());
    }

    #[test]
    fn www_waits_for_download() {
        let (mut sched, _) = scheduler();
        let owner = Owner::new("panel");
        sched
            .start(
                &owner,
                ExampleWww::new(Source::Simulated {
                    url: "https://example.org/".to_string(),
                    latency: Duration::from_millis(10),
                }),
            )
            .unwrap();
        assert_eq!(sched.snapshot()[0].wait, "external");
        assert_eq!(sched.snapshot()[0].label.as_deref(), Some("ExampleWWW"));

        let mut ticks = 0;
        while sched.snapshot()[0].wait == "external" {
            assert!(ticks < 500, "download never completed");
            thread::sleep(Duration::from_millis(2));
            sched.advance(Duration::ZERO);
            ticks += 1;
        }
        assert_eq!(sched.snapshot()[0].wait, "timer");
    }

    #[test]
    fn preview_trims_long_pages() {
        assert_eq!(preview("\n  <html>\n<body>"), "<html>");
        let long = "x".repeat(200);
        assert_eq!(preview(&long).len(), 83);
    }

    #[test]
    fn registered_names_start() {
        let (mut sched, clock) = scheduler();
        let owner = Owner::new("panel");
        register(&owner);
        let h = sched.start_named(&owner, "CountTwice").unwrap();
        clock.advance_secs(1.0);
        sched.on_tick();
        assert_eq!(h.state(), TaskState::Completed);
        assert!(sched.start_named(&owner, EXAMPLE).is_ok());
    }
}
