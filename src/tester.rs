use crate::color::{Palette, Style};
use crate::config::Config;
use crate::err::Result;
use crate::thread_pool::{PoolHandle, ResultHandle, WorkerPool};
use log::{debug, info};
use std::io::{self, Write};

/// Width of the pass/fail bar printed by [`Tester::run_tests`].
pub const BAR_WIDTH: usize = 60;

/// Fail the enclosing test body when `cond` is false.
///
/// Expands to an early `return Err(StressError::Assertion { .. })` carrying
/// the file, line and source text of the condition.
///
/// ```
/// use stester::{require, Result};
///
/// fn check() -> Result<()> {
///     require!(1 + 1 == 3);
///     Ok(())
/// }
///
/// let err = check().unwrap_err().to_string();
/// assert!(err.ends_with("REQUIRE(1 + 1 == 3)"));
/// ```
#[macro_export]
macro_rules! require {
    ($cond:expr) => {
        if !($cond) {
            return ::std::result::Result::Err(
                $crate::err::StressError::Assertion {
                    file: file!(),
                    line: line!(),
                    expr: stringify!($cond),
                }
                .into(),
            );
        }
    };
}

/// Outcome of [`Tester::run_tests`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// tests that returned `Ok`
    pub success: usize,
    /// tests that failed or panicked
    pub broken: usize,
    /// green cells of the bar
    pub green: usize,
    /// red cells of the bar
    pub red: usize,
}

impl Summary {
    /// Summary for `success` passing tests out of `total`.
    pub fn new(success: usize, total: usize) -> Self {
        assert!(success <= total);
        if total == 0 {
            return Summary::default();
        }
        let green = (BAR_WIDTH * success + total - 1) / total;
        Summary {
            success,
            broken: total - success,
            green,
            red: BAR_WIDTH - green,
        }
    }

    /// Number of tests counted.
    pub fn total(&self) -> usize {
        self.success + self.broken
    }

    /// Whether every test passed.
    pub fn all_passed(&self) -> bool {
        self.broken == 0
    }
}

/// Tester
///
/// Owns a [`WorkerPool`] and runs named tests, or a stress test, on it.
///
/// ```
/// use stester::{require, Tester};
///
/// let mut tester = Tester::new(2).unwrap();
/// tester.run_test("sum", || {
///     require!(2 + 2 == 4);
///     Ok(())
/// });
/// let summary = tester.run_tests().unwrap();
/// assert!(summary.all_passed());
/// ```
pub struct Tester {
    pub(crate) config: Config,
    pub(crate) palette: Palette,
    tests: Vec<(String, ResultHandle<Result<()>>)>,
    pub(crate) pool: WorkerPool,
}

impl Tester {
    /// New a tester with `threads` workers and default settings.
    pub fn new(threads: usize) -> Result<Tester> {
        Tester::with_config(Config::with_threads(threads))
    }

    /// New a tester from `config`.
    pub fn with_config(config: Config) -> Result<Tester> {
        config.validate()?;
        let pool = WorkerPool::new(config.threads, config.queue_capacity)?;
        info!(
            "tester started: {} threads, queue capacity {}",
            config.threads, config.queue_capacity
        );
        Ok(Tester {
            palette: Palette::new(config.color),
            config,
            tests: Vec::new(),
            pool,
        })
    }

    /// Submit `test` to the pool under `name`.
    ///
    /// The test starts as soon as a worker is free; its result is collected
    /// by [`run_tests`](Tester::run_tests).
    pub fn run_test<F>(&mut self, name: impl Into<String>, test: F)
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let name = name.into();
        debug!("submit test {}", name);
        let handle = self.pool.submit(test);
        self.tests.push((name, handle));
    }

    /// Await every submitted test, print the report to stdout and stop the pool.
    pub fn run_tests(&mut self) -> Result<Summary> {
        // stdout stays unlocked while tests that print are still running
        let mut report = Vec::new();
        let summary = self.run_tests_to(&mut report)?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(&report)?;
        out.flush()?;
        Ok(summary)
    }

    /// Like [`run_tests`](Tester::run_tests) but writes the report to `out`.
    ///
    /// Every outcome is collected and the pool stopped before anything is
    /// written, so a failing `out` loses only the report.
    pub fn run_tests_to<W: Write>(&mut self, out: &mut W) -> Result<Summary> {
        let p = self.palette;
        if self.tests.is_empty() {
            writeln!(out, "{}", p.paint(Style::Red, "WARN tests not found!"))?;
            return Ok(Summary::default());
        }

        let outcomes: Vec<(String, Result<()>)> = self
            .tests
            .drain(..)
            .map(|(name, handle)| (name, handle.wait().and_then(|outcome| outcome)))
            .collect();
        self.pool.stop();

        let total = outcomes.len();
        let mut success = 0;
        for (name, outcome) in outcomes {
            match outcome {
                Ok(()) => success += 1,
                Err(e) => {
                    writeln!(out, "{}", p.paint(Style::Gray, "=".repeat(BAR_WIDTH)))?;
                    writeln!(out, "{} : {}", name, p.paint(Style::Red, "Failed: "))?;
                    writeln!(out, "{}", p.paint(Style::Purple, e))?;
                }
            }
        }

        let summary = Summary::new(success, total);
        for i in 0..BAR_WIDTH {
            let style = if i < summary.green {
                Style::Green
            } else {
                Style::Red
            };
            write!(out, "{}", p.paint(style, "="))?;
        }
        writeln!(out)?;
        writeln!(out, "{}", p.paint(Style::Blue, "Testing finished"))?;
        writeln!(
            out,
            "{}{}: {}, {}: {}",
            p.paint(Style::Gray, "===> "),
            p.paint(Style::Green, "Success"),
            summary.success,
            p.paint(Style::Red, "Broken"),
            summary.broken
        )?;
        if summary.all_passed() {
            writeln!(out, "{}", p.paint(Style::Green, "All test passed!!!"))?;
        }
        out.flush()?;
        Ok(summary)
    }

    /// Settings this tester runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying pool.
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// A handle to stop the pool from another thread.
    pub fn handle(&self) -> PoolHandle {
        self.pool.handle()
    }
}
