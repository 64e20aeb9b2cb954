use crate::color::{Palette, Style};
use crate::tester::Tester;
use crate::thread_pool::PoolHandle;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Display;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// What a stress run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressOutcome {
    /// iterations submitted to the pool
    pub iterations: u64,
    /// textual form of the counterexample, if one was reported
    pub counterexample: Option<String>,
}

// Guards the output sink and the console together.
struct Report<W> {
    out: W,
    found: Option<String>,
}

type SharedReport<W> = Arc<Mutex<Report<W>>>;

fn lock<W>(report: &SharedReport<W>) -> MutexGuard<'_, Report<W>> {
    report.lock().unwrap_or_else(PoisonError::into_inner)
}

static SEED_SALT: AtomicU64 = AtomicU64::new(0);

fn time_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    // iterations starting within the same clock tick still get distinct seeds
    nanos ^ SEED_SALT
        .fetch_add(1, Ordering::Relaxed)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

struct StressIteration<I, R1, R2, A, B, G, C, W> {
    index: u64,
    trials: u64,
    first: A,
    second: B,
    generator: G,
    checker: C,
    report: SharedReport<W>,
    pool: PoolHandle,
    palette: Palette,
    _types: PhantomData<fn(I) -> (R1, R2)>,
}

impl<I, R1, R2, A, B, G, C, W> StressIteration<I, R1, R2, A, B, G, C, W>
where
    I: Display,
    A: Fn(&I) -> R1,
    B: Fn(&I) -> R2,
    G: FnMut(&mut StdRng) -> I,
    C: Fn(R1, R2) -> bool,
    W: Write,
{
    fn run(mut self) {
        let mut rng = StdRng::seed_from_u64(time_seed());
        for _ in 0..self.trials {
            let input = (self.generator)(&mut rng);
            if !(self.checker)((self.first)(&input), (self.second)(&input)) {
                self.report_found(&input);
                return;
            }
        }

        let _console = lock(&self.report);
        println!(
            "{}",
            self.palette.paint(
                Style::Red,
                format!("TEST NOT FOUND ON ITERATION : {}", self.index)
            )
        );
    }

    fn report_found(&self, input: &I) {
        let mut report = lock(&self.report);
        // another worker already reported and stopped the pool
        if !self.pool.is_enabled() {
            return;
        }
        let line = input.to_string();
        println!("{}", self.palette.paint(Style::Green, "TEST FOUND : "));
        if let Err(e) = writeln!(report.out, "{}", line).and_then(|_| report.out.flush()) {
            error!("write counterexample: {}", e);
        }
        info!("counterexample found on iteration {}", self.index);
        report.found = Some(line);
        self.pool.stop();
    }
}

impl Tester {
    /// Compare `first` and `second` on random inputs until they disagree.
    ///
    /// Keeps the pool saturated with iterations, each running
    /// `trials_per_iteration` trials: draw an input from `generator`, run
    /// both implementations on it and pass the results to `checker`. The
    /// first worker to see `checker` return `false` prints `TEST FOUND`,
    /// writes the input's `Display` form as one line to `out` and stops the
    /// pool; no other counterexample is reported afterwards.
    ///
    /// Every iteration gets its own clones of the closures. Returns once the
    /// pool is stopped, or after `max_iterations` iterations have finished
    /// when a limit is configured.
    pub fn run_stress_test<I, R1, R2, A, B, G, C, W>(
        &self,
        first: A,
        second: B,
        generator: G,
        checker: C,
        out: W,
    ) -> StressOutcome
    where
        I: Display + 'static,
        R1: 'static,
        R2: 'static,
        A: Fn(&I) -> R1 + Clone + Send + 'static,
        B: Fn(&I) -> R2 + Clone + Send + 'static,
        G: FnMut(&mut StdRng) -> I + Clone + Send + 'static,
        C: Fn(R1, R2) -> bool + Clone + Send + 'static,
        W: Write + Send + 'static,
    {
        let report = Arc::new(Mutex::new(Report { out, found: None }));
        let pool = self.pool.handle();
        let limit = self.config.max_iterations;
        let mut handles = Vec::new();

        let mut i: u64 = 0;
        while pool.is_enabled() {
            if limit.map_or(false, |max| i >= max) {
                break;
            }
            i += 1;
            let iteration = StressIteration {
                index: i,
                trials: self.config.trials_per_iteration,
                first: first.clone(),
                second: second.clone(),
                generator: generator.clone(),
                checker: checker.clone(),
                report: Arc::clone(&report),
                pool: pool.clone(),
                palette: self.palette,
                _types: PhantomData,
            };
            let handle = pool.submit(move || iteration.run());
            if limit.is_some() {
                handles.push(handle);
            }
        }

        for handle in handles {
            if let Err(e) = handle.wait() {
                warn!("stress iteration failed: {}", e);
            }
        }

        let counterexample = lock(&report).found.clone();
        debug!("stress run ended after {} iterations", i);
        StressOutcome {
            iterations: i,
            counterexample,
        }
    }
}
