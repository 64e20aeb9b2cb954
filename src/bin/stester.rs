use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use env_logger::Env;
use log::{error, info};
use rand::Rng;
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::exit;
use stester::{require, Config, Result, StdRng, Tester};

#[derive(Clone, Debug)]
struct Sample {
    val: u32,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.val)
    }
}

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let matches = cli().get_matches();
    info!("stester - {}", env!("CARGO_PKG_VERSION"));
    match run(&matches) {
        Ok(code) => exit(code),
        Err(e) => {
            error!("{:?}", e);
            eprintln!("{}", e);
            exit(2);
        }
    }
}

fn run(matches: &ArgMatches) -> Result<i32> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = *threads;
    }
    if let Some(capacity) = matches.get_one::<usize>("capacity") {
        config.queue_capacity = *capacity;
    }
    if matches.get_flag("no-color") {
        config.color = false;
    }

    match matches.subcommand() {
        Some(("stress", sub_matches)) => {
            if let Some(trials) = sub_matches.get_one::<u64>("trials") {
                config.trials_per_iteration = *trials;
            }
            if let Some(iterations) = sub_matches.get_one::<u64>("iterations") {
                config.max_iterations = Some(*iterations);
            }
            let out = sub_matches.get_one::<PathBuf>("out").expect("default");
            let broken = sub_matches.get_flag("broken");
            stress(config, out, broken)
        }
        Some(("tests", _)) => tests(config),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn stress(config: Config, out: &Path, broken: bool) -> Result<i32> {
    let sink = OpenOptions::new().create(true).append(true).open(out)?;
    let tester = Tester::with_config(config)?;
    let outcome = tester.run_stress_test(
        |s: &Sample| s.val % 2,
        move |s: &Sample| if broken { (s.val + 1) % 2 } else { s.val % 2 },
        |rng: &mut StdRng| Sample {
            val: rng.gen_range(0..100),
        },
        |a: u32, b: u32| a == b,
        sink,
    );
    match outcome.counterexample {
        Some(sample) => info!(
            "counterexample {} after {} iterations",
            sample, outcome.iterations
        ),
        None => info!("no counterexample in {} iterations", outcome.iterations),
    }
    Ok(0)
}

fn tests(config: Config) -> Result<i32> {
    let mut tester = Tester::with_config(config)?;
    tester.run_test("Test int", || {
        require!(2 == 3);
        Ok(())
    });
    tester.run_test("Test strings", || {
        require!(String::from("asdfsdff") == "s1");
        Ok(())
    });
    tester.run_test("Test vector", || {
        let v = vec![1, 2, 4];
        require!(v[0] == v[1]);
        Ok(())
    });
    tester.run_test("Test vector", || {
        let v = vec![1, 1, 4];
        require!(v[0] == v[1]);
        Ok(())
    });
    let summary = tester.run_tests()?;
    Ok(if summary.all_passed() { 0 } else { 1 })
}

fn cli() -> Command {
    Command::new("stester")
        .about("Run demo tests or a differential stress test on a thread pool")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON config file"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("worker threads"),
        )
        .arg(
            Arg::new("capacity")
                .long("capacity")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("task queue capacity"),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("plain console output"),
        )
        .subcommand(
            Command::new("stress")
                .about("compare x % 2 against itself on random inputs")
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .value_name("FILE")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("tmp.txt")
                        .help("file receiving the counterexample"),
                )
                .arg(
                    Arg::new("trials")
                        .long("trials")
                        .value_name("N")
                        .value_parser(value_parser!(u64))
                        .help("trials per iteration"),
                )
                .arg(
                    Arg::new("iterations")
                        .short('n')
                        .long("iterations")
                        .value_name("N")
                        .value_parser(value_parser!(u64))
                        .help("stop after N iterations"),
                )
                .arg(
                    Arg::new("broken")
                        .long("broken")
                        .action(ArgAction::SetTrue)
                        .help("compare against (x + 1) % 2 instead"),
                ),
        )
        .subcommand(Command::new("tests").about("run the bundled demo tests"))
}
