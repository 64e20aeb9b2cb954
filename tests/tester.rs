use stester::{require, Config, Result, StressError, Summary, Tester, BAR_WIDTH};
use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn plain_tester(threads: usize) -> Tester {
    Tester::with_config(Config {
        color: false,
        ..Config::with_threads(threads)
    })
    .unwrap()
}

fn report(tester: &mut Tester) -> (Summary, String) {
    let mut out = Vec::new();
    let summary = tester.run_tests_to(&mut out).unwrap();
    (summary, String::from_utf8(out).unwrap())
}

fn always_false() -> Result<()> {
    require!(1 > 2);
    Ok(())
}

#[test]
fn assertion_message_carries_location_and_expression() {
    match always_false() {
        Err(StressError::Assertion { file, line, expr }) => {
            assert_eq!(file, file!());
            assert_eq!(expr, "1 > 2");
            assert!(line > 0);
            let err = StressError::Assertion { file, line, expr };
            assert_eq!(err.to_string(), format!("{}:{} REQUIRE(1 > 2)", file, line));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn failed_test_handle_surfaces_message_verbatim() {
    let tester = plain_tester(2);
    let expected = always_false().unwrap_err().to_string();
    let outcome = tester.pool().submit(always_false).wait().unwrap();
    assert_eq!(outcome.unwrap_err().to_string(), expected);
}

#[test]
fn summary_counts_passed_and_broken() {
    let mut tester = plain_tester(4);
    for i in 0..5 {
        tester.run_test(format!("test {}", i), move || {
            require!(i % 2 == 0 || i == 3);
            Ok(())
        });
    }
    // only "test 1" fails among the numbered tests
    tester.run_test("broken", always_false);

    let (summary, out) = report(&mut tester);
    assert_eq!(summary.success, 4);
    assert_eq!(summary.broken, 2);
    assert_eq!(summary.green, 40);
    assert_eq!(summary.red, 20);
    assert!(out.contains("test 1 : Failed: "));
    assert!(out.contains("broken : Failed: "));
    assert!(out.contains("REQUIRE(i % 2 == 0 || i == 3)"));
    assert!(out.contains("Testing finished"));
    assert!(out.contains("===> Success: 4, Broken: 2"));
    assert!(!out.contains("All test passed!!!"));
    assert!(out.contains(&"=".repeat(BAR_WIDTH)));
    assert!(!tester.pool().is_enabled());
}

#[test]
fn all_passing_tests_are_celebrated() {
    let mut tester = plain_tester(2);
    tester.run_test("ints", || {
        require!(2 + 2 == 4);
        Ok(())
    });
    tester.run_test("strings", || {
        require!("s1".len() == 2);
        Ok(())
    });

    let (summary, out) = report(&mut tester);
    assert!(summary.all_passed());
    assert_eq!(summary.green, BAR_WIDTH);
    assert!(out.contains("===> Success: 2, Broken: 0"));
    assert!(out.contains("All test passed!!!"));
}

#[test]
fn panicking_test_counts_as_broken() {
    let mut tester = plain_tester(2);
    tester.run_test("index", || {
        let v: Vec<u8> = Vec::new();
        require!(v[3] == 0);
        Ok(())
    });

    let (summary, out) = report(&mut tester);
    assert_eq!(summary.broken, 1);
    assert!(out.contains("task panicked"));
}

#[test]
fn no_tests_prints_warning() {
    let mut tester = plain_tester(1);
    let (summary, out) = report(&mut tester);
    assert_eq!(summary, Summary::default());
    assert_eq!(out.trim(), "WARN tests not found!");
}

#[test]
fn colored_bar_is_split_by_outcome() {
    let mut tester = Tester::new(2).unwrap();
    tester.run_test("pass", || Ok(()));
    tester.run_test("fail", always_false);

    let (summary, out) = report(&mut tester);
    assert_eq!(summary.green, 30);
    assert_eq!(out.matches("\x1b[32;1m=\x1b[0m").count(), 30);
    assert_eq!(out.matches("\x1b[31;1m=\x1b[0m").count(), 30);
}

#[test]
fn zero_threads_is_rejected() {
    assert!(matches!(
        Tester::new(0),
        Err(StressError::InvalidConfig(_))
    ));
}

#[test]
fn printing_test_does_not_block_report() {
    let mut tester = plain_tester(2);
    tester.run_test("prints late", || {
        thread::sleep(Duration::from_millis(200));
        println!("output from a running test");
        Ok(())
    });

    let (tx, rx) = mpsc::channel();
    let runner = thread::spawn(move || {
        let summary = tester.run_tests();
        tx.send(summary.map(|s| s.success)).unwrap();
    });
    let success = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("run_tests blocked on a printing test");
    assert_eq!(success.unwrap(), 1);
    runner.join().unwrap();
}

#[test]
fn failing_report_writer_still_stops_pool() {
    struct Broken;
    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let mut tester = plain_tester(2);
    tester.run_test("fails", always_false);
    tester.run_test("passes", || Ok(()));
    assert!(matches!(
        tester.run_tests_to(&mut Broken),
        Err(StressError::Io(_))
    ));
    assert!(!tester.pool().is_enabled());
}
