// tests/scheduler_concurrency.rs

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pullbuild::{Build, BuildError, BuildOptions, TargetState};
use pullbuild_test_utils::counter::CallCounter;
use pullbuild_test_utils::{init_tracing, with_timeout};

fn options(jobs: usize) -> BuildOptions {
    BuildOptions::default().with_jobs(jobs)
}

#[test]
fn independent_targets_build_in_parallel() {
    init_tracing();
    let starts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));
    let build = Build::with_options(options(4));

    let s = Arc::clone(&starts);
    build.rule("sleep:*", move |_, _| {
        s.lock().unwrap().push(Instant::now());
        std::thread::sleep(Duration::from_millis(300));
        Ok(())
    });
    build.rule("root", |b, _| {
        b.need(["sleep:x", "sleep:y"])?;
        Ok(())
    });

    let began = Instant::now();
    build.run("root").unwrap();
    let elapsed = began.elapsed();

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 2);
    let gap = if starts[0] > starts[1] {
        starts[0] - starts[1]
    } else {
        starts[1] - starts[0]
    };
    assert!(gap < Duration::from_millis(200), "start gap was {gap:?}");
    assert!(elapsed < Duration::from_millis(550), "took {elapsed:?}");
}

#[test]
fn jobs_limit_serialises_work() {
    init_tracing();
    let running = Arc::new(Mutex::new((0usize, 0usize))); // (current, peak)
    let build = Build::with_options(options(2));

    let r = Arc::clone(&running);
    build.rule("work:*", move |_, _| {
        {
            let mut guard = r.lock().unwrap();
            guard.0 += 1;
            guard.1 = guard.1.max(guard.0);
        }
        std::thread::sleep(Duration::from_millis(40));
        r.lock().unwrap().0 -= 1;
        Ok(())
    });
    build.rule("root", |b, _| {
        let work: Vec<String> = (0..8).map(|i| format!("work:{i}")).collect();
        b.need(&work)?;
        Ok(())
    });

    build.run("root").unwrap();

    let (current, peak) = *running.lock().unwrap();
    assert_eq!(current, 0);
    assert!(peak <= 2, "peak concurrency was {peak}");
}

#[test]
fn concurrent_demanders_share_one_build() {
    init_tracing();
    let calls = CallCounter::new();
    let build = Build::with_options(options(8));

    let c = calls.clone();
    build.rule("shared", move |_, target| {
        std::thread::sleep(Duration::from_millis(50));
        c.record(target);
        Ok(())
    });
    let c = calls.clone();
    build.rule("page:*", move |b, target| {
        b.need(["shared"])?;
        c.record(target);
        Ok(())
    });
    build.rule("root", |b, _| {
        let pages: Vec<String> = (0..16).map(|i| format!("page:{i}")).collect();
        b.need(&pages)?;
        Ok(())
    });

    build.run("root").unwrap();

    assert_eq!(calls.count("shared"), 1);
    for i in 0..16 {
        assert_eq!(calls.count(&format!("page:{i}")), 1);
    }
    assert_eq!(calls.total(), 17);
}

#[test]
fn concurrent_waiters_on_a_failing_build_see_the_same_error() {
    init_tracing();
    const WAITERS: usize = 12;

    let calls = CallCounter::new();
    let seen: Arc<Mutex<Vec<BuildError>>> = Arc::new(Mutex::new(Vec::new()));
    let build = Build::with_options(options(WAITERS));
    assert_eq!(build.options().jobs, WAITERS);

    let c = calls.clone();
    build.rule("bad", move |_, target| {
        std::thread::sleep(Duration::from_millis(100));
        c.record(target);
        anyhow::bail!("feed server returned 503")
    });
    let s = Arc::clone(&seen);
    build.rule("page:*", move |b, _| {
        if let Err(err) = b.need(["bad"]) {
            s.lock().unwrap().push(err);
        }
        Ok(())
    });
    build.rule("root", |b, _| {
        let pages: Vec<String> = (0..WAITERS).map(|i| format!("page:{i}")).collect();
        b.need(&pages)?;
        Ok(())
    });

    build.run("root").unwrap();

    assert_eq!(calls.count("bad"), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), WAITERS);
    assert!(seen.iter().all(|err| *err == seen[0]), "{seen:?}");
    assert_eq!(seen[0].target(), Some("bad"));
    assert_eq!(build.summary().failed, 1);
}

#[test]
fn deep_chain_completes_with_a_single_job() {
    init_tracing();
    const DEPTH: usize = 200;

    let calls = CallCounter::new();
    let build = Build::with_options(options(1));

    let c = calls.clone();
    build.rule("chain:*", move |b, target| {
        let depth: usize = target["chain:".len()..].parse()?;
        if depth + 1 < DEPTH {
            b.need([format!("chain:{}", depth + 1)])?;
        }
        c.record(target);
        Ok(())
    });

    let result = {
        let build = build.clone();
        with_timeout(30, move || build.run("chain:0"))
    };
    result.unwrap();

    assert_eq!(calls.total(), DEPTH);
    // Leaves finish first.
    let order = calls.order();
    assert_eq!(order.first().map(String::as_str), Some("chain:199"));
    assert_eq!(order.last().map(String::as_str), Some("chain:0"));
}

#[test]
fn self_dependency_is_reported_as_cycle() {
    init_tracing();
    let build = Build::new();
    build.rule("self", |b, _| {
        b.need(["self"])?;
        Ok(())
    });

    let result = {
        let build = build.clone();
        with_timeout(10, move || build.run("self"))
    };

    assert_eq!(
        result,
        Err(BuildError::DependencyCycle {
            cycle: vec!["self".to_string(), "self".to_string()]
        })
    );
    assert_eq!(build.state_of("self"), TargetState::Failed);
}

#[test]
fn cycle_across_several_targets_is_reported() {
    init_tracing();
    let build = Build::new();
    build.rule("a", |b, _| {
        b.need(["b"])?;
        Ok(())
    });
    build.rule("b", |b, _| {
        b.need(["c"])?;
        Ok(())
    });
    build.rule("c", |b, _| {
        b.need(["a"])?;
        Ok(())
    });

    let result = {
        let build = build.clone();
        with_timeout(10, move || build.run("a"))
    };

    match result {
        Err(BuildError::DependencyCycle { cycle }) => {
            assert_eq!(cycle.first(), cycle.last());
            for target in ["a", "b", "c"] {
                assert!(cycle.iter().any(|t| t == target), "{cycle:?}");
            }
        }
        other => panic!("expected DependencyCycle, got {other:?}"),
    }
    for target in ["a", "b", "c"] {
        assert_eq!(build.state_of(target), TargetState::Failed);
    }
}

#[test]
fn failure_in_one_branch_does_not_cancel_siblings() {
    init_tracing();
    let calls = CallCounter::new();
    let build = Build::with_options(options(4));

    build.rule("fast_fail", |_, _| anyhow::bail!("fetch failed"));
    let c = calls.clone();
    build.rule("slow_ok", move |_, target| {
        std::thread::sleep(Duration::from_millis(100));
        c.record(target);
        Ok(())
    });
    build.rule("root", |b, _| {
        b.need(["slow_ok", "fast_fail"])?;
        Ok(())
    });

    let err = build.run("root").unwrap_err();
    assert_eq!(err.target(), Some("fast_fail"));
    assert_eq!(calls.count("slow_ok"), 1);
    assert_eq!(build.state_of("slow_ok"), TargetState::Done);
    assert_eq!(build.summary().building, 0);
}
