// tests/property_queue.rs

use proptest::prelude::*;

use cmdrelay::engine::{CoreCommand, CoreRuntime, JobId, RuntimeEvent, RuntimeOptions};
use cmdrelay::protocol::{Event, Request, RunRequest};
use cmdrelay::types::CANCELLED_CODE;

#[derive(Debug, Clone, Copy)]
enum Op {
    Submit,
    Kill,
    /// Let the running job (if any) exit.
    Finish,
}

fn op_strategy(with_kills: bool) -> impl Strategy<Value = Op> {
    if with_kills {
        prop_oneof![Just(Op::Submit), Just(Op::Kill), Just(Op::Finish)].boxed()
    } else {
        prop_oneof![Just(Op::Submit), Just(Op::Finish)].boxed()
    }
}

/// Drives a `CoreRuntime` the way the IO shell would, with a simulated
/// backend that reports each job's submission index as its exit code.
struct Driver {
    core: CoreRuntime,
    running: Option<(JobId, i32)>,
    exits: Vec<i32>,
    submitted: i32,
    stopped: bool,
}

impl Driver {
    fn new() -> Self {
        Self {
            core: CoreRuntime::new(RuntimeOptions::default()),
            running: None,
            exits: Vec::new(),
            submitted: 0,
            stopped: false,
        }
    }

    fn feed(&mut self, event: RuntimeEvent) {
        let step = self.core.step(event);
        for command in step.commands {
            match command {
                CoreCommand::Emit(Event::Exit { code }) => self.exits.push(code),
                CoreCommand::Emit(_) => {}
                CoreCommand::Start { job, request } => {
                    assert!(self.running.is_none(), "two jobs running at once");
                    let index: i32 = request.command.parse().unwrap();
                    self.running = Some((job, index));
                }
                CoreCommand::Kill(_) | CoreCommand::RequestExit => {}
            }
        }
        if !step.keep_running {
            self.stopped = true;
        }
    }

    fn apply(&mut self, op: Op) {
        match op {
            Op::Submit => {
                let index = self.submitted;
                self.submitted += 1;
                let request = RunRequest::new(index.to_string(), Vec::<String>::new());
                self.feed(RuntimeEvent::Request(Request::Run(request)));
            }
            Op::Kill => self.feed(RuntimeEvent::Request(Request::Kill)),
            Op::Finish => self.finish(),
        }
    }

    fn finish(&mut self) {
        if let Some((job, index)) = self.running.take() {
            self.feed(RuntimeEvent::JobExited { job, code: index });
        }
    }

    fn close_and_drain(&mut self) {
        self.feed(RuntimeEvent::InputClosed);
        while !self.stopped {
            assert!(self.running.is_some(), "runtime waiting with nothing running");
            self.finish();
        }
    }
}

proptest! {
    #[test]
    fn every_submission_gets_exactly_one_exit_in_order(
        ops in proptest::collection::vec(op_strategy(false), 0..40)
    ) {
        let mut driver = Driver::new();
        for op in ops {
            driver.apply(op);
        }
        driver.close_and_drain();

        let expected: Vec<i32> = (0..driver.submitted).collect();
        prop_assert_eq!(driver.exits, expected);
    }

    #[test]
    fn kills_never_reorder_or_duplicate_exits(
        ops in proptest::collection::vec(op_strategy(true), 0..60)
    ) {
        let mut driver = Driver::new();
        for op in ops {
            driver.apply(op);
        }
        driver.close_and_drain();

        prop_assert_eq!(driver.exits.len() as i32, driver.submitted);
        for (position, code) in driver.exits.iter().enumerate() {
            prop_assert!(
                *code == position as i32 || *code == CANCELLED_CODE,
                "exit #{} has code {}", position, code
            );
        }
    }
}
