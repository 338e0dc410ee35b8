//! Transition strategies: the order in which resolver steps run.

use super::TransitionResolver;
use crate::error::TaskError;
use crate::task::{merge, BoxRoutine, Routine, Yield};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Close the old path completely, then open the new one.
    #[default]
    Sequential,
    /// Open the new path while the old one closes.
    Cross,
    Custom,
}

/// A transition strategy.
pub trait Transition {
    fn kind(&self) -> TransitionKind;

    /// Skip open and close animations.
    fn is_immediate(&self) -> bool {
        false
    }

    fn routine(&self, resolver: Rc<dyn TransitionResolver>) -> BoxRoutine;
}

pub type TransitionRef = Rc<dyn Transition>;

impl fmt::Debug for dyn Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("kind", &self.kind())
            .field("immediate", &self.is_immediate())
            .finish()
    }
}

/// Build the built-in strategy for `kind`. `Custom` falls back to sequential.
pub fn for_kind(kind: TransitionKind, immediate: bool) -> TransitionRef {
    match kind {
        TransitionKind::Cross => Rc::new(Cross { immediate }),
        TransitionKind::Sequential | TransitionKind::Custom => Rc::new(Sequential { immediate }),
    }
}

/// Close-then-open.
///
/// `start`, enter effect, close old, deactivate and unload old, load new,
/// activate and open new, exit effect, `finish`. The old and new paths never
/// overlap in time, so the same node may appear on both sides.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequential {
    immediate: bool,
}

impl Sequential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate() -> Self {
        Self { immediate: true }
    }
}

impl Transition for Sequential {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Sequential
    }

    fn is_immediate(&self) -> bool {
        self.immediate
    }

    fn routine(&self, resolver: Rc<dyn TransitionResolver>) -> BoxRoutine {
        Box::new(SequentialRoutine {
            resolver,
            immediate: self.immediate,
            stage: SequentialStage::Start,
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum SequentialStage {
    Start,
    EnterEffect,
    ClosePrev,
    ReleasePrev,
    LoadNext,
    OpenNext,
    ExitEffect,
    Finish,
    Done,
}

struct SequentialRoutine {
    resolver: Rc<dyn TransitionResolver>,
    immediate: bool,
    stage: SequentialStage,
}

impl Routine for SequentialRoutine {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        use SequentialStage::*;
        loop {
            match self.stage {
                Start => {
                    self.resolver.start()?;
                    self.stage = EnterEffect;
                }
                EnterEffect => {
                    self.stage = ClosePrev;
                    return Ok(Some(Yield::Routine(self.resolver.enter_effect_routine())));
                }
                ClosePrev => {
                    self.stage = ReleasePrev;
                    return Ok(Some(Yield::Routine(
                        self.resolver.close_prev_routine(self.immediate),
                    )));
                }
                ReleasePrev => {
                    self.resolver.deactivate_prev()?;
                    self.resolver.unload_prev()?;
                    self.stage = LoadNext;
                }
                LoadNext => {
                    self.stage = OpenNext;
                    return Ok(Some(Yield::Routine(self.resolver.load_next_routine())));
                }
                OpenNext => {
                    self.resolver.activate_next()?;
                    self.stage = ExitEffect;
                    return Ok(Some(Yield::Routine(
                        self.resolver.open_next_routine(self.immediate),
                    )));
                }
                ExitEffect => {
                    self.stage = Finish;
                    return Ok(Some(Yield::Routine(self.resolver.exit_effect_routine())));
                }
                Finish => {
                    self.resolver.finish()?;
                    self.stage = Done;
                }
                Done => return Ok(None),
            }
        }
    }
}

/// Open-while-closing.
///
/// `start`, load and activate new, then the new open and old close
/// animations side by side, deactivate and unload old, `finish`. No enter or
/// exit effect routine is played.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cross {
    immediate: bool,
}

impl Cross {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate() -> Self {
        Self { immediate: true }
    }
}

impl Transition for Cross {
    fn kind(&self) -> TransitionKind {
        TransitionKind::Cross
    }

    fn is_immediate(&self) -> bool {
        self.immediate
    }

    fn routine(&self, resolver: Rc<dyn TransitionResolver>) -> BoxRoutine {
        Box::new(CrossRoutine {
            resolver,
            immediate: self.immediate,
            stage: CrossStage::Start,
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum CrossStage {
    Start,
    LoadNext,
    Swap,
    ReleasePrev,
    Done,
}

struct CrossRoutine {
    resolver: Rc<dyn TransitionResolver>,
    immediate: bool,
    stage: CrossStage,
}

impl Routine for CrossRoutine {
    fn resume(&mut self) -> Result<Option<Yield>, TaskError> {
        use CrossStage::*;
        loop {
            match self.stage {
                Start => {
                    self.resolver.start()?;
                    self.stage = LoadNext;
                }
                LoadNext => {
                    self.stage = Swap;
                    return Ok(Some(Yield::Routine(self.resolver.load_next_routine())));
                }
                Swap => {
                    self.resolver.activate_next()?;
                    self.stage = ReleasePrev;
                    let routines = vec![
                        self.resolver.open_next_routine(self.immediate),
                        self.resolver.close_prev_routine(self.immediate),
                    ];
                    return Ok(Some(Yield::Routine(merge(routines))));
                }
                ReleasePrev => {
                    self.resolver.deactivate_prev()?;
                    self.resolver.unload_prev()?;
                    self.resolver.finish()?;
                    self.stage = Done;
                }
                Done => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodeFault;
    use crate::task::{routine, Script, Task};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording {
        log: Rc<RefCell<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl Recording {
        fn hit(&self, step: &'static str) -> Result<(), TaskError> {
            self.log.borrow_mut().push(step.to_string());
            if self.fail_on == Some(step) {
                return Err(NodeFault::new(step).into());
            }
            Ok(())
        }

        fn logged(&self, step: &'static str) -> BoxRoutine {
            let log = self.log.clone();
            Script::new()
                .call(move || {
                    log.borrow_mut().push(step.to_string());
                    Ok(())
                })
                .run(|| routine::ticks(1))
                .boxed()
        }
    }

    impl TransitionResolver for Recording {
        fn start(&self) -> Result<(), TaskError> {
            self.hit("start")
        }
        fn enter_effect_routine(&self) -> BoxRoutine {
            self.logged("enter_effect")
        }
        fn load_next_routine(&self) -> BoxRoutine {
            self.logged("load_next")
        }
        fn activate_next(&self) -> Result<(), TaskError> {
            self.hit("activate_next")
        }
        fn open_next_routine(&self, _immediate: bool) -> BoxRoutine {
            self.logged("open_next")
        }
        fn close_prev_routine(&self, _immediate: bool) -> BoxRoutine {
            self.logged("close_prev")
        }
        fn deactivate_prev(&self) -> Result<(), TaskError> {
            self.hit("deactivate_prev")
        }
        fn unload_prev(&self) -> Result<(), TaskError> {
            self.hit("unload_prev")
        }
        fn exit_effect_routine(&self) -> BoxRoutine {
            self.logged("exit_effect")
        }
        fn finish(&self) -> Result<(), TaskError> {
            self.hit("finish")
        }
    }

    fn drive(transition: &dyn Transition, resolver: Recording) -> (Vec<String>, Result<(), TaskError>) {
        let log = resolver.log.clone();
        let mut task = Task::new(transition.routine(Rc::new(resolver)));
        let result = loop {
            match task.advance() {
                Ok(true) => continue,
                Ok(false) => break Ok(()),
                Err(error) => break Err(error),
            }
        };
        let steps = log.borrow().clone();
        (steps, result)
    }

    #[test]
    fn sequential_closes_before_opening() {
        let (steps, result) = drive(&Sequential::new(), Recording::default());
        assert!(result.is_ok());
        assert_eq!(
            steps,
            vec![
                "start",
                "enter_effect",
                "close_prev",
                "deactivate_prev",
                "unload_prev",
                "load_next",
                "activate_next",
                "open_next",
                "exit_effect",
                "finish",
            ]
        );
    }

    #[test]
    fn cross_overlaps_open_and_close() {
        let (steps, result) = drive(&Cross::new(), Recording::default());
        assert!(result.is_ok());
        assert_eq!(
            steps,
            vec![
                "start",
                "load_next",
                "activate_next",
                "open_next",
                "close_prev",
                "deactivate_prev",
                "unload_prev",
                "finish",
            ]
        );
    }

    #[test]
    fn failing_step_stops_the_sequence() {
        let resolver = Recording {
            fail_on: Some("deactivate_prev"),
            ..Recording::default()
        };
        let (steps, result) = drive(&Sequential::new(), resolver);
        assert!(result.is_err());
        assert_eq!(steps.last().map(String::as_str), Some("deactivate_prev"));
        assert!(!steps.iter().any(|s| s == "load_next"));
    }

    #[test]
    fn for_kind_builds_matching_strategy() {
        assert_eq!(
            for_kind(TransitionKind::Cross, false).kind(),
            TransitionKind::Cross
        );
        assert!(for_kind(TransitionKind::Sequential, true).is_immediate());
        assert_eq!(
            for_kind(TransitionKind::Custom, false).kind(),
            TransitionKind::Sequential
        );
    }
}
