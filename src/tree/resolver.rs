//! The tree's side of the transition protocol.

use super::{PreloadState, TransitionState, TreeState};
use crate::error::{NodeFault, TaskError};
use crate::node::{NodeKey, NodeKind, Phase, PhaseRoutine, SharedCell};
use crate::task::{merge, routine, AsyncHandle, BoxRoutine, Script};
use crate::transition::{EffectRef, TransitionContext, TransitionResolver};
use std::cell::RefCell;
use std::rc::Rc;

pub(crate) struct TreeResolver<K: NodeKey> {
    shared: Rc<RefCell<TreeState<K>>>,
}

impl<K: NodeKey> Clone for TreeResolver<K> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

fn no_transition() -> TaskError {
    NodeFault::new("no transition in progress").into()
}

/// Load one node, waiting for a preload that already owns it.
fn load_when_ready<K: NodeKey>(
    cell: SharedCell<K>,
    preload: Option<AsyncHandle>,
    cx: TransitionContext<K>,
) -> BoxRoutine {
    let watched = cell.clone();
    Script::new()
        .run(move || match preload {
            Some(handle) => routine::wait_for(handle),
            None => routine::done(),
        })
        .run(move || routine::wait_until(move || watched.borrow().phase() != Phase::Loading))
        .run(move || {
            if cell.borrow().phase() == Phase::Standby {
                PhaseRoutine::load(cell, &cx)
            } else {
                routine::done()
            }
        })
        .boxed()
}

fn initialize_when_loaded<K: NodeKey>(cell: SharedCell<K>, cx: TransitionContext<K>) -> BoxRoutine {
    Script::new()
        .run(move || {
            if cell.borrow().phase() == Phase::Loaded {
                PhaseRoutine::initialize(cell, &cx)
            } else {
                routine::done()
            }
        })
        .boxed()
}

fn collapse(mut group: Vec<BoxRoutine>) -> BoxRoutine {
    match group.len() {
        1 => group.remove(0),
        _ => merge(group),
    }
}

impl<K: NodeKey> TreeResolver<K> {
    pub fn new(shared: Rc<RefCell<TreeState<K>>>) -> Self {
        Self { shared }
    }

    fn set_state(&self, state: TransitionState) -> Result<TransitionContext<K>, TaskError> {
        let mut tree = self.shared.borrow_mut();
        let record = tree.record.as_mut().ok_or_else(no_transition)?;
        record.state = state;
        Ok(record.context.clone())
    }

    fn effects(&self) -> Vec<EffectRef> {
        self.shared
            .borrow()
            .record
            .as_ref()
            .map(|record| record.effects.clone())
            .unwrap_or_default()
    }

    fn close_cells(&self) -> Result<(Vec<SharedCell<K>>, TransitionContext<K>), TaskError> {
        let tree = self.shared.borrow();
        let record = tree.record.as_ref().ok_or_else(no_transition)?;
        Ok((tree.cells_of(&record.path.close), record.context.clone()))
    }

    fn open_cells(&self) -> Result<(Vec<SharedCell<K>>, TransitionContext<K>), TaskError> {
        let tree = self.shared.borrow();
        let record = tree.record.as_ref().ok_or_else(no_transition)?;
        Ok((tree.cells_of(&record.path.open), record.context.clone()))
    }

    /// Loads grouped so that roots and sessions run alone while runs of
    /// adjacent parallel screens load together.
    fn load_routine(&self) -> Result<BoxRoutine, TaskError> {
        let cx = self.set_state(TransitionState::Initializing)?;
        let targets: Vec<(SharedCell<K>, Option<AsyncHandle>)> = {
            let tree = self.shared.borrow();
            let record = tree.record.as_ref().ok_or_else(no_transition)?;
            record
                .path
                .open
                .iter()
                .map(|&id| {
                    let preload = tree
                        .preloads
                        .get(tree.key(id))
                        .filter(|r| r.state == PreloadState::Loading)
                        .map(|r| r.handle.clone());
                    (tree.cell(id).clone(), preload)
                })
                .collect()
        };

        let mut groups: Vec<Vec<BoxRoutine>> = Vec::new();
        let mut joinable = false;
        for (cell, preload) in targets {
            let (alone, phase) = {
                let node = cell.borrow();
                (node.loads_alone(), node.phase())
            };
            if preload.is_none() && phase.is_loaded() {
                continue;
            }
            let load = load_when_ready(cell, preload, cx.clone());
            match groups.last_mut() {
                Some(group) if joinable && !alone => group.push(load),
                _ => groups.push(vec![load]),
            }
            joinable = !alone;
        }
        Ok(routine::sequence(groups.into_iter().map(collapse).collect()))
    }

    fn initialize_routine(&self) -> Result<BoxRoutine, TaskError> {
        let (cells, cx) = self.open_cells()?;
        Ok(routine::sequence(
            cells
                .into_iter()
                .map(|cell| initialize_when_loaded(cell, cx.clone()))
                .collect(),
        ))
    }

    fn screens(cells: Vec<SharedCell<K>>) -> impl Iterator<Item = SharedCell<K>> {
        cells
            .into_iter()
            .filter(|cell| cell.borrow().kind() == NodeKind::Screen)
    }
}

impl<K: NodeKey> TransitionResolver for TreeResolver<K> {
    fn start(&self) -> Result<(), TaskError> {
        let (unfocus, effects) = {
            let mut tree = self.shared.borrow_mut();
            let record = tree.record.as_mut().ok_or_else(no_transition)?;
            record.state = TransitionState::Standby;
            record.effects_active = true;
            let effects = record.effects.clone();
            let previous = record.previous.clone();
            (tree.cells_of(&previous), effects)
        };
        for cell in unfocus {
            cell.borrow_mut().set_focus(false);
        }
        for effect in &effects {
            effect.begin_transition();
        }
        Ok(())
    }

    fn enter_effect_routine(&self) -> BoxRoutine {
        merge(self.effects().iter().map(|e| e.enter_routine()).collect::<Vec<_>>())
    }

    fn load_next_routine(&self) -> BoxRoutine {
        let load = self.clone();
        let initialize = self.clone();
        Script::new()
            .run(move || load.load_routine().unwrap_or_else(|e| routine::fail(e)))
            .run(move || initialize.initialize_routine().unwrap_or_else(|e| routine::fail(e)))
            .boxed()
    }

    fn activate_next(&self) -> Result<(), TaskError> {
        let cx = self.set_state(TransitionState::Opening)?;
        let (cells, _) = self.open_cells()?;
        for cell in cells {
            let mut node = cell.borrow_mut();
            if node.phase() == Phase::Initialized {
                node.activate(&cx)?;
            }
        }
        Ok(())
    }

    fn open_next_routine(&self, immediate: bool) -> BoxRoutine {
        let (cells, cx) = match self.open_cells() {
            Ok(found) => found,
            Err(error) => return routine::fail(error),
        };
        let opens: Vec<BoxRoutine> = Self::screens(cells)
            .map(|cell| PhaseRoutine::open(cell, &cx, immediate))
            .collect();
        merge(opens)
    }

    fn close_prev_routine(&self, immediate: bool) -> BoxRoutine {
        let cx = match self.set_state(TransitionState::Closing) {
            Ok(cx) => cx,
            Err(error) => return routine::fail(error),
        };
        let cells = match self.close_cells() {
            Ok((cells, _)) => cells,
            Err(error) => return routine::fail(error),
        };
        let closes: Vec<BoxRoutine> = Self::screens(cells)
            .filter(|cell| cell.borrow().is_opened())
            .map(|cell| PhaseRoutine::close(cell, &cx, immediate))
            .collect();
        merge(closes)
    }

    fn deactivate_prev(&self) -> Result<(), TaskError> {
        let (cells, cx) = self.close_cells()?;
        for cell in cells {
            let mut node = cell.borrow_mut();
            if node.phase() == Phase::Active {
                node.deactivate(&cx)?;
            }
        }
        Ok(())
    }

    fn unload_prev(&self) -> Result<(), TaskError> {
        let (cells, retained, cx) = {
            let tree = self.shared.borrow();
            let record = tree.record.as_ref().ok_or_else(no_transition)?;
            let retained: Vec<bool> = record
                .path
                .close
                .iter()
                .map(|&id| tree.is_retained(id))
                .collect();
            (tree.cells_of(&record.path.close), retained, record.context.clone())
        };
        for cell in &cells {
            let mut node = cell.borrow_mut();
            if matches!(node.phase(), Phase::Initializing | Phase::Initialized) {
                node.terminate(&cx)?;
            }
        }
        for (cell, retained) in cells.iter().zip(retained) {
            let mut node = cell.borrow_mut();
            if !retained && matches!(node.phase(), Phase::Loading | Phase::Loaded) {
                node.unload(&cx)?;
            }
        }
        Ok(())
    }

    fn exit_effect_routine(&self) -> BoxRoutine {
        merge(self.effects().iter().map(|e| e.exit_routine()).collect::<Vec<_>>())
    }

    fn finish(&self) -> Result<(), TaskError> {
        let (effects, top) = {
            let mut tree = self.shared.borrow_mut();
            let top = tree.current.map(|id| tree.cell(id).clone());
            let record = tree.record.as_mut().ok_or_else(no_transition)?;
            record.state = TransitionState::Completed;
            record.effects_active = false;
            (record.effects.clone(), top)
        };
        for effect in &effects {
            effect.end_transition();
        }
        if let Some(top) = top {
            top.borrow_mut().set_focus(true);
        }
        Ok(())
    }
}
