//! Integration tests for the stack and tree routers.

mod common;

use common::{scenario_tree, tree_with, Key, Log};
use waymark::error::ConfigError;
use waymark::prelude::*;

fn settle(router: &dyn Router<Key>) {
    for _ in 0..200 {
        if !router.is_transitioning() {
            return;
        }
        router.tree().update();
    }
    panic!("transition did not settle");
}

fn visit(router: &mut dyn Router<Key>, key: Key) -> TransitionHandle<Key> {
    let handle = router.transition_to(&key, TransitionRequest::new()).unwrap();
    settle(router);
    handle
}

fn stack_router(log: &Log) -> StackRouter<Key> {
    StackRouter::new(scenario_tree(log).build().unwrap())
}

#[test]
fn stack_back_two_returns_to_first_entry() {
    let log = Log::new();
    let mut router = stack_router(&log);
    for key in [Key::ScreenX, Key::ScreenY, Key::ScreenZ] {
        visit(&mut router, key);
    }

    let handle = router.back(2, TransitionRequest::new()).unwrap();
    settle(&router);

    assert_eq!(handle.result(), Some(Key::ScreenX));
    assert_eq!(router.stack(), &[Key::ScreenX]);
    assert_eq!(router.current_key(), Some(Key::ScreenX));
    assert_eq!(router.tree().current_key(), Some(Key::ScreenX));
}

#[test]
fn stack_back_with_single_entry_is_empty() {
    let log = Log::new();
    let mut router = stack_router(&log);
    visit(&mut router, Key::ScreenX);

    let handle = router.back(1, TransitionRequest::new()).unwrap();

    assert!(handle.is_empty());
    assert!(!router.is_transitioning());
    assert_eq!(router.stack(), &[Key::ScreenX]);
}

#[test]
fn stack_back_depth_is_clamped() {
    let log = Log::new();
    let mut router = stack_router(&log);
    for key in [Key::ScreenX, Key::ScreenY, Key::ScreenW] {
        visit(&mut router, key);
    }

    assert_eq!(router.back_key(1), Some(Key::ScreenY));
    assert_eq!(router.back_key(99), Some(Key::ScreenX));

    router.back(99, TransitionRequest::new()).unwrap();
    settle(&router);

    assert_eq!(router.stack(), &[Key::ScreenX]);
}

#[test]
fn revisiting_truncates_history() {
    let log = Log::new();
    let mut router = stack_router(&log);
    for key in [Key::ScreenX, Key::ScreenY, Key::ScreenZ, Key::ScreenW] {
        visit(&mut router, key);
    }

    visit(&mut router, Key::ScreenY);

    assert_eq!(router.stack(), &[Key::ScreenX, Key::ScreenY]);
}

#[test]
fn stack_rejects_requests_while_transitioning() {
    let log = Log::new();
    let mut router = stack_router(&log);
    router
        .transition_to(&Key::ScreenX, TransitionRequest::new())
        .unwrap();

    let forward = router.transition_to(&Key::ScreenY, TransitionRequest::new());
    let back = router.back(1, TransitionRequest::new());

    assert!(matches!(forward, Err(RequestError::AlreadyTransitioning)));
    assert!(matches!(back, Err(RequestError::AlreadyTransitioning)));
    settle(&router);
    assert_eq!(router.stack(), &[Key::ScreenX]);
}

#[test]
fn stack_unknown_key_leaves_history_untouched() {
    let log = Log::new();
    let mut router = stack_router(&log);
    visit(&mut router, Key::ScreenX);

    let result = router.transition_to(&Key::Orphan, TransitionRequest::new());

    assert!(matches!(result, Err(RequestError::UnknownKey { .. })));
    assert_eq!(router.stack(), &[Key::ScreenX]);
}

#[test]
fn set_stack_skips_unknown_and_repeated_keys() {
    let log = Log::new();
    let mut router = stack_router(&log);

    router.set_stack([Key::ScreenX, Key::Orphan, Key::ScreenY, Key::ScreenX]);

    assert_eq!(router.stack(), &[Key::ScreenX, Key::ScreenY]);
    assert_eq!(router.history(), vec![Key::ScreenX, Key::ScreenY]);
    router.clear_stack();
    assert!(router.stack().is_empty());
}

#[test]
fn stack_reset_keeps_history() {
    let log = Log::new();
    let mut router = stack_router(&log);
    visit(&mut router, Key::ScreenX);
    visit(&mut router, Key::ScreenY);
    log.clear();

    let handle = router.reset(TransitionRequest::new()).unwrap();
    settle(&router);

    assert_eq!(handle.result(), Some(Key::ScreenY));
    assert_eq!(router.stack(), &[Key::ScreenX, Key::ScreenY]);
    assert_eq!(log.count("Root.load"), 1);
}

#[test]
fn stack_router_keeps_its_stack_when_a_transition_faults() {
    let log = Log::new();
    let tree = tree_with(&log, |key, node| match key {
        Key::ScreenZ => node.failing("load"),
        _ => node,
    })
    .build()
    .unwrap();
    let mut router = StackRouter::new(tree);
    visit(&mut router, Key::ScreenX);

    let failed = visit(&mut router, Key::ScreenZ);

    assert!(failed.fault().is_some());
    assert_eq!(router.tree().current_key(), Some(Key::Root));
    assert_eq!(router.current_key(), Some(Key::ScreenX));
    assert_eq!(router.history(), vec![Key::ScreenX]);

    let retry = visit(&mut router, Key::ScreenZ);
    assert!(!retry.is_empty());
    assert_eq!(log.count("ScreenZ.load"), 2);
    assert_eq!(router.stack(), &[Key::ScreenX]);

    let home = visit(&mut router, Key::ScreenX);
    assert_eq!(home.result(), Some(Key::ScreenX));
    assert_eq!(router.stack(), &[Key::ScreenX]);
    assert_eq!(router.tree().current_key(), Some(Key::ScreenX));
}

fn tree_router(log: &Log) -> TreeRouter<Key> {
    TreeRouterBuilder::new()
        .add_root(Key::ScreenX, |x| {
            x.connect(Key::ScreenY, |y| {
                y.leaf(Key::ScreenZ);
            });
            x.connect(Key::ScreenW, |w| {
                w.fallback();
            });
        })
        .build(scenario_tree(log).build().unwrap())
        .unwrap()
}

#[test]
fn tree_router_follows_declared_edges() {
    let log = Log::new();
    let mut router = tree_router(&log);

    visit(&mut router, Key::ScreenX);
    visit(&mut router, Key::ScreenY);
    visit(&mut router, Key::ScreenZ);

    assert_eq!(router.current_key(), Some(Key::ScreenZ));
    assert_eq!(router.history(), vec![Key::ScreenX, Key::ScreenY, Key::ScreenZ]);
}

#[test]
fn tree_router_rejects_undeclared_moves() {
    let log = Log::new();
    let mut router = tree_router(&log);
    visit(&mut router, Key::ScreenX);

    let result = router.transition_to(&Key::ScreenZ, TransitionRequest::new());

    assert!(matches!(
        result,
        Err(RequestError::NoRoute { from, to }) if from == "ScreenX" && to == "ScreenZ"
    ));
    assert_eq!(router.current_key(), Some(Key::ScreenX));
}

#[test]
fn tree_router_uses_fallback_from_anywhere() {
    let log = Log::new();
    let mut router = tree_router(&log);
    for key in [Key::ScreenX, Key::ScreenY, Key::ScreenZ] {
        visit(&mut router, key);
    }

    visit(&mut router, Key::ScreenW);

    assert_eq!(router.current_key(), Some(Key::ScreenW));
    assert_eq!(router.history(), vec![Key::ScreenX, Key::ScreenW]);
}

#[test]
fn tree_router_moves_to_declared_ancestor() {
    let log = Log::new();
    let mut router = tree_router(&log);
    for key in [Key::ScreenX, Key::ScreenY, Key::ScreenZ] {
        visit(&mut router, key);
    }

    visit(&mut router, Key::ScreenX);

    assert_eq!(router.history(), vec![Key::ScreenX]);
}

#[test]
fn tree_router_back_climbs_the_graph() {
    let log = Log::new();
    let mut router = tree_router(&log);
    for key in [Key::ScreenX, Key::ScreenY, Key::ScreenZ] {
        visit(&mut router, key);
    }

    assert_eq!(router.back_key(1), Some(Key::ScreenY));
    assert_eq!(router.back_key(5), Some(Key::ScreenX));

    router.back(1, TransitionRequest::new()).unwrap();
    settle(&router);
    assert_eq!(router.current_key(), Some(Key::ScreenY));

    router.back(5, TransitionRequest::new()).unwrap();
    settle(&router);
    assert_eq!(router.current_key(), Some(Key::ScreenX));

    let handle = router.back(1, TransitionRequest::new()).unwrap();
    assert!(handle.is_empty());
}

#[test]
fn tree_router_stays_put_when_a_transition_faults() {
    let log = Log::new();
    let tree = tree_with(&log, |key, node| match key {
        Key::ScreenY => node.failing("load"),
        _ => node,
    })
    .build()
    .unwrap();
    let mut router = TreeRouterBuilder::new()
        .add_root(Key::ScreenX, |x| {
            x.leaf(Key::ScreenY);
        })
        .build(tree)
        .unwrap();
    visit(&mut router, Key::ScreenX);

    let failed = visit(&mut router, Key::ScreenY);

    assert!(failed.fault().is_some());
    assert_eq!(router.tree().current_key(), Some(Key::SessionA));
    assert_eq!(router.current_key(), Some(Key::ScreenX));
    assert_eq!(router.back_key(1), None);

    let retry = visit(&mut router, Key::ScreenY);
    assert!(!retry.is_empty());
    assert_eq!(log.count("ScreenY.load"), 2);

    let home = visit(&mut router, Key::ScreenX);
    assert_eq!(home.result(), Some(Key::ScreenX));
    assert_eq!(router.history(), vec![Key::ScreenX]);
}

#[test]
fn tree_router_unknown_key_is_not_a_missing_route() {
    let log = Log::new();
    let mut router = tree_router(&log);
    visit(&mut router, Key::ScreenX);

    let result = router.transition_to(&Key::Orphan, TransitionRequest::new());

    assert!(matches!(result, Err(RequestError::UnknownKey { .. })));
}

#[test]
fn tree_router_rejects_unregistered_routes_at_build() {
    let log = Log::new();

    let result = TreeRouterBuilder::new()
        .add_root(Key::ScreenX, |x| {
            x.leaf(Key::Orphan);
        })
        .build(scenario_tree(&log).build().unwrap());

    let errors = result.err().map(|e| e.errors).unwrap_or_default();
    assert_eq!(
        errors,
        vec![ConfigError::UnknownRouterKey {
            key: "Orphan".to_string()
        }]
    );
}
