//! Sample App
//!
//! This example wires up the navigation tree of a small game: a title
//! screen, an out-game hub with shop and party screens, and a battle
//! session entered with a cross transition.
//!
//! Key concepts:
//! - Declaring keys with `node_keys!` and nodes with `NavNode`
//! - Tree router with a global fallback back to the hub
//! - Preloading the battle field while the player browses the shop
//! - Driving everything from a fixed update loop
//!
//! Run with: RUST_LOG=debug cargo run --example sample_app

use tracing::info;
use waymark::node_keys;
use waymark::prelude::*;
use waymark::transition::{DelayEffect, TransitionRef};

node_keys! {
    enum Key {
        Root,
        TitleSession,
        Title,
        OutGame,
        Home,
        Shop,
        Party,
        Battle,
        Field,
        Summary,
    }
}

/// A screen that pretends to stream assets for a few frames.
struct Screen {
    assets: usize,
}

impl NavNode<Key> for Screen {
    fn load(&mut self, cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        info!(to = ?cx.to, preload = cx.preload, frames = self.assets, "streaming assets");
        routine::ticks(self.assets)
    }

    fn open(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        routine::ticks(2)
    }

    fn close(&mut self, _cx: &TransitionContext<Key>, _scope: &Scope) -> BoxRoutine {
        routine::ticks(1)
    }
}

/// The battle session always cross-fades in.
struct BattleSession;

impl NavNode<Key> for BattleSession {
    fn override_transition(&self, _next: &Key, transition: TransitionRef) -> TransitionRef {
        waymark::transition::for_kind(TransitionKind::Cross, transition.is_immediate())
    }

    fn activate(&mut self, _cx: &TransitionContext<Key>, scope: &Scope) -> HookResult {
        info!("battle music on");
        scope.defer(|| info!("battle music off"));
        Ok(())
    }
}

fn screen(assets: usize) -> Screen {
    Screen { assets }
}

fn run(engine: &mut NavigationEngine<Key>, handle: TransitionHandle<Key>) {
    let mut frames = 0;
    while handle.is_transitioning() {
        engine.update();
        frames += 1;
    }
    info!(
        reached = ?handle.result(),
        frames,
        current = ?engine.current_key(),
        "transition settled"
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let tree = TreeBuilder::root(Key::Root, EmptyNode, |root| {
        root.session(Key::TitleSession, EmptyNode, |title| {
            title.screen(Key::Title, screen(3));
        });
        root.session(Key::OutGame, EmptyNode, |out| {
            out.screen(Key::Home, screen(2));
            out.screen(Key::Shop, screen(1));
            out.screen(Key::Party, screen(1));
        });
        root.session(Key::Battle, BattleSession, |battle| {
            battle.screen(Key::Field, screen(6));
            battle.screen(Key::Summary, screen(1));
        });
    });

    let routes = TreeRouterBuilder::new().add_root(Key::Title, |title| {
        title.connect(Key::Home, |home| {
            home.connect(Key::Shop, |shop| {
                shop.fallback();
            });
            home.leaf(Key::Party);
            home.connect(Key::Field, |field| {
                field.leaf(Key::Summary);
            });
        });
    });

    let mut engine = NavigationEngine::builder()
        .tree(tree)
        .tree_router(routes)
        .options(EngineOptions::from_json(r#"{ "journal_capacity": 16 }"#)?)
        .build()?;

    let handle = engine.transition_to(&Key::Title, TransitionRequest::new())?;
    run(&mut engine, handle);

    let fade = TransitionRequest::new().with_effect(DelayEffect::new(2, 2));
    let handle = engine.transition_to(&Key::Home, fade)?;
    run(&mut engine, handle);

    let preload = engine.preload(&Key::Field)?;
    let handle = engine.transition_to(&Key::Shop, TransitionRequest::new())?;
    run(&mut engine, handle);
    info!(status = ?preload.status(), "field preload");

    let handle = engine.back(1, TransitionRequest::new())?;
    run(&mut engine, handle);

    let handle = engine.transition_to(&Key::Field, TransitionRequest::new())?;
    run(&mut engine, handle);
    engine.cancel_preload(&Key::Field);

    let handle = engine.transition_to(&Key::Summary, TransitionRequest::new())?;
    run(&mut engine, handle);

    // No edge leads from the summary to the shop; its fallback does.
    let handle = engine.transition_to(&Key::Shop, TransitionRequest::new())?;
    run(&mut engine, handle);

    let journal = engine.journal();
    let path: Vec<&str> = journal.get_path().into_iter().map(|k| k.name()).collect();
    info!(?path, "visited");

    if let Some(router) = engine.router() {
        let checkpoint = waymark::checkpoint::RouterCheckpoint::capture(router);
        info!(json = %checkpoint.to_json()?, "checkpoint");
    }

    engine.shutdown();
    Ok(())
}
