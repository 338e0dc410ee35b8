//! Transition strategies, effects, requests and handles.

mod context;
mod effect;
mod handle;
mod request;
mod resolver;
mod strategy;

pub use context::{Direction, TransitionContext};
pub use effect::{DelayEffect, EffectRef, TransitionEffect};
pub use handle::TransitionHandle;
pub use request::{SetupFn, TransitionOption, TransitionRequest};
pub use resolver::TransitionResolver;
pub use strategy::{for_kind, Cross, Sequential, Transition, TransitionKind, TransitionRef};
