//! Kinetic Animation System
//!
//! Deterministic, frame-rate independent animation primitives. Everything here
//! is driven by explicit elapsed time; nothing reads a wall clock.
//!
//! # Features
//!
//! - **Timelines**: bounded or cyclic progress clocks with discrete steps
//! - **Easing**: CSS keyword curves, polynomial curves and custom beziers
//! - **Timer Queues**: per-instance delayed work with cancellation
//! - **Keyframes**: sampled tracks over any [`Interpolate`] value

pub mod easing;
pub mod timeline;
pub mod timer;
pub mod values;

pub use easing::Easing;
pub use timeline::{Direction, Repeat, Timeline};
pub use timer::{Fired, TimerId, TimerQueue};
pub use values::{Interpolate, Keyframe, Keyframes, LinearRange};
