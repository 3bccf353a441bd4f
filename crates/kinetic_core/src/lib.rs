//! Kinetic Core Runtime
//!
//! Foundational primitives shared by every kinetic effect:
//!
//! - **Event Targets**: DOM-style element event sources with explicit
//!   subscribe/unsubscribe and guaranteed teardown
//! - **Triggers**: mount-delay, intersection, hover and manual conditions that
//!   start, stop or restart an effect's timeline
//! - **Errors**: configuration and transition errors raised at instantiation
//!
//! # Example
//!
//! ```rust
//! use kinetic_core::{ElementEvent, EventTarget, Trigger, TriggerEdge, TriggerKind};
//!
//! let element = EventTarget::<ElementEvent>::new();
//! let mut hover = Trigger::new(TriggerKind::Hover).unwrap();
//!
//! let sub = element.subscribe(|event| {
//!     println!("element saw {:?}", event);
//! });
//! element.emit(&ElementEvent::PointerEnter);
//!
//! assert_eq!(
//!     hover.handle(&ElementEvent::PointerEnter.trigger_input().unwrap()),
//!     Some(TriggerEdge::Fire)
//! );
//!
//! // Detach before the owner goes away
//! sub.unsubscribe();
//! assert_eq!(element.listener_count(), 0);
//! ```

pub mod error;
pub mod events;
pub mod trigger;

pub use error::{ConfigError, Result, TransitionError};
pub use events::{ElementEvent, EventTarget, FrameTick, ListenerId, Subscription};
pub use trigger::{Trigger, TriggerEdge, TriggerInput, TriggerKind};
