//! Effect contract and mounted instances
//!
//! Every visual effect implements [`Effect`]: it reacts to trigger edges and
//! consumes elapsed time, and nothing else. Wiring an effect to its element
//! and to the frame service is the job of [`EffectInstance`], which owns the
//! effect's [`Trigger`] and both subscriptions.
//!
//! Unmounting detaches both subscriptions and cancels the effect before
//! anything is released, so an unmounted effect never sees another event or
//! frame. Listeners only hold a `Weak` reference to the effect, so even a
//! subscription that somehow outlives the instance cannot reach it.
//!
//! ```rust
//! use kinetic_core::{ElementEvent, EventTarget, FrameTick};
//! use kinetic_effects::{EffectInstance, SplitReveal, SplitRevealConfig};
//!
//! let element = EventTarget::<ElementEvent>::new();
//! let frames = EventTarget::<FrameTick>::new();
//!
//! let heading = SplitReveal::new(SplitRevealConfig::new("Features")).unwrap();
//! let heading = EffectInstance::mount(heading, &element, &frames).unwrap();
//!
//! element.emit(&ElementEvent::Intersection { ratio: 0.4 });
//! for _ in 0..120 {
//!     frames.emit(&FrameTick { dt_ms: 16.0 });
//! }
//! assert!(heading.with(|effect| effect.is_complete()));
//!
//! heading.unmount();
//! assert_eq!(frames.listener_count(), 0);
//! ```

use kinetic_core::{
    ElementEvent, EventTarget, FrameTick, Result, Subscription, Trigger, TriggerEdge,
    TriggerInput, TriggerKind,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// A self-contained animation driven by trigger edges and elapsed time
///
/// Callbacks an effect invokes (completion, sentence complete) run while the
/// effect is borrowed by its instance and must not reach back into it.
pub trait Effect: 'static {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// The trigger gating this effect, if any
    ///
    /// Effects without a trigger only follow intersection and frame input.
    fn trigger_kind(&self) -> Option<TriggerKind>;

    /// React to a trigger edge
    fn on_trigger(&mut self, edge: TriggerEdge);

    /// Consume `dt_ms` of elapsed time
    fn advance(&mut self, dt_ms: f32);

    /// Observe the element's visible fraction
    fn on_intersection(&mut self, _ratio: f32) {}

    /// Stop all pending work; called once on unmount
    fn cancel(&mut self);

    /// Whether the effect has nothing left to animate
    fn is_settled(&self) -> bool;
}

struct Slot<E> {
    effect: E,
    trigger: Option<Trigger>,
    /// Hidden elements don't consume frames
    visible: bool,
    mounted: bool,
}

impl<E: Effect> Slot<E> {
    fn handle_event(&mut self, event: &ElementEvent) {
        if !self.mounted {
            return;
        }

        match *event {
            ElementEvent::Visibility(visible) => {
                if self.visible != visible {
                    tracing::debug!(effect = self.effect.name(), visible, "visibility changed");
                }
                self.visible = visible;
                return;
            }
            ElementEvent::Intersection { ratio } => self.effect.on_intersection(ratio),
            _ => {}
        }

        let Some(input) = event.trigger_input() else {
            return;
        };
        if let Some(edge) = self.trigger.as_mut().and_then(|t| t.handle(&input)) {
            self.effect.on_trigger(edge);
        }
    }

    fn handle_frame(&mut self, tick: &FrameTick) {
        if !self.mounted || !self.visible {
            return;
        }
        let dt = tick.dt_ms;
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let fired = self
            .trigger
            .as_mut()
            .and_then(|t| t.handle(&TriggerInput::Elapsed(dt)).map(|edge| (edge, t.overshoot_ms())));

        match fired {
            Some((edge, overshoot)) => {
                // Everything before the firing point belongs to the idle effect
                self.effect.advance(dt - overshoot);
                self.effect.on_trigger(edge);
                self.effect.advance(overshoot);
            }
            // Settled effects only wait for their next edge
            None if self.effect.is_settled() => return,
            None => self.effect.advance(dt),
        }
        tracing::trace!(effect = self.effect.name(), dt, "frame");
    }
}

/// An effect mounted on an element and the frame service
pub struct EffectInstance<E: Effect> {
    slot: Rc<RefCell<Slot<E>>>,
    subscriptions: SmallVec<[Subscription; 2]>,
}

impl<E: Effect> EffectInstance<E> {
    /// Mount `effect`, attaching it to `element` and `frames`
    ///
    /// Fails if the effect's trigger configuration is invalid.
    pub fn mount(
        effect: E,
        element: &EventTarget<ElementEvent>,
        frames: &EventTarget<FrameTick>,
    ) -> Result<Self> {
        let trigger = effect.trigger_kind().map(Trigger::new).transpose()?;
        let name = effect.name();

        let slot = Rc::new(RefCell::new(Slot {
            effect,
            trigger,
            visible: true,
            mounted: true,
        }));

        let mut subscriptions = SmallVec::new();

        let weak: Weak<RefCell<Slot<E>>> = Rc::downgrade(&slot);
        subscriptions.push(element.subscribe(move |event| {
            let Some(slot) = weak.upgrade() else {
                return;
            };
            match slot.try_borrow_mut() {
                Ok(mut slot) => slot.handle_event(event),
                Err(_) => tracing::warn!(effect = name, "dropping re-entrant element event"),
            };
        }));

        let weak: Weak<RefCell<Slot<E>>> = Rc::downgrade(&slot);
        subscriptions.push(frames.subscribe(move |tick| {
            let Some(slot) = weak.upgrade() else {
                return;
            };
            match slot.try_borrow_mut() {
                Ok(mut slot) => slot.handle_frame(tick),
                Err(_) => tracing::warn!(effect = name, "dropping re-entrant frame"),
            };
        }));

        tracing::debug!(effect = name, "effect mounted");
        Ok(Self {
            slot,
            subscriptions,
        })
    }

    /// Detach from the element and frame service and cancel the effect
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let was_attached = !self.subscriptions.is_empty();
        self.subscriptions.clear();

        let Ok(mut slot) = self.slot.try_borrow_mut() else {
            tracing::warn!("effect busy during unmount; subscriptions detached only");
            return;
        };
        if !std::mem::replace(&mut slot.mounted, false) {
            return;
        }
        slot.effect.cancel();
        if was_attached {
            tracing::debug!(effect = slot.effect.name(), "effect unmounted");
        }
    }

    /// Borrow the effect
    pub fn with<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.slot.borrow().effect)
    }

    /// Whether the effect has nothing left to animate
    pub fn is_settled(&self) -> bool {
        self.slot.borrow().effect.is_settled()
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.borrow().mounted
    }

    /// Whether the element is currently shown
    pub fn is_visible(&self) -> bool {
        self.slot.borrow().visible
    }

    /// Whether the effect's trigger is waiting to fire
    pub fn is_armed(&self) -> bool {
        self.slot
            .borrow()
            .trigger
            .as_ref()
            .map_or(false, Trigger::is_armed)
    }
}

impl<E: Effect> Drop for EffectInstance<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<E: Effect> fmt::Debug for EffectInstance<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot.try_borrow() {
            Ok(slot) => f
                .debug_struct("EffectInstance")
                .field("effect", &slot.effect.name())
                .field("mounted", &slot.mounted)
                .field("visible", &slot.visible)
                .finish(),
            Err(_) => f.debug_struct("EffectInstance").finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Records what the instance feeds it
    #[derive(Default)]
    struct Recorder {
        kind: Option<TriggerKind>,
        edges: Vec<TriggerEdge>,
        advanced_ms: f32,
        advanced_after_fire_ms: f32,
        ratios: Vec<f32>,
        cancelled: Rc<Cell<u32>>,
        settled: bool,
    }

    impl Effect for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn trigger_kind(&self) -> Option<TriggerKind> {
            self.kind
        }

        fn on_trigger(&mut self, edge: TriggerEdge) {
            self.edges.push(edge);
        }

        fn advance(&mut self, dt_ms: f32) {
            self.advanced_ms += dt_ms;
            if self.edges.contains(&TriggerEdge::Fire) {
                self.advanced_after_fire_ms += dt_ms;
            }
        }

        fn on_intersection(&mut self, ratio: f32) {
            self.ratios.push(ratio);
        }

        fn cancel(&mut self) {
            self.cancelled.set(self.cancelled.get() + 1);
        }

        fn is_settled(&self) -> bool {
            self.settled
        }
    }

    fn targets() -> (EventTarget<ElementEvent>, EventTarget<FrameTick>) {
        (EventTarget::new(), EventTarget::new())
    }

    #[test]
    fn test_hover_edges_reach_effect() {
        let (element, frames) = targets();
        let recorder = Recorder {
            kind: Some(TriggerKind::Hover),
            ..Default::default()
        };
        let instance = EffectInstance::mount(recorder, &element, &frames).unwrap();

        element.emit(&ElementEvent::PointerEnter);
        element.emit(&ElementEvent::PointerLeave);

        instance.with(|p| {
            assert_eq!(p.edges, vec![TriggerEdge::Fire, TriggerEdge::Release]);
        });
    }

    #[test]
    fn test_mount_delay_splits_firing_frame() {
        let (element, frames) = targets();
        let recorder = Recorder {
            kind: Some(TriggerKind::MountDelay { delay_ms: 100.0 }),
            ..Default::default()
        };
        let instance = EffectInstance::mount(recorder, &element, &frames).unwrap();

        frames.emit(&FrameTick { dt_ms: 60.0 });
        frames.emit(&FrameTick { dt_ms: 60.0 });

        instance.with(|p| {
            assert_eq!(p.edges, vec![TriggerEdge::Fire]);
            assert!((p.advanced_ms - 120.0).abs() < 1e-4);
            // Only the 20ms past the delay count as running time
            assert!((p.advanced_after_fire_ms - 20.0).abs() < 1e-4);
        });
    }

    #[test]
    fn test_hidden_element_consumes_no_frames() {
        let (element, frames) = targets();
        let instance = EffectInstance::mount(Recorder::default(), &element, &frames).unwrap();

        element.emit(&ElementEvent::Visibility(false));
        frames.emit(&FrameTick { dt_ms: 16.0 });
        assert!(!instance.is_visible());
        element.emit(&ElementEvent::Visibility(true));
        frames.emit(&FrameTick { dt_ms: 16.0 });

        instance.with(|p| assert!((p.advanced_ms - 16.0).abs() < 1e-4));
    }

    #[test]
    fn test_settled_effect_skips_frames() {
        let (element, frames) = targets();
        let recorder = Recorder {
            kind: Some(TriggerKind::MountDelay { delay_ms: 30.0 }),
            settled: true,
            ..Default::default()
        };
        let instance = EffectInstance::mount(recorder, &element, &frames).unwrap();
        assert!(instance.is_settled());

        // The firing frame is still delivered, later frames are not
        frames.emit(&FrameTick { dt_ms: 16.0 });
        frames.emit(&FrameTick { dt_ms: 16.0 });
        frames.emit(&FrameTick { dt_ms: 16.0 });

        instance.with(|r| {
            assert_eq!(r.edges, vec![TriggerEdge::Fire]);
            assert!((r.advanced_ms - 16.0).abs() < 1e-4);
        });
    }

    #[test]
    fn test_frames_reach_mounted_effect() {
        let (element, frames) = targets();
        let instance = EffectInstance::mount(Recorder::default(), &element, &frames).unwrap();

        frames.emit(&FrameTick { dt_ms: 10.0 });
        element.emit(&ElementEvent::Intersection { ratio: 0.5 });
        frames.emit(&FrameTick { dt_ms: 10.0 });

        instance.with(|r| {
            assert!((r.advanced_ms - 20.0).abs() < 1e-4);
            assert_eq!(r.ratios, vec![0.5]);
        });
    }

    #[test]
    fn test_intersection_forwarded() {
        let (element, frames) = targets();
        let instance = EffectInstance::mount(Recorder::default(), &element, &frames).unwrap();

        element.emit(&ElementEvent::Intersection { ratio: 0.25 });
        element.emit(&ElementEvent::Intersection { ratio: 0.75 });

        instance.with(|p| assert_eq!(p.ratios, vec![0.25, 0.75]));
    }

    #[test]
    fn test_unmount_detaches_and_cancels_once() {
        let (element, frames) = targets();
        let cancelled = Rc::new(Cell::new(0));
        let recorder = Recorder {
            kind: Some(TriggerKind::Hover),
            cancelled: cancelled.clone(),
            ..Default::default()
        };
        let instance = EffectInstance::mount(recorder, &element, &frames).unwrap();
        assert_eq!(element.listener_count(), 1);
        assert_eq!(frames.listener_count(), 1);

        instance.unmount();

        assert_eq!(element.listener_count(), 0);
        assert_eq!(frames.listener_count(), 0);
        assert_eq!(cancelled.get(), 1);

        // Nothing left to deliver to
        element.emit(&ElementEvent::PointerEnter);
        frames.emit(&FrameTick { dt_ms: 16.0 });
    }

    #[test]
    fn test_drop_is_unmount() {
        let (element, frames) = targets();
        let cancelled = Rc::new(Cell::new(0));
        {
            let recorder = Recorder {
                cancelled: cancelled.clone(),
                ..Default::default()
            };
            let _instance = EffectInstance::mount(recorder, &element, &frames).unwrap();
        }
        assert_eq!(cancelled.get(), 1);
        assert_eq!(frames.listener_count(), 0);
    }

    #[test]
    fn test_invalid_trigger_rejected_at_mount() {
        let (element, frames) = targets();
        let recorder = Recorder {
            kind: Some(TriggerKind::Intersection {
                threshold: 2.0,
                rearm_on_exit: false,
            }),
            ..Default::default()
        };
        assert!(EffectInstance::mount(recorder, &element, &frames).is_err());
        assert_eq!(element.listener_count(), 0);
    }
}
