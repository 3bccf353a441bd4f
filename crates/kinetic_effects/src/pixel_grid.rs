//! Pixel grid transition
//!
//! A square grid of cells sits over two content layers. Firing the trigger
//! flips hidden cells one by one (each after its own delay) until the second
//! layer is fully shown; releasing flips them back in mirrored order.
//!
//! Cell flips are timers in a per-instance [`TimerQueue`]. Every edge cancels
//! whatever is still in flight before scheduling its own flips, so a release
//! in mid-reveal never leaves stale flips behind.
//!
//! ```text
//!  Concealed --Fire--> Revealing --all shown--> Revealed
//!      ^                 |    ^                    |
//!      |              Release Fire              Release
//!      |                 v    |                    |
//!      +--all hidden-- Concealing <----------------+
//! ```

use kinetic_animation::{TimerId, TimerQueue};
use kinetic_core::error::non_negative_delay;
use kinetic_core::{ConfigError, Result, TriggerEdge, TriggerKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

use crate::effect::Effect;

/// Custom delay function: `(row, col, grid_size)` to a factor in [0, 1]
pub type CustomDelay = Rc<dyn Fn(usize, usize, usize) -> f32>;

/// How a cell's delay depends on its position
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelayFn {
    /// Pseudo-random order, fixed by `seed`
    Scatter { seed: u64 },
    /// Left to right, top to bottom
    RowMajor,
    /// Top-left corner to bottom-right corner
    Diagonal,
    #[serde(skip)]
    Custom(CustomDelay),
}

impl Default for DelayFn {
    fn default() -> Self {
        DelayFn::Scatter { seed: 7 }
    }
}

impl fmt::Debug for DelayFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayFn::Scatter { seed } => f.debug_struct("Scatter").field("seed", seed).finish(),
            DelayFn::RowMajor => f.write_str("RowMajor"),
            DelayFn::Diagonal => f.write_str("Diagonal"),
            DelayFn::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl DelayFn {
    /// Delay factor in [0, 1] for every cell, row-major
    fn factors(&self, grid_size: usize) -> Vec<f32> {
        let cells = grid_size * grid_size;
        let last = (cells - 1).max(1) as f32;
        let diagonal = (2 * (grid_size - 1)).max(1) as f32;

        match self {
            DelayFn::Scatter { seed } => {
                let mut rng = SmallRng::seed_from_u64(*seed);
                (0..cells).map(|_| rng.gen::<f32>()).collect()
            }
            DelayFn::RowMajor => (0..cells).map(|i| i as f32 / last).collect(),
            DelayFn::Diagonal => (0..cells)
                .map(|i| (i / grid_size + i % grid_size) as f32 / diagonal)
                .collect(),
            DelayFn::Custom(f) => (0..cells)
                .map(|i| {
                    let factor = f(i / grid_size, i % grid_size, grid_size);
                    if factor.is_finite() {
                        factor.clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }
}

/// Pixel grid options
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelGridConfig {
    /// Cells per side
    pub grid_size: usize,
    /// Time from the first flip to the last
    pub step_ms: f32,
    pub delay_fn: DelayFn,
    /// Stay revealed once fully revealed
    pub once: bool,
    pub trigger: TriggerKind,
}

impl Default for PixelGridConfig {
    fn default() -> Self {
        Self {
            grid_size: 7,
            step_ms: 300.0,
            delay_fn: DelayFn::default(),
            once: false,
            trigger: TriggerKind::Hover,
        }
    }
}

impl PixelGridConfig {
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            ..Default::default()
        }
    }

    pub fn with_step(mut self, ms: f32) -> Self {
        self.step_ms = ms;
        self
    }

    pub fn with_delay_fn(mut self, delay_fn: DelayFn) -> Self {
        self.delay_fn = delay_fn;
        self
    }

    pub fn with_once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    /// Toggle on tap instead of following the pointer
    pub fn for_touch(mut self) -> Self {
        self.trigger = TriggerKind::Manual { toggle: true };
        self
    }
}

/// One tile of the grid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    /// Whether the cell shows the second layer
    pub visible: bool,
    pub delay_ms: f32,
}

/// Where the transition is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridPhase {
    Concealed,
    Revealing,
    Revealed,
    Concealing,
}

/// Which content layer dominates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    First,
    Second,
}

#[derive(Clone, Copy, Debug)]
struct CellFlip {
    index: usize,
    show: bool,
}

/// Staggered two-layer grid transition
pub struct PixelGrid {
    config: PixelGridConfig,
    cells: Vec<GridCell>,
    max_delay_ms: f32,
    phase: GridPhase,
    timers: TimerQueue<CellFlip>,
    /// In-flight flip per cell
    flips: Vec<Option<TimerId>>,
    on_reveal_complete: Option<Box<dyn FnMut()>>,
}

impl PixelGrid {
    pub fn new(config: PixelGridConfig) -> Result<Self> {
        if config.grid_size == 0 {
            return Err(ConfigError::InvalidGridSize(config.grid_size));
        }
        let step_ms = non_negative_delay("grid step", config.step_ms)?;

        let size = config.grid_size;
        let cells: Vec<GridCell> = config
            .delay_fn
            .factors(size)
            .into_iter()
            .enumerate()
            .map(|(i, factor)| GridCell {
                row: i / size,
                col: i % size,
                visible: false,
                delay_ms: factor * step_ms,
            })
            .collect();
        let max_delay_ms = cells.iter().map(|c| c.delay_ms).fold(0.0, f32::max);

        Ok(Self {
            config,
            cells,
            max_delay_ms,
            phase: GridPhase::Concealed,
            timers: TimerQueue::new(),
            flips: vec![None; size * size],
            on_reveal_complete: None,
        })
    }

    /// Set the callback run each time the grid becomes fully revealed
    pub fn on_reveal_complete(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_reveal_complete = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &PixelGridConfig {
        &self.config
    }

    pub fn phase(&self) -> GridPhase {
        self.phase
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        let size = self.config.grid_size;
        if row >= size || col >= size {
            return None;
        }
        self.cells.get(row * size + col)
    }

    pub fn visible_count(&self) -> usize {
        self.cells.iter().filter(|c| c.visible).count()
    }

    /// The layer on top: the second once more than half the cells flipped
    pub fn active_layer(&self) -> Layer {
        if self.visible_count() * 2 > self.cells.len() {
            Layer::Second
        } else {
            Layer::First
        }
    }

    /// Flips still scheduled
    pub fn pending_flips(&self) -> usize {
        self.timers.len()
    }

    /// One line per row, `#` for flipped cells
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.config.grid_size);
        for row in self.cells.chunks(self.config.grid_size) {
            out.extend(row.iter().map(|c| if c.visible { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }

    /// Cancel every cell's in-flight flip, returning how many were pending
    fn cancel_flips(&mut self) -> usize {
        let mut cancelled = 0;
        for id in self.flips.iter_mut().filter_map(Option::take) {
            if self.timers.cancel(id) {
                cancelled += 1;
            }
        }
        cancelled
    }

    fn reveal(&mut self) {
        let cancelled = self.cancel_flips();
        self.phase = GridPhase::Revealing;
        for (index, cell) in self.cells.iter().enumerate() {
            if !cell.visible {
                let id = self.timers.schedule(cell.delay_ms, CellFlip { index, show: true });
                self.flips[index] = Some(id);
            }
        }
        tracing::debug!(cancelled, scheduled = self.timers.len(), "grid revealing");
        self.settle_if_idle();
    }

    fn conceal(&mut self) {
        let cancelled = self.cancel_flips();
        self.phase = GridPhase::Concealing;
        for (index, cell) in self.cells.iter().enumerate() {
            if cell.visible {
                let delay = self.max_delay_ms - cell.delay_ms;
                let id = self.timers.schedule(delay, CellFlip { index, show: false });
                self.flips[index] = Some(id);
            }
        }
        tracing::debug!(cancelled, scheduled = self.timers.len(), "grid concealing");
        self.settle_if_idle();
    }

    /// Enter the terminal phase once nothing is in flight
    fn settle_if_idle(&mut self) {
        if !self.timers.is_empty() {
            return;
        }
        match self.phase {
            GridPhase::Revealing => {
                self.phase = GridPhase::Revealed;
                tracing::debug!("grid revealed");
                if let Some(callback) = self.on_reveal_complete.as_mut() {
                    callback();
                }
            }
            GridPhase::Concealing => {
                self.phase = GridPhase::Concealed;
                tracing::debug!("grid concealed");
            }
            GridPhase::Revealed | GridPhase::Concealed => {}
        }
    }
}

impl Effect for PixelGrid {
    fn name(&self) -> &'static str {
        "pixel_grid"
    }

    fn trigger_kind(&self) -> Option<TriggerKind> {
        Some(self.config.trigger)
    }

    fn on_trigger(&mut self, edge: TriggerEdge) {
        match (edge, self.phase) {
            (TriggerEdge::Fire, GridPhase::Concealed | GridPhase::Concealing) => self.reveal(),
            (TriggerEdge::Release, _) if self.config.once => {}
            (TriggerEdge::Release, GridPhase::Revealed | GridPhase::Revealing) => self.conceal(),
            _ => {}
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        if matches!(self.phase, GridPhase::Concealed | GridPhase::Revealed) {
            return;
        }
        for flip in self.timers.advance(dt_ms) {
            if let Some(cell) = self.cells.get_mut(flip.index) {
                cell.visible = flip.show;
                self.flips[flip.index] = None;
            }
        }
        self.settle_if_idle();
    }

    fn cancel(&mut self) {
        self.timers.cancel_all();
        self.flips.fill(None);
        self.on_reveal_complete = None;
    }

    fn is_settled(&self) -> bool {
        matches!(self.phase, GridPhase::Concealed | GridPhase::Revealed)
    }
}
