//! Per-layer animation state, indexed by layer slot
//!
//! A slot holds one of a fixed set of state shapes. Asking for a shape the
//! slot doesn't currently hold replaces it with a fresh default, which is
//! how a slot changes kind without leaking the previous kind's state.

/// Scroll position shared by every layer kind
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollState {
    pub offset: f32,
    /// Index into the layer's text snippets
    pub snippet: usize,
}

/// One falling character
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub ch: char,
    pub color: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallingLettersState {
    pub particles: Vec<Particle>,
    /// Fractional spawns carried between frames
    pub spawn_accumulator: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixRainState {
    /// Per-column head phase, one entry per even column
    pub phases: Vec<f32>,
    /// Per-column fall speed
    pub speeds: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlasmaState {
    pub phase: f32,
    pub color_phase: f32,
    pub bass_intensity: f32,
    pub treble_intensity: f32,
}

/// Expanding ring spawned on a beat
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub max_radius: f32,
    pub color: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeatCirclesState {
    pub rings: Vec<Ring>,
    /// Beat counter value when the last ring was spawned
    pub last_beat: u64,
}

/// State held by one layer slot
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LayerState {
    #[default]
    Empty,
    FallingLetters(FallingLettersState),
    MatrixRain(MatrixRainState),
    Plasma(PlasmaState),
    BeatCircles(BeatCirclesState),
}

/// A state shape that can live in a slot
pub trait SlotState: Default {
    /// The slot's state as `Self`, replacing any other shape with a fresh
    /// default first
    fn coerce_slot(slot: &mut LayerState) -> &mut Self;
}

macro_rules! slot_state {
    ($ty:ty, $variant:ident) => {
        impl SlotState for $ty {
            fn coerce_slot(slot: &mut LayerState) -> &mut Self {
                match slot {
                    LayerState::$variant(state) => state,
                    other => {
                        *other = LayerState::$variant(Self::default());
                        Self::coerce_slot(other)
                    }
                }
            }
        }
    };
}

slot_state!(FallingLettersState, FallingLetters);
slot_state!(MatrixRainState, MatrixRain);
slot_state!(PlasmaState, Plasma);
slot_state!(BeatCirclesState, BeatCircles);

/// View a slot as state `T`, replacing it with a fresh `T` if it holds
/// anything else
pub fn coerce<T: SlotState>(slot: &mut LayerState) -> &mut T {
    T::coerce_slot(slot)
}

#[derive(Debug, Clone, Default)]
struct Slot {
    scroll: ScrollState,
    state: LayerState,
}

/// Animation state for every layer slot
#[derive(Debug, Default)]
pub struct LayerStateStore {
    slots: Vec<Slot>,
}

impl LayerStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to at least `n` empty slots
    pub fn ensure_capacity(&mut self, n: usize) {
        if self.slots.len() < n {
            self.slots.resize_with(n, Slot::default);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot state as `T`, constructing it if missing or of another shape
    pub fn get_state<T: SlotState>(&mut self, index: usize) -> &mut T {
        self.ensure_capacity(index + 1);
        coerce(&mut self.slots[index].state)
    }

    /// Raw slot state, for renderers that coerce it themselves
    pub fn slot_mut(&mut self, index: usize) -> &mut LayerState {
        self.ensure_capacity(index + 1);
        &mut self.slots[index].state
    }

    pub fn scroll(&self, index: usize) -> ScrollState {
        self.slots.get(index).map(|s| s.scroll).unwrap_or_default()
    }

    pub fn set_scroll(&mut self, index: usize, scroll: ScrollState) {
        self.ensure_capacity(index + 1);
        self.slots[index].scroll = scroll;
    }

    /// Reset a slot so the next draw starts from fresh state
    pub fn clear_state(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::default();
        }
    }
}
