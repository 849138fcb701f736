#![forbid(unsafe_code)]

//! Effect stream assertions.

use stepkit_core::{Effect, Quantity};

/// Accumulates effect batches and answers the questions tests ask.
#[derive(Debug, Default)]
pub struct EffectLog {
    effects: Vec<Effect>,
}

impl EffectLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of effects.
    pub fn record(&mut self, effects: impl IntoIterator<Item = Effect>) {
        self.effects.extend(effects);
    }

    /// Every effect recorded, in order.
    pub fn all(&self) -> &[Effect] {
        &self.effects
    }

    /// `(old, new)` unit pairs of every applied change, in order.
    pub fn changes(&self) -> Vec<(i64, i64)> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::QuantityChanged { new, old, .. } => Some((old.units(), new.units())),
                _ => None,
            })
            .collect()
    }

    /// Targets of every commit request, in order.
    pub fn commits(&self) -> Vec<Quantity> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Commit { target, .. } => Some(*target),
                _ => None,
            })
            .collect()
    }

    /// Count effects by [`Effect::kind_name`].
    pub fn count(&self, kind_name: &str) -> usize {
        self.effects
            .iter()
            .filter(|e| e.kind_name() == kind_name)
            .count()
    }

    /// Drop everything recorded so far.
    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
