//! The gravity line
//!
//! One shared state per level context: a global polarity and a beam row.
//! Everything below the beam has gravity reversed; polarity swaps the two
//! halves. Bodies and animated tiles both use the beam row as the threshold.

use serde::{Deserialize, Serialize};

use super::tile::TilePos;
use crate::consts::TILE_SIZE;

/// Global gravity sign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[default]
    Positive,
    Negative,
}

impl Polarity {
    pub fn sign(self) -> i32 {
        match self {
            Polarity::Positive => 1,
            Polarity::Negative => -1,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Polarity::Positive => Polarity::Negative,
            Polarity::Negative => Polarity::Positive,
        }
    }
}

/// Identity of a gravity button within a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonId {
    pub room: usize,
    pub pos: TilePos,
}

/// Polarity plus beam position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravityState {
    pub polarity: Polarity,
    /// Beam position in tile rows
    pub beam_row: f32,
    /// Button whose press is currently applied to the beam
    #[serde(default)]
    pub latched_button: Option<ButtonId>,
}

impl GravityState {
    pub fn new(polarity: Polarity, beam_row: f32) -> Self {
        Self {
            polarity,
            beam_row,
            latched_button: None,
        }
    }

    /// Gravity-orb stimulus
    pub fn flip_polarity(&mut self) {
        self.polarity = self.polarity.flipped();
        log::debug!("Gravity polarity now {:?}", self.polarity);
    }

    /// Gravity-button stimulus.
    ///
    /// Pressing a button moves the beam by `delta` and latches it; pressing the
    /// latched button again moves the beam back and releases the latch. A press
    /// on any other button replaces the latch without undoing the previous move.
    pub fn press_button(&mut self, button: ButtonId, delta: f32) {
        if self.latched_button == Some(button) {
            self.beam_row -= delta;
            self.latched_button = None;
        } else {
            self.beam_row += delta;
            self.latched_button = Some(button);
        }
        log::debug!(
            "Gravity button {:?} in room {} -> beam row {}",
            button.pos,
            button.room,
            self.beam_row
        );
    }

    /// True when a row (in tile units) sits in the reversed half
    #[inline]
    pub fn is_inverted_at(&self, row: f32) -> bool {
        (row >= self.beam_row) ^ (self.polarity == Polarity::Negative)
    }

    /// Local gravity for something whose centre is at `row`: +1 pulls toward
    /// increasing screen y, -1 toward decreasing
    #[inline]
    pub fn local_dir_at(&self, row: f32) -> i32 {
        if self.is_inverted_at(row) { -1 } else { 1 }
    }

    /// Local gravity for a body centred at pixel `y`
    pub fn local_dir_at_pixel(&self, y: i32) -> i32 {
        self.local_dir_at(y as f32 / TILE_SIZE as f32)
    }

    /// Screen y of the beam line, for drawing it
    pub fn beam_pixel_y(&self) -> f32 {
        self.beam_row * TILE_SIZE as f32
    }
}

impl Default for GravityState {
    fn default() -> Self {
        Self::new(
            Polarity::Positive,
            crate::consts::SCREEN_TILE_SIZE.1 as f32 / 2.0,
        )
    }
}
