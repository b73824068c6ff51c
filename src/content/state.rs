//! Text position state machine.
//!
//! [`TextState`] is an immutable value. [`TextState::step`] maps the state
//! before a token to the state after it, so a stream's states are a fold over
//! its tokens.

use super::geometry::{Band, PageGeometry};
use super::lexer::Token;

/// Whether text shows at the current position are being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suppression {
    /// Body text
    #[default]
    Off,
    /// Inside a header, footer, off-page or top-center band: every text
    /// show is removed
    Region(Band),
    /// On a whitelisted footer offset: only encoded footer runs are removed
    FooterOffset,
}

/// Text positioning state carried across the tokens of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextState {
    pub x: f64,
    pub y: f64,
    pub suppression: Suppression,
}

impl TextState {
    /// General (positional) suppression is active.
    pub fn suppress_general(&self) -> bool {
        matches!(self.suppression, Suppression::Region(_))
    }

    /// Footer-offset suppression is active.
    pub fn suppress_footer_only(&self) -> bool {
        self.suppression == Suppression::FooterOffset
    }

    /// State after `token`.
    pub fn step(self, token: &Token<'_>, geometry: &PageGeometry) -> Self {
        let Some(op) = token.operator() else {
            return self;
        };

        match op {
            b"BT" => Self::default(),
            b"ET" => Self {
                suppression: Suppression::Off,
                ..self
            },
            b"Tm" => match token.trailing_numbers::<6>() {
                Some([_, _, _, _, x, y]) => Self::positioned(x, y, geometry),
                None => self,
            },
            // Relative moves stay in the same run, so the decision carries over.
            b"Td" | b"TD" => match token.trailing_numbers::<2>() {
                Some([tx, ty]) => Self {
                    x: self.x + tx,
                    y: self.y + ty,
                    ..self
                },
                None => self,
            },
            _ => self,
        }
    }

    fn positioned(x: f64, y: f64, geometry: &PageGeometry) -> Self {
        let suppression = match geometry.band_of(x, y) {
            Some(band) => Suppression::Region(band),
            None if geometry.is_footer_offset(y) => Suppression::FooterOffset,
            None => Suppression::Off,
        };
        Self { x, y, suppression }
    }
}
