//! Raw to physical value conversion.

use super::blocks::ConversionBlock;
use crate::constants::conversion_types;

/// Conversion rule attached to a channel
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Identity,
    /// `offset + factor * x`
    Linear { offset: f64, factor: f64 },
    /// `(p1 x² + p2 x + p3) / (p4 x² + p5 x + p6)`
    Rational { p: [f64; 6] },
    /// Table lookups, formulas and text mappings
    Unsupported(u8),
}

impl Conversion {
    pub fn from_block(block: Option<&ConversionBlock>) -> Self {
        let Some(block) = block else {
            return Conversion::Identity;
        };

        match block.conversion_type {
            conversion_types::IDENTITY => Conversion::Identity,
            conversion_types::LINEAR if block.values.len() >= 2 => Conversion::Linear {
                offset: block.values[0],
                factor: block.values[1],
            },
            conversion_types::RATIONAL if block.values.len() >= 6 => {
                let mut p = [0.0; 6];
                p.copy_from_slice(&block.values[..6]);
                Conversion::Rational { p }
            }
            other => Conversion::Unsupported(other),
        }
    }

    /// Physical value for raw value `x`
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Conversion::Identity | Conversion::Unsupported(_) => x,
            Conversion::Linear { offset, factor } => offset + factor * x,
            Conversion::Rational { p } => {
                let x2 = x * x;
                (p[0] * x2 + p[1] * x + p[2]) / (p[3] * x2 + p[4] * x + p[5])
            }
        }
    }
}
