use std::f64::consts::PI;

pub const RING_RADIUS: f64 = 140.0;
pub const CIRCUMFERENCE: f64 = RING_RADIUS * 2.0 * PI;

const MIN_SCALE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub offset: f64,
    pub scale: f64,
}

/// Ring offset and breathing scale for the remaining `fraction` of a phase.
///
/// The offset grows from 0 (full ring) to the circumference (empty ring);
/// the scale shrinks from 1.0 to 0.95 along with it.
pub fn progress(fraction: f64) -> Progress {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    Progress {
        offset: CIRCUMFERENCE * (1.0 - fraction),
        scale: MIN_SCALE + (1.0 - MIN_SCALE) * fraction,
    }
}

pub fn ring_transform(scale: f64) -> String {
    format!("rotate(-90deg) scale({})", scale)
}

pub fn text_transform(scale: f64) -> String {
    format!("scale({})", scale)
}
