/// Stateless unit conversion between model units (milliseconds, pitch rows)
/// and caller-provided display units. The engine never renders; it only
/// translates through this boundary when a caller asks for displayable
/// geometry or feeds display-space input back in.
pub trait Scaler {
    /// Horizontal span, ms to display units.
    fn scale_x(&self, ms: f64) -> f64;
    fn unscale_x(&self, display: f64) -> f64;

    /// Vertical span, pitch rows to display units.
    fn scale_y(&self, rows: f64) -> f64;
    fn unscale_y(&self, display: f64) -> f64;

    /// Absolute song position. Identical to `scale_x` unless the display
    /// origin is offset.
    fn scale_pos(&self, ms: f64) -> f64 {
        self.scale_x(ms)
    }
    fn unscale_pos(&self, display: f64) -> f64 {
        self.unscale_x(display)
    }
}

/// Plain zoom-factor scaler.
#[derive(Clone, Copy, Debug)]
pub struct ZoomScaler {
    pub horizontal: f64,
    pub vertical: f64,
}

impl ZoomScaler {
    pub const IDENTITY: Self = Self {
        horizontal: 1.0,
        vertical: 1.0,
    };

    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

impl Scaler for ZoomScaler {
    fn scale_x(&self, ms: f64) -> f64 {
        ms * self.horizontal
    }
    fn unscale_x(&self, display: f64) -> f64 {
        display / self.horizontal
    }
    fn scale_y(&self, rows: f64) -> f64 {
        rows * self.vertical
    }
    fn unscale_y(&self, display: f64) -> f64 {
        display / self.vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_round_trip() {
        let scaler = ZoomScaler::new(0.25, 16.0);
        assert_eq!(scaler.unscale_x(scaler.scale_x(480.0)), 480.0);
        assert_eq!(scaler.unscale_y(scaler.scale_y(12.0)), 12.0);
        assert_eq!(scaler.scale_pos(400.0), 100.0);
    }
}
