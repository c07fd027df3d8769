//! Uniform scale-to-fit helpers
//!
//! Displays a virtual resolution inside an arbitrary surface while keeping the
//! aspect ratio, centering whatever space is left over.

/// Result of fitting a base rectangle into a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Horizontal offset of the scaled content inside the window
    pub x: i32,
    /// Vertical offset of the scaled content inside the window
    pub y: i32,
    /// Uniform scale from base units to window pixels
    pub scale: f32,
    /// Scaled content width in window pixels
    pub cx: i32,
    /// Scaled content height in window pixels
    pub cy: i32,
}

/// Fit `base` into `window` with a uniform scale and center the remainder.
///
/// Whichever dimension is the tighter fit decides the scale; the other axis is
/// centered. Degenerate sizes give a zero-scale result instead of dividing by
/// zero.
pub fn fit_and_center(base_cx: i32, base_cy: i32, window_cx: i32, window_cy: i32) -> Letterbox {
    if base_cx <= 0 || base_cy <= 0 || window_cx <= 0 || window_cy <= 0 {
        return Letterbox { x: 0, y: 0, scale: 0.0, cx: 0, cy: 0 };
    }

    let window_aspect = window_cx as f64 / window_cy as f64;
    let base_aspect = base_cx as f64 / base_cy as f64;

    let (scale, new_cx, new_cy) = if window_aspect > base_aspect {
        let scale = window_cy as f64 / base_cy as f64;
        (scale, (base_cx as f64 * scale) as i32, window_cy)
    } else {
        let scale = window_cx as f64 / base_cx as f64;
        (scale, window_cx, (window_cx as f64 * base_cy as f64 / base_cx as f64) as i32)
    };

    Letterbox {
        x: window_cx / 2 - new_cx / 2,
        y: window_cy / 2 - new_cy / 2,
        scale: scale as f32,
        cx: new_cx,
        cy: new_cy,
    }
}

/// Window size whose aspect matches `base` exactly, keeping the window width.
///
/// Used to shrink a window so the letterbox bars disappear.
pub fn fit_window_to_content(base_cx: i32, base_cy: i32, window_cx: i32, window_cy: i32) -> (i32, i32) {
    let fit = fit_and_center(base_cx, base_cy, window_cx, window_cy);
    if fit.scale <= 0.0 {
        return (window_cx, window_cy);
    }
    (fit.cx, fit.cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_constrained_fit() {
        // 800x600 is narrower than 16:9 so width decides the scale
        let fit = fit_and_center(1920, 1080, 800, 600);
        assert!((fit.scale - 800.0 / 1920.0).abs() < 1e-6);
        assert_eq!(fit.cx, 800);
        assert_eq!(fit.cy, 450);
        assert_eq!(fit.x, 0);
        assert_eq!(fit.y, 75);
    }

    #[test]
    fn test_height_constrained_fit() {
        let fit = fit_and_center(1920, 1080, 1600, 600);
        assert!((fit.scale - 600.0 / 1080.0).abs() < 1e-6);
        assert_eq!(fit.cy, 600);
        assert!(fit.cx < 1600);
        assert_eq!(fit.cx, 1066);
        assert_eq!(fit.x, 800 - 533);
        assert_eq!(fit.y, 0);
    }

    #[test]
    fn test_exact_aspect_has_no_bars() {
        let fit = fit_and_center(1920, 1080, 960, 540);
        assert_eq!((fit.x, fit.y), (0, 0));
        assert!((fit.scale - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_sizes() {
        let fit = fit_and_center(0, 1080, 800, 600);
        assert_eq!(fit.scale, 0.0);
        let fit = fit_and_center(1920, 1080, 0, 0);
        assert_eq!((fit.cx, fit.cy), (0, 0));
    }

    #[test]
    fn test_fit_window_to_content() {
        assert_eq!(fit_window_to_content(1920, 1080, 800, 600), (800, 450));
        assert_eq!(fit_window_to_content(1920, 1080, 0, 600), (0, 600));
    }
}
