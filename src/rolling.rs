//! Trailing window averages
//!
//! Rolling means over the current and previous records in table order. Partial
//! windows are averaged over whatever is available, so the first record's window
//! holds exactly one value.

use std::collections::VecDeque;

/// Default rolling window in records
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// Fixed-capacity trailing window
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    window_size: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_ROLLING_WINDOW)
    }
}

impl RollingWindow {
    /// Create a window holding at most `window_size` values (minimum 1)
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            values: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Push a value, evicting the oldest once full, and return the current mean
    pub fn push(&mut self, value: f64) -> f64 {
        self.values.push_back(value);
        while self.values.len() > self.window_size {
            self.values.pop_front();
        }
        self.mean()
    }

    /// Mean of the values currently in the window (NaN when empty)
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return f64::NAN;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Trailing means for a whole series
pub fn rolling_means(values: &[f64], window_size: usize) -> Vec<f64> {
    let mut window = RollingWindow::new(window_size);
    values.iter().map(|&v| window.push(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_window_is_single_value() {
        let means = rolling_means(&[6.0, 8.0], 7);
        assert_eq!(means[0], 6.0);
        assert_eq!(means[1], 7.0);
    }

    #[test]
    fn test_window_rolls_after_capacity() {
        let mut window = RollingWindow::new(3);
        for v in [60.0, 70.0, 80.0, 90.0] {
            window.push(v);
        }
        assert_eq!(window.len(), 3);
        assert!((window.mean() - 80.0).abs() < 1e-12);
    }

    #[test]
    fn test_seven_record_window() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let means = rolling_means(&values, DEFAULT_ROLLING_WINDOW);
        // rows 3..=9 -> values 4..=10
        assert!((means[9] - 7.0).abs() < 1e-12);
        // partial window at row 5 -> values 1..=6
        assert!((means[5] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_mean_is_nan() {
        assert!(RollingWindow::default().mean().is_nan());
    }

    #[test]
    fn test_zero_window_clamped_to_one() {
        let means = rolling_means(&[1.0, 5.0], 0);
        assert_eq!(means, vec![1.0, 5.0]);
    }
}
