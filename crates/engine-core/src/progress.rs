/// Decides which per-row progress ticks reach the reporter.
#[derive(Debug, Clone, Copy)]
pub struct ProgressThrottle {
    every: u64,
}

pub const DEFAULT_PROGRESS_EVERY: u64 = 10;

impl ProgressThrottle {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }

    /// Every `every`-th unit, and always the last one.
    pub fn should_report(&self, current: u64, total: u64) -> bool {
        current > 0 && (current % self.every == 0 || current == total)
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_EVERY)
    }
}

/// `12.5%`, with a zero total reported as complete.
pub fn percent(current: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        current as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_every_tenth_and_the_last() {
        let throttle = ProgressThrottle::default();
        let ticks: Vec<u64> = (1..=23).filter(|i| throttle.should_report(*i, 23)).collect();
        assert_eq!(ticks, vec![10, 20, 23]);
    }

    #[test]
    fn zero_interval_reports_everything() {
        let throttle = ProgressThrottle::new(0);
        assert!(throttle.should_report(1, 5));
        assert!(!throttle.should_report(0, 5));
    }
}
