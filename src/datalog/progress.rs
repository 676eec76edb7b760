/// Progress callback for long imports and exports. Receives percent
/// complete; returning `true` asks an export to stop. Imports ignore the
/// return value.
pub type ProgressFn<'a> = &'a mut dyn FnMut(f64) -> bool;

/// Rate-limits a progress callback to one call per `step` percent.
pub struct Progress<'a> {
    callback: Option<ProgressFn<'a>>,
    step: f64,
    last_bucket: Option<u64>,
    completed: bool,
}

impl<'a> Progress<'a> {
    pub fn new(callback: Option<ProgressFn<'a>>, step: u32) -> Self {
        Self {
            callback,
            step: step.max(1) as f64,
            last_bucket: None,
            completed: false,
        }
    }

    /// Report `done` of `total` units. Returns the callback's answer when it
    /// was invoked, `false` otherwise.
    pub fn update(&mut self, done: usize, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        let percent = (done as f64 / total as f64 * 100.0).min(100.0);
        let bucket = (percent / self.step).floor() as u64;
        if self.last_bucket.is_some_and(|b| b >= bucket) {
            return false;
        }
        self.last_bucket = Some(bucket);
        self.completed = percent >= 100.0;
        self.call(percent)
    }

    /// Final 100% report, unless `update` already delivered it.
    pub fn finish(&mut self) {
        if !self.completed {
            self.completed = true;
            self.call(100.0);
        }
    }

    fn call(&mut self, percent: f64) -> bool {
        match self.callback.as_mut() {
            Some(cb) => cb(percent),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_step() {
        let mut seen = Vec::new();
        {
            let mut cb = |p: f64| {
                seen.push(p);
                false
            };
            let mut progress = Progress::new(Some(&mut cb), 25);
            for done in 0..=100 {
                progress.update(done, 100);
            }
        }
        assert_eq!(seen, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn hundred_is_reported_once() {
        let mut seen = Vec::new();
        {
            let mut cb = |p: f64| {
                seen.push(p);
                false
            };
            let mut progress = Progress::new(Some(&mut cb), 5);
            progress.update(3, 4);
            progress.update(4, 4);
            progress.finish();
        }
        assert_eq!(seen, vec![75.0, 100.0]);
    }

    #[test]
    fn finish_fills_in_missing_hundred() {
        let mut seen = Vec::new();
        {
            let mut cb = |p: f64| {
                seen.push(p);
                false
            };
            let mut progress = Progress::new(Some(&mut cb), 50);
            progress.update(1, 4);
            progress.finish();
            progress.finish();
        }
        assert_eq!(seen, vec![25.0, 100.0]);
    }

    #[test]
    fn propagates_cancel_request() {
        let mut cb = |p: f64| p >= 50.0;
        let mut progress = Progress::new(Some(&mut cb), 10);
        assert!(!progress.update(1, 10));
        assert!(progress.update(5, 10));
    }

    #[test]
    fn no_callback_never_cancels() {
        let mut progress = Progress::new(None, 5);
        assert!(!progress.update(3, 3));
        progress.finish();
    }
}
