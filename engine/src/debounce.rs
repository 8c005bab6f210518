/// Trailing-edge debounce driven by host time. Each `schedule` replaces the pending
/// value and pushes the deadline back; `poll` hands the value out once it is due.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    delay_ms: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: f64) -> Self {
        Debouncer { delay_ms, pending: None }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    pub fn schedule(&mut self, value: T, now_ms: f64) {
        self.pending = Some((value, now_ms + self.delay_ms));
    }

    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now_ms >= *deadline => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Hands out the pending value regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(v, _)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseding_writes_coalesce() {
        let mut d = Debouncer::new(500.0);
        d.schedule(80, 0.0);
        d.schedule(90, 100.0);
        d.schedule(100, 200.0);
        assert_eq!(d.poll(600.0), None);
        assert_eq!(d.pending(), Some(&100));
        assert_eq!(d.poll(700.0), Some(100));
        assert_eq!(d.poll(5000.0), None);
    }

    #[test]
    fn cancel_and_flush() {
        let mut d = Debouncer::new(200.0);
        d.schedule("a", 0.0);
        d.cancel();
        assert!(!d.is_pending());
        d.schedule("b", 0.0);
        assert_eq!(d.flush(), Some("b"));
        assert_eq!(d.poll(1000.0), None);
    }
}
