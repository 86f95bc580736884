// Single-flight guard for the continuation mixer.
// Taken synchronously before the first network call, released when the
// guard drops (whether the cycle succeeded, failed or was dropped mid-way).

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct MixerFlight {
    in_flight: AtomicBool,
}

impl MixerFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if a flight is already outstanding.
    pub fn try_begin(&self) -> Option<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flight: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct FlightGuard<'a> {
    flight: &'a MixerFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused_until_drop() {
        let flight = MixerFlight::new();
        let guard = flight.try_begin();
        assert!(guard.is_some());
        assert!(flight.is_in_flight());
        assert!(flight.try_begin().is_none());

        drop(guard);
        assert!(!flight.is_in_flight());
        assert!(flight.try_begin().is_some());
    }
}
