//! Violation table filtering.
//!
//! The engine keeps the last fetched record set and narrows it on demand
//! according to two toggles. The cached set is never modified by filtering;
//! it is only replaced wholesale when a new fetch is applied.

use crate::data::Measurement;

/// The two filter checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterToggles {
    /// Show temperature violations.
    pub temperature: bool,
    /// Show humidity violations.
    pub humidity: bool,
}

impl FilterToggles {
    pub fn new(temperature: bool, humidity: bool) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// Decide whether a record passes.
    ///
    /// | temp | rh  | kept                       |
    /// |------|-----|----------------------------|
    /// | on   | on  | temp OR rh violation       |
    /// | on   | off | temp violation, rh normal  |
    /// | off  | on  | rh violation, temp normal  |
    /// | off  | off | everything                 |
    ///
    /// Only the threshold flags count here. A backend `reason` marks the
    /// row's status but does not make it match a dimension toggle.
    pub fn accepts(&self, record: &Measurement) -> bool {
        let temp = record.temp_violation();
        let rh = record.rh_violation();
        match (self.temperature, self.humidity) {
            (true, true) => temp || rh,
            (true, false) => temp && !rh,
            (false, true) => rh && !temp,
            (false, false) => true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.temperature || self.humidity
    }

    /// Short description for status lines.
    pub fn describe(&self) -> &'static str {
        match (self.temperature, self.humidity) {
            (true, true) => "temp+umidade",
            (true, false) => "temperatura",
            (false, true) => "umidade",
            (false, false) => "todos",
        }
    }
}

/// Cache of the last fetched records plus the current toggles.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    records: Vec<Measurement>,
    toggles: FilterToggles,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached set.
    pub fn replace(&mut self, records: Vec<Measurement>) {
        self.records = records;
    }

    /// The full, unfiltered set.
    pub fn records(&self) -> &[Measurement] {
        &self.records
    }

    pub fn toggles(&self) -> FilterToggles {
        self.toggles
    }

    pub fn set_toggles(&mut self, toggles: FilterToggles) {
        self.toggles = toggles;
    }

    pub fn toggle_temperature(&mut self) {
        self.toggles.temperature = !self.toggles.temperature;
    }

    pub fn toggle_humidity(&mut self) {
        self.toggles.humidity = !self.toggles.humidity;
    }

    /// Records passing the current toggles, in cache order.
    pub fn apply(&self) -> Vec<Measurement> {
        self.apply_with(self.toggles)
    }

    /// Records passing the given toggles, in cache order.
    pub fn apply_with(&self, toggles: FilterToggles) -> Vec<Measurement> {
        self.records.iter().filter(|r| toggles.accepts(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Measurement> {
        vec![
            Measurement::new("2024-01-01T00:00:00Z", 18.0, 50.0), // normal
            Measurement::new("2024-01-01T01:00:00Z", 20.0, 50.0), // temp
            Measurement::new("2024-01-01T02:00:00Z", 18.0, 70.0), // rh
            Measurement::new("2024-01-01T03:00:00Z", 16.0, 65.0), // both
        ]
    }

    fn temps(records: &[Measurement]) -> Vec<(f64, f64)> {
        records.iter().map(|r| (r.temperature, r.humidity)).collect()
    }

    #[test]
    fn test_both_off_passes_everything_in_order() {
        let mut engine = FilterEngine::new();
        engine.replace(sample());
        assert_eq!(engine.apply(), sample());
    }

    #[test]
    fn test_both_on_keeps_any_violation() {
        let mut engine = FilterEngine::new();
        engine.replace(sample());
        engine.set_toggles(FilterToggles::new(true, true));
        assert_eq!(
            temps(&engine.apply()),
            vec![(20.0, 50.0), (18.0, 70.0), (16.0, 65.0)]
        );
    }

    #[test]
    fn test_temperature_only_excludes_humidity_violations() {
        let mut engine = FilterEngine::new();
        engine.replace(sample());
        engine.toggle_temperature();
        assert_eq!(temps(&engine.apply()), vec![(20.0, 50.0)]);
    }

    #[test]
    fn test_humidity_only_excludes_temperature_violations() {
        let mut engine = FilterEngine::new();
        engine.replace(sample());
        engine.toggle_humidity();
        assert_eq!(temps(&engine.apply()), vec![(18.0, 70.0)]);
    }

    #[test]
    fn test_reason_alone_does_not_match_a_toggle() {
        let flagged = Measurement::new("2024-01-01T04:00:00Z", 18.0, 50.0)
            .with_reason("Sensor flagged");
        assert!(flagged.is_violation());

        let mut engine = FilterEngine::new();
        engine.replace(vec![flagged.clone()]);
        engine.set_toggles(FilterToggles::new(true, true));
        assert!(engine.apply().is_empty());

        engine.set_toggles(FilterToggles::default());
        assert_eq!(engine.apply(), vec![flagged]);
    }

    #[test]
    fn test_filtering_never_mutates_cache() {
        let mut engine = FilterEngine::new();
        engine.replace(sample());
        engine.set_toggles(FilterToggles::new(true, false));
        let _ = engine.apply();
        engine.set_toggles(FilterToggles::new(false, true));
        let _ = engine.apply();
        assert_eq!(engine.records(), sample().as_slice());
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterToggles::default().describe(), "todos");
        assert!(!FilterToggles::default().is_active());
        assert!(FilterToggles::new(false, true).is_active());
    }
}
