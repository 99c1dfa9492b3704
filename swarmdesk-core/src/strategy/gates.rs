//! Named gates and the confidence accumulator shared by every persona.

/// Ordered record of gate checks on one decision branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateTrail {
    gates: Vec<(&'static str, bool)>,
}

impl GateTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a gate and return its verdict so checks can be chained in `if`s.
    pub fn check(&mut self, name: &'static str, passed: bool) -> bool {
        self.gates.push((name, passed));
        passed
    }

    pub fn all_passed(&self) -> bool {
        self.gates.iter().all(|&(_, passed)| passed)
    }

    pub fn first_failure(&self) -> Option<&'static str> {
        self.gates
            .iter()
            .find(|&&(_, passed)| !passed)
            .map(|&(name, _)| name)
    }

    /// `[trend:ok rsi-band:ok fib-zone:no]`
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .gates
            .iter()
            .map(|(name, passed)| format!("{name}:{}", if *passed { "ok" } else { "no" }))
            .collect();
        format!("[{}]", parts.join(" "))
    }
}

/// Base score plus conditional bonuses. Saturates at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confidence(u32);

impl Confidence {
    pub fn base(score: u32) -> Self {
        Self(score.min(100))
    }

    #[must_use]
    pub fn bonus(self, condition: bool, points: u32) -> Self {
        if condition {
            Self((self.0 + points).min(100))
        } else {
            self
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Open interval check used by every RSI band gate.
pub(crate) fn within(value: f64, low: f64, high: f64) -> bool {
    value > low && value < high
}
