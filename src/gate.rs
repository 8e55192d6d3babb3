//! Reversible gates over numbered lines.

use std::fmt::{Display, Formatter};

/// Index of a circuit line.
pub type Line = usize;

/// A control line together with the value it must carry for the gate to fire.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Control {
    line: Line,
    polarity: bool,
}

impl Control {
    pub const fn new(line: Line, polarity: bool) -> Self {
        Self { line, polarity }
    }

    pub const fn positive(line: Line) -> Self {
        Self::new(line, true)
    }

    pub const fn negative(line: Line) -> Self {
        Self::new(line, false)
    }

    pub const fn line(&self) -> Line {
        self.line
    }

    pub const fn polarity(&self) -> bool {
        self.polarity
    }

    pub const fn is_negative(&self) -> bool {
        !self.polarity
    }

    /// Fires when `pattern` (bit `i` for line `i`) carries the required value.
    pub const fn is_satisfied(&self, pattern: u64) -> bool {
        ((pattern >> self.line) & 1 == 1) == self.polarity
    }
}

impl From<Line> for Control {
    fn from(line: Line) -> Self {
        Self::positive(line)
    }
}

/// Coarse classification of a gate, as used for printing and statistics.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum GateKind {
    Not,
    Cnot,
    Toffoli,
    Fredkin,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Gate {
    /// Inverts `target` when all controls are satisfied.
    Toffoli { controls: Vec<Control>, target: Line },
    /// Swaps both targets when all controls are satisfied.
    Fredkin {
        controls: Vec<Control>,
        targets: [Line; 2],
    },
}

impl Gate {
    /// # Panics
    ///
    /// Panics if a control line is repeated or equals the target.
    pub fn toffoli(controls: impl IntoIterator<Item = Control>, target: Line) -> Self {
        let gate = Gate::Toffoli {
            controls: controls.into_iter().collect(),
            target,
        };
        gate.assert_well_formed();
        gate
    }

    /// # Panics
    ///
    /// Panics if the targets coincide, or a control line is repeated or equals a target.
    pub fn fredkin(controls: impl IntoIterator<Item = Control>, t0: Line, t1: Line) -> Self {
        let gate = Gate::Fredkin {
            controls: controls.into_iter().collect(),
            targets: [t0, t1],
        };
        gate.assert_well_formed();
        gate
    }

    pub fn not(target: Line) -> Self {
        Self::toffoli([], target)
    }

    pub fn cnot(control: impl Into<Control>, target: Line) -> Self {
        Self::toffoli([control.into()], target)
    }

    fn assert_well_formed(&self) {
        let targets = self.targets();
        assert!(
            targets.len() < 2 || targets[0] != targets[1],
            "Fredkin targets must differ: {:?}",
            targets
        );
        let controls = self.controls();
        for (i, c) in controls.iter().enumerate() {
            assert!(
                !targets.contains(&c.line),
                "Control line {} is also a target of {:?}",
                c.line,
                self
            );
            assert!(
                controls[..i].iter().all(|d| d.line != c.line),
                "Control line {} is repeated in {:?}",
                c.line,
                self
            );
        }
    }

    pub fn controls(&self) -> &[Control] {
        match self {
            Gate::Toffoli { controls, .. } | Gate::Fredkin { controls, .. } => controls,
        }
    }

    pub fn targets(&self) -> &[Line] {
        match self {
            Gate::Toffoli { target, .. } => std::slice::from_ref(target),
            Gate::Fredkin { targets, .. } => targets,
        }
    }

    /// Control lines followed by target lines.
    pub fn lines(&self) -> impl Iterator<Item = Line> + '_ {
        self.controls()
            .iter()
            .map(|c| c.line)
            .chain(self.targets().iter().copied())
    }

    pub fn max_line(&self) -> Line {
        self.lines().max().unwrap_or(0)
    }

    pub fn kind(&self) -> GateKind {
        match self {
            Gate::Toffoli { controls, .. } => match controls.len() {
                0 => GateKind::Not,
                1 => GateKind::Cnot,
                _ => GateKind::Toffoli,
            },
            Gate::Fredkin { .. } => GateKind::Fredkin,
        }
    }

    pub fn is_toffoli(&self) -> bool {
        matches!(self, Gate::Toffoli { .. })
    }

    pub fn is_fredkin(&self) -> bool {
        matches!(self, Gate::Fredkin { .. })
    }

    pub fn has_negative_controls(&self) -> bool {
        self.controls().iter().any(|c| c.is_negative())
    }

    /// All controls are satisfied by `pattern`.
    pub fn is_active(&self, pattern: u64) -> bool {
        self.controls().iter().all(|c| c.is_satisfied(pattern))
    }

    /// Same gate with every line renamed by `f`.
    pub fn map_lines(&self, mut f: impl FnMut(Line) -> Line) -> Gate {
        let controls = self
            .controls()
            .iter()
            .map(|c| Control::new(f(c.line), c.polarity));
        match self {
            Gate::Toffoli { target, .. } => {
                let controls: Vec<Control> = controls.collect();
                Gate::toffoli(controls, f(*target))
            }
            Gate::Fredkin { targets, .. } => {
                let controls: Vec<Control> = controls.collect();
                Gate::fredkin(controls, f(targets[0]), f(targets[1]))
            }
        }
    }

    /// Same gate with every control made positive.
    pub fn with_positive_controls(&self) -> Gate {
        let controls = self.controls().iter().map(|c| Control::positive(c.line));
        match self {
            Gate::Toffoli { target, .. } => Gate::toffoli(controls, *target),
            Gate::Fredkin { targets, .. } => Gate::fredkin(controls, targets[0], targets[1]),
        }
    }
}

impl Display for Gate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self.kind() {
            GateKind::Not => "NOT",
            GateKind::Cnot => "CNOT",
            GateKind::Toffoli => "TOFFOLI",
            GateKind::Fredkin => "FREDKIN",
        };
        write!(f, "{}(", name)?;
        for (i, c) in self.controls().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}{}", if c.polarity { "" } else { "-" }, c.line)?;
        }
        write!(f, "; ")?;
        for (i, t) in self.targets().iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(Gate::not(0).kind(), GateKind::Not);
        assert_eq!(Gate::cnot(1, 0).kind(), GateKind::Cnot);
        assert_eq!(
            Gate::toffoli([Control::positive(1), Control::negative(2)], 0).kind(),
            GateKind::Toffoli
        );
        assert_eq!(Gate::fredkin([], 0, 1).kind(), GateKind::Fredkin);
    }

    #[test]
    fn test_lines() {
        let g = Gate::fredkin([Control::negative(3)], 0, 2);
        assert_eq!(g.lines().collect::<Vec<_>>(), vec![3, 0, 2]);
        assert_eq!(g.max_line(), 3);
        assert!(g.has_negative_controls());
        assert!(!g.with_positive_controls().has_negative_controls());
    }

    #[test]
    fn test_is_active() {
        let g = Gate::toffoli([Control::positive(0), Control::negative(1)], 2);
        assert!(g.is_active(0b001));
        assert!(!g.is_active(0b011));
        assert!(!g.is_active(0b000));
    }

    #[test]
    fn test_map_lines() {
        let g = Gate::toffoli([Control::negative(2)], 4);
        let h = g.map_lines(|l| l / 2);
        assert_eq!(h, Gate::toffoli([Control::negative(1)], 2));
    }

    #[test]
    fn test_display() {
        let g = Gate::toffoli([Control::negative(0), Control::positive(2)], 1);
        assert_eq!(g.to_string(), "TOFFOLI(-0,2; 1)");
        assert_eq!(Gate::fredkin([], 1, 2).to_string(), "FREDKIN(; 1,2)");
    }

    #[test]
    #[should_panic]
    fn test_control_on_target() {
        Gate::cnot(1, 1);
    }

    #[test]
    #[should_panic]
    fn test_repeated_control() {
        Gate::toffoli([Control::positive(1), Control::negative(1)], 0);
    }

    #[test]
    #[should_panic]
    fn test_equal_fredkin_targets() {
        Gate::fredkin([], 2, 2);
    }
}
