//! Ordered gate lists over a fixed number of lines, with per-line metadata.

use std::fmt::{Display, Formatter};

use crate::error::{Error, Result};
use crate::gate::{Control, Gate, Line};
use crate::print::{print_circuit, PrintSettings};

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Circuit {
    lines: usize,
    gates: Vec<Gate>,
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    constants: Vec<Option<bool>>,
    garbage: Vec<bool>,
}

impl Circuit {
    pub fn new(lines: usize) -> Self {
        let mut circuit = Circuit::default();
        circuit.resize_metadata(lines);
        circuit
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Change the number of lines, keeping metadata of the surviving lines.
    ///
    /// Fails if a gate uses a line that would be removed.
    pub fn set_lines(&mut self, lines: usize) -> Result<()> {
        if let Some(line) = self.gates.iter().flat_map(Gate::lines).find(|&l| l >= lines) {
            return Err(Error::LineOutOfRange { line, lines });
        }
        self.resize_metadata(lines);
        Ok(())
    }

    fn resize_metadata(&mut self, lines: usize) {
        self.inputs.truncate(lines);
        self.outputs.truncate(lines);
        for i in self.lines.min(lines)..lines {
            if self.inputs.len() == i {
                self.inputs.push(format!("i{}", i));
            }
            if self.outputs.len() == i {
                self.outputs.push(format!("o{}", i));
            }
        }
        self.constants.resize(lines, None);
        self.garbage.resize(lines, false);
        self.lines = lines;
    }

    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate(&self, index: usize) -> Option<&Gate> {
        self.gates.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gate> {
        self.gates.iter()
    }

    fn check_gate(&self, gate: &Gate) -> Result<()> {
        match gate.lines().find(|&l| l >= self.lines) {
            Some(line) => Err(Error::LineOutOfRange {
                line,
                lines: self.lines,
            }),
            None => Ok(()),
        }
    }

    pub fn append_gate(&mut self, gate: Gate) -> Result<()> {
        self.check_gate(&gate)?;
        self.gates.push(gate);
        Ok(())
    }

    pub fn prepend_gate(&mut self, gate: Gate) -> Result<()> {
        self.insert_gate(0, gate)
    }

    /// # Panics
    ///
    /// Panics if `index > num_gates()`.
    pub fn insert_gate(&mut self, index: usize, gate: Gate) -> Result<()> {
        self.check_gate(&gate)?;
        self.gates.insert(index, gate);
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if `index >= num_gates()`.
    pub fn remove_gate_at(&mut self, index: usize) -> Gate {
        self.gates.remove(index)
    }

    /// Appends a gate already known to fit, as produced by the transformations.
    pub(crate) fn push_gate(&mut self, gate: Gate) {
        debug_assert!(self.check_gate(&gate).is_ok(), "{} does not fit", gate);
        self.gates.push(gate);
    }

    pub fn append_not(&mut self, target: Line) -> Result<()> {
        self.append_gate(Gate::not(target))
    }

    pub fn append_cnot(&mut self, control: impl Into<Control>, target: Line) -> Result<()> {
        self.append_gate(Gate::cnot(control, target))
    }

    pub fn append_toffoli(
        &mut self,
        controls: impl IntoIterator<Item = Control>,
        target: Line,
    ) -> Result<()> {
        self.append_gate(Gate::toffoli(controls, target))
    }

    pub fn append_fredkin(
        &mut self,
        controls: impl IntoIterator<Item = Control>,
        t0: Line,
        t1: Line,
    ) -> Result<()> {
        self.append_gate(Gate::fredkin(controls, t0, t1))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual == self.lines {
            Ok(())
        } else {
            Err(Error::LineCountMismatch {
                expected: self.lines,
                actual,
            })
        }
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn set_inputs(&mut self, inputs: Vec<String>) -> Result<()> {
        self.check_len(inputs.len())?;
        self.inputs = inputs;
        Ok(())
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn set_outputs(&mut self, outputs: Vec<String>) -> Result<()> {
        self.check_len(outputs.len())?;
        self.outputs = outputs;
        Ok(())
    }

    /// Constant input value per line, `None` for primary inputs.
    pub fn constants(&self) -> &[Option<bool>] {
        &self.constants
    }

    pub fn set_constants(&mut self, constants: Vec<Option<bool>>) -> Result<()> {
        self.check_len(constants.len())?;
        self.constants = constants;
        Ok(())
    }

    /// Whether the output of each line is garbage.
    pub fn garbage(&self) -> &[bool] {
        &self.garbage
    }

    pub fn set_garbage(&mut self, garbage: Vec<bool>) -> Result<()> {
        self.check_len(garbage.len())?;
        self.garbage = garbage;
        Ok(())
    }

    /// Same lines and metadata, no gates.
    pub fn empty_like(&self) -> Circuit {
        Circuit {
            lines: self.lines,
            gates: Vec::new(),
            name: self.name.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            constants: self.constants.clone(),
            garbage: self.garbage.clone(),
        }
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Gate;
    type IntoIter = std::slice::Iter<'a, Gate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Display for Circuit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&print_circuit(self, &PrintSettings::default()))
    }
}
