//! Structural circuit transformations.

use log::debug;

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::gate::{Control, Gate, Line};

/// Same gates in reverse order, realizing the inverse function.
pub fn reverse_circuit(circuit: &Circuit) -> Circuit {
    let mut result = circuit.empty_like();
    for gate in circuit.iter().rev() {
        result.push_gate(gate.clone());
    }
    result
}

fn check_fits(dest: &Circuit, src: &Circuit) -> Result<()> {
    if src.lines() > dest.lines() {
        return Err(Error::LineCountMismatch {
            expected: dest.lines(),
            actual: src.lines(),
        });
    }
    Ok(())
}

/// Append the gates of `src` to `dest`. `src` may not use more lines than `dest`.
pub fn append_circuit(dest: &mut Circuit, src: &Circuit) -> Result<()> {
    check_fits(dest, src)?;
    for gate in src {
        dest.push_gate(gate.clone());
    }
    Ok(())
}

/// Insert the gates of `src` in front of `dest`, keeping their order.
pub fn prepend_circuit(dest: &mut Circuit, src: &Circuit) -> Result<()> {
    check_fits(dest, src)?;
    for (i, gate) in src.iter().enumerate() {
        dest.insert_gate(i, gate.clone())?;
    }
    Ok(())
}

/// `first` followed by `second`; both must have the same number of lines.
pub fn concat(first: &Circuit, second: &Circuit) -> Result<Circuit> {
    if first.lines() != second.lines() {
        return Err(Error::LineCountMismatch {
            expected: first.lines(),
            actual: second.lines(),
        });
    }
    let mut result = first.clone();
    append_circuit(&mut result, second)?;
    Ok(result)
}

/// Copy of `circuit`, optionally restricted to the lines in `filter`.
///
/// Retained lines are renumbered in filter order, each may be listed once. Gates
/// whose targets are all excluded are dropped. A retained gate that touches an
/// excluded line is an error.
pub fn copy_circuit(circuit: &Circuit, filter: Option<&[Line]>) -> Result<Circuit> {
    let Some(filter) = filter else {
        return Ok(circuit.clone());
    };

    let mut mapping: Vec<Option<Line>> = vec![None; circuit.lines()];
    for (new, &old) in filter.iter().enumerate() {
        match mapping.get_mut(old) {
            Some(Some(_)) => return Err(Error::DuplicateFilterLine(old)),
            Some(slot) => *slot = Some(new),
            None => {
                return Err(Error::LineOutOfRange {
                    line: old,
                    lines: circuit.lines(),
                })
            }
        }
    }

    let mut result = Circuit::new(filter.len());
    result.set_name(circuit.name());
    let pick = |values: &[String]| -> Vec<String> {
        filter.iter().map(|&l| values[l].clone()).collect()
    };
    result.set_inputs(pick(circuit.inputs()))?;
    result.set_outputs(pick(circuit.outputs()))?;
    result.set_constants(filter.iter().map(|&l| circuit.constants()[l]).collect())?;
    result.set_garbage(filter.iter().map(|&l| circuit.garbage()[l]).collect())?;

    for (index, gate) in circuit.iter().enumerate() {
        if gate.targets().iter().all(|&t| mapping[t].is_none()) {
            debug!("copy_circuit: dropping {} (#{})", gate, index);
            continue;
        }
        if let Some(line) = gate.lines().find(|&l| mapping[l].is_none()) {
            return Err(Error::LineFilterMismatch { gate: index, line });
        }
        result.push_gate(gate.map_lines(|l| mapping[l].unwrap_or(l)));
    }
    Ok(result)
}

/// Replace every negative control by a positive one framed with NOT gates.
pub fn negative_controls_to_positive(circuit: &Circuit) -> Circuit {
    let mut result = circuit.empty_like();
    for gate in circuit {
        let negative: Vec<Line> = gate
            .controls()
            .iter()
            .filter(|c| c.is_negative())
            .map(|c| c.line())
            .collect();
        for &l in &negative {
            result.push_gate(Gate::not(l));
        }
        result.push_gate(gate.with_positive_controls());
        for &l in &negative {
            result.push_gate(Gate::not(l));
        }
    }
    result
}

/// Replace every Fredkin gate by three Toffoli gates.
///
/// ```text
/// FREDKIN(C; t0, t1) = CNOT(t1; t0) TOFFOLI(C, t0; t1) CNOT(t1; t0)
/// ```
pub fn fredkin_gates_to_toffoli(circuit: &Circuit) -> Circuit {
    let mut result = circuit.empty_like();
    for gate in circuit {
        match gate {
            Gate::Fredkin { controls, targets } => {
                let [t0, t1] = *targets;
                let mut inner = controls.clone();
                inner.push(Control::positive(t0));
                result.push_gate(Gate::cnot(t1, t0));
                result.push_gate(Gate::toffoli(inner, t1));
                result.push_gate(Gate::cnot(t1, t0));
            }
            Gate::Toffoli { .. } => result.push_gate(gate.clone()),
        }
    }
    result
}
