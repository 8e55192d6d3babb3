//! Text rendering of circuits, one row per line.

use crate::circuit::Circuit;
use crate::gate::Gate;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PrintSettings {
    /// Number of line characters between consecutive gates.
    pub gate_spacing: usize,
    /// Number of empty rows after each line.
    pub line_spacing: usize,
    pub print_gate_index: bool,
    pub print_inputs_and_outputs: bool,
    pub line_char: char,
    pub control_char: char,
    pub negative_control_char: char,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            gate_spacing: 1,
            line_spacing: 0,
            print_gate_index: false,
            print_inputs_and_outputs: false,
            line_char: '―',
            control_char: '●',
            negative_control_char: '○',
        }
    }
}

impl PrintSettings {
    pub fn target_char(&self, gate: &Gate) -> char {
        match gate {
            Gate::Toffoli { .. } => '⊕',
            Gate::Fredkin { .. } => '⨯',
        }
    }
}

/// Render `circuit` as text. Circuits without gates or lines render as an empty string.
pub fn print_circuit(circuit: &Circuit, settings: &PrintSettings) -> String {
    let mut out = String::new();
    if circuit.num_gates() == 0 || circuit.lines() == 0 {
        return out;
    }

    let input_width = if settings.print_inputs_and_outputs {
        circuit
            .inputs()
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0)
    } else {
        0
    };

    // (gate index, glyph) for each line
    let mut line_chars: Vec<Vec<(usize, char)>> = vec![Vec::new(); circuit.lines()];
    for (index, gate) in circuit.iter().enumerate() {
        for c in gate.controls() {
            let glyph = if c.polarity() {
                settings.control_char
            } else {
                settings.negative_control_char
            };
            line_chars[c.line()].push((index, glyph));
        }
        for &t in gate.targets() {
            line_chars[t].push((index, settings.target_char(gate)));
        }
    }

    if settings.print_gate_index {
        if settings.print_inputs_and_outputs {
            out.extend(std::iter::repeat_n(' ', input_width + 1));
        }
        for index in 0..circuit.num_gates() {
            out.extend(std::iter::repeat_n(' ', settings.gate_spacing));
            out.push_str(&(index % 10).to_string());
        }
        out.push('\n');
    }

    let slot = settings.gate_spacing + 1;
    for (line, chars) in line_chars.iter().enumerate() {
        if settings.print_inputs_and_outputs {
            let input = &circuit.inputs()[line];
            out.extend(std::iter::repeat_n(' ', input_width - input.chars().count()));
            out.push_str(input);
            out.push(' ');
        }

        let mut pos = 0;
        for &(index, glyph) in chars {
            out.extend(std::iter::repeat_n(
                settings.line_char,
                (index - pos) * slot + settings.gate_spacing,
            ));
            out.push(glyph);
            pos = index + 1;
        }
        out.extend(std::iter::repeat_n(
            settings.line_char,
            (circuit.num_gates() - pos) * slot + settings.gate_spacing,
        ));

        if settings.print_inputs_and_outputs {
            out.push(' ');
            out.push_str(&circuit.outputs()[line]);
        }
        out.push('\n');
        out.extend(std::iter::repeat_n('\n', settings.line_spacing));
    }

    out
}
