//! Embedding of irreversible PLA specifications into reversible functions.
//!
//! The specification is a list of already parsed `(input cube, output cube)`
//! pairs that must describe a total, single-valued function. The embedding
//! adds constant input lines and garbage output lines until the function is
//! a bijection, and stores its characteristic function in an [`Rcbdd`].

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::budget::Budget;
use crate::error::{Error, Result};
use crate::manager::DecisionDiagram;
use crate::permutation::MAX_EXPLICIT_LINES;
use crate::rcbdd::{Rcbdd, VariableOrder};
use crate::reference::Ref;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CubeValue {
    Zero,
    One,
    DontCare,
}

impl CubeValue {
    pub fn matches(self, bit: bool) -> bool {
        match self {
            CubeValue::Zero => !bit,
            CubeValue::One => bit,
            CubeValue::DontCare => true,
        }
    }
}

impl TryFrom<char> for CubeValue {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        match c {
            '0' => Ok(CubeValue::Zero),
            '1' => Ok(CubeValue::One),
            '-' => Ok(CubeValue::DontCare),
            _ => Err(Error::InvalidCube(format!("unexpected input character {:?}", c))),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlaCube {
    pub inputs: Vec<CubeValue>,
    pub outputs: Vec<bool>,
}

impl PlaCube {
    /// Parse cube text such as `("1-0", "10")`.
    ///
    /// Outputs `1` are set; `0`, `-` and `~` are all read as unset.
    pub fn parse(inputs: &str, outputs: &str) -> Result<Self> {
        let inputs = inputs
            .chars()
            .map(CubeValue::try_from)
            .collect::<Result<Vec<_>>>()?;
        let outputs = outputs
            .chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' | '-' | '~' => Ok(false),
                _ => Err(Error::InvalidCube(format!(
                    "unexpected output character {:?}",
                    c
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { inputs, outputs })
    }

    /// Whether the cube contains `pattern` (bit `k` for input `k`).
    pub fn matches(&self, pattern: u64) -> bool {
        self.inputs
            .iter()
            .enumerate()
            .all(|(k, v)| v.matches((pattern >> k) & 1 == 1))
    }

    /// Outputs packed into an integer, bit `j` for output `j`.
    pub fn output_pattern(&self) -> u64 {
        self.outputs
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .fold(0, |acc, (j, _)| acc | (1 << j))
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PlaSpecification {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub input_labels: Vec<String>,
    pub output_labels: Vec<String>,
    pub cubes: Vec<PlaCube>,
}

impl PlaSpecification {
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            num_inputs,
            num_outputs,
            ..Self::default()
        }
    }

    pub fn with_labels(mut self, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        self.input_labels = inputs;
        self.output_labels = outputs;
        self
    }

    pub fn add_cube(&mut self, inputs: &str, outputs: &str) -> Result<()> {
        let cube = PlaCube::parse(inputs, outputs)?;
        self.check_cube(&cube)?;
        self.cubes.push(cube);
        Ok(())
    }

    fn check_cube(&self, cube: &PlaCube) -> Result<()> {
        for (expected, actual) in [
            (self.num_inputs, cube.inputs.len()),
            (self.num_outputs, cube.outputs.len()),
        ] {
            if expected != actual {
                return Err(Error::CubeWidthMismatch { expected, actual });
            }
        }
        Ok(())
    }

    /// Output pattern of the first cube containing `pattern`.
    pub fn evaluate(&self, pattern: u64) -> Option<u64> {
        self.cubes
            .iter()
            .find(|cube| cube.matches(pattern))
            .map(PlaCube::output_pattern)
    }

    fn labels_or_default(labels: &[String], count: usize, prefix: &str) -> Vec<String> {
        if labels.len() == count {
            labels.to_vec()
        } else {
            (0..count).map(|k| format!("{}{}", prefix, k)).collect()
        }
    }

    pub fn input_labels_or_default(&self) -> Vec<String> {
        Self::labels_or_default(&self.input_labels, self.num_inputs, "i")
    }

    pub fn output_labels_or_default(&self) -> Vec<String> {
        Self::labels_or_default(&self.output_labels, self.num_outputs, "o")
    }
}

/// Input cube as a function of `vars` (input `k` is `vars[k]`).
fn cube_function<M: DecisionDiagram>(manager: &M, vars: &[M::Node], cube: &PlaCube) -> M::Node {
    manager.cube(
        cube.inputs
            .iter()
            .zip(vars)
            .filter_map(|(&value, &var)| match value {
                CubeValue::Zero => Some((var, false)),
                CubeValue::One => Some((var, true)),
                CubeValue::DontCare => None,
            }),
    )
}

/// The cubes of `spec` as BDDs in a scratch manager.
struct CubeFunctions {
    manager: Bdd,
    vars: Vec<Ref>,
    cubes: Vec<Ref>,
}

impl CubeFunctions {
    fn new(spec: &PlaSpecification) -> Result<Self> {
        for cube in &spec.cubes {
            spec.check_cube(cube)?;
        }
        let manager = Bdd::default();
        let vars: Vec<_> = (0..spec.num_inputs).map(|_| manager.new_var()).collect();
        let cubes = spec
            .cubes
            .iter()
            .map(|cube| cube_function(&manager, &vars, cube))
            .collect();
        Ok(Self {
            manager,
            vars,
            cubes,
        })
    }
}

/// Fails with `NotTotal` if some input pattern is not covered, or with
/// `NotSingleValued` if overlapping cubes disagree on an output.
pub fn check_total_and_single_valued(spec: &PlaSpecification) -> Result<()> {
    let CubeFunctions {
        manager,
        vars,
        cubes,
    } = CubeFunctions::new(spec)?;

    let covered = manager.or_many(cubes.iter().copied());
    if !manager.is_one(covered) {
        let uncovered = manager.sat_count(manager.not(covered), spec.num_inputs);
        return Err(Error::NotTotal { uncovered });
    }

    for j in 0..spec.num_outputs {
        let on = manager.or_many(
            spec.cubes
                .iter()
                .zip(&cubes)
                .filter(|(cube, _)| cube.outputs[j])
                .map(|(_, &f)| f),
        );
        let off = manager.or_many(
            spec.cubes
                .iter()
                .zip(&cubes)
                .filter(|(cube, _)| !cube.outputs[j])
                .map(|(_, &f)| f),
        );
        let conflict = manager.and(on, off);
        if let Some(pattern) = manager.pick_one_minterm(conflict, &vars) {
            let input = (0..spec.num_inputs)
                .map(|k| if (pattern >> k) & 1 == 1 { '1' } else { '0' })
                .collect();
            return Err(Error::NotSingleValued { input });
        }
    }
    Ok(())
}

/// Number of input patterns mapped to each output value.
pub fn output_multiplicities(spec: &PlaSpecification) -> Result<BTreeMap<Vec<bool>, BigUint>> {
    let CubeFunctions { manager, cubes, .. } = CubeFunctions::new(spec)?;

    let mut preimages: BTreeMap<Vec<bool>, _> = BTreeMap::new();
    for (cube, &f) in spec.cubes.iter().zip(&cubes) {
        let preimage = preimages.entry(cube.outputs.clone()).or_insert(manager.zero());
        *preimage = manager.or(*preimage, f);
    }
    Ok(preimages
        .into_iter()
        .map(|(output, f)| (output, manager.sat_count(f, spec.num_inputs)))
        .collect())
}

/// Largest number of inputs sharing one output value (at least 1).
pub fn max_output_multiplicity(spec: &PlaSpecification) -> Result<BigUint> {
    Ok(output_multiplicities(spec)?
        .into_values()
        .max()
        .unwrap_or_default()
        .max(BigUint::from(1u32)))
}

/// `max(n, m + ceil(log2(max_mu)))`: enough lines to tell apart inputs with equal outputs.
pub fn calculate_required_lines(n: usize, m: usize, max_mu: &BigUint) -> usize {
    let one = BigUint::from(1u32);
    let extra = if *max_mu <= one {
        0
    } else {
        (max_mu - one).bits() as usize
    };
    n.max(m + extra)
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum EmbeddingStrategy {
    /// `y = (x_c ⊕ f(x) ⊕ c, x)`, symbolic, `n` garbage lines.
    #[default]
    Bennett,
    /// Explicit bijection with the least number of garbage lines.
    MinimalGarbage,
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddingSettings {
    pub strategy: EmbeddingStrategy,
    /// Value carried by the constant input lines.
    pub constant_value: bool,
    pub variable_order: VariableOrder,
    /// Render the truth table of the embedding into the statistics.
    pub truth_table: bool,
    /// Dump the embedding as PLA to this path.
    pub write_pla: Option<PathBuf>,
    pub budget: Budget,
}

#[derive(Debug, Clone)]
pub struct EmbeddingStatistics {
    pub runtime: Duration,
    pub lines: usize,
    pub constant_lines: usize,
    pub garbage_lines: usize,
    pub max_multiplicity: BigUint,
    pub truth_table: Option<String>,
}

pub trait PlaEmbedding {
    /// Number of lines of the reversible function.
    fn required_lines(&self, spec: &PlaSpecification, max_multiplicity: &BigUint) -> Result<usize>;

    /// χ of the embedding; variables for `required_lines` lines exist already.
    fn build_chi<M: DecisionDiagram>(
        &self,
        cf: &Rcbdd<M>,
        spec: &PlaSpecification,
        constant_value: bool,
        budget: &Budget,
    ) -> Result<M::Node>;
}

#[derive(Debug, Copy, Clone, Default)]
pub struct BennettEmbedding;

impl PlaEmbedding for BennettEmbedding {
    fn required_lines(&self, spec: &PlaSpecification, _: &BigUint) -> Result<usize> {
        Ok(spec.num_inputs + spec.num_outputs)
    }

    fn build_chi<M: DecisionDiagram>(
        &self,
        cf: &Rcbdd<M>,
        spec: &PlaSpecification,
        constant_value: bool,
        budget: &Budget,
    ) -> Result<M::Node> {
        let manager = cf.manager()?;
        let m = spec.num_outputs;
        let inputs = &cf.xs()[m..];

        let cubes: Vec<M::Node> = spec
            .cubes
            .iter()
            .map(|cube| cube_function(manager, inputs, cube))
            .collect();

        let mut chi = manager.and_many(
            (m..cf.num_vars()).map(|line| manager.xnor(cf.y(line), cf.x(line))),
        );
        for j in 0..m {
            let f = manager.or_many(
                spec.cubes
                    .iter()
                    .zip(&cubes)
                    .filter(|(cube, _)| cube.outputs[j])
                    .map(|(_, &f)| f),
            );
            let value = manager.xor(manager.xor(cf.x(j), f), manager.constant(constant_value));
            chi = manager.and(chi, manager.xnor(cf.y(j), value));
            let nodes = if budget.node_limit.is_some() {
                manager.size(chi)
            } else {
                0
            };
            budget.check(nodes).inspect_err(|err| {
                warn!("bennett embedding: stopped after output {} of {}: {}", j + 1, m, err)
            })?;
        }
        Ok(chi)
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct MinimalGarbageEmbedding;

impl MinimalGarbageEmbedding {
    /// The bijection: input `(c, x)` maps to `(f(x), k)` where `x` is the
    /// `k`-th input with output `f(x)`; remaining inputs fill the unused outputs in order.
    fn permutation(
        &self,
        spec: &PlaSpecification,
        lines: usize,
        constant_value: bool,
    ) -> Result<Vec<u64>> {
        let (n, m) = (spec.num_inputs, spec.num_outputs);
        let constants = lines - n;
        let constant_mask = if constant_value {
            (1u64 << constants) - 1
        } else {
            0
        };

        let size = 1usize << lines;
        let mut perm: Vec<Option<u64>> = vec![None; size];
        let mut used = vec![false; size];
        let mut counters: HashMap<u64, u64> = HashMap::new();

        for x in 0..1u64 << n {
            let output = spec.evaluate(x).ok_or(Error::NotTotal {
                uncovered: BigUint::from(1u32),
            })?;
            let counter = counters.entry(output).or_insert(0);
            let image = output | (*counter << m);
            *counter += 1;
            perm[(constant_mask | (x << constants)) as usize] = Some(image);
            used[image as usize] = true;
        }

        let mut free = used.iter().enumerate().filter(|(_, &u)| !u).map(|(v, _)| v as u64);
        perm.into_iter()
            .map(|image| {
                image.or_else(|| free.next()).ok_or_else(|| {
                    Error::NotAPermutation("ran out of unused output patterns".to_string())
                })
            })
            .collect()
    }
}

impl PlaEmbedding for MinimalGarbageEmbedding {
    fn required_lines(&self, spec: &PlaSpecification, max_multiplicity: &BigUint) -> Result<usize> {
        let lines = calculate_required_lines(spec.num_inputs, spec.num_outputs, max_multiplicity);
        if lines > MAX_EXPLICIT_LINES {
            return Err(Error::TooManyLines {
                lines,
                max: MAX_EXPLICIT_LINES,
            });
        }
        Ok(lines)
    }

    fn build_chi<M: DecisionDiagram>(
        &self,
        cf: &Rcbdd<M>,
        spec: &PlaSpecification,
        constant_value: bool,
        budget: &Budget,
    ) -> Result<M::Node> {
        let perm = self.permutation(spec, cf.num_vars(), constant_value)?;
        budget.check(0).inspect_err(|err| {
            warn!("minimal garbage embedding: stopped before building χ: {}", err)
        })?;
        let chi = cf.create_from_permutation(&perm)?;
        let nodes = if budget.node_limit.is_some() {
            cf.manager()?.size(chi)
        } else {
            0
        };
        budget.check(nodes).inspect_err(|err| {
            warn!("minimal garbage embedding: χ too large: {}", err)
        })?;
        Ok(chi)
    }
}

/// Embed `spec` into `cf` with the strategy chosen in `settings`.
///
/// `cf` must not have variables yet; its manager is created if needed.
/// If building χ fails, `cf` is left without variables and can be embedded into again.
pub fn embed_pla<M: DecisionDiagram>(
    cf: &mut Rcbdd<M>,
    spec: &PlaSpecification,
    settings: &EmbeddingSettings,
) -> Result<EmbeddingStatistics> {
    match settings.strategy {
        EmbeddingStrategy::Bennett => embed_pla_with(&BennettEmbedding, cf, spec, settings),
        EmbeddingStrategy::MinimalGarbage => {
            embed_pla_with(&MinimalGarbageEmbedding, cf, spec, settings)
        }
    }
}

fn stage_embedding<E: PlaEmbedding, M: DecisionDiagram>(
    embedding: &E,
    cf: &mut Rcbdd<M>,
    spec: &PlaSpecification,
    settings: &EmbeddingSettings,
    lines: usize,
) -> Result<()> {
    cf.create_variables(lines, settings.variable_order)?;
    cf.set_num_inputs(spec.num_inputs);
    cf.set_num_outputs(spec.num_outputs);
    cf.set_constant_value(settings.constant_value);
    cf.set_input_labels(spec.input_labels_or_default());
    cf.set_output_labels(spec.output_labels_or_default());

    let chi = embedding.build_chi(cf, spec, settings.constant_value, &settings.budget)?;
    cf.set_chi(chi);
    Ok(())
}

pub fn embed_pla_with<E: PlaEmbedding, M: DecisionDiagram>(
    embedding: &E,
    cf: &mut Rcbdd<M>,
    spec: &PlaSpecification,
    settings: &EmbeddingSettings,
) -> Result<EmbeddingStatistics> {
    let start = Instant::now();

    check_total_and_single_valued(spec)?;
    let max_multiplicity = max_output_multiplicity(spec)?;
    let lines = embedding.required_lines(spec, &max_multiplicity)?;
    debug!(
        "embedding {} inputs, {} outputs into {} lines (max multiplicity {})",
        spec.num_inputs, spec.num_outputs, lines, max_multiplicity
    );

    if let Some(existing) = cf.created_lines() {
        return Err(Error::VariablesAlreadyCreated(existing));
    }

    // Build into a fresh instance sharing the manager; `cf` only changes on success.
    cf.initialize_manager();
    let manager = cf.take_manager().ok_or(Error::ManagerNotInitialized)?;
    let mut staged = Rcbdd::with_manager(manager);
    if let Err(err) = stage_embedding(embedding, &mut staged, spec, settings, lines) {
        if let Some(manager) = staged.take_manager() {
            *cf = Rcbdd::with_manager(manager);
        }
        return Err(err);
    }
    *cf = staged;
    let chi = cf.chi().ok_or(Error::VariablesNotCreated)?;

    let truth_table = if settings.truth_table {
        Some(cf.truth_table(chi)?)
    } else {
        None
    };
    if let Some(path) = &settings.write_pla {
        cf.write_pla(chi, path, false)?;
    }

    let statistics = EmbeddingStatistics {
        runtime: start.elapsed(),
        lines,
        constant_lines: cf.num_constants(),
        garbage_lines: cf.num_garbage(),
        max_multiplicity,
        truth_table,
    };
    info!(
        "Embedded into {} lines ({} constant, {} garbage) in {:?}",
        statistics.lines, statistics.constant_lines, statistics.garbage_lines, statistics.runtime
    );
    Ok(statistics)
}
