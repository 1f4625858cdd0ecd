//! Deterministic test-matrix synthesis
//!
//! Reproducible pseudo-random matrices for regression diffing: the seed
//! determines both the non-zero cell positions and the cell values, so two
//! calls with the same spec yield bit-identical payloads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::matrix::{MatrixPayload, MatrixSpec};

/// Seed for the transition matrix `G` (matches the recorded regression inputs)
pub const SEED_G: u64 = 234;
/// Seed for the initial rank vector `p`
pub const SEED_P: u64 = 71;
/// Seed for the teleportation vector `e`
pub const SEED_E: u64 = 72;
/// Seed for the dangling-mass row vector `u`
pub const SEED_U: u64 = 73;

/// Synthesize a matrix from its spec
///
/// Cells are visited in row-major order. For `density < 1` each cell first
/// draws a keep/skip gate from the seeded stream, then kept cells draw a
/// value uniformly from `[min_value, max_value]`; dense specs skip the gate
/// draw entirely. Zero-valued draws are stored explicitly so the payload is
/// a faithful record of the generator output.
///
/// # Errors
///
/// Returns `HarnessError::InvalidSpec` for malformed specs (zero dimension,
/// density outside `[0, 1]`, inverted value range).
///
/// # Examples
///
/// ```
/// use cotejar::matrix::MatrixSpec;
/// use cotejar::synth::generate;
///
/// let spec = MatrixSpec {
///     rows: 8,
///     cols: 8,
///     min_value: 0.0,
///     max_value: 1.0,
///     density: 0.5,
///     seed: 42,
/// };
/// let a = generate(&spec).unwrap();
/// let b = generate(&spec).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn generate(spec: &MatrixSpec) -> Result<MatrixPayload> {
    spec.validate()?;
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let dense = spec.density >= 1.0;
    let mut payload = MatrixPayload::new(spec.rows, spec.cols);
    for row in 0..spec.rows {
        for col in 0..spec.cols {
            if !dense && rng.gen::<f64>() >= spec.density {
                continue;
            }
            let value = rng.gen_range(spec.min_value..=spec.max_value);
            payload.set(row, col, value)?;
        }
    }
    Ok(payload)
}

/// The four named inputs of the fixed power-iteration program
///
/// `G` is the link matrix, `p` the rank column vector, `e` the teleportation
/// column vector, `u` the dangling-mass row vector.
#[derive(Debug, Clone)]
pub struct PageRankInputs {
    /// Link matrix, `rows x cols`
    pub g: MatrixPayload,
    /// Rank vector, `cols x 1`
    pub p: MatrixPayload,
    /// Teleportation vector, `rows x 1`
    pub e: MatrixPayload,
    /// Dangling-mass row vector, `1 x cols`
    pub u: MatrixPayload,
}

impl PageRankInputs {
    /// Synthesize the canonical input set
    ///
    /// `G` carries unit-valued links at the given density; the three vectors
    /// are dense with values in `[0, 1e-14]`, the scale at which the
    /// recorded regression baselines were produced.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidSpec` when the geometry or density is
    /// malformed.
    pub fn synthesize(rows: usize, cols: usize, density: f64) -> Result<Self> {
        let g = generate(&MatrixSpec {
            rows,
            cols,
            min_value: 1.0,
            max_value: 1.0,
            density,
            seed: SEED_G,
        })?;
        let p = generate(&vector_spec(cols, 1, SEED_P))?;
        let e = generate(&vector_spec(rows, 1, SEED_E))?;
        let u = generate(&vector_spec(1, cols, SEED_U))?;
        Ok(Self { g, p, e, u })
    }

    /// The inputs as `(name, matrix)` pairs, in persistence order
    #[must_use]
    pub fn named(&self) -> [(&'static str, &MatrixPayload); 4] {
        [("G", &self.g), ("p", &self.p), ("e", &self.e), ("u", &self.u)]
    }
}

fn vector_spec(rows: usize, cols: usize, seed: u64) -> MatrixSpec {
    MatrixSpec {
        rows,
        cols,
        min_value: 0.0,
        max_value: 1e-14,
        density: 1.0,
        seed,
    }
}
