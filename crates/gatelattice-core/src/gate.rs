//! Gate weights and kernel types
//!
//! Every kernel offset carries a weight from the closed palette {3, 4, 5, 6}.
//! The weight decides which reduction consumes the neighbor at that offset:
//!
//! | weight | gate      |
//! |--------|-----------|
//! | 3      | XOR       |
//! | 4      | THRESHOLD |
//! | 5      | MEMORY    |
//! | 6      | NOT       |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Logical reduction applied to the neighbors sharing a weight class.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateType {
    Xor,
    Threshold,
    Memory,
    Not,
}

impl GateType {
    /// Single-letter tag used in text dumps.
    pub fn symbol(self) -> char {
        match self {
            GateType::Xor => 'X',
            GateType::Threshold => 'T',
            GateType::Memory => 'M',
            GateType::Not => 'N',
        }
    }
}

/// Kernel weight, always one of the palette values.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weight(u8);

/// Weights in rotation order.
pub const PALETTE: [Weight; 4] = [Weight(3), Weight(4), Weight(5), Weight(6)];

/// Weight → gate table, indexed by palette position.
pub const GATE_TABLE: [(Weight, GateType); 4] = [
    (Weight(3), GateType::Xor),
    (Weight(4), GateType::Threshold),
    (Weight(5), GateType::Memory),
    (Weight(6), GateType::Not),
];

impl Weight {
    pub const XOR: Weight = Weight(3);
    pub const THRESHOLD: Weight = Weight(4);
    pub const MEMORY: Weight = Weight(5);
    pub const NOT: Weight = Weight(6);

    pub fn new(value: u8) -> Result<Self> {
        match value {
            3..=6 => Ok(Self(value)),
            other => Err(Error::InvalidWeight(other)),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn palette_index(self) -> usize {
        (self.0 - 3) as usize
    }

    pub fn gate(self) -> GateType {
        GATE_TABLE[self.palette_index()].1
    }

    /// Advance `steps` positions through the palette, wrapping after NOT.
    pub fn rotate(self, steps: usize) -> Self {
        PALETTE[(self.palette_index() + steps) % PALETTE.len()]
    }
}

impl TryFrom<u8> for Weight {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Weight> for u8 {
    fn from(weight: Weight) -> Self {
        weight.0
    }
}

/// A 3×3 weight pattern, the seed of a kernel slice.
pub type CorePattern = [[Weight; 3]; 3];

/// Seed pattern for every kernel.
pub const BASE_PATTERN: CorePattern = [
    [Weight(3), Weight(4), Weight(3)],
    [Weight(5), Weight(6), Weight(5)],
    [Weight(3), Weight(4), Weight(3)],
];

/// Rotate every weight of `core` by `steps` palette positions.
pub fn rotate_pattern(core: &CorePattern, steps: usize) -> CorePattern {
    core.map(|row| row.map(|w| w.rotate(steps)))
}

/// N×N grid of weights, indexed `[ky][kx]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<Vec<u8>>")]
pub struct KernelSlice {
    side: usize,
    weights: Vec<Weight>,
}

impl KernelSlice {
    /// Slice with every offset set to `weight`.
    pub fn uniform(side: usize, weight: Weight) -> Self {
        Self {
            side,
            weights: vec![weight; side * side],
        }
    }

    pub fn from_fn(side: usize, mut f: impl FnMut(usize, usize) -> Weight) -> Self {
        let mut weights = Vec::with_capacity(side * side);
        for ky in 0..side {
            for kx in 0..side {
                weights.push(f(ky, kx));
            }
        }
        Self { side, weights }
    }

    pub fn from_rows(rows: Vec<Vec<Weight>>) -> Result<Self> {
        let side = rows.len();
        if side == 0 {
            return Err(Error::MalformedKernel("kernel slice has no rows".into()));
        }
        let mut weights = Vec::with_capacity(side * side);
        for (ky, row) in rows.into_iter().enumerate() {
            if row.len() != side {
                return Err(Error::MalformedKernel(format!(
                    "row {} has {} weights, expected {}",
                    ky,
                    row.len(),
                    side
                )));
            }
            weights.extend(row);
        }
        Ok(Self { side, weights })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn get(&self, ky: usize, kx: usize) -> Weight {
        self.weights[ky * self.side + kx]
    }

    /// Weights in row-major (ky, kx) order.
    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Weight]> {
        self.weights.chunks(self.side)
    }

    pub fn count(&self, gate: GateType) -> usize {
        self.weights.iter().filter(|w| w.gate() == gate).count()
    }
}

impl From<KernelSlice> for Vec<Vec<u8>> {
    fn from(slice: KernelSlice) -> Self {
        slice
            .rows()
            .map(|row| row.iter().map(|w| w.value()).collect())
            .collect()
    }
}

/// One kernel slice per depth layer. Read-only once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KernelVolume {
    slices: Vec<KernelSlice>,
}

impl KernelVolume {
    /// Assemble a volume, checking that there is one square slice of side N per depth.
    pub fn new(slices: Vec<KernelSlice>) -> Result<Self> {
        let side = slices.len();
        if side == 0 {
            return Err(Error::MalformedKernel("kernel volume has no slices".into()));
        }
        for slice in &slices {
            if slice.side() != side {
                return Err(Error::mismatch("kernel slice side", side, slice.side()));
            }
        }
        Ok(Self { slices })
    }

    pub fn side(&self) -> usize {
        self.slices.len()
    }

    pub fn slice(&self, z: usize) -> Option<&KernelSlice> {
        self.slices.get(z)
    }

    pub fn slices(&self) -> &[KernelSlice] {
        &self.slices
    }
}
