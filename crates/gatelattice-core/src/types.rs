//! Core types for Gatelattice

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Smallest lattice side the engine accepts.
pub const MIN_SIZE: usize = 3;
/// Largest lattice side the engine accepts. The pass is O(N^5).
pub const MAX_SIZE: usize = 15;

pub fn validate_size(size: usize) -> Result<()> {
    if (MIN_SIZE..=MAX_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(Error::SizeOutOfRange {
            size,
            min: MIN_SIZE,
            max: MAX_SIZE,
        })
    }
}

/// Binary cell value
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum CellState {
    #[default]
    Off = 0,
    On = 1,
}

impl CellState {
    pub fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            Self::On
        } else {
            Self::Off
        }
    }

    pub fn bit(self) -> u8 {
        self as u8
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl TryFrom<u8> for CellState {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(Error::InvalidCell(other)),
        }
    }
}

impl From<CellState> for u8 {
    fn from(state: CellState) -> Self {
        state.bit()
    }
}

/// One depth layer of a lattice, indexed `[y][x]`.
pub type LatticeSlice = Vec<Vec<CellState>>;

/// N×N×N binary cube. Cells are stored flat in z, y, x order.
///
/// On the wire a lattice is a nested `[[[0|1]]]` array indexed `[z][y][x]`.
/// Deserialization rejects non-binary cells, ragged or non-square slices, and
/// a depth count that differs from the slice side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec<u8>>>", into = "Vec<Vec<Vec<u8>>>")]
pub struct Lattice {
    side: usize,
    cells: Vec<CellState>,
}

impl Lattice {
    pub fn filled(side: usize, state: CellState) -> Self {
        Self {
            side,
            cells: vec![state; side * side * side],
        }
    }

    /// Build a lattice by evaluating `f(z, y, x)` for every cell in z, y, x order.
    pub fn from_fn(side: usize, mut f: impl FnMut(usize, usize, usize) -> CellState) -> Self {
        let mut cells = Vec::with_capacity(side * side * side);
        for z in 0..side {
            for y in 0..side {
                for x in 0..side {
                    cells.push(f(z, y, x));
                }
            }
        }
        Self { side, cells }
    }

    pub fn from_cells(side: usize, cells: Vec<CellState>) -> Result<Self> {
        let expected = side * side * side;
        if cells.len() != expected {
            return Err(Error::mismatch("cell count", expected, cells.len()));
        }
        Ok(Self { side, cells })
    }

    pub fn from_nested(nested: Vec<Vec<Vec<u8>>>) -> Result<Self> {
        let side = nested.len();
        if side == 0 {
            return Err(Error::malformed("lattice has no depth layers"));
        }
        let mut cells = Vec::with_capacity(side * side * side);
        for (z, slice) in nested.into_iter().enumerate() {
            if slice.len() != side {
                return Err(Error::malformed(format!(
                    "slice {} has {} rows, expected {}",
                    z,
                    slice.len(),
                    side
                )));
            }
            for (y, row) in slice.into_iter().enumerate() {
                if row.len() != side {
                    return Err(Error::malformed(format!(
                        "slice {} row {} has {} cells, expected {}",
                        z,
                        y,
                        row.len(),
                        side
                    )));
                }
                for value in row {
                    cells.push(CellState::try_from(value)?);
                }
            }
        }
        Ok(Self { side, cells })
    }

    pub fn to_nested(&self) -> Vec<Vec<Vec<u8>>> {
        self.cells
            .chunks(self.side * self.side)
            .map(|layer| {
                layer
                    .chunks(self.side)
                    .map(|row| row.iter().map(|c| c.bit()).collect())
                    .collect()
            })
            .collect()
    }

    pub fn side(&self) -> usize {
        self.side
    }

    /// Total cell count, N³.
    pub fn volume(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn index(&self, z: usize, y: usize, x: usize) -> usize {
        (z * self.side + y) * self.side + x
    }

    pub fn get(&self, z: usize, y: usize, x: usize) -> CellState {
        self.cells[self.index(z, y, x)]
    }

    /// Flat view of depth layer `z` (row-major, `side * side` cells).
    pub fn layer(&self, z: usize) -> &[CellState] {
        let stride = self.side * self.side;
        &self.cells[z * stride..(z + 1) * stride]
    }

    pub fn slice(&self, z: usize) -> Result<LatticeSlice> {
        if z >= self.side {
            return Err(Error::DepthOutOfRange {
                depth: z,
                side: self.side,
            });
        }
        Ok(self
            .layer(z)
            .chunks(self.side)
            .map(|row| row.to_vec())
            .collect())
    }

    /// Number of cells in state 1.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|c| c.is_on()).count()
    }

    /// Mean cell value in [0, 1].
    pub fn energy(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.population() as f64 / self.cells.len() as f64
    }
}

impl TryFrom<Vec<Vec<Vec<u8>>>> for Lattice {
    type Error = Error;

    fn try_from(nested: Vec<Vec<Vec<u8>>>) -> Result<Self> {
        Self::from_nested(nested)
    }
}

impl From<Lattice> for Vec<Vec<Vec<u8>>> {
    fn from(lattice: Lattice) -> Self {
        lattice.to_nested()
    }
}

/// Summary of one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsRecord {
    /// Tick counter after the transition this record describes.
    pub tick: u64,
    /// Cells that changed state.
    pub delta: u64,
    /// Mean cell value of the new lattice.
    pub energy: f64,
    /// Presentational noise in [0.999, 1.0).
    pub reversibility: f64,
    /// `1 - delta / N³ * 0.05`.
    pub phase_invariance: f64,
}

/// Gateway configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bind: BindMode,
}

fn default_port() -> u16 {
    3001
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: BindMode::default(),
        }
    }
}

/// Bind mode for the gateway
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    #[default]
    Loopback,
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lan" | "0.0.0.0" => BindMode::Lan,
            _ => BindMode::Loopback,
        }
    }
}
