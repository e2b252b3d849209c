//! Plain-text rendering for the CLI: metrics lines, kernel slices, lattice slices.

use gatelattice_core::{
    GateType, KernelSlice, LatticeSlice, MetricsRecord, SnapshotMeta, GATE_TABLE,
};

const ON: char = '#';
const OFF: char = '.';

pub fn metrics_line(record: &MetricsRecord) -> String {
    format!(
        "t={:<6} delta={:<5} energy={:.6} rev={:.6} phase={:.6}",
        record.tick, record.delta, record.energy, record.reversibility, record.phase_invariance
    )
}

/// One row per kernel row, gates as letters (X, T, M, N) separated by spaces.
pub fn kernel_slice(slice: &KernelSlice) -> String {
    slice
        .rows()
        .map(|row| {
            row.iter()
                .map(|w| w.gate().symbol().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `X=3 XOR  T=4 THRESHOLD  M=5 MEMORY  N=6 NOT`
pub fn gate_legend() -> String {
    GATE_TABLE
        .iter()
        .map(|(weight, gate)| {
            format!("{}={} {}", gate.symbol(), weight.value(), gate_name(*gate))
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Offsets per gate in one kernel slice, e.g. `X:9 T:12 M:0 N:4`.
pub fn gate_census(slice: &KernelSlice) -> String {
    GATE_TABLE
        .iter()
        .map(|(_, gate)| format!("{}:{}", gate.symbol(), slice.count(*gate)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn gate_name(gate: GateType) -> &'static str {
    match gate {
        GateType::Xor => "XOR",
        GateType::Threshold => "THRESHOLD",
        GateType::Memory => "MEMORY",
        GateType::Not => "NOT",
    }
}

pub fn lattice_slice(slice: &LatticeSlice) -> String {
    slice
        .iter()
        .map(|row| row.iter().map(|c| if c.is_on() { ON } else { OFF }).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn snapshot_line(meta: &SnapshotMeta) -> String {
    format!(
        "{}  {:<20} t={:<6} {}³  {}",
        meta.id,
        meta.name,
        meta.tick,
        meta.size,
        meta.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}
