/// Operation tag of synthesized neighbor row activations
pub const NEIGHBOR_ACTIVATION: &str = "NEI_ACT";

/// Default probability of the probabilistic row activation scheme
pub const DEFAULT_PRA_PROBABILITY: f64 = 0.001;

/// Default activation threshold of the counter-based row activation scheme.
///
/// Bit flips are expected after this many activations of one row.
pub const DEFAULT_CRA_THRESHOLD: u32 = 55555;

/// Number of records between two progress bar updates
pub const PROGRESS_INTERVAL: u64 = 1 << 16;
