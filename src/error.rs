//! Error types for the flock crate.
//!
//! Each fallible surface gets its own enum: configuration loading, agent store
//! construction, tick execution, and GPU rendering. [`SimulationError`]
//! aggregates them for the facade and the CLI.
//!
//! The hot path (scan, merge, steer) has no error variants of its own: numeric
//! degeneracy is handled per agent and only reported through
//! [`TickReport`](crate::engine::TickReport) counters.

use thiserror::Error;

/// Errors raised while loading or validating a [`FlockConfig`](crate::FlockConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A numeric field that must be strictly positive (and finite) is not.
    #[error("`{field}` must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    /// `radii.falloff` outside `(0, 1]`.
    #[error("`radii.falloff` must be in (0, 1], got {0}")]
    Falloff(f32),
    /// Grid resolution is not a power of two or exceeds the Morton code range.
    #[error("`spatial.grid_resolution` must be a power of two <= 256, got {0}")]
    GridResolution(u32),
    /// `radii.levels` outside `1..=MAX_LEVELS`.
    #[error("`radii.levels` must be in 1..={max}, got {got}")]
    Levels { got: u32, max: u32 },
    /// `flocks` outside `1..=32`.
    #[error("`flocks` must be in 1..=32, got {0}")]
    Flocks(u32),
    /// Partition tree deeper than the supported maximum.
    #[error("`partition.depth` must be <= {max}, got {got}")]
    PartitionDepth { got: u32, max: u32 },
}

/// Errors raised by the agent store.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    /// An agent's hierarchy level is outside `0..MAX_LEVELS`.
    #[error("agent {index} has level {level}, levels must be below {max}")]
    InvalidLevel { index: usize, level: u32, max: u32 },
    /// An agent's position or heading contains NaN or infinity.
    #[error("agent {index} has a non-finite position or heading")]
    NonFinite { index: usize },
    /// A whole-array replacement does not match the fixed agent count.
    #[error("replacement holds {got} agents but the store holds {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Errors that abandon a tick. An abandoned tick commits nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    /// The tick was cancelled between phases.
    #[error("tick cancelled before commit")]
    Cancelled,
}

/// Errors that can occur during GPU initialization and readback.
#[derive(Debug, Error)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    /// The adapter lacks features required for stereo rendering.
    #[error("GPU adapter is missing required features: {0:?}")]
    MissingFeatures(wgpu::Features),
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    #[error("failed to map GPU buffer: {0}")]
    BufferMapping(String),
}

/// Errors that can occur when building or running a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Invalid initial agent state.
    #[error("agent store error: {0}")]
    Store(#[from] StoreError),
    /// A tick was abandoned.
    #[error("tick error: {0}")]
    Tick(#[from] TickError),
    /// GPU rendering failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// Writing a rendered image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
