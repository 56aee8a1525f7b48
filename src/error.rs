//! Error types for arbor.
//!
//! Configuration problems are reported before any entity is generated, so a
//! bad setting never turns into a cloud of NaN positions. Per-frame numeric
//! edge cases are absorbed where they occur and never show up here.

use thiserror::Error;

/// Invalid static configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A spatial extent (radius, height) is NaN, infinite, zero or negative.
    #[error("`{name}` must be a finite positive number, got {value}")]
    InvalidExtent { name: &'static str, value: f32 },
    /// The damping time constant is NaN, infinite, zero or negative.
    #[error("transition time constant must be finite and positive, got {0}")]
    InvalidTimeConstant(f32),
    /// A probability threshold lies outside `[0, 1]`.
    #[error("`{name}` must lie in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f32 },
    /// A scalar lies outside the interval it must fall in.
    #[error("`{name}` must lie in [{min}, {max}), got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    /// A `[min, max)` range is empty, inverted or non-finite.
    #[error("`{name}` range {min}..{max} is empty or not finite")]
    InvalidRange { name: &'static str, min: f32, max: f32 },
    /// A free-form scalar parameter is NaN or infinite.
    #[error("`{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    /// A palette color is not a `#rrggbb` hex string.
    #[error("`{name}` is not a #rrggbb color: {value:?}")]
    InvalidColor { name: &'static str, value: String },
}

/// Errors that can occur while loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read the file from disk.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid settings JSON.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// The file parsed but describes an invalid configuration.
    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a Vulkan/Metal/DX12/WebGPU capable device is required")]
    NoAdapter,
    /// The surface reports no usable texture format.
    #[error("the GPU surface supports no texture formats")]
    NoSurfaceFormat,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_the_field() {
        let err = ConfigError::InvalidExtent {
            name: "scatter_radius",
            value: -1.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("scatter_radius"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn test_settings_error_wraps_config_error() {
        let err: SettingsError = ConfigError::InvalidTimeConstant(0.0).into();
        assert!(matches!(err, SettingsError::Invalid(_)));
        assert!(err.to_string().contains("time constant"));
    }
}
