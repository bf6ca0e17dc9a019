use std::path::PathBuf;

use thiserror::Error;

/// Failures while bringing up the window, the GPU or the particle buffers.
///
/// None of these are recovered from: the event loop exits and `main`
/// returns the error.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,

    #[error("failed to load texture `{path}`: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("{count} particles exceed the device limit of {max}")]
    TooManyParticles { count: u32, max: u32 },
}
