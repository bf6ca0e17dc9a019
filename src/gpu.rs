use std::sync::Arc;

use log::info;
use winit::window::Window;

use crate::error::SetupError;

pub struct GpuContext<'a> {
    pub surface: wgpu::Surface<'a>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    minimized: bool,
}

/// What the frame loop does when the next surface texture can't be acquired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAction {
    /// Configure the surface again and skip the frame
    Reconfigure,
    /// Skip the frame and try again on the next one
    Skip,
    /// Stop the application
    Fatal,
}

impl From<&wgpu::SurfaceError> for SurfaceAction {
    fn from(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigure,
            wgpu::SurfaceError::Timeout => Self::Skip,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
        }
    }
}

impl<'a> GpuContext<'a> {
    pub async fn new(window: Arc<Window>) -> Result<Self, SetupError> {
        let window_size = window.inner_size();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                ..Default::default()
            })
            .await
            .ok_or(SetupError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            "Using adapter `{}` ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: buffer_limits(&adapter.limits()),
                },
                None,
            )
            .await?;

        let mut config = surface
            .get_default_config(&adapter, window_size.width.max(1), window_size.height.max(1))
            .ok_or(SetupError::UnsupportedSurface)?;
        config.present_mode = wgpu::PresentMode::AutoVsync;
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            minimized: window_size.width == 0 || window_size.height == 0,
        })
    }

    /// A zero sized window can't be configured, frames are skipped until it
    /// gets a size again.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.minimized = width == 0 || height == 0;
        if self.minimized {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.reconfigure_surface();
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn reconfigure_surface(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}

/// Default limits with the adapter's own buffer size limits, so large
/// particle counts fit.
fn buffer_limits(adapter_limits: &wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits {
        max_buffer_size: adapter_limits.max_buffer_size,
        max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
        ..wgpu::Limits::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_surfaces_are_reconfigured() {
        assert_eq!(
            SurfaceAction::from(&wgpu::SurfaceError::Lost),
            SurfaceAction::Reconfigure
        );
        assert_eq!(
            SurfaceAction::from(&wgpu::SurfaceError::Outdated),
            SurfaceAction::Reconfigure
        );
    }

    #[test]
    fn timeouts_skip_and_out_of_memory_stops() {
        assert_eq!(
            SurfaceAction::from(&wgpu::SurfaceError::Timeout),
            SurfaceAction::Skip
        );
        assert_eq!(
            SurfaceAction::from(&wgpu::SurfaceError::OutOfMemory),
            SurfaceAction::Fatal
        );
    }

    #[test]
    fn buffer_limits_follow_the_adapter() {
        let adapter = wgpu::Limits {
            max_buffer_size: 1 << 34,
            max_storage_buffer_binding_size: 1 << 31,
            ..wgpu::Limits::default()
        };
        let limits = buffer_limits(&adapter);

        assert_eq!(limits.max_buffer_size, 1 << 34);
        assert_eq!(limits.max_storage_buffer_binding_size, 1 << 31);
        assert_eq!(
            limits.max_compute_workgroups_per_dimension,
            wgpu::Limits::default().max_compute_workgroups_per_dimension
        );
    }
}
