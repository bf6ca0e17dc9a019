use std::{borrow::Cow, mem::size_of};

use glam::Vec2;
use log::info;
use wgpu::util::DeviceExt;

use crate::{
    error::SetupError,
    particle::{Particle, SpawnArea, Vertex},
    utils::workgroup_count,
};

/// Must match `@workgroup_size` in `field.wgsl`.
pub const PARTICLES_PER_WORKGROUP: u32 = 256;

/// Uniform block read by the compute kernel, `Params` in `field.wgsl`.
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    pub delta_time: f32,
    pub time: f32,
    /// Pull toward the initial position
    pub stiffness: f32,
    /// Velocity retained per frame
    pub damping: f32,
    pub spawn_extent: Vec2,
    pub swirl: f32,
    pub particle_count: u32,
}

impl FieldParams {
    pub fn new(particle_count: u32, spawn_area: SpawnArea) -> Self {
        Self {
            delta_time: 0.0,
            time: 0.0,
            stiffness: 2.0,
            damping: 0.98,
            spawn_extent: spawn_area.half_extents(),
            swirl: 40.0,
            particle_count,
        }
    }
}

/// Largest particle count whose buffers and dispatch fit inside `limits`.
pub fn max_particles(limits: &wgpu::Limits) -> u32 {
    let stride = size_of::<Particle>().max(size_of::<Vertex>()) as u64;
    let by_binding = limits.max_storage_buffer_binding_size as u64 / stride;
    let by_buffer = limits.max_buffer_size / stride;
    let by_dispatch =
        limits.max_compute_workgroups_per_dimension as u64 * PARTICLES_PER_WORKGROUP as u64;

    by_binding
        .min(by_buffer)
        .min(by_dispatch)
        .min(u32::MAX as u64) as u32
}

/// Byte sizes of the particle and vertex buffers holding `particle_count` particles.
pub fn buffer_sizes(particle_count: u32) -> (u64, u64) {
    let count = particle_count as u64;
    (
        size_of::<Particle>() as u64 * count,
        size_of::<Vertex>() as u64 * count,
    )
}

pub fn check_particle_count(count: u32, limits: &wgpu::Limits) -> Result<(), SetupError> {
    let max = max_particles(limits);
    if count > max {
        return Err(SetupError::TooManyParticles { count, max });
    }

    Ok(())
}

/// Owns the particle state on the GPU and the compute pass that advances it.
pub struct FieldModule {
    particle_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    param_buffer: wgpu::Buffer,
    pub params: FieldParams,

    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::ComputePipeline,
}

impl FieldModule {
    pub fn new(device: &wgpu::Device, params: FieldParams) -> Self {
        let field_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("field"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("field.wgsl"))),
        });

        let param_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Field Parameter Buffer"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: false },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("field"),
            entries: &[
                storage_entry(0),
                storage_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let (particle_buffer, vertex_buffer, bind_group) = create_buffer_group(
            device,
            &bind_group_layout,
            &param_buffer,
            params.particle_count,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("field"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("field"),
            layout: Some(&pipeline_layout),
            module: &field_shader,
            entry_point: "particle_move",
        });

        Self {
            particle_buffer,
            vertex_buffer,
            param_buffer,
            params,

            bind_group_layout,
            bind_group,
            pipeline,
        }
    }

    /// Reallocates both buffers for `particle_count` particles.
    ///
    /// The new particle buffer is zeroed, callers upload fresh particles
    /// and parameters afterwards.
    pub fn resize(&mut self, device: &wgpu::Device, particle_count: u32) {
        let (particle_buffer, vertex_buffer, bind_group) = create_buffer_group(
            device,
            &self.bind_group_layout,
            &self.param_buffer,
            particle_count,
        );

        self.particle_buffer = particle_buffer;
        self.vertex_buffer = vertex_buffer;
        self.bind_group = bind_group;
        self.params.particle_count = particle_count;
    }

    pub fn particle_count(&self) -> u32 {
        self.params.particle_count
    }

    pub fn particle_buffer(&self) -> &wgpu::Buffer {
        &self.particle_buffer
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn begin_pass<'a>(&'a self, encoder: &'a mut wgpu::CommandEncoder) -> wgpu::ComputePass<'a> {
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("field"),
            timestamp_writes: None,
        });

        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(0, &self.bind_group, &[]);
        cpass.dispatch_workgroups(
            workgroup_count(self.particle_count(), PARTICLES_PER_WORKGROUP),
            1,
            1,
        );

        cpass
    }

    /// Advances the simulation clock and writes the parameters for this frame.
    pub fn update_time(&mut self, queue: &wgpu::Queue, delta_time: f32) {
        self.params.delta_time = delta_time;
        self.params.time += delta_time;
        self.update_params(queue);
    }

    pub fn update_params(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.param_buffer, 0, bytemuck::bytes_of(&self.params));
    }
}

fn create_buffer_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    param_buffer: &wgpu::Buffer,
    particle_count: u32,
) -> (wgpu::Buffer, wgpu::Buffer, wgpu::BindGroup) {
    let (particle_size, vertex_size) = buffer_sizes(particle_count);

    let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Buffer"),
        size: particle_size,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Particle Vertex Buffer"),
        size: vertex_size,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::STORAGE,
        mapped_at_creation: false,
    });

    info!(
        "Allocated {} particles ({} bytes state, {} bytes vertices)",
        particle_count,
        particle_buffer.size(),
        vertex_buffer.size()
    );

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("field"),
        layout: bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: particle_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: vertex_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: param_buffer.as_entire_binding(),
            },
        ],
    });

    (particle_buffer, vertex_buffer, bind_group)
}
