use glam::Vec2;
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::field::FieldModule;

/// Simulation state of one particle, laid out as `Particle` in `field.wgsl`.
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub initial_position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub life: f32,
    // WGSL rounds the struct size up to its 8 byte alignment
    _padding: f32,
}

impl Particle {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            initial_position: position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            life: 0.0,
            _padding: 0.0,
        }
    }
}

/// Per particle vertex written by the compute pass and read by the render pass.
#[repr(C)]
#[derive(bytemuck::Pod, bytemuck::Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec2,
    _padding0: Vec2,
    pub color: [f32; 4],
    pub uv: Vec2,
    _padding1: Vec2,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: 16,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 32,
            shader_location: 2,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Half extents of the rectangle, centered on the origin, particles spawn in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnArea {
    half_extents: Vec2,
}

impl SpawnArea {
    pub fn new(half_width: f32, half_height: f32) -> Option<Self> {
        let valid = |v: f32| v > 0.0 && v.is_finite();
        (valid(half_width) && valid(half_height)).then(|| Self {
            half_extents: Vec2::new(half_width, half_height),
        })
    }

    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }
}

pub fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Places `count` particles uniformly at random inside `area`, at rest.
pub fn generate_particles<R: Rng>(rng: &mut R, count: u32, area: SpawnArea) -> Vec<Particle> {
    let half = area.half_extents();

    (0..count)
        .map(|_| {
            Particle::at(Vec2::new(
                rng.gen_range(-half.x..=half.x),
                rng.gen_range(-half.y..=half.y),
            ))
        })
        .collect()
}

pub fn upload_particles(queue: &wgpu::Queue, field: &FieldModule, particles: &[Particle]) {
    debug_assert_eq!(particles.len(), field.particle_count() as usize);

    queue.write_buffer(field.particle_buffer(), 0, bytemuck::cast_slice(particles));
    info!("Uploaded {} particles", particles.len());
}
