use crate::terrain::Terrain;
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub emissive: [f32; 4],
}

impl InstanceRaw {
    pub fn new(model: Mat4, emissive: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            emissive: emissive.extend(0.0).to_array(),
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        const ATTRIBS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            5 => Float32x4, 6 => Float32x4, 7 => Float32x4, 8 => Float32x4, 9 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBS,
        }
    }
}

/// CPU-side geometry, built once and uploaded as a [`Mesh`].
#[derive(Debug, Default, Clone)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

const GRASS_BASE: [f32; 3] = [0.25, 0.45, 0.12];
const GRASS_TIP: [f32; 3] = [0.78, 0.82, 0.42];

impl MeshData {
    /// Grid mesh sharing the terrain's samples. Each cell is split along the
    /// same diagonal `Terrain::height_at` interpolates on.
    pub fn terrain(terrain: &Terrain) -> Self {
        let n = terrain.segments();
        let side = n + 1;
        let mut vertices = Vec::with_capacity(side * side);

        for iz in 0..side {
            for ix in 0..side {
                let p = terrain.vertex(ix, iz);
                let left = terrain.vertex(ix.saturating_sub(1), iz);
                let right = terrain.vertex((ix + 1).min(n), iz);
                let back = terrain.vertex(ix, iz.saturating_sub(1));
                let front = terrain.vertex(ix, (iz + 1).min(n));
                let normal = (front - back).cross(right - left).normalize_or_zero();

                let t = ((p.y + 6.0) / 12.0).clamp(0.0, 1.0);
                let low = Vec3::new(0.55, 0.50, 0.30);
                let high = Vec3::new(0.70, 0.62, 0.40);
                vertices.push(Vertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                    color: low.lerp(high, t).to_array(),
                });
            }
        }

        let mut indices = Vec::with_capacity(n * n * 6);
        for iz in 0..n {
            for ix in 0..n {
                let tl = (iz * side + ix) as u32;
                let tr = tl + 1;
                let bl = tl + side as u32;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
            }
        }

        Self { vertices, indices }
    }

    pub fn cuboid(center: Vec3, half: Vec3, color: [f32; 3]) -> Self {
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];
        let mut mesh = Self::default();
        for (n, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = n + u * su + v * sv;
                mesh.vertices.push(Vertex {
                    position: (center + corner * half).to_array(),
                    normal: n.to_array(),
                    color,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// A tuft of double-sided blades rooted at the origin.
    pub fn grass_bunch() -> Self {
        const BLADES: usize = 9;
        let mut mesh = Self::default();
        for i in 0..BLADES {
            let angle = i as f32 / BLADES as f32 * std::f32::consts::TAU;
            let lean = Vec3::new(angle.cos(), 0.0, angle.sin()) * 0.25;
            let root = lean * 0.4;
            let side = Vec3::new(-angle.sin(), 0.0, angle.cos()) * 0.05;
            let height = 0.9 + (i % 3) as f32 * 0.2;
            let tip = root + lean + Vec3::Y * height;
            let normal = side.cross(tip - root).normalize_or_zero();

            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend_from_slice(&[
                Vertex { position: (root - side).to_array(), normal: normal.to_array(), color: GRASS_BASE },
                Vertex { position: (root + side).to_array(), normal: normal.to_array(), color: GRASS_BASE },
                Vertex { position: tip.to_array(), normal: normal.to_array(), color: GRASS_TIP },
            ]);
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 1]);
        }
        mesh
    }

    /// Stand-in avatar used when no glTF model is supplied: a body with a
    /// nose pointing along +z so the facing is visible.
    pub fn avatar_placeholder(half_extents: Vec3) -> Self {
        let mut body = Self::cuboid(Vec3::new(0.0, half_extents.y, 0.0), half_extents, [0.25, 0.35, 0.75]);
        let nose = Self::cuboid(
            Vec3::new(0.0, half_extents.y * 1.5, half_extents.z + 0.1),
            Vec3::new(0.1, 0.1, 0.1),
            [0.95, 0.85, 0.6],
        );
        body.append(&nose);
        body
    }

    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    pub fn transform(&mut self, matrix: Mat4) {
        for v in &mut self.vertices {
            v.position = matrix.transform_point3(Vec3::from(v.position)).to_array();
            v.normal = matrix
                .transform_vector3(Vec3::from(v.normal))
                .normalize_or_zero()
                .to_array();
        }
    }
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, name: &str, data: &MeshData) -> Self {
        let vertex_label = format!("{} Vertex Buffer", name);
        let index_label = format!("{} Index Buffer", name);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(vertex_label.as_str()),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(index_label.as_str()),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: data.indices.len() as u32,
        }
    }
}

/// Growable per-instance buffer rewritten every frame.
pub struct InstanceBatch {
    label: &'static str,
    pub buffer: wgpu::Buffer,
    capacity: usize,
    pub count: u32,
}

impl InstanceBatch {
    pub fn new(device: &wgpu::Device, label: &'static str, capacity: usize) -> Self {
        Self {
            label,
            buffer: Self::allocate(device, label, capacity.max(1)),
            capacity: capacity.max(1),
            count: 0,
        }
    }

    fn allocate(device: &wgpu::Device, label: &'static str, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[InstanceRaw]) {
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.label, self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances));
        }
        self.count = instances.len() as u32;
    }
}

pub trait DrawMesh {
    fn draw_mesh(&mut self, mesh: &Mesh, instances: &InstanceBatch);
}

impl DrawMesh for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh, instances: &InstanceBatch) {
        if instances.count == 0 {
            return;
        }
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_vertex_buffer(1, instances.buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.num_indices, 0, 0..instances.count);
    }
}
