use crate::animation::{ClipAction, IDLE_CLIP, WALK_CLIP};
use crate::model::{MeshData, Vertex};
use crate::player::AVATAR_HALF_EXTENTS;
use glam::Mat4;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

const AVATAR_COLOR: [f32; 3] = [0.8, 0.72, 0.62];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to import {path}: {source}")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{0} contains no meshes")]
    NoMeshes(PathBuf),
    #[error("{path} has no animation usable as the {clip} clip")]
    MissingClip { path: PathBuf, clip: &'static str },
    #[error("{path}: mesh primitive without {attribute}")]
    MissingAttribute { path: PathBuf, attribute: &'static str },
}

pub struct AvatarAsset {
    pub mesh: MeshData,
    pub idle: ClipAction,
    pub walk: ClipAction,
}

pub struct AssetPaths {
    pub idle_model: Option<PathBuf>,
    pub walk_model: Option<PathBuf>,
}

/// Loads the avatar mesh and idle clip, then the walk clip. Without an idle
/// model the procedural placeholder and its built-in clips are used.
///
/// Blocking file I/O; `spawn_loader` runs it off the event loop thread.
pub fn load(paths: &AssetPaths) -> Result<AvatarAsset, AssetError> {
    let Some(idle_path) = paths.idle_model.as_deref() else {
        log::warn!("no avatar model given, using placeholder");
        return Ok(placeholder());
    };

    let idle_doc = import(idle_path)?;
    let mesh = avatar_mesh(idle_path, &idle_doc)?;
    let idle = pick_clip(idle_path, &idle_doc, IDLE_CLIP, true)?;
    log::info!("{} animation loaded from {}", idle.name, idle_path.display());

    let walk = match paths.walk_model.as_deref() {
        Some(walk_path) => {
            let walk_doc = import(walk_path)?;
            pick_clip(walk_path, &walk_doc, WALK_CLIP, true)?
        }
        None => match pick_clip(idle_path, &idle_doc, WALK_CLIP, false) {
            Ok(walk) => walk,
            Err(e) => {
                log::warn!("{}, reusing the idle clip for walking", e);
                reuse_for_walk(&idle)
            }
        },
    };
    log::info!("{} animation loaded ({:.2}s)", walk.name, walk.duration());

    Ok(AvatarAsset { mesh, idle, walk })
}

/// Loads on a worker thread. A failed load arrives as the placeholder.
pub fn spawn_loader(paths: AssetPaths) -> mpsc::Receiver<AvatarAsset> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let avatar = load(&paths).unwrap_or_else(|e| {
            log::warn!("{}, falling back to placeholder avatar", e);
            placeholder()
        });
        // Receiver gone means the window closed first.
        let _ = tx.send(avatar);
    });
    rx
}

fn reuse_for_walk(idle: &ClipAction) -> ClipAction {
    ClipAction::new(WALK_CLIP, idle.duration())
}

pub fn placeholder() -> AvatarAsset {
    AvatarAsset {
        mesh: MeshData::avatar_placeholder(AVATAR_HALF_EXTENTS),
        idle: ClipAction::new(IDLE_CLIP, 2.0),
        walk: ClipAction::new(WALK_CLIP, 0.9),
    }
}

struct Document {
    doc: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
}

fn import(path: &Path) -> Result<Document, AssetError> {
    let (doc, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Import {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Document { doc, buffers })
}

/// Index of the first name containing `clip` (case-insensitive); with
/// `fallback_first` the first animation stands in when none matches.
fn choose_clip(names: &[Option<&str>], clip: &str, fallback_first: bool) -> Option<usize> {
    let named = names.iter().position(|n| {
        n.map(|n| n.to_ascii_lowercase().contains(clip))
            .unwrap_or(false)
    });
    match named {
        Some(i) => Some(i),
        None if fallback_first && !names.is_empty() => Some(0),
        None => None,
    }
}

/// Clip whose name matches `clip`, renamed to `clip`.
fn pick_clip(
    path: &Path,
    document: &Document,
    clip: &'static str,
    fallback_first: bool,
) -> Result<ClipAction, AssetError> {
    let animations: Vec<_> = document.doc.animations().collect();
    let names: Vec<Option<&str>> = animations.iter().map(|a| a.name()).collect();
    let animation = choose_clip(&names, clip, fallback_first)
        .map(|i| &animations[i])
        .ok_or_else(|| AssetError::MissingClip {
            path: path.to_path_buf(),
            clip,
        })?;

    let mut duration = 0.0f32;
    for channel in animation.channels() {
        let reader = channel.reader(|buffer| Some(&document.buffers[buffer.index()]));
        if let Some(inputs) = reader.read_inputs() {
            duration = inputs.fold(duration, f32::max);
        }
    }
    Ok(ClipAction::new(clip, duration))
}

fn avatar_mesh(path: &Path, document: &Document) -> Result<MeshData, AssetError> {
    let mut mesh = MeshData::default();
    for scene in document.doc.scenes() {
        for node in scene.nodes() {
            collect_node(path, document, &node, Mat4::IDENTITY, &mut mesh)?;
        }
    }
    if mesh.indices.is_empty() {
        return Err(AssetError::NoMeshes(path.to_path_buf()));
    }
    Ok(mesh)
}

fn collect_node(
    path: &Path,
    document: &Document,
    node: &gltf::Node,
    parent: Mat4,
    out: &mut MeshData,
) -> Result<(), AssetError> {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&document.buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or(AssetError::MissingAttribute { path: path.to_path_buf(), attribute: "positions" })?
                .collect();
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => vec![[0.0, 1.0, 0.0]; positions.len()],
            };
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let mut part = MeshData {
                vertices: positions
                    .iter()
                    .zip(normals.iter())
                    .map(|(pos, norm)| Vertex {
                        position: *pos,
                        normal: *norm,
                        color: AVATAR_COLOR,
                    })
                    .collect(),
                indices,
            };
            part.transform(transform);
            out.append(&part);
        }
    }

    for child in node.children() {
        collect_node(path, document, &child, transform, out)?;
    }
    Ok(())
}
