//! Fixtures shared by the unit tests: GLB models, encoded images, in-memory
//! asset trees and instrumented sources.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};

use async_trait::async_trait;
use futures::channel::oneshot;
use image::{ImageFormat, RgbaImage};
use rootcause::Report;
use serde_json::json;
use vfs::{MemoryFS, VfsPath};

use crate::data::{AssetSource, FetchError, VfsSource};

/// One top-level node of a fixture model: a box-shaped primitive with a
/// named material.
#[derive(Clone, Copy)]
pub(crate) struct FixturePart {
    pub node: &'static str,
    pub material: &'static str,
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub translation: [f32; 3],
}

impl FixturePart {
    pub fn new(node: &'static str, material: &'static str, min: [f32; 3], max: [f32; 3]) -> Self {
        Self {
            node,
            material,
            min,
            max,
            translation: [0.0; 3],
        }
    }

    pub fn at(mut self, translation: [f32; 3]) -> Self {
        self.translation = translation;
        self
    }
}

/// Build a binary glTF with one scene whose root nodes are `parts`.
pub(crate) fn build_glb(parts: &[FixturePart]) -> Vec<u8> {
    let mut bin: Vec<u8> = Vec::new();
    let mut buffer_views = Vec::new();
    let mut accessors = Vec::new();
    let mut materials = Vec::new();
    let mut meshes = Vec::new();
    let mut nodes = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        let offset = bin.len();
        let mid = [
            (part.min[0] + part.max[0]) * 0.5,
            (part.min[1] + part.max[1]) * 0.5,
            (part.min[2] + part.max[2]) * 0.5,
        ];
        for point in [part.min, part.max, mid] {
            for c in point {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        buffer_views.push(json!({ "buffer": 0, "byteOffset": offset, "byteLength": 36 }));
        accessors.push(json!({
            "bufferView": i,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": part.min,
            "max": part.max,
        }));
        materials.push(json!({ "name": part.material }));
        meshes.push(json!({ "primitives": [{ "attributes": { "POSITION": i }, "material": i }] }));
        nodes.push(json!({ "name": part.node, "mesh": i, "translation": part.translation }));
    }

    let root = json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": (0..parts.len()).collect::<Vec<_>>() }],
        "nodes": nodes,
        "meshes": meshes,
        "materials": materials,
        "accessors": accessors,
        "bufferViews": buffer_views,
        "buffers": [{ "byteLength": bin.len() }],
    });

    let mut json_bytes = serde_json::to_vec(&root).unwrap();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let glb = gltf::binary::Glb {
        header: gltf::binary::Header {
            magic: *b"glTF",
            version: 2,
            length: 0,
        },
        json: Cow::Owned(json_bytes),
        bin: Some(Cow::Owned(bin)),
    };
    let mut out = Vec::new();
    glb.to_writer(&mut out).unwrap();
    out
}

/// A rifle-like model with both renders: legacy `(1, 0.3, 0.1)` at the origin
/// and a larger, offset current render.
pub(crate) fn two_variant_rifle() -> Vec<u8> {
    build_glb(&[
        FixturePart::new("legacy", "rifle_legacy", [-0.5, -0.15, -0.05], [0.5, 0.15, 0.05]),
        FixturePart::new("current", "rifle_current", [0.0, 0.0, 0.0], [2.0, 0.5, 0.25])
            .at([1.0, 1.0, 1.0]),
    ])
}

pub(crate) fn encode_image(format: ImageFormat, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub(crate) fn memory_tree() -> VfsPath {
    MemoryFS::new().into()
}

pub(crate) fn write_file(root: &VfsPath, path: &str, bytes: &[u8]) {
    if let Some((dir, _)) = path.rsplit_once('/') {
        root.join(dir).unwrap().create_dir_all().unwrap();
    }
    root.join(path)
        .unwrap()
        .create_file()
        .unwrap()
        .write_all(bytes)
        .unwrap();
}

/// Logs every requested path before delegating.
pub(crate) struct RecordingSource<S> {
    inner: S,
    log: RefCell<Vec<String>>,
}

impl<S> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn requested(&self, path: &str) -> bool {
        self.log.borrow().iter().any(|p| p == path)
    }
}

#[async_trait(?Send)]
impl<S: AssetSource> AssetSource for RecordingSource<S> {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, Report<FetchError>> {
        self.log.borrow_mut().push(path.to_string());
        self.inner.fetch(path).await
    }
}

/// Holds selected fetches until the test releases them.
pub(crate) struct GatedSource {
    inner: VfsSource,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
}

impl GatedSource {
    pub fn new(root: VfsPath) -> Self {
        Self {
            inner: VfsSource::new(root),
            gates: RefCell::new(HashMap::new()),
        }
    }

    /// The next fetch of `path` waits until the returned sender fires or is dropped.
    pub fn gate(&self, path: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().insert(path.to_string(), rx);
        tx
    }
}

#[async_trait(?Send)]
impl AssetSource for GatedSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, Report<FetchError>> {
        let gate = self.gates.borrow_mut().remove(path);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.fetch(path).await
    }
}
