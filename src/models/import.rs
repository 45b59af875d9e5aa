//! glTF/GLB import into the in-memory scene graph.

use std::rc::Rc;

use glam::{Quat, Vec3, Vec4};
use image::{DynamicImage, RgbImage, RgbaImage};
use rootcause::Report;
use thiserror::Error;
use tracing::{debug, warn};

use super::scene::{Material, MeshGeometry, MeshPart, SceneNode};
use crate::texture::{ColorSpace, Texture};
use crate::weapon::WeaponId;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid glTF: {0}")]
    Gltf(String),
    #[error("glTF document has no scene")]
    NoScene,
}

/// The cached master copy of a weapon model.
///
/// `scene` is the scene's root group; its direct children are the structural
/// renders (legacy first, current second for ordinary firearms). The master is
/// never mutated: viewers work on [`WeaponAsset::instantiate`] copies.
#[derive(Debug)]
pub struct WeaponAsset {
    weapon: WeaponId,
    scene: SceneNode,
}

impl WeaponAsset {
    pub fn new(weapon: WeaponId, scene: SceneNode) -> Self {
        Self { weapon, scene }
    }

    /// Parse a `.glb` (or self-contained `.gltf`) model.
    pub fn from_gltf_bytes(weapon: WeaponId, bytes: &[u8]) -> Result<Self, Report<ImportError>> {
        let (document, buffers, images) =
            gltf::import_slice(bytes).map_err(|e| Report::new(ImportError::Gltf(e.to_string())))?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| Report::new(ImportError::NoScene))?;

        let images: Vec<Option<Rc<RgbaImage>>> = images.into_iter().map(convert_image).collect();

        let mut root = SceneNode::group(scene.name().unwrap_or("Scene"));
        root.children = scene
            .nodes()
            .map(|node| convert_node(&node, &buffers, &images))
            .collect();

        debug!(
            weapon = %weapon,
            children = root.children.len(),
            "imported weapon model"
        );
        Ok(Self::new(weapon, root))
    }

    pub fn weapon(&self) -> &WeaponId {
        &self.weapon
    }

    /// Read-only view of the master scene.
    pub fn scene(&self) -> &SceneNode {
        &self.scene
    }

    /// A working copy that may be freely mutated.
    pub fn instantiate(&self) -> SceneNode {
        self.scene.clone()
    }
}

fn convert_node(
    node: &gltf::Node<'_>,
    buffers: &[gltf::buffer::Data],
    images: &[Option<Rc<RgbaImage>>],
) -> SceneNode {
    let (translation, rotation, scale) = node.transform().decomposed();
    let meshes = node
        .mesh()
        .map(|mesh| {
            mesh.primitives()
                .filter_map(|primitive| convert_primitive(&primitive, buffers, images))
                .collect()
        })
        .unwrap_or_default();

    SceneNode {
        name: node.name().map(str::to_string),
        translation: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
        meshes,
        children: node
            .children()
            .map(|child| convert_node(&child, buffers, images))
            .collect(),
    }
}

fn convert_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
    images: &[Option<Rc<RgbaImage>>],
) -> Option<MeshPart> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

    let Some(positions) = reader.read_positions() else {
        warn!("skipping primitive without POSITION attribute");
        return None;
    };

    let mut geometry = MeshGeometry::new(positions.collect());
    geometry.uvs = reader
        .read_tex_coords(0)
        .map(|uvs| uvs.into_f32().collect());
    geometry.indices = reader
        .read_indices()
        .map(|indices| indices.into_u32().collect());

    Some(MeshPart::new(
        geometry,
        convert_material(&primitive.material(), images),
    ))
}

fn convert_material(material: &gltf::Material<'_>, images: &[Option<Rc<RgbaImage>>]) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let map = pbr
        .base_color_texture()
        .and_then(|info| images.get(info.texture().source().index()).cloned().flatten())
        .map(|image| {
            let mut texture = Texture::from_shared(image);
            texture.color_space = ColorSpace::Srgb;
            texture.flip_y = false;
            texture
        });

    Material {
        name: material.name().unwrap_or_default().to_string(),
        base_color: Vec4::from(pbr.base_color_factor()),
        map,
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        metalness_map: None,
        revision: 0,
    }
}

fn convert_image(data: gltf::image::Data) -> Option<Rc<RgbaImage>> {
    let (width, height) = (data.width, data.height);
    let rgba = match data.format {
        gltf::image::Format::R8G8B8A8 => RgbaImage::from_raw(width, height, data.pixels),
        gltf::image::Format::R8G8B8 => RgbImage::from_raw(width, height, data.pixels)
            .map(|rgb| DynamicImage::ImageRgb8(rgb).to_rgba8()),
        other => {
            warn!(?other, "unsupported embedded image format");
            None
        }
    };
    rgba.map(Rc::new)
}
