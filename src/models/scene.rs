//! In-memory scene graph for a weapon model.
//!
//! `SceneNode` derives `Clone` as a deep copy of everything a viewer may
//! mutate (transforms, hierarchy, materials). Vertex data and decoded pixels
//! are immutable and shared through `Rc`.

use std::rc::Rc;

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::texture::Texture;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut aabb, p| {
            aabb.expand(p);
            aabb
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Zero for an empty box.
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Box enclosing the eight transformed corners.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let (min, max) = (self.min, self.max);
        Aabb::from_points((0..8).map(|corner| {
            let p = Vec3::new(
                if corner & 1 == 0 { min.x } else { max.x },
                if corner & 2 == 0 { min.y } else { max.y },
                if corner & 4 == 0 { min.z } else { max.z },
            );
            matrix.transform_point3(p)
        }))
    }
}

/// Vertex data for one primitive.
#[derive(Debug)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    /// Local-space bounds of `positions`.
    pub bounds: Aabb,
}

impl MeshGeometry {
    pub fn new(positions: Vec<[f32; 3]>) -> Self {
        let bounds = Aabb::from_points(positions.iter().copied().map(Vec3::from));
        Self {
            positions,
            uvs: None,
            indices: None,
            bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
    /// Color map, interpreted as sRGB.
    pub map: Option<Texture>,
    pub metalness: f32,
    pub roughness: f32,
    /// Metalness map, interpreted as linear data.
    pub metalness_map: Option<Texture>,
    /// Bumped on every change a renderer has to pick up.
    pub revision: u32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: Vec4::ONE,
            map: None,
            metalness: 1.0,
            roughness: 1.0,
            metalness_map: None,
            revision: 0,
        }
    }
}

impl Material {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn mark_updated(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

/// One drawable surface: shared geometry plus an owned material.
#[derive(Debug, Clone)]
pub struct MeshPart {
    pub geometry: Rc<MeshGeometry>,
    pub material: Material,
}

impl MeshPart {
    pub fn new(geometry: MeshGeometry, material: Material) -> Self {
        Self {
            geometry: Rc::new(geometry),
            material,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: Option<String>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub meshes: Vec<MeshPart>,
    pub children: Vec<SceneNode>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: None,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl SceneNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_mesh(mut self, mesh: MeshPart) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Bounds of all geometry under this node, including this node's own
    /// transform, in the space of its parent.
    pub fn world_bounds(&self) -> Aabb {
        self.bounds_under(Mat4::IDENTITY)
    }

    fn bounds_under(&self, parent: Mat4) -> Aabb {
        let world = parent * self.local_matrix();
        let own = self
            .meshes
            .iter()
            .map(|mesh| mesh.geometry.bounds.transformed(&world))
            .fold(Aabb::EMPTY, |acc, b| acc.union(&b));
        self.children
            .iter()
            .map(|child| child.bounds_under(world))
            .fold(own, |acc, b| acc.union(&b))
    }

    /// Remove and return the direct child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<SceneNode> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Depth-first visit of every mesh under this node.
    pub fn for_each_mesh<'a, F: FnMut(&'a MeshPart)>(&'a self, f: &mut F) {
        for mesh in &self.meshes {
            f(mesh);
        }
        for child in &self.children {
            child.for_each_mesh(f);
        }
    }

    pub fn for_each_mesh_mut<F: FnMut(&mut MeshPart)>(&mut self, f: &mut F) {
        for mesh in &mut self.meshes {
            f(mesh);
        }
        for child in &mut self.children {
            child.for_each_mesh_mut(f);
        }
    }

    pub fn all_meshes(&self) -> Vec<&MeshPart> {
        let mut out = Vec::new();
        self.for_each_mesh(&mut |mesh| out.push(mesh));
        out
    }
}

#[cfg(test)]
pub(crate) fn box_mesh(name: &str, min: [f32; 3], max: [f32; 3]) -> MeshPart {
    MeshPart::new(
        MeshGeometry::new(vec![min, max, min]),
        Material::named(name),
    )
}
