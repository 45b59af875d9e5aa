//! Picks the mesh a decal would most plausibly sit on.
//!
//! Sticker placement is currently driven by the offset tables alone; this
//! heuristic is kept for callers that want to project onto real geometry.

use crate::config::ViewerConfig;

use super::scene::{MeshPart, SceneNode};

/// Surface proxy for a box of the given extents: the sum of its three
/// distinct face areas.
fn surface_score(mesh: &MeshPart) -> f32 {
    let size = mesh.geometry.bounds.size();
    size.x * size.y + size.x * size.z + size.y * size.z
}

/// The eligible mesh with the largest bounding-box surface, ignoring
/// excluded materials (scope lenses, arms). Falls back to the first mesh in
/// traversal order when nothing is eligible; `None` only for a model with no
/// meshes at all.
pub fn select_target_mesh<'a>(root: &'a SceneNode, config: &ViewerConfig) -> Option<&'a MeshPart> {
    let meshes = root.all_meshes();

    let mut best: Option<(&MeshPart, f32)> = None;
    for mesh in meshes.iter().copied() {
        if config.is_excluded_material(&mesh.material.name) {
            continue;
        }
        let score = surface_score(mesh);
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((mesh, score));
        }
    }

    best.map(|(mesh, _)| mesh).or_else(|| meshes.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::box_mesh;

    #[test]
    fn largest_surface_wins() {
        let root = SceneNode::group("Scene")
            .with_mesh(box_mesh("grip", [0.0; 3], [0.2, 0.5, 0.2]))
            .with_child(
                SceneNode::group("body").with_mesh(box_mesh("receiver", [0.0; 3], [2.0, 0.5, 0.2])),
            );
        let target = select_target_mesh(&root, &ViewerConfig::default()).unwrap();
        assert_eq!(target.material.name, "receiver");
    }

    #[test]
    fn excluded_materials_are_skipped() {
        let root = SceneNode::group("Scene")
            .with_mesh(box_mesh("awp_scope", [0.0; 3], [5.0, 5.0, 5.0]))
            .with_mesh(box_mesh("bare_arm_left", [0.0; 3], [4.0, 4.0, 4.0]))
            .with_mesh(box_mesh("awp_body", [0.0; 3], [1.0, 0.2, 0.1]));
        let target = select_target_mesh(&root, &ViewerConfig::default()).unwrap();
        assert_eq!(target.material.name, "awp_body");
    }

    #[test]
    fn falls_back_to_first_mesh() {
        let root = SceneNode::group("Scene")
            .with_mesh(box_mesh("scope_glass", [0.0; 3], [1.0; 3]))
            .with_mesh(box_mesh("scope_ring", [0.0; 3], [2.0; 3]));
        let target = select_target_mesh(&root, &ViewerConfig::default()).unwrap();
        assert_eq!(target.material.name, "scope_glass");
    }

    #[test]
    fn no_meshes_no_target() {
        assert!(select_target_mesh(&SceneNode::group("Scene"), &ViewerConfig::default()).is_none());
    }
}
