/// glTF/GLB import into [`scene::SceneNode`] trees
pub mod import;
/// Variant selection, centering and scaling
pub mod normalize;
/// Scene graph, materials and bounds
pub mod scene;
/// Largest-surface mesh heuristic
pub mod target;

pub use import::WeaponAsset;
pub use normalize::{NormalizedModel, normalize};
pub use scene::{Aabb, Material, MeshPart, SceneNode};
