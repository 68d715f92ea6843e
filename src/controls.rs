use cgmath::vec3;
use winit::keyboard::{Key, NamedKey};

use crate::{context::RenderContext, mesh::Mesh};

/// How far one arrow key press moves a mesh, in clip space.
pub const MOVE_STEP: f32 = 0.05;
pub const SCALE_STEP: f32 = 1.1;

/// Arrow keys translate the mesh, `+`/`-` scale it and `r` asks for a
/// rotation. Returns whether the key was one of those.
pub fn apply_key<C: RenderContext>(mesh: &mut Mesh<C>, key: Key<&str>) -> bool {
    match key {
        Key::Named(NamedKey::ArrowLeft) => mesh.translate(vec3(-MOVE_STEP, 0.0, 0.0)),
        Key::Named(NamedKey::ArrowRight) => mesh.translate(vec3(MOVE_STEP, 0.0, 0.0)),
        Key::Named(NamedKey::ArrowUp) => mesh.translate(vec3(0.0, MOVE_STEP, 0.0)),
        Key::Named(NamedKey::ArrowDown) => mesh.translate(vec3(0.0, -MOVE_STEP, 0.0)),
        Key::Character("+" | "=") => mesh.scale(vec3(SCALE_STEP, SCALE_STEP, 1.0)),
        Key::Character("-") => mesh.scale(vec3(1.0 / SCALE_STEP, 1.0 / SCALE_STEP, 1.0)),
        Key::Character("r") => {
            if let Err(e) = mesh.rotate(vec3(0.0, 0.0, 15.0)) {
                log::debug!("Ignoring rotate key: {e}");
            }
        }
        _ => return false,
    }
    true
}
