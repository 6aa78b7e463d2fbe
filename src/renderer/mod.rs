//! Renderer Stand-ins - Meshes, geometry and materials.
//!
//! Real GPU resources are owned by the host engine. Components only need
//! something to attach to the scene graph and to write appearance into, so
//! these types carry plain state:
//! - [`Material`] - appearance written by initializers, disposed by its owner
//! - [`Geometry`] - which shared geometry a mesh uses
//! - [`Mesh`] - geometry + material + an optional text label

mod material;

pub use material::{live_material_count, Material, MaterialState};

use std::cell::RefCell;
use std::rc::Rc;

/// Shared geometry kinds. Geometry itself is never owned per component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    /// Rounded panel quad used by containers and interaction panels.
    Panel,
    /// Unit plane used by images.
    Plane,
}

/// Text ready for the glyph pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextLayout {
    pub content: String,
    pub font_family: String,
    pub font_url: Option<String>,
    pub font_size: f64,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    label: Rc<RefCell<Option<TextLayout>>>,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            label: Rc::new(RefCell::new(None)),
        }
    }

    pub fn set_label(&self, label: Option<TextLayout>) {
        *self.label.borrow_mut() = label;
    }

    pub fn label(&self) -> Option<TextLayout> {
        self.label.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_clones_share_label_and_material() {
        let mesh = Mesh::new(Geometry::Panel, Material::new());
        let alias = mesh.clone();
        alias.set_label(Some(TextLayout {
            content: "hi".into(),
            ..Default::default()
        }));
        assert_eq!(mesh.label().map(|l| l.content), Some("hi".to_string()));
        assert!(mesh.material.ptr_eq(&alias.material));
        mesh.material.dispose();
    }
}
