//! Image Primitive - Textured plane.
//!
//! A leaf component owning a plane mesh and its material. The `src`
//! property becomes the material's texture; `opacity` and `visibility`
//! apply as on containers.

use std::ops::Deref;

use crate::engine::{create_node, release_node, NodeId, NodeKind};
use crate::error::Result;
use crate::properties::{build_merged, Conditionals};
use crate::renderer::{Geometry, Material, Mesh};
use super::appearance::material_initializer;
use super::component::Component;
use super::types::{event_handlers, ComponentInputs, ComponentKind, Internals};

fn image_kind(plane: NodeId, material: Material) -> ComponentKind {
    ComponentKind::new("image", move |args| {
        let merged = build_merged(Conditionals::new(), args.inputs());
        let handlers = event_handlers(&merged, Vec::new());
        Ok(Internals::new(merged.clone(), handlers)
            .with_node(plane)
            .with_initializer(material_initializer(merged, material.clone(), None)))
    })
}

#[derive(Debug)]
pub struct Image {
    component: Component,
    plane: NodeId,
    material: Material,
}

impl Image {
    pub fn new() -> Result<Self> {
        Self::with_inputs(ComponentInputs::default())
    }

    pub fn with_inputs(inputs: ComponentInputs) -> Result<Self> {
        let material = Material::new();
        let plane = create_node(NodeKind::Mesh(Mesh::new(Geometry::Plane, material.clone())));

        let component = match Component::with_inputs(image_kind(plane, material.clone()), inputs) {
            Ok(component) => component,
            Err(error) => {
                material.dispose();
                release_node(plane)?;
                return Err(error);
            }
        };

        let owned = material.clone();
        component.own(move || {
            owned.dispose();
        });
        component.own(move || {
            if let Err(error) = release_node(plane) {
                tracing::warn!(node = %plane, %error, "releasing image plane failed");
            }
        });

        Ok(Self {
            component,
            plane,
            material,
        })
    }

    pub fn plane(&self) -> NodeId {
        self.plane
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}

impl Deref for Image {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RootConfig;
    use crate::engine::{add_child, children_of, reset_registry};
    use crate::record;
    use crate::state::events::reset_listeners;
    use super::super::root::Root;

    #[test]
    fn test_src_maps_to_texture() {
        reset_registry();
        reset_listeners();
        let root = Root::new(RootConfig::default()).unwrap();
        let image = Image::new().unwrap();
        image
            .set_properties(Some(record! { "src" => "cat.png", "opacity" => 0.5 }))
            .unwrap();
        assert!(image.material().texture().is_none());

        add_child(root.node(), image.node()).unwrap();
        assert_eq!(children_of(image.node()), vec![image.plane()]);
        assert_eq!(image.material().texture().as_deref(), Some("cat.png"));
        assert_eq!(image.material().opacity(), 0.5);

        image.set_style(Some(record! { "visibility" => "hidden" }), false).unwrap();
        assert!(!image.material().visible());
    }

    #[test]
    fn test_created_with_inputs() {
        reset_registry();
        reset_listeners();
        let root = Root::new(RootConfig::default()).unwrap();
        let image = Image::with_inputs(ComponentInputs::default().with_style(record! { "src" => "dog.png" }))
            .unwrap();

        add_child(root.node(), image.node()).unwrap();
        assert_eq!(image.material().texture().as_deref(), Some("dog.png"));
        assert_eq!(image.generation(), 1);
    }

    #[test]
    fn test_image_destroy_disposes_material() {
        reset_registry();
        reset_listeners();
        let image = Image::new().unwrap();
        image.destroy().unwrap();
        assert!(image.material().is_disposed());
    }
}
