//! Container Primitive - Panel with hover and active states.
//!
//! The fundamental building block. A container owns a panel mesh and its
//! material for its whole life; each generation attaches the panel and
//! keeps the material in sync with the merged properties.
//!
//! # Conditional properties
//!
//! - `hover` - applies while the pointer is over the container
//! - `active` - applies while the pointer is pressed on it
//!
//! Both are driven by the container's own pointer handlers, so the host
//! only has to dispatch `pointerover`, `pointerout`, `pointerdown` and
//! `pointerup` to the container's node. Each generation starts with fresh
//! pointer state: a container moved while hovered is not hovered under its
//! new parent until the pointer says so.
//!
//! # Example
//!
//! ```ignore
//! use spark_uikit::{primitives::Container, record};
//!
//! let card = Container::new()?;
//! card.set_style(Some(record! {
//!     "backgroundColor" => "white",
//!     "hover" => record! { "backgroundColor" => "lightgray" },
//! }), true)?;
//! ```

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use crate::engine::{create_node, release_node, NodeId, NodeKind};
use crate::error::Result;
use crate::properties::{build_merged, Conditionals};
use crate::reactive::{signal, ReadSignal, Signal};
use crate::renderer::{Geometry, Material, Mesh};
use crate::state::events::EventHandler;
use super::appearance::material_initializer;
use super::component::Component;
use super::types::{event_handlers, ComponentKind, ComponentInputs, Internals};

// =============================================================================
// Pointer State
// =============================================================================

/// Hover and press cells of one generation.
#[derive(Clone, Debug)]
struct PointerState {
    hovered: Signal<bool>,
    pressed: Signal<bool>,
}

impl PointerState {
    fn new() -> Self {
        Self {
            hovered: signal(false),
            pressed: signal(false),
        }
    }
}

/// Pointer state of the live generation.
type LivePointer = Rc<RefCell<Option<PointerState>>>;

fn pointer_handlers(state: &PointerState) -> Vec<(&'static str, EventHandler)> {
    let PointerState { hovered, pressed } = state;
    let (over, out, down, up) = (hovered.clone(), (hovered.clone(), pressed.clone()), pressed.clone(), pressed.clone());
    vec![
        ("pointerover", EventHandler::new(move |_| {
            over.set(true);
        })),
        ("pointerout", EventHandler::new(move |_| {
            out.0.set(false);
            out.1.set(false);
        })),
        ("pointerdown", EventHandler::new(move |_| {
            down.set(true);
        })),
        ("pointerup", EventHandler::new(move |_| {
            up.set(false);
        })),
    ]
}

// =============================================================================
// Container Component
// =============================================================================

fn container_kind(panel: NodeId, material: Material, live: LivePointer) -> ComponentKind {
    ComponentKind::new("container", move |args| {
        let pointer = PointerState::new();
        let conditionals = Conditionals::new()
            .with("hover", pointer.hovered.read_only())
            .with("active", pointer.pressed.read_only());
        let merged = build_merged(conditionals, args.inputs());
        let handlers = event_handlers(&merged, pointer_handlers(&pointer));
        *live.borrow_mut() = Some(pointer);

        let released = live.clone();
        Ok(Internals::new(merged.clone(), handlers)
            .with_resource(move || {
                released.borrow_mut().take();
            })
            .with_node(panel)
            .with_initializer(material_initializer(merged, material.clone(), Some("backgroundColor")))
            .with_child_context(args.context.child(args.node)))
    })
}

#[derive(Debug)]
pub struct Container {
    component: Component,
    panel: NodeId,
    material: Material,
    live: LivePointer,
}

impl Container {
    pub fn new() -> Result<Self> {
        Self::with_inputs(ComponentInputs::default())
    }

    /// Create a container that already carries `inputs` when it first binds.
    pub fn with_inputs(inputs: ComponentInputs) -> Result<Self> {
        let material = Material::new();
        let panel = create_node(NodeKind::Mesh(Mesh::new(Geometry::Panel, material.clone())));
        let live: LivePointer = Rc::new(RefCell::new(None));

        let kind = container_kind(panel, material.clone(), live.clone());
        let component = match Component::with_inputs(kind, inputs) {
            Ok(component) => component,
            Err(error) => {
                material.dispose();
                release_node(panel)?;
                return Err(error);
            }
        };

        let owned = material.clone();
        component.own(move || {
            owned.dispose();
        });
        component.own(move || {
            if let Err(error) = release_node(panel) {
                tracing::warn!(node = %panel, %error, "releasing container panel failed");
            }
        });

        Ok(Self {
            component,
            panel,
            material,
            live,
        })
    }

    /// The panel mesh node, attached while bound.
    pub fn panel(&self) -> NodeId {
        self.panel
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Hover cell of the live generation, `None` while unbound.
    pub fn hovered(&self) -> Option<ReadSignal<bool>> {
        self.live.borrow().as_ref().map(|pointer| pointer.hovered.read_only())
    }

    /// Press cell of the live generation, `None` while unbound.
    pub fn pressed(&self) -> Option<ReadSignal<bool>> {
        self.live.borrow().as_ref().map(|pointer| pointer.pressed.read_only())
    }
}

impl Deref for Container {
    type Target = Component;

    fn deref(&self) -> &Component {
        &self.component
    }
}
