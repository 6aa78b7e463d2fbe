//! Material - Shared appearance state for a mesh.
//!
//! Stands in for a GPU material: initializers write appearance into it and
//! the owner disposes it exactly once. A thread-local live count makes leaks
//! observable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::properties::PropertyValue;

thread_local! {
    static LIVE_MATERIALS: Cell<usize> = const { Cell::new(0) };
}

/// Number of materials created on this thread and not yet disposed.
pub fn live_material_count() -> usize {
    LIVE_MATERIALS.with(|count| count.get())
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialState {
    pub color: Option<PropertyValue>,
    pub opacity: f64,
    pub visible: bool,
    pub texture: Option<Rc<str>>,
    pub disposed: bool,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            color: None,
            opacity: 1.0,
            visible: true,
            texture: None,
            disposed: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    state: Rc<RefCell<MaterialState>>,
}

impl Material {
    pub fn new() -> Self {
        LIVE_MATERIALS.with(|count| count.set(count.get() + 1));
        Self {
            state: Rc::new(RefCell::new(MaterialState::default())),
        }
    }

    pub fn set_color(&self, color: Option<PropertyValue>) {
        self.state.borrow_mut().color = color;
    }

    pub fn set_opacity(&self, opacity: f64) {
        self.state.borrow_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_visible(&self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    pub fn set_texture(&self, texture: Option<Rc<str>>) {
        self.state.borrow_mut().texture = texture;
    }

    pub fn color(&self) -> Option<PropertyValue> {
        self.state.borrow().color.clone()
    }

    pub fn opacity(&self) -> f64 {
        self.state.borrow().opacity
    }

    pub fn visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn texture(&self) -> Option<Rc<str>> {
        self.state.borrow().texture.clone()
    }

    pub fn snapshot(&self) -> MaterialState {
        self.state.borrow().clone()
    }

    /// Release the material. Returns false if it was already disposed.
    pub fn dispose(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disposed {
            return false;
        }
        state.disposed = true;
        LIVE_MATERIALS.with(|count| count.set(count.get().saturating_sub(1)));
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}
