//! Appearance - Merged properties onto a material.

use std::rc::Rc;

use crate::engine::Subscriptions;
use crate::error::Result;
use crate::properties::{MergedProperties, PropertyValue};
use crate::reactive::{effect, Memo};
use crate::renderer::Material;

/// `visibility: "hidden"` or `visibility: false` hides; anything else shows.
pub fn is_visible(view: &MergedProperties) -> bool {
    match view.read("visibility", None) {
        Some(PropertyValue::Bool(visible)) => visible,
        Some(PropertyValue::Text(value)) => &*value != "hidden",
        _ => true,
    }
}

/// Initializer keeping `material` in sync with the merged view.
///
/// `color_key` picks which property drives the material color; `None`
/// leaves color alone. `src` is mapped onto the texture when present.
pub fn material_initializer(
    merged: Memo<Rc<MergedProperties>>,
    material: Material,
    color_key: Option<&'static str>,
) -> impl FnOnce(&mut Subscriptions) -> Result<()> + 'static {
    move |subs| {
        let sync = effect(move || {
            let view = merged.get();
            if let Some(key) = color_key {
                material.set_color(view.read(key, None));
            }
            material.set_opacity(view.read_number("opacity", 1.0));
            material.set_visible(is_visible(&view));
            material.set_texture(view.read_text("src"));
        });
        subs.register_effect(sync);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{build_merged, record_cell, Conditionals};
    use crate::record;

    #[test]
    fn test_visibility_values() {
        let shown = MergedProperties::from_records(&Conditionals::new(), &[]);
        assert!(is_visible(&shown));

        for (value, expected) in [
            (PropertyValue::from("hidden"), false),
            (PropertyValue::from("visible"), true),
            (PropertyValue::Bool(false), false),
        ] {
            let view = MergedProperties::from_records(
                &Conditionals::new(),
                &[Some(Rc::new(record! { "visibility" => value }))],
            );
            assert_eq!(is_visible(&view), expected);
        }
    }

    #[test]
    fn test_material_follows_merged_view() {
        let style = record_cell(Some(record! { "backgroundColor" => "red", "opacity" => 0.25 }));
        let merged = build_merged(Conditionals::new(), vec![style.read_only()]);
        let material = Material::new();
        let mut subs = Subscriptions::new();

        material_initializer(merged, material.clone(), Some("backgroundColor"))(&mut subs).unwrap();
        assert_eq!(material.color(), Some(PropertyValue::from("red")));
        assert_eq!(material.opacity(), 0.25);

        style.set(Some(Rc::new(record! { "visibility" => "hidden", "src" => "cat.png" })));
        assert_eq!(material.color(), None);
        assert_eq!(material.opacity(), 1.0);
        assert!(!material.visible());
        assert_eq!(material.texture().as_deref(), Some("cat.png"));

        subs.release_all().unwrap();
        style.set(None);
        assert!(!material.visible());
        material.dispose();
    }
}
