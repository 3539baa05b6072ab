use std::borrow::Cow;
use std::collections::BTreeMap;

use glam::Vec3;

use crate::texture::Texture;

/// Uniform holding the eased hover amount.
pub const HOVER_STATE: &str = "hover_state";
/// Logo shown while idle.
pub const LOGO_PRIMARY: &str = "logo_primary";
/// Logo revealed on hover.
pub const LOGO_SECONDARY: &str = "logo_secondary";
/// Displacement map driving the transition.
pub const DISPLACEMENT: &str = "displacement";

/// Which faces are drawn and hit by rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// A single material property. Only populated texture slots own GPU
/// resources.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialProperty {
    Float(f32),
    Vec3(Vec3),
    Texture(Option<Texture>),
}

impl MaterialProperty {
    /// The texture this property owns, if any.
    pub fn disposable(&self) -> Option<&Texture> {
        match self {
            MaterialProperty::Texture(Some(texture)) => Some(texture),
            _ => None,
        }
    }
}

/// Material running custom vertex and fragment shaders over named uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub vertex_shader: Cow<'static, str>,
    pub fragment_shader: Cow<'static, str>,
    pub side: Side,
    uniforms: BTreeMap<String, MaterialProperty>,
}

impl ShaderMaterial {
    pub fn new(
        vertex_shader: impl Into<Cow<'static, str>>,
        fragment_shader: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            side: Side::default(),
            uniforms: BTreeMap::new(),
        }
    }

    pub fn with_uniform(mut self, name: &str, value: MaterialProperty) -> Self {
        self.uniforms.insert(name.to_string(), value);
        self
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.uniforms
            .insert(name.to_string(), MaterialProperty::Float(value));
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name) {
            Some(MaterialProperty::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn set_texture(&mut self, name: &str, texture: Option<Texture>) {
        self.uniforms
            .insert(name.to_string(), MaterialProperty::Texture(texture));
    }

    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.uniforms.get(name).and_then(MaterialProperty::disposable)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &MaterialProperty)> {
        self.uniforms
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Every texture held by any property, in property-name order.
    pub fn disposables(&self) -> impl Iterator<Item = &Texture> {
        self.uniforms.values().filter_map(MaterialProperty::disposable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::tests::MemoryFetcher;
    use crate::texture::TextureLoader;
    use std::sync::Arc;

    #[test]
    fn float_uniforms_round_trip_by_name() {
        let mut material = ShaderMaterial::new("vs", "fs");
        assert_eq!(material.float(HOVER_STATE), None);
        material.set_float(HOVER_STATE, 0.25);
        assert_eq!(material.float(HOVER_STATE), Some(0.25));
        assert_eq!(material.side, Side::Front);
    }

    #[test]
    fn disposables_skip_empty_and_non_texture_values() {
        let mut loader = TextureLoader::with_fetcher(Arc::new(MemoryFetcher::default()));
        let logo = loader.load("logo.png");
        let material = ShaderMaterial::new("vs", "fs")
            .with_uniform(HOVER_STATE, MaterialProperty::Float(0.0))
            .with_uniform("tint", MaterialProperty::Vec3(Vec3::ONE))
            .with_uniform("normal_map", MaterialProperty::Texture(None))
            .with_uniform(LOGO_PRIMARY, MaterialProperty::Texture(Some(logo.clone())));
        loader.join_pending();

        let textures: Vec<_> = material.disposables().collect();
        assert_eq!(textures, vec![&logo]);
        assert_eq!(material.properties().count(), 4);
        assert!(material.texture("normal_map").is_none());
        assert!(material.texture(HOVER_STATE).is_none());
    }
}
