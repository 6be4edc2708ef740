// Named shader inputs for one plane: a type tag plus current value per uniform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const GRID_SIZE: &str = "uGridSize";
pub const IMAGE_SIZE: &str = "uImageSize";
pub const PROGRESS: &str = "uAnimationProgress";
pub const TIME: &str = "uTime";
pub const DIRECTION: &str = "uDirection";
pub const POINTER: &str = "uPointer";

/// Current value of a uniform. The variant doubles as the GLSL type tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum UniformValue {
    #[serde(rename = "1f")]
    Float(f32),
    #[serde(rename = "2f")]
    Vec2([f32; 2]),
}

impl UniformValue {
    pub fn type_tag(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "1f",
            UniformValue::Vec2(_) => "2f",
        }
    }
}

/// Uniform declarations of one plane, keyed by GLSL name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UniformSet {
    values: BTreeMap<String, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        UniformSet::default()
    }

    /// Declare (or redeclare) a uniform.
    pub fn declare(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.values.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<[f32; 2]> {
        match self.values.get(name) {
            Some(UniformValue::Vec2(v)) => Some(*v),
            _ => None,
        }
    }

    /// Write a float uniform. Returns false when the name is undeclared or not a float;
    /// writes never change a uniform's declared type.
    pub fn set_float(&mut self, name: &str, value: f32) -> bool {
        match self.values.get_mut(name) {
            Some(UniformValue::Float(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    pub fn set_vec2(&mut self, name: &str, value: [f32; 2]) -> bool {
        match self.values.get_mut(name) {
            Some(UniformValue::Vec2(v)) => {
                *v = value;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_respect_declared_type() {
        let mut set = UniformSet::new();
        set.declare(PROGRESS, UniformValue::Float(0.0));
        set.declare(IMAGE_SIZE, UniformValue::Vec2([10.0, 20.0]));

        assert!(set.set_float(PROGRESS, 0.4));
        assert!(!set.set_float(IMAGE_SIZE, 1.0));
        assert!(!set.set_vec2(PROGRESS, [1.0, 1.0]));
        assert!(!set.set_float(TIME, 1.0));

        assert_eq!(set.float(PROGRESS), Some(0.4));
        assert_eq!(set.vec2(IMAGE_SIZE), Some([10.0, 20.0]));
        assert_eq!(set.get(IMAGE_SIZE).map(|v| v.type_tag()), Some("2f"));
    }

    #[test]
    fn serializes_with_type_tags() {
        let mut set = UniformSet::new();
        set.declare(GRID_SIZE, UniformValue::Float(20.0));
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"values":{"uGridSize":{"type":"1f","value":20.0}}}"#);
    }
}
