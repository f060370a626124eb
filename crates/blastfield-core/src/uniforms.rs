//! Named uniform values shared between the CPU pipeline state and the GPU program.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Texture bindings a uniform can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlot {
    /// The packed per-hole data texture.
    HoleData,
    /// The 1D colour-ramp lookup texture.
    ColourRamp,
}

/// Type of a uniform, fixed for the lifetime of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Texture,
}

impl UniformKind {
    /// WGSL spelling, for kinds that can live in a uniform block.
    pub fn wgsl_type(self) -> Option<&'static str> {
        match self {
            Self::Float => Some("f32"),
            Self::Int => Some("i32"),
            Self::UInt => Some("u32"),
            Self::Vec2 => Some("vec2<f32>"),
            Self::Vec3 => Some("vec3<f32>"),
            Self::Vec4 => Some("vec4<f32>"),
            Self::Mat4 | Self::Texture => None,
        }
    }
}

/// A single uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    UInt(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Texture(TextureSlot),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            Self::Float(_) => UniformKind::Float,
            Self::Int(_) => UniformKind::Int,
            Self::UInt(_) => UniformKind::UInt,
            Self::Vec2(_) => UniformKind::Vec2,
            Self::Vec3(_) => UniformKind::Vec3,
            Self::Vec4(_) => UniformKind::Vec4,
            Self::Mat4(_) => UniformKind::Mat4,
            Self::Texture(_) => UniformKind::Texture,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            Self::Mat4(v) => Some(*v),
            _ => None,
        }
    }

    /// Encodes the value into one 16-byte uniform slot.
    ///
    /// Returns `None` for matrices and textures, which never occupy a slot.
    pub fn to_slot(&self) -> Option<[u8; 16]> {
        let mut slot = [0u8; 16];
        match self {
            Self::Float(v) => slot[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Int(v) => slot[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::UInt(v) => slot[..4].copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => slot[..8].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Vec3(v) => slot[..12].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Vec4(v) => slot.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Mat4(_) | Self::Texture(_) => return None,
        }
        Some(slot)
    }
}

/// Outcome of assigning to an existing uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assign {
    /// The stored value changed.
    Changed,
    /// The new value equals the stored one.
    Unchanged,
    /// No uniform of that name exists.
    Missing,
    /// A uniform exists but with a different kind.
    KindMismatch,
}

/// Ordered mapping from uniform name to value.
///
/// Insertion order is preserved; it defines the GPU block layout for model
/// uniforms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSet {
    entries: Vec<(String, UniformValue)>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: UniformValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a uniform. Replacement keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, value: UniformValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Assigns to a uniform only if it already exists with the same kind.
    pub fn assign(&mut self, name: &str, value: UniformValue) -> Assign {
        let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) else {
            return Assign::Missing;
        };
        if entry.1.kind() != value.kind() {
            return Assign::KindMismatch;
        }
        if entry.1 == value {
            return Assign::Unchanged;
        }
        entry.1 = value;
        Assign::Changed
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Appends every entry of `other`, replacing values with the same name.
    pub fn merge(&mut self, other: &UniformSet) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), *value);
        }
    }

    /// Whether every name in `other` is present here.
    pub fn is_superset_of(&self, other: &UniformSet) -> bool {
        other.names().all(|n| self.contains(n))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut set = UniformSet::new()
            .with("b", UniformValue::Float(1.0))
            .with("a", UniformValue::Float(2.0));
        set.insert("b", UniformValue::Float(3.0));
        let names: Vec<_> = set.names().collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(set.get("b"), Some(&UniformValue::Float(3.0)));
    }

    #[test]
    fn test_assign_only_touches_existing_same_kind() {
        let mut set = UniformSet::new().with("k", UniformValue::Float(1.0));
        assert_eq!(set.assign("k", UniformValue::Float(2.0)), Assign::Changed);
        assert_eq!(set.assign("k", UniformValue::Float(2.0)), Assign::Unchanged);
        assert_eq!(set.assign("k", UniformValue::Int(2)), Assign::KindMismatch);
        assert_eq!(set.assign("new", UniformValue::Float(1.0)), Assign::Missing);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_slot_encoding() {
        let slot = UniformValue::Vec3(Vec3::new(1.0, 2.0, 3.0)).to_slot().unwrap();
        assert_eq!(&slot[..], bytemuck::bytes_of(&[1.0f32, 2.0, 3.0, 0.0]));

        let slot = UniformValue::UInt(7).to_slot().unwrap();
        assert_eq!(&slot[..4], &7u32.to_ne_bytes());
        assert!(UniformValue::Texture(TextureSlot::HoleData).to_slot().is_none());
    }
}
