//! WGSL assembly for analytics programs.
//!
//! A program is the shared base (bindings, hole accessors, vertex stage),
//! a generated block describing the model's uniforms and hole fields, the
//! model's own `model_value` function, and the shared colour-mapping
//! fragment entry point.

use std::fmt::Write as _;

use crate::encoder::{HoleLayout, FLOATS_PER_TEXEL};
use crate::error::{AnalyticsError, Result};
use crate::model::AnalyticsModel;
use crate::uniforms::{UniformKind, UniformSet};

const BASE_SOURCE: &str = include_str!("shaders/analytics_base.wgsl");
const FRAGMENT_SOURCE: &str = include_str!("shaders/analytics_fragment.wgsl");

/// Member emitted when a model has no uniforms; WGSL structs cannot be empty.
const RESERVED_MEMBER: &str = "reserved";

const WGSL_KEYWORDS: &[&str] = &[
    "alias", "break", "case", "const", "const_assert", "continue", "continuing", "default",
    "diagnostic", "discard", "else", "enable", "false", "fn", "for", "if", "let", "loop",
    "override", "requires", "return", "struct", "switch", "true", "var", "while", "f32", "i32",
    "u32", "bool", "f16",
];

/// Words WGSL reserves for future use; also rejected as identifiers.
const WGSL_RESERVED: &[&str] = &[
    "NULL", "Self", "abstract", "active", "alignas", "alignof", "as", "asm", "asm_fragment",
    "async", "attribute", "auto", "await", "become", "binding_array", "cast", "catch", "class",
    "co_await", "co_return", "co_yield", "coherent", "column_major", "common", "compile",
    "compile_fragment", "concept", "const_cast", "consteval", "constexpr", "constinit", "crate",
    "debugger", "decltype", "delete", "demote", "demote_to_helper", "do", "dynamic_cast", "enum",
    "explicit", "export", "extends", "extern", "external", "fallthrough", "filter", "final",
    "finally", "friend", "from", "fxgroup", "get", "goto", "groupshared", "highp", "impl",
    "implements", "import", "inline", "instanceof", "interface", "layout", "lowp", "macro",
    "macro_rules", "match", "mediump", "meta", "mod", "module", "move", "mut", "mutable",
    "namespace", "new", "nil", "noexcept", "noinline", "nointerpolation", "noperspective", "null",
    "nullptr", "of", "operator", "package", "packoffset", "partition", "pass", "patch",
    "pixelfragment", "precise", "precision", "premerge", "priv", "protected", "pub", "public",
    "readonly", "ref", "regardless", "register", "reinterpret_cast", "require", "resource",
    "restrict", "self", "set", "shared", "sizeof", "smooth", "snorm", "static", "static_assert",
    "static_cast", "std", "subroutine", "super", "target", "template", "this", "thread_local",
    "throw", "trait", "try", "type", "typedef", "typeid", "typename", "typeof", "union", "unless",
    "unorm", "unsafe", "unsized", "use", "using", "varying", "virtual", "volatile", "wgsl",
    "where", "with", "writeonly", "yield",
];

/// Prefix of the generated padding members; model uniforms may not use it.
pub const PADDING_PREFIX: &str = "_pad";

/// 4-byte words needed after a member of `kind` to fill its 16-byte slot.
fn padding_words(kind: UniformKind) -> usize {
    match kind {
        UniformKind::Vec2 => 2,
        UniformKind::Vec3 => 1,
        UniformKind::Vec4 => 0,
        _ => 3,
    }
}

fn write_slot(out: &mut String, slot: usize, name: &str, ty: &str, padding: usize) {
    let _ = writeln!(out, "    {name}: {ty},");
    for word in 0..padding {
        let _ = writeln!(out, "    {PADDING_PREFIX}{slot}_{word}: u32,");
    }
}

/// Whether `name` can be used as a WGSL struct member.
pub fn is_wgsl_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if name == "_" || name.starts_with("__") {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !WGSL_KEYWORDS.contains(&name)
        && !WGSL_RESERVED.contains(&name)
}

/// Fully assembled shader source for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    /// Complete WGSL module with `vs_main` and `fs_main`.
    pub wgsl: String,
    /// Model uniform names in block order; slot `i` lives at byte `16 * i`.
    pub model_block: Vec<String>,
}

impl ProgramSource {
    /// Assembles the program for `model` reading records in `layout`.
    ///
    /// `model_uniforms` fixes the member list of the generated block; later
    /// parameter changes may alter values but never the members.
    pub fn assemble(
        model: &dyn AnalyticsModel,
        layout: &HoleLayout,
        model_uniforms: &UniformSet,
    ) -> Result<Self> {
        let mut generated = String::new();
        let mut model_block = Vec::with_capacity(model_uniforms.len());

        // Writing into a String cannot fail.
        let _ = writeln!(
            generated,
            "const HOLE_TEXELS: u32 = {}u;\n",
            layout.texels_per_hole()
        );

        // Every member fills a 16-byte slot through explicit padding, so the
        // layout is the same under std140 (GL) and WGSL rules.
        generated.push_str("struct ModelUniforms {\n");
        for (i, (name, value)) in model_uniforms.iter().enumerate() {
            let kind = value.kind();
            let ty = kind.wgsl_type().ok_or_else(|| AnalyticsError::InvalidModel {
                model: model.name().to_string(),
                reason: format!("uniform '{name}' cannot live in the model block"),
            })?;
            write_slot(&mut generated, i, name, ty, padding_words(kind));
            model_block.push(name.to_string());
        }
        if model_block.is_empty() {
            write_slot(&mut generated, 0, RESERVED_MEMBER, "f32", 3);
        }
        generated.push_str("}\n\n@group(0) @binding(1) var<uniform> model: ModelUniforms;\n\n");

        for &field in layout.fields() {
            let Some(slot) = layout.slot_of(field) else {
                continue;
            };
            let texel = slot / FLOATS_PER_TEXEL;
            let component = ["x", "y", "z", "w"][slot % FLOATS_PER_TEXEL];
            let _ = writeln!(
                generated,
                "fn hole_{}(i: u32) -> f32 {{\n    return hole_texel(i, {texel}u).{component};\n}}\n",
                field.wgsl_name()
            );
        }

        let wgsl = format!(
            "{BASE_SOURCE}\n// ---- generated for '{}' ----\n{generated}\n{}\n{FRAGMENT_SOURCE}",
            model.name(),
            model.fragment_source()
        );

        Ok(Self { wgsl, model_block })
    }

    /// Number of 16-byte slots in the model uniform block (at least one).
    pub fn model_block_slots(&self) -> usize {
        self.model_block.len().max(1)
    }
}
