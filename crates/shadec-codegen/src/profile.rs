//! Target profile decoding.
//!
//! A profile string such as `vs_4_0`, `ps_3_sw` or `ps_4_0_level_9_1` picks
//! the target shader kind, model version, feature level and software
//! rasterizer flag. Legacy assembler spellings with dots (`ps.2.0`) are
//! accepted alongside the underscore forms. Lookup is by exact name;
//! unknown strings return `None`.

use serde::{Deserialize, Serialize};

/// The pipeline stage (or effect/texture container) a profile targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderKind {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
    Compute,
    Effect,
    Texture,
}

/// A decoded target profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileInfo {
    pub name: &'static str,
    pub kind: ShaderKind,
    pub major: u32,
    pub minor: u32,
    pub level_major: u32,
    pub level_minor: u32,
    pub software: bool,
}

const fn profile(
    name: &'static str,
    kind: ShaderKind,
    major: u32,
    minor: u32,
    level_major: u32,
    level_minor: u32,
    software: bool,
) -> ProfileInfo {
    ProfileInfo {
        name,
        kind,
        major,
        minor,
        level_major,
        level_minor,
        software,
    }
}

static PROFILES: &[ProfileInfo] = &[
    profile("cs_4_0", ShaderKind::Compute, 4, 0, 0, 0, false),
    profile("cs_4_1", ShaderKind::Compute, 4, 1, 0, 0, false),
    profile("cs_5_0", ShaderKind::Compute, 5, 0, 0, 0, false),
    profile("ds_5_0", ShaderKind::Domain, 5, 0, 0, 0, false),
    profile("fx_2_0", ShaderKind::Effect, 2, 0, 0, 0, false),
    profile("fx_4_0", ShaderKind::Effect, 4, 0, 0, 0, false),
    profile("fx_4_1", ShaderKind::Effect, 4, 1, 0, 0, false),
    profile("fx_5_0", ShaderKind::Effect, 5, 0, 0, 0, false),
    profile("gs_4_0", ShaderKind::Geometry, 4, 0, 0, 0, false),
    profile("gs_4_1", ShaderKind::Geometry, 4, 1, 0, 0, false),
    profile("gs_5_0", ShaderKind::Geometry, 5, 0, 0, 0, false),
    profile("hs_5_0", ShaderKind::Hull, 5, 0, 0, 0, false),
    profile("ps.1.0", ShaderKind::Pixel, 1, 0, 0, 0, false),
    profile("ps.1.1", ShaderKind::Pixel, 1, 1, 0, 0, false),
    profile("ps.1.2", ShaderKind::Pixel, 1, 2, 0, 0, false),
    profile("ps.1.3", ShaderKind::Pixel, 1, 3, 0, 0, false),
    profile("ps.1.4", ShaderKind::Pixel, 1, 4, 0, 0, false),
    profile("ps.2.0", ShaderKind::Pixel, 2, 0, 0, 0, false),
    profile("ps.2.a", ShaderKind::Pixel, 2, 1, 0, 0, false),
    profile("ps.2.b", ShaderKind::Pixel, 2, 2, 0, 0, false),
    profile("ps.2.sw", ShaderKind::Pixel, 2, 0, 0, 0, true),
    profile("ps.3.0", ShaderKind::Pixel, 3, 0, 0, 0, false),
    profile("ps_1_0", ShaderKind::Pixel, 1, 0, 0, 0, false),
    profile("ps_1_1", ShaderKind::Pixel, 1, 1, 0, 0, false),
    profile("ps_1_2", ShaderKind::Pixel, 1, 2, 0, 0, false),
    profile("ps_1_3", ShaderKind::Pixel, 1, 3, 0, 0, false),
    profile("ps_1_4", ShaderKind::Pixel, 1, 4, 0, 0, false),
    profile("ps_2_0", ShaderKind::Pixel, 2, 0, 0, 0, false),
    profile("ps_2_a", ShaderKind::Pixel, 2, 1, 0, 0, false),
    profile("ps_2_b", ShaderKind::Pixel, 2, 2, 0, 0, false),
    profile("ps_2_sw", ShaderKind::Pixel, 2, 0, 0, 0, true),
    profile("ps_3_0", ShaderKind::Pixel, 3, 0, 0, 0, false),
    profile("ps_3_sw", ShaderKind::Pixel, 3, 0, 0, 0, true),
    profile("ps_4_0", ShaderKind::Pixel, 4, 0, 0, 0, false),
    profile("ps_4_0_level_9_0", ShaderKind::Pixel, 4, 0, 9, 0, false),
    profile("ps_4_0_level_9_1", ShaderKind::Pixel, 4, 0, 9, 1, false),
    profile("ps_4_0_level_9_3", ShaderKind::Pixel, 4, 0, 9, 3, false),
    profile("ps_4_1", ShaderKind::Pixel, 4, 1, 0, 0, false),
    profile("ps_5_0", ShaderKind::Pixel, 5, 0, 0, 0, false),
    profile("tx_1_0", ShaderKind::Texture, 1, 0, 0, 0, false),
    profile("vs.1.0", ShaderKind::Vertex, 1, 0, 0, 0, false),
    profile("vs.1.1", ShaderKind::Vertex, 1, 1, 0, 0, false),
    profile("vs.2.0", ShaderKind::Vertex, 2, 0, 0, 0, false),
    profile("vs.2.a", ShaderKind::Vertex, 2, 1, 0, 0, false),
    profile("vs.2.sw", ShaderKind::Vertex, 2, 0, 0, 0, true),
    profile("vs.3.0", ShaderKind::Vertex, 3, 0, 0, 0, false),
    profile("vs.3.sw", ShaderKind::Vertex, 3, 0, 0, 0, true),
    profile("vs_1_0", ShaderKind::Vertex, 1, 0, 0, 0, false),
    profile("vs_1_1", ShaderKind::Vertex, 1, 1, 0, 0, false),
    profile("vs_2_0", ShaderKind::Vertex, 2, 0, 0, 0, false),
    profile("vs_2_a", ShaderKind::Vertex, 2, 1, 0, 0, false),
    profile("vs_2_sw", ShaderKind::Vertex, 2, 0, 0, 0, true),
    profile("vs_3_0", ShaderKind::Vertex, 3, 0, 0, 0, false),
    profile("vs_3_sw", ShaderKind::Vertex, 3, 0, 0, 0, true),
    profile("vs_4_0", ShaderKind::Vertex, 4, 0, 0, 0, false),
    profile("vs_4_0_level_9_0", ShaderKind::Vertex, 4, 0, 9, 0, false),
    profile("vs_4_0_level_9_1", ShaderKind::Vertex, 4, 0, 9, 1, false),
    profile("vs_4_0_level_9_3", ShaderKind::Vertex, 4, 0, 9, 3, false),
    profile("vs_4_1", ShaderKind::Vertex, 4, 1, 0, 0, false),
    profile("vs_5_0", ShaderKind::Vertex, 5, 0, 0, 0, false),
];

/// Decodes a profile string. Unknown names return `None`.
pub fn find_profile(name: &str) -> Option<&'static ProfileInfo> {
    PROFILES.iter().find(|p| p.name == name)
}
