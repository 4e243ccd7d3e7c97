//! The embedded WGSL parses, validates, and agrees with the Rust uniform
//! layouts.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Module, ShaderStage, TypeInner};
use umbra::{MeshConstants, SurfaceUniforms};

const SHADOW_DEPTH: &str = include_str!("../src/shaders/shadow_depth.wgsl");
const SCENE: &str = include_str!("../src/shaders/scene.wgsl");
const FLAT: &str = include_str!("../src/shaders/flat.wgsl");

fn load(name: &str, source: &str) -> Module {
    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|e| panic!("{name}: {}", e.emit_to_string(source)));
    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{name}: {e:?}"));
    module
}

/// Size and member offsets of the named struct.
fn struct_layout(module: &Module, name: &str) -> (u32, Vec<(String, u32)>) {
    let (_, ty) = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("struct {name} not found"));
    let TypeInner::Struct { members, span } = &ty.inner else {
        panic!("{name} is not a struct");
    };
    let offsets = members
        .iter()
        .map(|m| (m.name.clone().unwrap_or_default(), m.offset))
        .collect();
    (*span, offsets)
}

fn entry_points(module: &Module) -> Vec<(&str, ShaderStage)> {
    module
        .entry_points
        .iter()
        .map(|ep| (ep.name.as_str(), ep.stage))
        .collect()
}

fn assert_mesh_constants(module: &Module) {
    let (size, offsets) = struct_layout(module, "MeshConstants");
    assert_eq!(size as usize, std::mem::size_of::<MeshConstants>());
    assert_eq!(size, 128);
    assert_eq!(
        offsets,
        [
            ("model_view_projection".to_string(), 0),
            ("shadow_view_projection".to_string(), 64),
        ]
    );
}

fn assert_surface_uniforms(module: &Module) {
    let (size, offsets) = struct_layout(module, "SurfaceUniforms");
    assert_eq!(size as usize, std::mem::size_of::<SurfaceUniforms>());
    assert_eq!(size, 32);

    let rust_offsets = [
        std::mem::offset_of!(SurfaceUniforms, color),
        std::mem::offset_of!(SurfaceUniforms, ambient),
        std::mem::offset_of!(SurfaceUniforms, shadow_bias),
        std::mem::offset_of!(SurfaceUniforms, visualize),
        std::mem::offset_of!(SurfaceUniforms, _pad),
    ];
    let wgsl_offsets: Vec<usize> = offsets.iter().map(|(_, o)| *o as usize).collect();
    assert_eq!(wgsl_offsets, rust_offsets);
}

#[test]
fn shadow_depth_shader_is_vertex_only() {
    let module = load("shadow_depth.wgsl", SHADOW_DEPTH);
    assert_eq!(entry_points(&module), [("vs_main", ShaderStage::Vertex)]);
    assert_mesh_constants(&module);
}

#[test]
fn scene_shader_matches_uniform_layouts() {
    let module = load("scene.wgsl", SCENE);
    assert_eq!(
        entry_points(&module),
        [
            ("vs_main", ShaderStage::Vertex),
            ("fs_main", ShaderStage::Fragment),
        ]
    );
    assert_mesh_constants(&module);
    assert_surface_uniforms(&module);
}

#[test]
fn flat_shader_matches_uniform_layouts() {
    let module = load("flat.wgsl", FLAT);
    assert_eq!(
        entry_points(&module),
        [
            ("vs_main", ShaderStage::Vertex),
            ("fs_main", ShaderStage::Fragment),
        ]
    );
    assert_mesh_constants(&module);
    assert_surface_uniforms(&module);
}

#[test]
fn scene_shader_samples_with_a_comparison_sampler() {
    let module = load("scene.wgsl", SCENE);
    let bindings: Vec<_> = module
        .global_variables
        .iter()
        .filter_map(|(_, var)| {
            let binding = var.binding.as_ref()?;
            Some(((binding.group, binding.binding), &module.types[var.ty].inner))
        })
        .collect();

    let at = |group, binding| {
        bindings
            .iter()
            .find(|(slot, _)| *slot == (group, binding))
            .map(|(_, inner)| *inner)
            .unwrap_or_else(|| panic!("nothing bound at @group({group}) @binding({binding})"))
    };

    assert!(matches!(
        at(1, 0),
        TypeInner::Image {
            class: naga::ImageClass::Depth { multi: false },
            ..
        }
    ));
    assert!(matches!(
        at(1, 1),
        TypeInner::Sampler { comparison: true }
    ));
}
