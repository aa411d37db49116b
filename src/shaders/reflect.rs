// SPDX-License-Identifier: GPL-3.0-only

//! Stage compilation and resource reflection
//!
//! WGSL stages are parsed and validated with naga before any backend sees
//! them. Reflection collects the named resources a stage declares so
//! uniforms can be written by name, the way a linked GL program exposes
//! its uniform locations.

use crate::constants::uniforms;
use crate::errors::{ShaderError, StageKind};
use crate::gpu::UniformValue;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Bind point of a resource inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingSlot {
    pub group: u32,
    pub binding: u32,
}

/// Uniform buffer resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub slot: BindingSlot,
    /// Size in bytes of the uniform's type
    pub size: u32,
}

/// One validated stage with its reflected resources
#[derive(Debug, Clone)]
pub struct StageModule {
    pub stage: StageKind,
    pub entry_point: String,
    pub source: String,
    pub uniforms: BTreeMap<String, UniformSlot>,
    pub textures: BTreeMap<String, BindingSlot>,
    pub samplers: BTreeMap<String, BindingSlot>,
}

/// Parse, validate and reflect one WGSL stage
///
/// The module must contain an entry point for `stage`; the first one found
/// is used.
pub fn compile_stage(source: &str, stage: StageKind) -> Result<StageModule, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
        stage,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| ShaderError::Validation {
            stage,
            message: e.emit_to_string(source),
        })?;

    let wanted = match stage {
        StageKind::Vertex => naga::ShaderStage::Vertex,
        StageKind::Fragment => naga::ShaderStage::Fragment,
    };
    let entry_point = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == wanted)
        .map(|ep| ep.name.clone())
        .ok_or(ShaderError::MissingEntryPoint(stage))?;

    let mut uniforms = BTreeMap::new();
    let mut textures = BTreeMap::new();
    let mut samplers = BTreeMap::new();

    for (_, var) in module.global_variables.iter() {
        let (Some(name), Some(binding)) = (var.name.as_ref(), var.binding.as_ref()) else {
            continue;
        };
        let slot = BindingSlot {
            group: binding.group,
            binding: binding.binding,
        };
        let inner = &module.types[var.ty].inner;

        match var.space {
            naga::AddressSpace::Uniform => {
                let size = inner.size(module.to_ctx());
                uniforms.insert(name.clone(), UniformSlot { slot, size });
            }
            naga::AddressSpace::Handle => match inner {
                naga::TypeInner::Image { .. } => {
                    textures.insert(name.clone(), slot);
                }
                naga::TypeInner::Sampler { .. } => {
                    samplers.insert(name.clone(), slot);
                }
                _ => {}
            },
            _ => {}
        }
    }

    debug!(
        %stage,
        entry_point = %entry_point,
        uniforms = uniforms.len(),
        textures = textures.len(),
        samplers = samplers.len(),
        "Compiled shader stage"
    );

    Ok(StageModule {
        stage,
        entry_point,
        source: source.to_string(),
        uniforms,
        textures,
        samplers,
    })
}

/// Resources of a linked program, merged from both stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramLayout {
    pub uniforms: BTreeMap<String, UniformSlot>,
    pub textures: BTreeMap<String, BindingSlot>,
    pub samplers: BTreeMap<String, BindingSlot>,
}

impl ProgramLayout {
    /// Merge two stages, checking they agree on every shared bind point
    ///
    /// All resources must live in group 0. A name declared by both stages
    /// must use the same slot, and a slot may only carry one name.
    pub fn link(vertex: &StageModule, fragment: &StageModule) -> Result<Self, ShaderError> {
        if vertex.stage != StageKind::Vertex {
            return Err(ShaderError::Link(format!(
                "expected a vertex stage, got {}",
                vertex.stage
            )));
        }
        if fragment.stage != StageKind::Fragment {
            return Err(ShaderError::Link(format!(
                "expected a fragment stage, got {}",
                fragment.stage
            )));
        }

        let mut layout = Self::default();
        let mut owners: BTreeMap<BindingSlot, String> = BTreeMap::new();

        for stage in [vertex, fragment] {
            for (name, uniform) in &stage.uniforms {
                claim(&mut owners, name, uniform.slot)?;
                match layout.uniforms.insert(name.clone(), *uniform) {
                    Some(existing) if existing != *uniform => {
                        return Err(ShaderError::Link(format!(
                            "uniform `{}` declared differently in the two stages",
                            name
                        )));
                    }
                    _ => {}
                }
            }
            for (name, slot) in &stage.textures {
                claim(&mut owners, name, *slot)?;
                layout.textures.insert(name.clone(), *slot);
            }
            for (name, slot) in &stage.samplers {
                claim(&mut owners, name, *slot)?;
                layout.samplers.insert(name.clone(), *slot);
            }
        }

        Ok(layout)
    }

    /// Whether `value` can be written to the uniform called `name`
    ///
    /// `texture` names the sampler unit of the program's input texture and
    /// takes an integer when the program samples a texture.
    pub fn accepts(&self, name: &str, value: &UniformValue) -> bool {
        if name == uniforms::TEXTURE && matches!(value, UniformValue::Int(_)) {
            return !self.textures.is_empty();
        }
        match self.uniforms.get(name) {
            Some(uniform) if uniform.size as usize == value.byte_size() => true,
            Some(uniform) => {
                warn!(
                    name,
                    expected = uniform.size,
                    got = value.byte_size(),
                    "Uniform size mismatch"
                );
                false
            }
            None => false,
        }
    }

    /// Every bind point in slot order
    pub fn slots(&self) -> Vec<BindingSlot> {
        let mut slots: Vec<BindingSlot> = self
            .uniforms
            .values()
            .map(|u| u.slot)
            .chain(self.textures.values().copied())
            .chain(self.samplers.values().copied())
            .collect();
        slots.sort();
        slots.dedup();
        slots
    }
}

fn claim(
    owners: &mut BTreeMap<BindingSlot, String>,
    name: &str,
    slot: BindingSlot,
) -> Result<(), ShaderError> {
    if slot.group != 0 {
        return Err(ShaderError::Link(format!(
            "`{}` uses bind group {}, only group 0 is supported",
            name, slot.group
        )));
    }
    match owners.get(&slot) {
        Some(owner) if owner != name => Err(ShaderError::Link(format!(
            "`{}` and `{}` share binding {}",
            owner, name, slot.binding
        ))),
        Some(_) => Ok(()),
        None => {
            owners.insert(slot, name.to_string());
            Ok(())
        }
    }
}
