// SPDX-License-Identifier: GPL-3.0-only

//! Command recording render context
//!
//! Nothing is executed. Every call is appended to a log that can be
//! printed (the `trace` CLI command) or inspected in tests. Programs still
//! go through the real link checks, so uniform lookups behave as they do
//! on a GPU.

use super::{RenderContext, UniformValue};
use crate::errors::ShaderError;
use crate::mesh::MeshData;
use crate::shaders::{ProgramLayout, StageModule};
use std::cell::{Cell, RefCell};
use std::fmt;
use tracing::trace;

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    LinkProgram { program: u32 },
    UseProgram { program: u32 },
    SetUniform { program: u32, name: String, value: UniformValue },
    CreateMesh { mesh: u32, vertices: usize, indices: usize },
    Clear { color: [f32; 4] },
    BindTexture { texture: u32 },
    DrawMesh { mesh: u32, program: Option<u32> },
    BeginFrame { target: u32 },
    EndFrame { target: u32, success: bool },
}

impl fmt::Display for GpuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuCommand::LinkProgram { program } => write!(f, "link_program #{}", program),
            GpuCommand::UseProgram { program } => write!(f, "use_program #{}", program),
            GpuCommand::SetUniform {
                program,
                name,
                value,
            } => match value {
                UniformValue::Mat4(m) => {
                    write!(f, "set_uniform #{} {} = mat4 {:?}", program, name, m)
                }
                UniformValue::Vec2(v) => {
                    write!(f, "set_uniform #{} {} = vec2 {:?}", program, name, v)
                }
                UniformValue::Int(i) => write!(f, "set_uniform #{} {} = {}", program, name, i),
            },
            GpuCommand::CreateMesh {
                mesh,
                vertices,
                indices,
            } => write!(
                f,
                "create_mesh #{} ({} vertices, {} indices)",
                mesh, vertices, indices
            ),
            GpuCommand::Clear { color } => write!(f, "clear {:?}", color),
            GpuCommand::BindTexture { texture } => write!(f, "bind_texture #{}", texture),
            GpuCommand::DrawMesh { mesh, program } => match program {
                Some(program) => write!(f, "draw_mesh #{} with program #{}", mesh, program),
                None => write!(f, "draw_mesh #{} with no program", mesh),
            },
            GpuCommand::BeginFrame { target } => write!(f, "begin_frame -> texture #{}", target),
            GpuCommand::EndFrame { target, success } => {
                write!(f, "end_frame texture #{} success={}", target, success)
            }
        }
    }
}

/// Linked program handle
#[derive(Debug, Clone)]
pub struct RecordedProgram {
    pub id: u32,
    pub layout: ProgramLayout,
}

/// Uploaded mesh handle
#[derive(Debug, Clone, Copy)]
pub struct RecordedMesh {
    pub id: u32,
    pub index_count: u32,
}

/// Texture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedTexture {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

/// Render context that logs instead of drawing
#[derive(Default)]
pub struct RecordingContext {
    commands: RefCell<Vec<GpuCommand>>,
    next_id: Cell<u32>,
    current_program: Cell<Option<u32>>,
    fail_links: Cell<bool>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn record(&self, command: GpuCommand) {
        trace!(%command, "GPU command");
        self.commands.borrow_mut().push(command);
    }

    /// Texture handle of the given size
    pub fn create_texture(&self, width: u32, height: u32) -> RecordedTexture {
        RecordedTexture {
            id: self.allocate_id(),
            width,
            height,
        }
    }

    /// Make every following link fail, like a driver rejecting the program
    pub fn set_link_failure(&self, fail: bool) {
        self.fail_links.set(fail);
    }

    /// Copy of the log so far
    pub fn commands(&self) -> Vec<GpuCommand> {
        self.commands.borrow().clone()
    }

    /// Take the log, leaving it empty
    pub fn take_commands(&self) -> Vec<GpuCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .borrow()
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawMesh { .. }))
            .count()
    }

    pub fn clear_count(&self) -> usize {
        self.commands
            .borrow()
            .iter()
            .filter(|c| matches!(c, GpuCommand::Clear { .. }))
            .count()
    }

    /// Last value written to `name`, in any program
    pub fn last_uniform(&self, name: &str) -> Option<UniformValue> {
        self.commands.borrow().iter().rev().find_map(|c| match c {
            GpuCommand::SetUniform {
                name: n, value, ..
            } if n == name => Some(*value),
            _ => None,
        })
    }
}

impl RenderContext for RecordingContext {
    type Program = RecordedProgram;
    type Mesh = RecordedMesh;
    type Texture = RecordedTexture;

    fn link_program(
        &self,
        vertex: &StageModule,
        fragment: &StageModule,
    ) -> Result<Self::Program, ShaderError> {
        if self.fail_links.get() {
            return Err(ShaderError::Link("link rejected by recording context".into()));
        }
        let layout = ProgramLayout::link(vertex, fragment)?;
        let id = self.allocate_id();
        self.record(GpuCommand::LinkProgram { program: id });
        Ok(RecordedProgram { id, layout })
    }

    fn use_program(&self, program: &Self::Program) {
        self.current_program.set(Some(program.id));
        self.record(GpuCommand::UseProgram {
            program: program.id,
        });
    }

    fn set_uniform(&self, program: &Self::Program, name: &str, value: UniformValue) -> bool {
        if !program.layout.accepts(name, &value) {
            return false;
        }
        self.record(GpuCommand::SetUniform {
            program: program.id,
            name: name.to_string(),
            value,
        });
        true
    }

    fn create_mesh(&self, data: &MeshData) -> Self::Mesh {
        let id = self.allocate_id();
        self.record(GpuCommand::CreateMesh {
            mesh: id,
            vertices: data.vertices.len(),
            indices: data.indices.len(),
        });
        RecordedMesh {
            id,
            index_count: data.index_count(),
        }
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(GpuCommand::Clear { color });
    }

    fn bind_texture(&self, texture: &Self::Texture) {
        self.record(GpuCommand::BindTexture { texture: texture.id });
    }

    fn draw_mesh(&self, mesh: &Self::Mesh) {
        self.record(GpuCommand::DrawMesh {
            mesh: mesh.id,
            program: self.current_program.get(),
        });
    }

    fn draw_to_texture(&self, target: &Self::Texture, draw: &mut dyn FnMut() -> bool) -> bool {
        self.record(GpuCommand::BeginFrame { target: target.id });
        let success = draw();
        self.record(GpuCommand::EndFrame {
            target: target.id,
            success,
        });
        success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_to_texture_brackets_frame() {
        let ctx = RecordingContext::new();
        let target = ctx.create_texture(64, 32);
        let mesh = ctx.create_mesh(&MeshData::plane(2.0));
        ctx.take_commands();

        let ok = ctx.draw_to_texture(&target, &mut || {
            ctx.clear([0.0; 4]);
            ctx.draw_mesh(&mesh);
            true
        });
        assert!(ok);

        let commands = ctx.commands();
        assert_eq!(commands.first(), Some(&GpuCommand::BeginFrame { target: target.id }));
        assert_eq!(
            commands.last(),
            Some(&GpuCommand::EndFrame {
                target: target.id,
                success: true
            })
        );
        assert_eq!(ctx.draw_count(), 1);
        assert_eq!(ctx.clear_count(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let ctx = RecordingContext::new();
        let a = ctx.create_texture(1, 1);
        let b = ctx.create_texture(1, 1);
        assert_ne!(a.id, b.id);
    }
}
