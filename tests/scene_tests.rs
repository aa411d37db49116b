// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for scene init and draw

use gst_vr::camera::{ArcballCamera, Camera, HmdCamera, StaticTracker};
use gst_vr::constants::CLEAR_COLOR;
use gst_vr::errors::{VrError, VrResult};
use gst_vr::gpu::{GpuCommand, RecordingContext, UniformValue};
use gst_vr::math;
use gst_vr::mesh::{Mesh, MeshData};
use gst_vr::scene::{Node, ProjectionMode, Scene, SceneSetup};
use gst_vr::shaders::{MVP_UV, Shader, TEXTURE_UV, WARP};
use std::sync::Arc;

type Ctx = RecordingContext;

fn empty_scene() -> Scene<Ctx> {
    Scene::new(
        Box::new(ArcballCamera::new()),
        ProjectionMode::Camera,
        Box::new(|_: &Ctx, _: &SceneSetup| -> VrResult<Vec<Node<Ctx>>> { Ok(Vec::new()) }),
    )
}

fn two_node_scene(mode: ProjectionMode) -> Scene<Ctx> {
    Scene::new(
        Box::new(ArcballCamera::new()),
        mode,
        Box::new(|ctx: &Ctx, setup: &SceneSetup| -> VrResult<Vec<Node<Ctx>>> {
            let sphere = Node::new(
                Mesh::upload(ctx, &MeshData::sphere(1.0, 8, 8)),
                Shader::from_assets(ctx, MVP_UV, TEXTURE_UV)?,
            );
            let plane = Node::new(
                Mesh::upload(ctx, &MeshData::plane(setup.aspect)),
                Shader::from_assets(ctx, MVP_UV, WARP)?,
            )
            .with_uniform("screen_size", UniformValue::Vec2([640.0, 480.0]));
            Ok(vec![sphere, plane])
        }),
    )
}

fn mesh_ids(ctx: &Ctx) -> Vec<u32> {
    ctx.commands()
        .iter()
        .filter_map(|c| match c {
            GpuCommand::CreateMesh { mesh, .. } => Some(*mesh),
            _ => None,
        })
        .collect()
}

#[test]
fn test_empty_scene_draw_only_clears() {
    let ctx = RecordingContext::new();
    let mut scene = empty_scene();
    scene.init(&ctx).unwrap();

    assert!(scene.draw(&ctx).is_ok());
    assert_eq!(ctx.clear_count(), 1);
    assert_eq!(ctx.draw_count(), 0);
    assert_eq!(
        ctx.commands(),
        vec![GpuCommand::Clear { color: CLEAR_COLOR }]
    );
}

#[test]
fn test_init_sets_texture_unit() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Camera);
    scene.init(&ctx).unwrap();

    let texture_writes = ctx
        .commands()
        .iter()
        .filter(|c| {
            matches!(c, GpuCommand::SetUniform { name, value: UniformValue::Int(0), .. } if name == "texture")
        })
        .count();
    assert_eq!(texture_writes, 2);
    assert!(scene.is_initialized());
    assert_eq!(scene.nodes().len(), 2);
}

#[test]
fn test_draw_follows_insertion_order() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Camera);
    scene.init(&ctx).unwrap();
    let meshes = mesh_ids(&ctx);
    ctx.take_commands();

    scene.draw(&ctx).unwrap();

    let drawn: Vec<u32> = ctx
        .commands()
        .iter()
        .filter_map(|c| match c {
            GpuCommand::DrawMesh { mesh, .. } => Some(*mesh),
            _ => None,
        })
        .collect();
    assert_eq!(drawn, meshes);
    assert_eq!(ctx.commands()[0], GpuCommand::Clear { color: CLEAR_COLOR });
}

#[test]
fn test_node_uniforms_are_uploaded() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Camera);
    scene.init(&ctx).unwrap();
    ctx.take_commands();

    scene.draw(&ctx).unwrap();
    assert_eq!(
        ctx.last_uniform("screen_size"),
        Some(UniformValue::Vec2([640.0, 480.0]))
    );

    scene.set_node_uniform("screen_size", UniformValue::Vec2([800.0, 600.0]));
    scene.draw(&ctx).unwrap();
    assert_eq!(
        ctx.last_uniform("screen_size"),
        Some(UniformValue::Vec2([800.0, 600.0]))
    );
}

#[test]
fn test_camera_mode_uploads_view_projection() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Camera);
    scene.set_aspect(1920, 1080);
    scene.init(&ctx).unwrap();
    scene.draw(&ctx).unwrap();

    let expected = math::to_float_array(&scene.camera().view_projection());
    assert_eq!(ctx.last_uniform("mvp"), Some(UniformValue::Mat4(expected)));
}

#[test]
fn test_orthographic_mode_ignores_camera() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Orthographic);
    scene.set_aspect(1600, 800);
    scene.init(&ctx).unwrap();
    scene.draw(&ctx).unwrap();

    let expected = math::to_float_array(&math::ortho(-2.0, 2.0, -1.0, 1.0, -1.0, 1.0));
    assert_eq!(ctx.last_uniform("mvp"), Some(UniformValue::Mat4(expected)));
}

#[test]
fn test_second_init_does_nothing() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Camera);
    scene.init(&ctx).unwrap();
    ctx.take_commands();

    scene.init(&ctx).unwrap();
    assert!(ctx.commands().is_empty());
    assert_eq!(scene.nodes().len(), 2);
}

#[test]
fn test_detached_hmd_fails_init_without_gpu_calls() {
    let ctx = RecordingContext::new();
    let mut scene = Scene::new(
        Box::new(HmdCamera::new(Arc::new(StaticTracker::detached()))),
        ProjectionMode::Camera,
        Box::new(|ctx: &Ctx, _: &SceneSetup| -> VrResult<Vec<Node<Ctx>>> {
            Ok(vec![Node::new(
                Mesh::upload(ctx, &MeshData::cube()),
                Shader::from_assets(ctx, MVP_UV, TEXTURE_UV)?,
            )])
        }),
    );

    let err = scene.init(&ctx).unwrap_err();
    assert!(matches!(err, VrError::DeviceUnavailable(_)));
    assert!(!scene.is_initialized());
    assert!(ctx.commands().is_empty());
}

#[test]
fn test_builder_shader_failure_is_reported() {
    let ctx = RecordingContext::new();
    ctx.set_link_failure(true);
    let mut scene = two_node_scene(ProjectionMode::Camera);

    let err = scene.init(&ctx).unwrap_err();
    assert!(matches!(err, VrError::Shader(_)));
    assert!(!scene.is_initialized());
}

#[test]
fn test_navigation_reaches_camera() {
    let ctx = RecordingContext::new();
    let mut scene = empty_scene();
    scene.init(&ctx).unwrap();
    let before = scene.camera().view_projection();

    scene.navigation_event(&gst_vr::NavigationEvent::MouseButtonPress {
        button: 4,
        x: 0.0,
        y: 0.0,
    });
    scene.navigation_event(&gst_vr::NavigationEvent::MouseButtonRelease {
        button: 4,
        x: 0.0,
        y: 0.0,
    });
    assert_ne!(scene.camera().view_projection(), before);
}

#[test]
fn test_delete_releases_nodes() {
    let ctx = RecordingContext::new();
    let mut scene = two_node_scene(ProjectionMode::Camera);
    scene.init(&ctx).unwrap();

    scene.delete();
    assert!(!scene.is_initialized());
    assert!(scene.nodes().is_empty());
}
