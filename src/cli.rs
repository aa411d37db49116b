// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for offline rendering
//!
//! This module provides command-line functionality for:
//! - Warping a still image for an HMD
//! - Compositing a still image through a camera
//! - Printing the GPU commands a filter issues for one frame
//! - Printing the default settings

use gst_vr::camera::ArcballCamera;
use gst_vr::gpu::{RecordingContext, RenderContext, WgpuContext};
use gst_vr::{
    GlFilter, HmdWarp, NavigationEvent, Settings, StaticTracker, VideoSize, VrCompositor,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Filter selection for `trace`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterKind {
    Warp,
    Composite,
}

/// Options of the `composite` command
#[derive(Debug, Clone, Default)]
pub struct CompositeOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    pub size: Option<(u32, u32)>,
    pub drags: Vec<(f64, f64)>,
    pub zoom_in: u32,
    pub zoom_out: u32,
    pub translate: Option<f32>,
    pub hmd_yaw: Option<f32>,
}

/// Apply lens warp to an image
pub fn warp(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let ctx = WgpuContext::new()?;
    let mut filter: HmdWarp<WgpuContext> = HmdWarp::new();
    render_image(&ctx, &mut filter, input, output, None, |_| {})?;
    println!("Warped image saved to: {}", output.display());
    Ok(())
}

/// Render an image through the VR compositor
pub fn composite(options: CompositeOptions) -> Result<(), Box<dyn Error>> {
    let mut settings = match &options.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    if let Some(z) = options.translate {
        let mut camera = ArcballCamera::from_settings(&settings.arcball, &settings.projection);
        camera.translate(z);
        settings.arcball.center_distance = camera.center_distance();
    }

    let mut filter: VrCompositor<WgpuContext> = match options.hmd_yaw {
        Some(yaw) => VrCompositor::with_tracker(
            settings,
            Arc::new(StaticTracker::from_yaw_degrees(yaw)),
        ),
        None => VrCompositor::new(settings),
    };

    let events = navigation_script(&options);
    info!(events = events.len(), "Replaying navigation events");

    let ctx = WgpuContext::new()?;
    render_image(
        &ctx,
        &mut filter,
        &options.input,
        &options.output,
        options.size,
        |filter| {
            for event in &events {
                filter.src_event(event);
            }
        },
    )?;
    println!("Composited image saved to: {}", options.output.display());
    Ok(())
}

/// Print the commands one frame issues, without a GPU
pub fn trace(kind: FilterKind, width: u32, height: u32) -> Result<(), Box<dyn Error>> {
    let ctx = RecordingContext::new();
    let input = ctx.create_texture(width, height);
    let output = ctx.create_texture(width, height);
    let size = VideoSize::new(width, height)?;

    let ok = match kind {
        FilterKind::Warp => {
            let mut filter: HmdWarp<RecordingContext> = HmdWarp::new();
            run_frame(&ctx, &mut filter, size, &input, &output)?
        }
        FilterKind::Composite => {
            let mut filter: VrCompositor<RecordingContext> = VrCompositor::new(Settings::default());
            run_frame(&ctx, &mut filter, size, &input, &output)?
        }
    };

    for (index, command) in ctx.commands().iter().enumerate() {
        println!("{:4}  {}", index, command);
    }
    println!();
    println!(
        "{} draw call(s), frame {}",
        ctx.draw_count(),
        if ok { "succeeded" } else { "failed" }
    );
    Ok(())
}

/// Print the default settings as JSON
pub fn print_defaults() -> Result<(), Box<dyn Error>> {
    println!("{}", Settings::default().to_json()?);
    Ok(())
}

fn run_frame<C, F>(
    ctx: &C,
    filter: &mut F,
    size: VideoSize,
    input: &C::Texture,
    output: &C::Texture,
) -> Result<bool, Box<dyn Error>>
where
    C: RenderContext,
    F: GlFilter<C>,
{
    filter.set_caps(size)?;
    filter.init_gl(ctx)?;
    let ok = filter.filter_texture(ctx, input, output);
    filter.gl_stop();
    Ok(ok)
}

fn render_image<F>(
    ctx: &WgpuContext,
    filter: &mut F,
    input: &Path,
    output: &Path,
    size: Option<(u32, u32)>,
    prepare: impl FnOnce(&mut F),
) -> Result<(), Box<dyn Error>>
where
    F: GlFilter<WgpuContext>,
{
    let image = image::open(input)?.to_rgba8();
    let (width, height) = image.dimensions();
    info!(width, height, path = %input.display(), "Loaded input image");

    let texture = ctx.create_texture_rgba(width, height, image.as_raw())?;
    let (out_width, out_height) = size.unwrap_or((width, height));

    filter.set_caps(VideoSize::new(out_width, out_height)?)?;
    filter.init_gl(ctx)?;
    prepare(filter);

    let target = ctx.create_target(out_width, out_height);
    if !filter.filter_texture(ctx, &texture, &target) {
        filter.gl_stop();
        return Err("Frame render failed".into());
    }
    filter.gl_stop();

    let pixels = ctx.read_texture(&target)?;
    let rendered = image::RgbaImage::from_raw(out_width, out_height, pixels)
        .ok_or("Readback size does not match output size")?;
    rendered.save(output)?;
    Ok(())
}

/// Pointer events equivalent to the requested drags and wheel steps
fn navigation_script(options: &CompositeOptions) -> Vec<NavigationEvent> {
    let mut events = Vec::new();

    for &(dx, dy) in &options.drags {
        events.push(NavigationEvent::MouseMove { x: 0.0, y: 0.0 });
        events.push(NavigationEvent::MouseButtonPress {
            button: 1,
            x: 0.0,
            y: 0.0,
        });
        events.push(NavigationEvent::MouseMove { x: dx, y: dy });
        events.push(NavigationEvent::MouseButtonRelease {
            button: 1,
            x: dx,
            y: dy,
        });
    }

    let wheel = |button: i32, count: u32, events: &mut Vec<NavigationEvent>| {
        for _ in 0..count {
            events.push(NavigationEvent::MouseButtonPress {
                button,
                x: 0.0,
                y: 0.0,
            });
            events.push(NavigationEvent::MouseButtonRelease {
                button,
                x: 0.0,
                y: 0.0,
            });
        }
    };
    wheel(4, options.zoom_in, &mut events);
    wheel(5, options.zoom_out, &mut events);

    events
}
