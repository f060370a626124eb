//! The analytics engine: model selection, hole data, geometry and flattening
//! over one set of GPU resources.

use std::sync::Arc;

use blastfield_core::pipeline::{
    HOLE_COUNT, MAX_VALUE, MESH_TRANSLATION, MIN_VALUE, OPACITY, TEXTURE_WIDTH, VIEW_PROJECTION,
    WORLD_OFFSET,
};
use blastfield_core::{
    build_plane, flatten_view_projection, model_block_bytes, AnalyticsError, AnalyticsModel,
    BaseInputs, BaseUniforms, Bounds2, DVec3, EncodeOptions, EngineOptions, Geometry, HoleEncoder,
    HoleLayout, HoleRecord, Mat4, ModelInfo, ModelParams, ModelRegistry, PackOutcome,
    PipelineState, PipelineTransition, ProgramSource, RasterSize, Result, RowUpdate, UniformSet,
    UniformValue, Vec3, WorldOffset,
};
use blastfield_render::{
    AnalyticsMesh, AnalyticsProgram, ColorMapRampFactory, ColourRampFactory, FlattenResult,
    Flattener, GpuContext, HoleTexture, ProgramInputs, RampTexture,
};

/// Summary of the mesh the engine currently shades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHandle {
    /// Frame the mesh vertices are relative to.
    pub world_offset: WorldOffset,
    /// Translation placing the mesh in the host scene.
    pub mesh_translation: Vec3,
    /// World rectangle covered by the mesh.
    pub world_bounds: Bounds2,
    pub triangle_count: u32,
}

/// Everything derived from the selected model.
struct ActiveProgram {
    state: PipelineState,
    encoder: HoleEncoder,
    hole_texture: HoleTexture,
    ramp: RampTexture,
    program: AnalyticsProgram,
}

impl ActiveProgram {
    fn sync_base(&self, queue: &wgpu::Queue) {
        self.program
            .write_base(queue, &BaseUniforms::from_set(self.state.uniforms()));
    }

    fn sync_model(&self, queue: &wgpu::Queue) {
        self.program.write_model(
            queue,
            &model_block_bytes(self.state.program(), self.state.uniforms()),
        );
    }

    /// Pushes the encoder's texture to the GPU, reallocating if its size
    /// changed, and refreshes the hole uniforms.
    #[allow(clippy::cast_possible_truncation)]
    fn upload_holes(&mut self, gpu: &GpuContext) {
        let packed = self.encoder.texture();
        if self.hole_texture.matches(packed) {
            self.hole_texture.upload(&gpu.queue, packed);
        } else {
            let texture = HoleTexture::new(&gpu.device, &gpu.queue, packed);
            self.program.rebind(
                &gpu.device,
                ProgramInputs {
                    hole_data: &texture,
                    colour_ramp: &self.ramp,
                },
            );
            std::mem::replace(&mut self.hole_texture, texture).destroy();
        }
        let (count, width) = (packed.hole_count() as u32, packed.width() as u32);
        self.state.set_uniform(HOLE_COUNT, UniformValue::UInt(count));
        self.state.set_uniform(TEXTURE_WIDTH, UniformValue::UInt(width));
        self.sync_base(&gpu.queue);
    }
}

/// GPU analytics renderer for blast-hole data.
///
/// A typical session selects a model, supplies holes, attaches geometry and
/// then either draws every frame or flattens to a raster:
///
/// ```no_run
/// use blastfield::*;
///
/// fn main() -> Result<()> {
///     let mut engine = AnalyticsEngine::new_headless(EngineOptions::default())?;
///     engine.set_model("ppv", &ModelParams::new().with("K", 1140.0))?;
///     engine.update(&[HoleRecord::new("H1", DVec3::new(10.0, 10.0, 0.0), DVec3::new(10.0, 10.0, -10.0), 115.0)], None)?;
///     engine.build_plane(&Bounds2::new(0.0, 0.0, 100.0, 100.0), 0.0, None)?;
///     engine.flatten(&Bounds2::new(0.0, 0.0, 100.0, 100.0), None)?.save("ppv.png")?;
///     engine.dispose();
///     Ok(())
/// }
/// ```
pub struct AnalyticsEngine {
    gpu: GpuContext,
    target_format: wgpu::TextureFormat,
    options: EngineOptions,
    registry: ModelRegistry,
    ramp_factory: Box<dyn ColourRampFactory>,
    /// Parameters supplied while no model is selected; consumed by `set_model`.
    pending_params: ModelParams,
    /// Records from the last full update, re-encoded on layout or frame changes.
    holes: Vec<HoleRecord>,
    encode_options: EncodeOptions,
    world_offset: WorldOffset,
    view_projection: Mat4,
    active: Option<ActiveProgram>,
    mesh: Option<AnalyticsMesh>,
    flattener: Option<Flattener>,
}

impl AnalyticsEngine {
    /// Creates an engine drawing into targets of `target_format`, with every
    /// built-in model registered.
    pub fn new(
        gpu: GpuContext,
        options: EngineOptions,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        Ok(Self {
            gpu,
            target_format,
            encode_options: options.encode,
            options,
            registry: ModelRegistry::with_builtin_models()?,
            ramp_factory: Box::new(ColorMapRampFactory::new()),
            pending_params: ModelParams::new(),
            holes: Vec::new(),
            world_offset: WorldOffset::ZERO,
            view_projection: Mat4::IDENTITY,
            active: None,
            mesh: None,
            flattener: None,
        })
    }

    /// Creates an engine on its own headless device rendering to RGBA8.
    pub fn new_headless(options: EngineOptions) -> Result<Self> {
        let gpu = GpuContext::new_headless()?;
        Self::new(gpu, options, wgpu::TextureFormat::Rgba8Unorm)
    }

    /// Replaces the colour-ramp provider. Takes effect at the next model or
    /// ramp change.
    #[must_use]
    pub fn with_ramp_factory(mut self, factory: Box<dyn ColourRampFactory>) -> Self {
        self.ramp_factory = factory;
        self
    }

    /// Registers an additional model.
    pub fn register_model(&mut self, model: Arc<dyn AnalyticsModel>) -> Result<()> {
        self.registry.register(model)
    }

    /// Every selectable model, in registration order.
    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        self.registry.list_models()
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Selects `name` and rebuilds the program.
    ///
    /// `params` are layered over the model's defaults. On any failure the
    /// previously selected model keeps rendering unchanged.
    pub fn set_model(&mut self, name: &str, params: &ModelParams) -> Result<PipelineTransition> {
        let model = match self.registry.resolve(name) {
            Ok(model) => model,
            Err(AnalyticsError::ModelNotFound(_)) => {
                log::warn!("unknown analytics model '{name}', keeping current pipeline");
                return Err(AnalyticsError::UnknownModel(name.to_string()));
            }
            Err(err) => return Err(err),
        };

        let mut merged = self.pending_params.clone();
        merged.merge(params);
        let active = self.build_active(model, &merged)?;
        self.pending_params = ModelParams::new();

        if let Some(old) = self.active.replace(active) {
            self.release(old);
        }
        log::info!("analytics model set to '{name}'");
        Ok(PipelineTransition::Rebuilt)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn build_active(
        &self,
        model: Arc<dyn AnalyticsModel>,
        params: &ModelParams,
    ) -> Result<ActiveProgram> {
        let mut encoder = HoleEncoder::new(HoleLayout::for_fields(model.hole_inputs()));
        encoder.set_world_offset(self.world_offset);
        encoder.pack(&self.holes, &self.encode_options)?;

        let base = BaseInputs {
            hole_count: encoder.texture().hole_count() as u32,
            texture_width: encoder.texture().width() as u32,
            opacity: self.options.opacity,
            world_offset: self.world_offset.0.as_vec3(),
            view_projection: self.view_projection,
            mesh_translation: self.mesh_translation(),
        };
        let mut state = PipelineState::build(model, params, &base)?;

        let GpuContext { device, queue } = &self.gpu;
        let ramp = self.ramp_factory.create(device, queue, state.ramp_name());
        if ramp.name != state.ramp_name() {
            state.set_ramp_name(ramp.name.clone());
        }
        let hole_texture = HoleTexture::new(device, queue, encoder.texture());

        let program = AnalyticsProgram::new(
            device,
            state.program(),
            self.target_format,
            &BaseUniforms::from_set(state.uniforms()),
            &model_block_bytes(state.program(), state.uniforms()),
            ProgramInputs {
                hole_data: &hole_texture,
                colour_ramp: &ramp,
            },
        );
        let program = match program {
            Ok(program) => program,
            Err(err) => {
                log::warn!("program for '{}' failed to compile: {err}", state.model().name());
                hole_texture.destroy();
                self.ramp_factory.dispose(ramp);
                return Err(err.into());
            }
        };

        Ok(ActiveProgram {
            state,
            encoder,
            hole_texture,
            ramp,
            program,
        })
    }

    /// Merges `params` and refreshes the values of the program's existing
    /// uniforms. Never recompiles.
    ///
    /// With no model selected the parameters are kept for the next
    /// [`set_model`](Self::set_model).
    pub fn set_params(&mut self, params: &ModelParams) -> PipelineTransition {
        let Some(active) = self.active.as_mut() else {
            self.pending_params.merge(params);
            return PipelineTransition::ParamsPatched { changed: vec![] };
        };
        let transition = active.state.patch(params);
        if let PipelineTransition::ParamsPatched { changed } = &transition {
            if !changed.is_empty() {
                log::debug!("patched uniforms {changed:?}");
                active.sync_model(&self.gpu.queue);
            }
        }
        transition
    }

    /// Sets the values mapped to the ends of the colour ramp.
    pub fn set_value_range(&mut self, min: f32, max: f32) -> Result<()> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(AnalyticsError::InvalidArgument(format!(
                "value range [{min}, {max}] must be finite and increasing"
            )));
        }
        let active = self.active.as_mut().ok_or(AnalyticsError::NotReady("no model selected"))?;
        active.state.set_uniform(MIN_VALUE, UniformValue::Float(min));
        active.state.set_uniform(MAX_VALUE, UniformValue::Float(max));
        active.sync_base(&self.gpu.queue);
        Ok(())
    }

    /// Sets surface opacity, clamped to `[0, 1]`. Also used by later models.
    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
        self.options.opacity = opacity;
        if let Some(active) = self.active.as_mut() {
            active.state.set_uniform(OPACITY, UniformValue::Float(opacity));
            active.sync_base(&self.gpu.queue);
        }
    }

    /// Swaps the colour ramp texture; the program is only rebound.
    pub fn set_colour_ramp(&mut self, name: &str) -> Result<()> {
        let active = self.active.as_mut().ok_or(AnalyticsError::NotReady("no model selected"))?;
        let ramp = self.ramp_factory.create(&self.gpu.device, &self.gpu.queue, name);
        active.program.rebind(
            &self.gpu.device,
            ProgramInputs {
                hole_data: &active.hole_texture,
                colour_ramp: &ramp,
            },
        );
        active.state.set_ramp_name(ramp.name.clone());
        let old = std::mem::replace(&mut active.ramp, ramp);
        self.ramp_factory.dispose(old);
        Ok(())
    }

    /// Sets the host camera used by [`draw`](Self::draw).
    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
        if let Some(active) = self.active.as_mut() {
            active
                .state
                .set_uniform(VIEW_PROJECTION, UniformValue::Mat4(view_projection));
            active.sync_base(&self.gpu.queue);
        }
    }

    /// Moves the host scene origin the mesh translation is measured from.
    pub fn set_scene_origin(&mut self, scene_origin: DVec3) {
        self.options.scene_origin = scene_origin;
        let translation = self.mesh_translation();
        if let Some(active) = self.active.as_mut() {
            active
                .state
                .set_uniform(MESH_TRANSLATION, UniformValue::Vec3(translation));
            active.sync_base(&self.gpu.queue);
        }
    }

    // ========================================================================
    // Hole data
    // ========================================================================

    /// Re-encodes every hole. `None` uses the engine's default encode options.
    ///
    /// The options are kept and reused for later single-hole updates and
    /// for re-encoding after a model or world offset change.
    ///
    /// Fails with `Capacity` and changes nothing if there are more holes than
    /// the texture can ever hold.
    pub fn update(
        &mut self,
        holes: &[HoleRecord],
        options: Option<EncodeOptions>,
    ) -> Result<PackOutcome> {
        let options = options.unwrap_or(self.options.encode);
        let active = self.active.as_mut().ok_or(AnalyticsError::NotReady("no model selected"))?;
        let outcome = active.encoder.pack(holes, &options)?;
        active.upload_holes(&self.gpu);

        self.holes = holes.to_vec();
        self.encode_options = options;
        log::debug!("encoded {} holes ({outcome:?})", holes.len());
        Ok(outcome)
    }

    /// Re-encodes one hole, touching only its texels.
    ///
    /// `index` may equal the hole count to append. `None` keeps the options
    /// the retained holes were encoded with. Options that differ from those,
    /// or an index past the texture's room, fall back to a full
    /// [`update`](Self::update) and return [`RowUpdate::NeedsRepack`].
    pub fn update_single_hole(
        &mut self,
        index: usize,
        hole: &HoleRecord,
        options: Option<EncodeOptions>,
    ) -> Result<RowUpdate> {
        let options = options.unwrap_or(self.encode_options);
        let active = self.active.as_mut().ok_or(AnalyticsError::NotReady("no model selected"))?;

        let outcome = if options == self.encode_options {
            active.encoder.update_single_hole(index, hole, &options)?
        } else if index > self.holes.len() {
            return Err(AnalyticsError::HoleIndexOutOfRange {
                index,
                count: self.holes.len(),
            });
        } else {
            log::debug!("encode options changed, repacking every hole");
            RowUpdate::NeedsRepack
        };

        match outcome {
            RowUpdate::Row(row) => {
                active
                    .hole_texture
                    .upload_record(&self.gpu.queue, active.encoder.texture(), row);
                if row == self.holes.len() {
                    self.holes.push(hole.clone());
                    #[allow(clippy::cast_possible_truncation)]
                    let count = active.encoder.texture().hole_count() as u32;
                    active.state.set_uniform(HOLE_COUNT, UniformValue::UInt(count));
                    active.sync_base(&self.gpu.queue);
                } else {
                    self.holes[row] = hole.clone();
                }
                Ok(RowUpdate::Row(row))
            }
            RowUpdate::NeedsRepack => {
                log::debug!("repacking for hole {index}");
                let mut holes = self.holes.clone();
                if index == holes.len() {
                    holes.push(hole.clone());
                } else {
                    holes[index] = hole.clone();
                }
                self.update(&holes, Some(options))?;
                Ok(RowUpdate::NeedsRepack)
            }
        }
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Replaces the shaded mesh with `geometry`, whose vertices are relative
    /// to `world_offset`.
    ///
    /// Hole records are re-encoded if the frame changed, so holes and
    /// vertices always share one local frame.
    #[allow(clippy::cast_possible_truncation)]
    pub fn build_on_geometry(
        &mut self,
        geometry: &Geometry,
        world_offset: WorldOffset,
    ) -> Result<MeshHandle> {
        if self.active.is_none() {
            return Err(AnalyticsError::NotReady("no model selected"));
        }
        geometry.validate()?;
        let (lo, hi) = geometry.local_bounds().ok_or_else(|| {
            AnalyticsError::InvalidArgument("geometry has no vertices".to_string())
        })?;

        if let Some(old) = self.mesh.take() {
            old.destroy();
        }
        self.set_world_offset(world_offset)?;

        let mesh = AnalyticsMesh::new(&self.gpu.device, geometry, world_offset);
        let (world_lo, world_hi) = (world_offset.to_world(lo), world_offset.to_world(hi));
        let handle = MeshHandle {
            world_offset,
            mesh_translation: self.mesh_translation(),
            world_bounds: Bounds2::new(world_lo.x, world_lo.y, world_hi.x, world_hi.y),
            triangle_count: mesh.num_triangles(),
        };
        log::debug!(
            "attached mesh of {} triangles at {:?}",
            handle.triangle_count,
            world_offset.0
        );
        self.mesh = Some(mesh);
        Ok(handle)
    }

    /// Builds and attaches a flat subdivided plane over `bounds` at
    /// `elevation`. `padding` defaults to the configured plane padding.
    pub fn build_plane(
        &mut self,
        bounds: &Bounds2,
        elevation: f64,
        padding: Option<f64>,
    ) -> Result<MeshHandle> {
        let padding = padding.unwrap_or(self.options.plane_padding);
        let plane = build_plane(bounds, elevation, padding, self.options.max_plane_segments)?;
        let mut handle = self.build_on_geometry(&plane.geometry, plane.world_offset)?;
        handle.world_bounds = plane.world_bounds;
        Ok(handle)
    }

    fn set_world_offset(&mut self, world_offset: WorldOffset) -> Result<()> {
        let changed = world_offset != self.world_offset;
        self.world_offset = world_offset;
        let translation = self.mesh_translation();
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        if changed {
            active.encoder.set_world_offset(world_offset);
            active.encoder.pack(&self.holes, &self.encode_options)?;
            active.upload_holes(&self.gpu);
            log::debug!("re-encoded {} holes for new world offset", self.holes.len());
        }
        active
            .state
            .set_uniform(WORLD_OFFSET, UniformValue::Vec3(world_offset.0.as_vec3()));
        active
            .state
            .set_uniform(MESH_TRANSLATION, UniformValue::Vec3(translation));
        active.sync_base(&self.gpu.queue);
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Records a draw of the current mesh into a host render pass.
    ///
    /// The pass must target the engine's format and carry a
    /// [`DEPTH_FORMAT`](blastfield_render::DEPTH_FORMAT) depth attachment.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) -> Result<()> {
        let (active, mesh) = self.ready()?;
        active.program.draw(render_pass, mesh);
        Ok(())
    }

    /// Renders the current mesh top-down over `bounds` into an image.
    ///
    /// `pixels_per_metre` defaults to the configured resolution. Repeated
    /// calls with the same inputs reuse the off-screen targets.
    pub fn flatten(
        &mut self,
        bounds: &Bounds2,
        pixels_per_metre: Option<f64>,
    ) -> Result<FlattenResult> {
        self.ready()?;
        let ppm = pixels_per_metre.unwrap_or(self.options.default_pixels_per_metre);
        let max_dimension = self
            .options
            .max_raster_dimension
            .min(self.gpu.device.limits().max_texture_dimension_2d);
        let size = RasterSize::for_bounds(bounds, ppm, max_dimension)?;

        let reusable = self
            .flattener
            .as_ref()
            .is_some_and(|f| f.matches(self.target_format, size.width, size.height));
        if !reusable {
            if let Some(old) = self.flattener.take() {
                old.dispose();
            }
            self.flattener = Some(Flattener::new(
                &self.gpu.device,
                self.target_format,
                size.width,
                size.height,
            )?);
        }

        let (active, mesh) = self.ready()?;
        let flattener = self
            .flattener
            .as_ref()
            .ok_or(AnalyticsError::NotReady("flatten target missing"))?;

        let host = BaseUniforms::from_set(active.state.uniforms());
        let camera = flatten_view_projection(bounds, mesh.world_offset);
        active
            .program
            .write_base(&self.gpu.queue, &host.with_camera(camera, Vec3::ZERO));
        let pixels = flattener.render(&self.gpu.device, &self.gpu.queue, &active.program, mesh);
        active.program.write_base(&self.gpu.queue, &host);

        let result = FlattenResult::from_rgba(
            pixels?,
            size.width,
            size.height,
            *bounds,
            size.pixels_per_metre,
        )?;
        log::debug!("flattened to {}x{}", size.width, size.height);
        Ok(result)
    }

    /// Releases every GPU resource: hole texture, flatten targets, ramp,
    /// program and mesh. Only [`set_model`](Self::set_model) brings the
    /// engine back.
    pub fn dispose(&mut self) {
        let mut released = false;
        if let Some(flattener) = self.flattener.take() {
            flattener.dispose();
            released = true;
        }
        if let Some(mesh) = self.mesh.take() {
            mesh.destroy();
            released = true;
        }
        if let Some(active) = self.active.take() {
            self.release(active);
            released = true;
        }
        self.holes.clear();
        if released {
            log::info!("analytics engine disposed");
        }
    }

    fn release(&self, active: ActiveProgram) {
        active.program.destroy();
        active.hole_texture.destroy();
        self.ramp_factory.dispose(active.ramp);
    }

    fn ready(&self) -> Result<(&ActiveProgram, &AnalyticsMesh)> {
        let active = self
            .active
            .as_ref()
            .ok_or(AnalyticsError::NotReady("no model selected"))?;
        let mesh = self
            .mesh
            .as_ref()
            .ok_or(AnalyticsError::NotReady("no mesh built"))?;
        Ok((active, mesh))
    }

    fn mesh_translation(&self) -> Vec3 {
        self.world_offset.translation_from(self.options.scene_origin)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Identity of the selected model.
    pub fn active_model(&self) -> Option<ModelInfo> {
        self.active.as_ref().map(|a| a.state.model().info())
    }

    /// Effective parameters of the selected model, defaults included.
    pub fn params(&self) -> Option<&ModelParams> {
        self.active.as_ref().map(|a| a.state.params())
    }

    /// Every uniform of the current program.
    pub fn uniforms(&self) -> Option<&UniformSet> {
        self.active.as_ref().map(|a| a.state.uniforms())
    }

    /// Assembled shader source of the current program.
    pub fn program_source(&self) -> Option<&ProgramSource> {
        self.active.as_ref().map(|a| a.state.program())
    }

    pub fn ramp_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.state.ramp_name())
    }

    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.active.as_ref().map(|a| a.state.value_range())
    }

    /// Holes retained from the last update.
    pub fn holes(&self) -> &[HoleRecord] {
        &self.holes
    }

    /// Packed records as last encoded for the selected model.
    pub fn hole_data(&self) -> Option<&blastfield_core::PackedHoleTexture> {
        self.active.as_ref().map(|a| a.encoder.texture())
    }

    pub fn world_offset(&self) -> WorldOffset {
        self.world_offset
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }
}

impl Drop for AnalyticsEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
