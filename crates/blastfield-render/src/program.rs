//! Compiled analytics program: shader, pipeline, uniform buffers and bind group.

use std::num::NonZeroU64;

use blastfield_core::{BaseUniforms, ProgramSource};

use crate::buffer::{create_uniform_buffer, create_uniform_buffer_from_bytes};
use crate::color_maps::RampTexture;
use crate::error::{RenderError, RenderResult};
use crate::hole_texture::HoleTexture;
use crate::mesh::{vertex_buffer_layout, AnalyticsMesh};

/// Depth attachment format every pass drawing the program must use.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Textures the program samples, bound together with its uniforms.
#[derive(Clone, Copy)]
pub struct ProgramInputs<'a> {
    pub hole_data: &'a HoleTexture,
    pub colour_ramp: &'a RampTexture,
}

/// GPU side of one assembled [`ProgramSource`].
pub struct AnalyticsProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    base_buffer: wgpu::Buffer,
    model_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    target_format: wgpu::TextureFormat,
}

impl AnalyticsProgram {
    /// Compiles `source` for `target_format` and binds `inputs`.
    ///
    /// Shader and pipeline validation errors are captured and returned, so
    /// a failed compile leaves no half-built program behind.
    pub fn new(
        device: &wgpu::Device,
        source: &ProgramSource,
        target_format: wgpu::TextureFormat,
        base: &BaseUniforms,
        model_block: &[u8],
        inputs: ProgramInputs<'_>,
    ) -> RenderResult<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("analytics shader"),
            source: wgpu::ShaderSource::Wgsl(source.wgsl.as_str().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("analytics bind group layout"),
            entries: &[
                // Base uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<BaseUniforms>() as u64
                        ),
                    },
                    count: None,
                },
                // Model uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Hole data, read with textureLoad
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Colour ramp
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("analytics pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("analytics pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_buffer_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // Surfaces are viewed from both sides
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompilationFailed(err.to_string()));
        }

        let base_buffer = create_uniform_buffer(device, base, Some("analytics base uniforms"));
        let model_buffer =
            create_uniform_buffer_from_bytes(device, model_block, Some("analytics model uniforms"));

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("colour ramp sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = create_bind_group(
            device,
            &bind_group_layout,
            &base_buffer,
            &model_buffer,
            &sampler,
            inputs,
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group,
            base_buffer,
            model_buffer,
            sampler,
            target_format,
        })
    }

    /// Uploads the base uniform block.
    pub fn write_base(&self, queue: &wgpu::Queue, base: &BaseUniforms) {
        queue.write_buffer(&self.base_buffer, 0, bytemuck::bytes_of(base));
    }

    /// Uploads the model uniform block; `bytes` must have the program's layout.
    pub fn write_model(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        queue.write_buffer(&self.model_buffer, 0, bytes);
    }

    /// Rebinds after a texture was replaced.
    pub fn rebind(&mut self, device: &wgpu::Device, inputs: ProgramInputs<'_>) {
        self.bind_group = create_bind_group(
            device,
            &self.bind_group_layout,
            &self.base_buffer,
            &self.model_buffer,
            &self.sampler,
            inputs,
        );
    }

    /// Records a draw of `mesh` into `render_pass`.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, mesh: &AnalyticsMesh) {
        // Empty buffers cannot be sliced
        if mesh.num_indices == 0 {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
    }

    /// Colour target format the pipeline was built for.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Frees the uniform buffers. The pipeline is released on drop.
    pub fn destroy(&self) {
        self.base_buffer.destroy();
        self.model_buffer.destroy();
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    base_buffer: &wgpu::Buffer,
    model_buffer: &wgpu::Buffer,
    sampler: &wgpu::Sampler,
    inputs: ProgramInputs<'_>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("analytics bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: base_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: model_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(inputs.hole_data.view()),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&inputs.colour_ramp.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
