use std::{path::Path, slice, sync::Arc};

use ash::vk;
use log::{debug, error, info};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{
    vulkan::{
        Buffer, Device, FrameDriver, FramePools, FrameState, GraphicsContext, GraphicsPipeline,
        PipelineDesc, Surface, Swapchain,
    },
    FrameClock, Limits, Mesh, RendererConfig, Result, SelectionPolicy, UniformMatrices,
};

/// Everything owned once per swapchain image.
struct ImageSlot {
    command_buffer: vk::CommandBuffer,
    uniform_buffer: Option<Buffer>,
    descriptor_set: Option<vk::DescriptorSet>,
}

/// Window-bound half of the renderer: surface, swapchain, pipeline and the
/// prerecorded per-image command buffers.
///
/// Fields drop top to bottom, in reverse creation order. Framebuffers belong to
/// the swapchain and go with it. Command buffers and descriptor sets go with
/// `pools`. The [`GraphicsContext`] it was built from has to outlive it.
pub struct Renderer {
    pipeline: GraphicsPipeline,
    slots: Vec<ImageSlot>,
    pools: FramePools,
    pub swapchain: Swapchain,
    pub surface: Surface,
    driver: FrameDriver,
    clock: FrameClock,
    clear_color: [f32; 4],
    device: Arc<Device>,
}

impl Renderer {
    pub fn new(
        context: &GraphicsContext,
        window: &(impl HasDisplayHandle + HasWindowHandle),
        window_extent: vk::Extent2D,
        config: &RendererConfig,
        policy: &SelectionPolicy,
        limits: &Limits,
    ) -> Result<Self> {
        let device = context.device();

        let surface = Surface::new(&context.instance, window)?;
        device.check_present_support(&surface)?;

        let mut swapchain = Swapchain::new(
            &context.instance,
            device,
            &surface,
            window_extent,
            config.image_count,
            policy,
            limits,
        )?;
        let image_count = swapchain.image_count() as u32;

        let pools = FramePools::new(device, image_count)?;

        let mut uniform_buffers = Vec::with_capacity(image_count as usize);
        if config.uniform_block {
            for _ in 0..image_count {
                uniform_buffers.push(Buffer::new(
                    device,
                    vk::BufferUsageFlags::UNIFORM_BUFFER,
                    None,
                    UniformMatrices::SIZE,
                )?);
            }
        }

        let pipeline = GraphicsPipeline::new(
            device,
            &PipelineDesc {
                color_format: swapchain.format(),
                extent: swapchain.extent(),
                vertex_shader: Path::new(&config.vertex_shader),
                fragment_shader: Path::new(&config.fragment_shader),
                has_uniform_block: config.uniform_block,
            },
        )?;

        let descriptor_sets = match pipeline.descriptor_set_layout {
            Some(set_layout) => {
                allocate_uniform_sets(device, pools.descriptor_pool, set_layout, &uniform_buffers)?
            }
            None => vec![],
        };

        swapchain.create_framebuffers(pipeline.render_pass)?;

        let command_buffers = pools.allocate_command_buffers(image_count)?;

        let mut uniform_buffers = uniform_buffers.into_iter();
        let mut descriptor_sets = descriptor_sets.into_iter();
        let slots = command_buffers
            .into_iter()
            .map(|command_buffer| ImageSlot {
                command_buffer,
                uniform_buffer: uniform_buffers.next(),
                descriptor_set: descriptor_sets.next(),
            })
            .collect();

        info!(
            "Renderer ready: {} images, {:?}, uniforms {}",
            image_count,
            swapchain.extent(),
            if config.uniform_block { "on" } else { "off" }
        );

        Ok(Self {
            pipeline,
            slots,
            pools,
            swapchain,
            surface,
            driver: FrameDriver::new(),
            clock: FrameClock::default(),
            clear_color: config.clear_color,
            device: device.clone(),
        })
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn state(&self) -> FrameState {
        self.driver.state()
    }

    pub fn frame_clock(&self) -> FrameClock {
        self.clock
    }

    pub fn image_count(&self) -> usize {
        self.slots.len()
    }

    /// Records every per-image command buffer. Only allowed once.
    ///
    /// With `None`, or a mesh that was already destroyed, the pass only clears.
    pub fn setup_command_buffers(&mut self, mesh: Option<&Mesh>) -> Result<()> {
        self.driver.record()?;

        let draw = mesh.and_then(|mesh| {
            Some((mesh.vertex_buffer()?, mesh.index_buffer()?, mesh.index_count()))
        });
        if draw.is_none() {
            debug!("Recording clear-only passes");
        }

        let clear_value = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: self.clear_color,
            },
        };
        let device = &self.device;

        for (slot, &framebuffer) in self.slots.iter().zip(&self.swapchain.framebuffers) {
            let cbuff = slot.command_buffer;
            unsafe {
                device.begin_command_buffer(
                    cbuff,
                    &vk::CommandBufferBeginInfo::default()
                        .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE),
                )?;

                let pass_info = vk::RenderPassBeginInfo::default()
                    .render_pass(self.pipeline.render_pass)
                    .framebuffer(framebuffer)
                    .render_area(self.swapchain.extent().into())
                    .clear_values(slice::from_ref(&clear_value));
                device.cmd_begin_render_pass(cbuff, &pass_info, vk::SubpassContents::INLINE);
                device.cmd_bind_pipeline(
                    cbuff,
                    vk::PipelineBindPoint::GRAPHICS,
                    self.pipeline.pipeline,
                );

                if let Some((vertex_buffer, index_buffer, index_count)) = draw {
                    device.cmd_bind_vertex_buffers(cbuff, 0, &[vertex_buffer], &[0]);
                    device.cmd_bind_index_buffer(cbuff, index_buffer, 0, vk::IndexType::UINT16);
                    if let Some(set) = slot.descriptor_set {
                        device.cmd_bind_descriptor_sets(
                            cbuff,
                            vk::PipelineBindPoint::GRAPHICS,
                            self.pipeline.layout,
                            0,
                            &[set],
                            &[],
                        );
                    }
                    device.cmd_draw_indexed(cbuff, index_count, 1, 0, 0, 0);
                }

                device.cmd_end_render_pass(cbuff);
                device.end_command_buffer(cbuff)?;
            }
        }
        Ok(())
    }

    /// Acquires the next image, refreshes its uniforms and submits its commands.
    pub fn render(&mut self) -> Result<()> {
        self.driver.acquire()?;
        let image_idx = self
            .swapchain
            .acquire_next_image(self.pools.sync.image_acquired)?;

        let frame = self.clock.tick();
        let aspect = self.swapchain.aspect_ratio();
        let slot = &mut self.slots[image_idx as usize];
        if let Some(uniform_buffer) = &mut slot.uniform_buffer {
            let matrices = UniformMatrices::for_frame(frame, aspect);
            uniform_buffer.buffer_data(bytemuck::bytes_of(&matrices))?;
        }

        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(slice::from_ref(&self.pools.sync.image_acquired))
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(slice::from_ref(&slot.command_buffer))
            .signal_semaphores(slice::from_ref(&self.pools.sync.draw_complete));
        unsafe {
            self.device
                .queue_submit(self.device.queue, &[submit_info], vk::Fence::null())?
        };

        self.driver.submit(image_idx)
    }

    /// Presents the image submitted by the last [`Renderer::render`].
    pub fn present(&mut self) -> Result<()> {
        let image_idx = self.driver.present()?;
        self.swapchain
            .present(image_idx, self.pools.sync.draw_complete)?;
        Ok(())
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }
}

fn allocate_uniform_sets(
    device: &Device,
    pool: vk::DescriptorPool,
    set_layout: vk::DescriptorSetLayout,
    uniform_buffers: &[Buffer],
) -> Result<Vec<vk::DescriptorSet>> {
    let set_layouts = vec![set_layout; uniform_buffers.len()];
    let sets = unsafe {
        device.allocate_descriptor_sets(
            &vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(pool)
                .set_layouts(&set_layouts),
        )?
    };

    for (&set, uniform_buffer) in sets.iter().zip(uniform_buffers) {
        let buffer_info = vk::DescriptorBufferInfo::default()
            .buffer(uniform_buffer.buffer)
            .offset(0)
            .range(UniformMatrices::SIZE);
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(slice::from_ref(&buffer_info));
        unsafe { device.update_descriptor_sets(&[write], &[]) };
    }
    Ok(sets)
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(err) = unsafe { self.device.device_wait_idle() } {
            error!("Failed to wait for the device before teardown: {err}");
        }
    }
}
