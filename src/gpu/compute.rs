use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};

use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, Buffer, BufferDescriptor, BufferUsages, CommandEncoderDescriptor,
    ComputePipeline, PipelineLayoutDescriptor, ShaderStages,
};

use super::GpuContext;
use crate::backend::ComputeBackend;
use crate::domain::Grid;
use crate::error::{EngineError, EngineResult};

const WORKGROUP_SIZE: u32 = 8;
const CELL_BYTES: u64 = std::mem::size_of::<u32>() as u64;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GridSizeUniform {
    width: u32,
    height: u32,
    _pad: [u32; 2],
}

/// Device-side state for one grid size
struct GridBuffers {
    width: u32,
    height: u32,
    cells: [Buffer; 2],
    /// `bind_groups[i]` reads `cells[i]` and writes `cells[1 - i]`
    bind_groups: [BindGroup; 2],
    staging: Buffer,
    current: usize,
}

impl GridBuffers {
    fn byte_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * CELL_BYTES
    }
}

/// Errors wgpu reports out of band: uncaptured validation and OOM errors,
/// and device loss. Filled from wgpu callbacks, drained on the frame thread.
#[derive(Clone, Default)]
struct DeviceFaults {
    pending: Arc<Mutex<Vec<String>>>,
}

impl DeviceFaults {
    /// Route the device's error and loss callbacks here instead of panicking
    fn install(device: &wgpu::Device) -> Self {
        let faults = Self::default();

        let sink = faults.clone();
        device.on_uncaptured_error(Arc::new(move |error: wgpu::Error| {
            log::error!("wgpu error: {error}");
            sink.record(error.to_string());
        }));

        let sink = faults.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::error!("device lost ({reason:?}): {message}");
            sink.record(format!("device lost ({reason:?}): {message}"));
        });

        faults
    }

    fn record(&self, message: String) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Err with everything reported since the last check
    fn check(&self) -> EngineResult<()> {
        let drained: Vec<String> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if drained.is_empty() {
            Ok(())
        } else {
            Err(EngineError::DeviceOperation(drained.join("; ")))
        }
    }
}

/// In-flight map of the staging buffer
struct Readback {
    epoch: u64,
    receiver: Receiver<Result<(), wgpu::BufferAsyncError>>,
}

/// Rule kernel as a wgpu compute pipeline.
///
/// The two cell buffers stay on the device. After each dispatch the current
/// buffer is copied into a staging buffer and mapped asynchronously; `poll`
/// picks the result up on a later frame. Readbacks issued before the last
/// upload, clear or reallocation are discarded by epoch.
pub struct GpuBackend {
    context: GpuContext,
    pipeline: ComputePipeline,
    layout: BindGroupLayout,
    buffers: Option<GridBuffers>,
    mirror: Option<Grid>,
    readback: Option<Readback>,
    faults: DeviceFaults,
    epoch: u64,
    /// A dispatch happened while the staging buffer was busy
    stale: bool,
}

impl GpuBackend {
    pub fn new(context: GpuContext) -> Self {
        let device = &context.device;
        let faults = DeviceFaults::install(device);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("life kernel"),
            source: wgpu::ShaderSource::Wgsl(include_str!("life.wgsl").into()),
        });

        let storage_entry = |binding, read_only| BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("life cells layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("life pipeline layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("life compute pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            context,
            pipeline,
            layout,
            buffers: None,
            mirror: None,
            readback: None,
            faults,
            epoch: 0,
            stale: false,
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.context.adapter_info.name
    }

    fn buffers(&self) -> EngineResult<&GridBuffers> {
        self.buffers.as_ref().ok_or(EngineError::NotMounted)
    }

    /// Reject sizes the device can't bind or dispatch, instead of letting
    /// wgpu validation abort the process.
    fn check_limits(&self, width: usize, height: usize) -> EngineResult<()> {
        let limits = self.context.device.limits();
        let bytes = width as u64 * height as u64 * CELL_BYTES;
        let groups_x = (width as u64).div_ceil(WORKGROUP_SIZE as u64);
        let groups_y = (height as u64).div_ceil(WORKGROUP_SIZE as u64);
        let max_groups = limits.max_compute_workgroups_per_dimension as u64;

        if bytes > limits.max_storage_buffer_binding_size as u64 || bytes > limits.max_buffer_size {
            return Err(EngineError::DeviceOperation(format!(
                "{width}x{height} grid needs {bytes} bytes, over the device limit"
            )));
        }
        if groups_x > max_groups || groups_y > max_groups {
            return Err(EngineError::DeviceOperation(format!(
                "{width}x{height} grid exceeds {max_groups} workgroups per dimension"
            )));
        }
        Ok(())
    }

    /// Start copying the current buffer to the host
    fn begin_readback(&mut self) -> EngineResult<()> {
        let buffers = self.buffers()?;
        let source = &buffers.cells[buffers.current];

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("life readback encoder"),
            });
        encoder.copy_buffer_to_buffer(source, 0, &buffers.staging, 0, buffers.byte_len());
        self.context.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = mpsc::channel();
        buffers
            .staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });

        self.readback = Some(Readback {
            epoch: self.epoch,
            receiver: rx,
        });
        self.stale = false;
        Ok(())
    }

    /// Copy a finished map into the mirror if it is still relevant
    fn finish_readback(&mut self, epoch: u64) -> EngineResult<()> {
        let buffers = self.buffers.as_ref().ok_or(EngineError::NotMounted)?;
        {
            let data = buffers.staging.slice(..).get_mapped_range();
            if epoch == self.epoch {
                if let Some(mirror) = self.mirror.as_mut() {
                    mirror.raw_mut().copy_from_slice(bytemuck::cast_slice(&data));
                }
            } else {
                log::trace!("discarding readback from epoch {epoch}");
            }
        }
        buffers.staging.unmap();
        Ok(())
    }

    /// Invalidate in-flight readbacks; the mirror was set directly
    fn bump_epoch(&mut self) {
        self.epoch += 1;
        self.stale = false;
    }
}

impl ComputeBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "GPU (wgpu)"
    }

    fn allocate(&mut self, width: usize, height: usize) -> EngineResult<()> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        self.check_limits(width, height)?;

        let device = &self.context.device;
        let byte_len = width as u64 * height as u64 * CELL_BYTES;

        let make_cells = |label| {
            device.create_buffer(&BufferDescriptor {
                label: Some(label),
                size: byte_len,
                usage: BufferUsages::STORAGE | BufferUsages::COPY_DST | BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let cells = [make_cells("life cells 0"), make_cells("life cells 1")];

        let size = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("life grid size"),
            contents: bytemuck::bytes_of(&GridSizeUniform {
                width: width as u32,
                height: height as u32,
                _pad: [0; 2],
            }),
            usage: BufferUsages::UNIFORM,
        });

        let bind = |label, read: &Buffer, write: &Buffer| {
            device.create_bind_group(&BindGroupDescriptor {
                label: Some(label),
                layout: &self.layout,
                entries: &[
                    BindGroupEntry {
                        binding: 0,
                        resource: read.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: write.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 2,
                        resource: size.as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [
            bind("life cells (0 -> 1)", &cells[0], &cells[1]),
            bind("life cells (1 -> 0)", &cells[1], &cells[0]),
        ];

        let staging = device.create_buffer(&BufferDescriptor {
            label: Some("life readback staging"),
            size: byte_len,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Old buffers (and any map pending on them) go away here
        self.readback = None;
        self.buffers = Some(GridBuffers {
            width: width as u32,
            height: height as u32,
            cells,
            bind_groups,
            staging,
            current: 0,
        });
        self.mirror = Some(Grid::new(width, height));
        self.bump_epoch();

        log::info!("gpu buffers allocated: {width}x{height} ({byte_len} bytes each)");
        Ok(())
    }

    fn upload(&mut self, grid: &Grid) -> EngineResult<()> {
        let buffers = self.buffers()?;
        let (width, height) = grid.dimensions();
        if (width as u32, height as u32) != (buffers.width, buffers.height) {
            return Err(EngineError::InvalidDimensions { width, height });
        }

        let bytes: &[u8] = bytemuck::cast_slice(grid.raw());
        for cells in &buffers.cells {
            self.context.queue.write_buffer(cells, 0, bytes);
        }
        self.context.queue.submit(std::iter::empty());

        self.mirror = Some(grid.clone());
        self.bump_epoch();
        Ok(())
    }

    fn dispatch(&mut self) -> EngineResult<()> {
        let buffers = self.buffers.as_mut().ok_or(EngineError::NotMounted)?;

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("life step encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("life step"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &buffers.bind_groups[buffers.current], &[]);
            pass.dispatch_workgroups(
                buffers.width.div_ceil(WORKGROUP_SIZE),
                buffers.height.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        // A rejected pass never ran, so the current buffer stays put
        self.faults.check()?;
        buffers.current = 1 - buffers.current;

        if self.readback.is_none() {
            self.begin_readback()
        } else {
            self.stale = true;
            Ok(())
        }
    }

    fn clear(&mut self) -> EngineResult<()> {
        let buffers = self.buffers.as_mut().ok_or(EngineError::NotMounted)?;

        let mut encoder = self
            .context
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("life clear encoder"),
            });
        for cells in &buffers.cells {
            encoder.clear_buffer(cells, 0, None);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        buffers.current = 0;

        if let Some(mirror) = self.mirror.as_mut() {
            mirror.clear();
        }
        self.bump_epoch();
        Ok(())
    }

    fn poll(&mut self) -> EngineResult<()> {
        self.context
            .device
            .poll(wgpu::PollType::Poll)
            .map_err(|e| EngineError::DeviceOperation(format!("device poll failed: {e}")))?;
        self.faults.check()?;

        if let Some(readback) = self.readback.as_ref() {
            match readback.receiver.try_recv() {
                Ok(Ok(())) => {
                    let epoch = readback.epoch;
                    self.readback = None;
                    self.finish_readback(epoch)?;
                }
                Ok(Err(e)) => {
                    self.readback = None;
                    return Err(EngineError::DeviceOperation(format!("readback map failed: {e}")));
                }
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    self.readback = None;
                    return Err(EngineError::DeviceOperation(
                        "readback channel closed".to_owned(),
                    ));
                }
            }
        }

        if self.stale && self.readback.is_none() {
            self.begin_readback()?;
        }
        Ok(())
    }

    fn current(&self) -> Option<&Grid> {
        self.mirror.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::gpu::{Capability, probe};
    use std::time::{Duration, Instant};

    /// Poll until the mirror catches up or two seconds pass
    fn settle(backend: &mut GpuBackend) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while (backend.readback.is_some() || backend.stale) && Instant::now() < deadline {
            backend.poll().unwrap();
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_faults_drain_once() {
        let faults = DeviceFaults::default();
        assert!(faults.check().is_ok());

        faults.record("first".to_owned());
        faults.record("second".to_owned());
        match faults.check() {
            Err(EngineError::DeviceOperation(message)) => assert_eq!(message, "first; second"),
            other => panic!("expected device error, got {other:?}"),
        }
        assert!(faults.check().is_ok());
    }

    #[test]
    fn test_validation_error_is_reported_not_raised() {
        let Capability::Ready(context) = probe() else {
            return;
        };
        let mut gpu = GpuBackend::new(context);
        gpu.allocate(16, 16).unwrap();

        let small = gpu.context.device.create_buffer(&BufferDescriptor {
            label: Some("too small"),
            size: 4,
            usage: BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        gpu.context.queue.write_buffer(&small, 0, &[0u8; 64]);

        assert!(matches!(gpu.poll(), Err(EngineError::DeviceOperation(_))));
        // Reported once; the backend keeps working afterwards
        gpu.dispatch().unwrap();
        settle(&mut gpu);
        assert!(gpu.current().is_some());
    }

    #[test]
    fn test_gpu_kernel_matches_cpu() {
        let Capability::Ready(context) = probe() else {
            // No adapter on this machine
            return;
        };
        let (width, height) = (37, 29);
        let alive: Vec<bool> = (0..width * height).map(|i| (i * 13 + i / 7) % 5 < 2).collect();
        let seed = Grid::from_alive(width, height, &alive);

        let mut gpu = GpuBackend::new(context);
        let mut cpu = CpuBackend::new(true);
        gpu.allocate(width, height).unwrap();
        cpu.allocate(width, height).unwrap();
        gpu.upload(&seed).unwrap();
        cpu.upload(&seed).unwrap();

        for _ in 0..4 {
            gpu.dispatch().unwrap();
            cpu.dispatch().unwrap();
        }
        settle(&mut gpu);
        assert_eq!(gpu.current(), cpu.current());

        gpu.clear().unwrap();
        assert_eq!(gpu.current().map(Grid::population), Some(0));
    }
}
