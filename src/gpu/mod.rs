//! wgpu compute support: a one-shot capability probe and the GPU backend.

mod compute;

pub use compute::GpuBackend;

/// Device handles shared by everything that talks to the GPU
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

/// Outcome of probing for compute support. Consumed once at startup.
pub enum Capability {
    Ready(GpuContext),
    Unsupported(String),
}

/// Acquire an adapter and device with compute shader support.
/// Blocks on the async wgpu calls; never retried.
pub fn probe() -> Capability {
    match pollster::block_on(acquire()) {
        Ok(context) => Capability::Ready(context),
        Err(reason) => {
            log::warn!("GPU compute unavailable: {reason}");
            Capability::Unsupported(reason)
        }
    }
}

async fn acquire() -> Result<GpuContext, String> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        })
        .await
        .map_err(|e| format!("no suitable adapter: {e}"))?;

    let adapter_info = adapter.get_info();
    log::info!("Using adapter: {} ({:?})", adapter_info.name, adapter_info.backend);

    let downlevel = adapter.get_downlevel_capabilities();
    if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
        return Err(format!("adapter {} does not support compute shaders", adapter_info.name));
    }

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("life device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|e| format!("device request failed: {e}"))?;

    Ok(GpuContext {
        device,
        queue,
        adapter_info,
    })
}
