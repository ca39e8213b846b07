//! Headless GPU device initialization.
//!
//! The engine never presents to a window, so no surface is created. When no
//! adapter is available the caller gets `None` and runs as a pure data pipeline.

/// Error type for GPU context initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum GpuContextError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Device and queue shared by every GPU upload of one engine.
///
/// Cloning is cheap; wgpu handles are reference counted.
#[derive(Clone, Debug)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    /// Request an adapter and device without a surface.
    pub async fn new_headless(
        power_preference: wgpu::PowerPreference,
    ) -> Result<Self, GpuContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(_) => return Err(GpuContextError::NoAdapter),
        };

        let adapter_info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?}, {:?})",
            adapter_info.name,
            adapter_info.backend,
            adapter_info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("strata-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            device,
            queue,
            adapter_info,
        })
    }

    /// Initialize synchronously using `pollster`.
    pub fn new_headless_blocking(
        power_preference: wgpu::PowerPreference,
    ) -> Result<Self, GpuContextError> {
        pollster::block_on(Self::new_headless(power_preference))
    }

    /// Like [`Self::new_headless_blocking`], but logs and returns `None` on failure.
    pub fn try_headless(power_preference: wgpu::PowerPreference) -> Option<Self> {
        match Self::new_headless_blocking(power_preference) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("GPU unavailable, continuing headless: {e}");
                None
            }
        }
    }
}

/// Map a config string to a power preference. Unknown values fall back to the default.
pub fn parse_power_preference(value: &str) -> wgpu::PowerPreference {
    match value.to_ascii_lowercase().as_str() {
        "high_performance" | "high-performance" | "high" => wgpu::PowerPreference::HighPerformance,
        "low_power" | "low-power" | "low" => wgpu::PowerPreference::LowPower,
        "none" => wgpu::PowerPreference::None,
        other => {
            log::warn!("Unknown power preference '{other}', using default");
            wgpu::PowerPreference::default()
        }
    }
}
