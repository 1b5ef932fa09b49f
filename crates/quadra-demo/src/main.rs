use anyhow::Result;
use quadra_engine::controller::{self, ControllerConfig};
use quadra_engine::device::GpuInit;
use quadra_engine::logging::{init_logging, LoggingConfig};
use quadra_engine::shader::{ShaderCatalog, ShaderSource, FRAGMENT_MARKER, VERTEX_MARKER};
use quadra_engine::window::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // The page-embedded shader sources, registered under the ids the
    // controller is configured to look up.
    let mut catalog = ShaderCatalog::new();
    catalog.insert(
        "shader_vs",
        ShaderSource::new(VERTEX_MARKER, include_str!("../shaders/quad_vs.wgsl")),
    );
    catalog.insert(
        "shader_fs",
        ShaderSource::new(FRAGMENT_MARKER, include_str!("../shaders/quad_fs.wgsl")),
    );

    let result = Runtime::run(
        RuntimeConfig::default(),
        GpuInit::default(),
        catalog,
        ControllerConfig::default(),
    );

    if let Some(report) = controller::report() {
        log::info!("bootstrap finished in phase: {}", report.phase);
        if let Some(location) = report.position_location {
            log::info!("position attribute enabled at location {location}");
        }
        if let Some(adapter) = &report.adapter {
            log::info!("adapter: {adapter}");
        }
        if let Some(error) = &report.error {
            log::info!("recorded failure: {error}");
        }
    }

    result
}
