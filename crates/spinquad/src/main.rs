use std::process::ExitCode;

use anyhow::Result;
use spinquad_engine::logging;
use spinquad_engine::window::Runtime;

mod app;
mod config;

use app::SpinQuadApp;
use config::DemoConfig;

fn main() -> ExitCode {
    let config = DemoConfig::default();
    logging::init_logging(config.logging.clone());

    exit_code(run(config))
}

fn run(config: DemoConfig) -> Result<()> {
    log::info!(
        "starting {} ({}x{})",
        config.window.title,
        config.window.initial_size.width,
        config.window.initial_size.height
    );

    let DemoConfig {
        window,
        gpu,
        assets,
        clear_color,
        ..
    } = config;

    Runtime::run(window, gpu, SpinQuadApp::new(assets, clear_color))?;

    log::info!("window closed");
    Ok(())
}

/// Every fatal error exits with status 1; a normal close exits with 0.
fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_exits_zero() {
        assert_eq!(exit_code(Ok(())), ExitCode::SUCCESS);
    }

    #[test]
    fn any_error_exits_non_zero() {
        let err = anyhow::anyhow!("failed to decode image assets/test.png")
            .context("startup failed");
        assert_eq!(exit_code(Err(err)), ExitCode::FAILURE);
    }
}
