//! Supervises daemon launch sequencing and runtime orchestration.

use std::ffi::OsString;
use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::cli::{CommandLine, PortArgument};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::transport::{MllpConnectionHandler, MllpListener};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) shutdown: S,
    pub(crate) ignored_port: Option<String>,
}

/// Runs the daemon using the production collaborators.
///
/// `args` is the full process argument list, program name first.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, binding, or signal installation
/// fails.
pub fn run_daemon<I, T>(args: I) -> Result<(), LaunchError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let command = CommandLine::parse(args);
    let ignored_port = match command.port() {
        PortArgument::Ignored(text) => Some(text.clone()),
        PortArgument::Absent | PortArgument::Port(_) => None,
    };
    let plan = LaunchPlan {
        loader: SystemConfigLoader::new(
            command.config_arguments().to_vec(),
            command.port_override(),
        ),
        reporter: Arc::new(StructuredHealthReporter::new()),
        shutdown: SystemShutdownSignal::new(),
        ignored_port,
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        shutdown,
        ignored_port,
    } = plan;

    let daemon = bootstrap_with(&loader, reporter.as_ref())?;
    let config = daemon.config();
    if let Some(argument) = ignored_port {
        warn!(
            target: PROCESS_TARGET,
            argument = %argument,
            port = config.listen_port(),
            "ignoring invalid port argument; using the configured port"
        );
    }

    let listener = MllpListener::bind(config.listen_host(), config.listen_port())?;
    let handler = Arc::new(MllpConnectionHandler::new(
        daemon.service(),
        config.max_frame_bytes(),
    ));
    let handle = listener.start(handler)?;
    reporter.listener_ready(handle.local_addr());

    let waited = shutdown.wait();
    handle.shutdown();
    let joined = handle.join();
    reporter.listener_stopped();
    waited?;
    joined?;
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}
