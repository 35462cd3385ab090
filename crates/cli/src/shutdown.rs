use model::execution::report::MigrationReport;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Listens for SIGINT and SIGTERM and cancels the run. The orchestrator
/// finishes the row in flight, stops, and still writes its report.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(cancel_token: CancellationToken) -> Self {
        Self {
            cancel_token,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let cancel_token = self.cancel_token.clone();
        let shutdown_flag = self.shutdown_requested.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(err) = signal::ctrl_c().await {
                    error!("Failed to install SIGINT handler: {err}");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut stream) => {
                        stream.recv().await;
                    }
                    Err(err) => {
                        error!("Failed to install SIGTERM handler: {err}");
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {
                    info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                }
                _ = terminate => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
            }

            shutdown_flag.store(true, Ordering::SeqCst);
            cancel_token.cancel();
            warn!("Finishing the current row, then stopping");
        });
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// Exit codes for the CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    ShutdownRequested = 130, // Standard exit code for SIGINT
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Success only when every table completed without row failures.
    pub fn for_report(report: &MigrationReport, shutdown_requested: bool) -> Self {
        if shutdown_requested || report.interrupted {
            ExitCode::ShutdownRequested
        } else if report.success() {
            ExitCode::Success
        } else {
            ExitCode::GeneralError
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::identifiers::RunId,
        execution::{
            report::{RunState, TableOutcome},
            run_result::RunResult,
        },
    };
    use std::time::Duration;

    fn report(outcome: TableOutcome, state: RunState, interrupted: bool) -> MigrationReport {
        MigrationReport {
            run_id: RunId::new("r1"),
            outcomes: vec![outcome],
            duration: Duration::ZERO,
            state,
            interrupted,
        }
    }

    #[test]
    fn exit_code_follows_the_report() {
        let clean = TableOutcome::finished("users", "", RunResult::empty("users"));
        let broken = TableOutcome::failed("shops", "", "relation does not exist".into());

        assert_eq!(
            ExitCode::for_report(&report(clean.clone(), RunState::Completed, false), false),
            ExitCode::Success
        );
        assert_eq!(
            ExitCode::for_report(&report(broken, RunState::Halted, false), false),
            ExitCode::GeneralError
        );
        assert_eq!(
            ExitCode::for_report(&report(clean.clone(), RunState::Halted, true), false),
            ExitCode::ShutdownRequested
        );
        assert_eq!(
            ExitCode::for_report(&report(clean, RunState::Completed, false), true),
            ExitCode::ShutdownRequested
        );
        assert_eq!(ExitCode::ShutdownRequested.as_i32(), 130);
    }

    #[tokio::test]
    async fn coordinator_starts_idle() {
        let coordinator = ShutdownCoordinator::new(CancellationToken::new());
        coordinator.register_handlers();
        assert!(!coordinator.is_shutdown_requested());
        assert!(!coordinator.cancel_token().is_cancelled());
    }
}
