//! Chat page and GPU monitor commands.

use crate::app::AppPaths;
use crate::cli::common::{CliError, CliResult, FormArgs};
use crate::server::external::{chat_port, monitor_gpu, open_chat};
use clap::Args;

/// Open the llama-server chat page in the browser
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Take the port from a saved profile
    #[arg(long, short = 'p', value_name = "NAME")]
    profile: Option<String>,

    /// Port of the running server (overrides the profile)
    #[arg(long)]
    port: Option<u16>,
}

impl ChatArgs {
    /// Execute chat command
    pub fn execute(&self, paths: &AppPaths) -> CliResult<()> {
        let port = match self.port {
            Some(port) => port,
            None => {
                let form = FormArgs {
                    profile: self.profile.clone(),
                    ..FormArgs::default()
                };
                let (_, form) = form.assemble(paths)?;
                chat_port(form.values())
            }
        };

        let url = open_chat(port).map_err(|e| CliError::launch(format!("{e:#}")))?;
        println!("Opened {url}");
        Ok(())
    }
}

/// Start `nvidia-smi -l 1` in its own console
#[derive(Args, Debug)]
pub struct GpuMonitorArgs {}

impl GpuMonitorArgs {
    /// Execute gpu-monitor command
    pub fn execute(&self) -> CliResult<()> {
        let child = monitor_gpu().map_err(|e| CliError::launch(format!("{e:#}")))?;
        println!("GPU monitor started (pid {}).", child.id());
        Ok(())
    }
}
