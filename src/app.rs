use crate::cli::{Args, Command, ConfigAction};
use crate::commands::{CommandDispatcher, CommandQueue, DispatchEvent, RunStatus};
use crate::config::{Config, FailurePolicy};
use crate::core::error::BooperError;
use crate::display;
use crate::input;
use crate::twitch::session::{UserRef, resolve_one};
use crate::twitch::{HelixClient, Session, list_channels};
use futures::StreamExt;
use is_terminal::IsTerminal;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub struct Application {
    pub args: Args,
    pub config: Config,
}

impl Application {
    pub fn new(args: Args, config: Config) -> Self {
        Self { args, config }
    }

    pub async fn run(&mut self) -> Result<(), BooperError> {
        match &self.args.command {
            Command::Run {
                file,
                channel,
                delay,
                on_send_failure,
            } => {
                let channel = channel
                    .clone()
                    .or_else(|| self.config.channel.clone())
                    .or_else(|| self.config.login.clone())
                    .unwrap_or_default()
                    .to_lowercase();
                let delay = delay
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| self.config.delay());
                let policy = on_send_failure.unwrap_or(self.config.on_send_failure);
                self.handle_run(file.as_deref(), &channel, delay, policy)
                    .await
            }
            Command::Channels => self.handle_channels().await,
            Command::Config { action } => Self::handle_config(&mut self.config, action),
        }
    }

    fn client(&self) -> Result<Arc<HelixClient>, BooperError> {
        let (client_id, token) = self.config.credentials()?;
        Ok(Arc::new(HelixClient::new(
            self.config.api_base_url(),
            client_id,
            token,
        )?))
    }

    fn moderator_ref(&self) -> Result<UserRef<'_>, BooperError> {
        let id = self.config.user_id.as_deref().filter(|v| !v.trim().is_empty());
        let login = self.config.login.as_deref().filter(|v| !v.trim().is_empty());
        match (id, login) {
            (Some(id), _) => Ok(UserRef::Id(id)),
            (None, Some(login)) => Ok(UserRef::Login(login)),
            (None, None) => Err(BooperError::Config(
                "Moderator account unknown; set 'login' in the config".to_string(),
            )),
        }
    }

    /// Collects the lines to dispatch from a file, piped stdin, or the prompt.
    fn read_lines(&self, file: Option<&Path>) -> Result<Option<CommandQueue>, BooperError> {
        if let Some(path) = file {
            let text = std::fs::read_to_string(path).map_err(|e| {
                BooperError::Input(format!("Failed to read {}: {}", path.display(), e))
            })?;
            return Ok(Some(CommandQueue::from_text(&text)));
        }

        if !io::stdin().is_terminal() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| BooperError::Input(format!("Failed to read from stdin: {}", e)))?;
            return Ok(Some(CommandQueue::from_text(&buffer)));
        }

        let mut editor = input::create_editor()?;
        let lines = input::read_queue(&mut editor)?;
        input::save_history(&mut editor)?;
        Ok(lines.map(CommandQueue::new))
    }

    async fn handle_run(
        &self,
        file: Option<&Path>,
        channel: &str,
        delay: Duration,
        policy: FailurePolicy,
    ) -> Result<(), BooperError> {
        self.config.validate_for_dispatch(channel)?;

        let Some(queue) = self.read_lines(file)? else {
            display::display_info("Input cancelled");
            return Ok(());
        };
        if queue.is_empty() {
            display::display_info("Nothing to dispatch");
            return Ok(());
        }

        let client = self.client()?;
        let session = Session::resolve(&*client, channel, self.moderator_ref()?).await?;

        display::display_run_header(&session, queue.len(), delay.as_millis() as u64);
        let dispatcher = CommandDispatcher::new(client, session, policy);
        let mut run = dispatcher.start(queue, delay)?;

        let stopper = dispatcher.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                display::display_info("Stopping before the next command... (Ctrl-C again to quit)");
                stopper.stop();
            }
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("second interrupt, exiting without waiting for the run");
                std::process::exit(130);
            }
        });

        while let Some(event) = run.next().await {
            display::display_event(&event);
            if matches!(
                event,
                DispatchEvent::LineDone { .. } | DispatchEvent::LineFailed { .. }
            ) {
                display::display_progress(&dispatcher.progress());
            }
        }
        interrupt.abort();
        println!();

        let report = run.finish().await?;
        display::display_report(&report);

        if report.status == RunStatus::Failed {
            return Err(BooperError::Dispatch(
                "the run did not start; nothing was sent".to_string(),
            ));
        }
        Ok(())
    }

    async fn handle_channels(&self) -> Result<(), BooperError> {
        let client = self.client()?;
        let moderator = resolve_one(&*client, self.moderator_ref()?)
            .await?
            .ok_or_else(|| BooperError::NotFound("moderator account".to_string()))?;

        let channels = list_channels(&*client, &moderator).await?;
        display::display_channels(&channels, self.config.channel.as_deref());
        Ok(())
    }

    fn handle_config(config: &mut Config, action: &ConfigAction) -> Result<(), BooperError> {
        match action {
            ConfigAction::Show => display::display_config(config),
            ConfigAction::Path => {
                println!("{}", Config::config_path().display());
                Ok(())
            }
            ConfigAction::Set { key, value } => {
                config.set(key, value)?;
                config.save()?;
                display::display_info(&format!("Updated '{}'", key));
                Ok(())
            }
        }
    }
}
