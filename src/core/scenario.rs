use crate::config::scenario::{ScenarioConfig, StepConfig, DEFAULT_POLL_MS, DEFAULT_WAIT_MS};
use crate::core::dev_process::DevProcess;
use crate::core::fixture::FixtureProject;
use crate::utils::error::{DevReadyError, Result};
use crate::utils::validation::compile_pattern;
use crate::utils::wait::{wait_until_async, WaitOptions};
use reqwest::Client;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub name: String,
    pub processes_started: usize,
    pub steps_run: usize,
    pub elapsed: Duration,
}

/// Runs a dev-loop scenario: write the fixture project, start each process
/// once the previous one is ready, then run the steps in order.
pub struct ScenarioRunner {
    config: ScenarioConfig,
    client: Client,
}

impl ScenarioRunner {
    pub fn new(config: ScenarioConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Every started process is killed before this returns, whether or not
    /// the scenario passed.
    pub async fn run(&self) -> Result<ScenarioReport> {
        let start = Instant::now();
        tracing::info!("🚀 Running scenario '{}'", self.config.scenario.name);

        let project = FixtureProject::create(
            self.config.project_dir(),
            self.config
                .files
                .iter()
                .map(|f| (f.path.as_str(), f.contents.as_str())),
        )?;
        tracing::info!(
            "📁 Wrote {} fixture files to {}",
            self.config.files.len(),
            project.root().display()
        );

        let mut processes = Vec::new();
        let outcome = self.drive(&project, &mut processes).await;

        for process in &mut processes {
            if let Err(e) = process.kill().await {
                tracing::warn!("Could not stop '{}': {}", process.name(), e);
            }
        }

        let steps_run = match outcome {
            Ok(steps_run) => steps_run,
            Err(e) => {
                for process in &processes {
                    tracing::debug!(
                        "Output of '{}':\n{}",
                        process.name(),
                        process.stdout().snapshot()
                    );
                }
                return Err(e);
            }
        };

        Ok(ScenarioReport {
            name: self.config.scenario.name.clone(),
            processes_started: processes.len(),
            steps_run,
            elapsed: start.elapsed(),
        })
    }

    async fn drive(
        &self,
        project: &FixtureProject,
        processes: &mut Vec<DevProcess>,
    ) -> Result<usize> {
        for process_config in &self.config.processes {
            let process = DevProcess::spawn(&process_config.to_spec(project.root()))?;
            processes.push(process);

            if let Some(pattern) = &process_config.ready_pattern {
                let pattern = compile_pattern("processes.ready_pattern", pattern)?;
                if let Some(process) = processes.last() {
                    process
                        .wait_for_log(&pattern, process_config.ready_timeout())
                        .await?;
                    tracing::info!("✅ '{}' is ready", process.name());
                }
            }
        }

        for (index, step) in self.config.steps.iter().enumerate() {
            let number = index + 1;
            tracing::debug!("Step {}: {:?}", number, step);
            self.run_step(step, project, processes)
                .await
                .map_err(|e| DevReadyError::Scenario {
                    step: number,
                    message: e.to_string(),
                })?;
        }

        Ok(self.config.steps.len())
    }

    async fn run_step(
        &self,
        step: &StepConfig,
        project: &FixtureProject,
        processes: &[DevProcess],
    ) -> Result<()> {
        match step {
            StepConfig::WriteFile { path, contents } => {
                project.write_file(path, contents)?;
                tracing::info!("✏️ Edited {}", path);
            }
            StepConfig::WaitForLog {
                process,
                pattern,
                timeout_ms,
            } => {
                let target = processes
                    .iter()
                    .find(|p| p.name() == process)
                    .ok_or_else(|| DevReadyError::Process {
                        name: process.clone(),
                        message: "not started".to_string(),
                    })?;
                let pattern = compile_pattern("steps.pattern", pattern)?;
                let timeout = Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_WAIT_MS));
                target.wait_for_log(&pattern, timeout).await?;
            }
            StepConfig::ExpectHttp {
                url,
                contains,
                timeout_ms,
                interval_ms,
            } => {
                let options = WaitOptions {
                    timeout: Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_WAIT_MS)),
                    interval: Duration::from_millis(interval_ms.unwrap_or(DEFAULT_POLL_MS)),
                };
                wait_until_async(|| self.body_contains(url, contains), options)
                    .await
                    .map_err(|e| DevReadyError::Process {
                        name: url.clone(),
                        message: format!("body never contained '{}' ({})", contains, e),
                    })?;
                tracing::info!("🔍 {} shows '{}'", url, contains);
            }
            StepConfig::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
        }
        Ok(())
    }

    async fn body_contains(&self, url: &str, needle: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => match response.text().await {
                Ok(body) => body.contains(needle),
                Err(e) => {
                    tracing::debug!("Could not read body of {}: {}", url, e);
                    false
                }
            },
            Err(e) => {
                tracing::debug!("{} not reachable yet: {}", url, e);
                false
            }
        }
    }
}
