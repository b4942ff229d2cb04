//! External pose estimator invocation

use crate::error::PoseError;
use crate::extractor::{collect_json_files, extract_keypoints};
use crate::keypoints::KeypointMap;
use crate::poll::{BoundedPoll, Sleeper, TokioSleeper};
use crate::process::{ProcessRunner, TokioProcessRunner};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tryon_core::PoseConfig;

/// Command line for one OpenPose run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl PoseCommand {
    /// Build the OpenPose argument vector from configuration.
    ///
    /// `--write_images` is only passed when a render directory is configured.
    pub fn from_config(config: &PoseConfig) -> Self {
        let flag = |enabled: bool| OsString::from(if enabled { "1" } else { "0" });

        let mut args: Vec<OsString> = vec![
            "--image_dir".into(),
            config.image_dir.clone().into_os_string(),
            "--write_json".into(),
            config.json_dir.clone().into_os_string(),
        ];
        if let Some(render_dir) = &config.render_dir {
            args.push("--write_images".into());
            args.push(render_dir.clone().into_os_string());
        }
        args.extend([
            "--render_pose".into(),
            flag(config.render_pose),
            "--display".into(),
            flag(config.display),
            "--model_folder".into(),
            config.model_folder.clone().into_os_string(),
        ]);

        Self {
            program: config.openpose_bin.clone(),
            args,
        }
    }

    /// Value following `flag`, if present
    pub fn arg_value(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|pos| self.args.get(pos + 1))
            .map(OsString::as_os_str)
    }
}

impl std::fmt::Display for PoseCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs OpenPose and waits for its JSON results
pub struct PoseInvoker {
    config: PoseConfig,
    runner: Arc<dyn ProcessRunner>,
    sleeper: Arc<dyn Sleeper>,
}

impl PoseInvoker {
    pub fn new(config: PoseConfig) -> Self {
        Self {
            config,
            runner: Arc::new(TokioProcessRunner),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &PoseConfig {
        &self.config
    }

    pub fn command(&self) -> PoseCommand {
        PoseCommand::from_config(&self.config)
    }

    async fn prepare_output_dirs(&self) -> Result<(), PoseError> {
        tokio::fs::create_dir_all(&self.config.json_dir).await?;
        if let Some(render_dir) = &self.config.render_dir {
            tokio::fs::create_dir_all(render_dir).await?;
        }
        Ok(())
    }

    /// Run the estimator, then wait for at least one JSON result.
    ///
    /// A non-zero exit fails immediately without polling. Returns the result
    /// files sorted by name.
    pub async fn run(&self) -> Result<Vec<PathBuf>, PoseError> {
        self.prepare_output_dirs().await?;

        let command = self.command();
        info!("Running pose estimation: {}", command);

        let output = self.runner.run(&command).await?;
        if !output.stdout.is_empty() {
            debug!("Pose estimator stdout:\n{}", output.stdout.trim_end());
        }
        if !output.stderr.is_empty() {
            debug!("Pose estimator stderr:\n{}", output.stderr.trim_end());
        }

        if !output.success() {
            return Err(PoseError::ProcessFailed {
                code: output.code,
                stderr: output.stderr,
            });
        }

        let json_dir = &self.config.json_dir;
        let poll = BoundedPoll::from_config(&self.config);
        let found = poll
            .run(self.sleeper.as_ref(), |_| list_results(json_dir.clone()))
            .await
            .map_err(|exhausted| PoseError::ArtifactTimeout {
                dir: json_dir.clone(),
                attempts: exhausted.attempts,
            })?;

        let files = found?;
        info!("Found {} pose result file(s) in {:?}", files.len(), json_dir);
        Ok(files)
    }

    /// Run the estimator and extract the first person's keypoints
    pub async fn run_and_extract(&self) -> Result<KeypointMap, PoseError> {
        let files = self.run().await?;
        extract_keypoints(&files)
    }
}

/// One poll probe: `None` while the directory holds no JSON results
async fn list_results(dir: PathBuf) -> Option<Result<Vec<PathBuf>, PoseError>> {
    match tokio::task::spawn_blocking(move || collect_json_files(&dir)).await {
        Ok(Ok(files)) if files.is_empty() => None,
        Ok(listed) => Some(listed),
        Err(join) => Some(Err(PoseError::Io(std::io::Error::new(std::io::ErrorKind::Other, join)))),
    }
}
