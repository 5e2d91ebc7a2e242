use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;

use crate::error::SchemaDocError;

pub const DEFAULT_IMAGE: &str = "schemacrawler/schemacrawler";
pub const DEFAULT_EXECUTABLE: &str = "schemacrawler";
pub const CONTAINER_SHARE: &str = "/home/schcrwlr/share";
pub const CONTAINER_SCRIPT: &str = "/opt/schemacrawler/bin/schemacrawler.sh";
const PASSWORD_MASK: &str = "********";

/// How SchemaCrawler is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Runner {
    /// `docker run` with `share_dir` mounted at the container share path
    Docker { image: String, share_dir: PathBuf },
    /// A locally installed launcher script
    Native { executable: String },
}

impl Runner {
    fn program(&self) -> &str {
        match self {
            Runner::Docker { .. } => "docker",
            Runner::Native { executable } => executable,
        }
    }
}

/// One SchemaCrawler command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaCrawlerInvocation {
    pub server: Option<String>,
    pub database: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub command: String,
    pub info_level: String,
    pub output_format: String,
    pub output_file: Option<PathBuf>,
    pub include_tables: Option<String>,
    pub exclude_tables: Option<String>,
    pub title: Option<String>,
    pub load_config: Option<PathBuf>,
    pub load_extension: Option<String>,
    pub attributes_file: Option<PathBuf>,
}

impl Default for SchemaCrawlerInvocation {
    fn default() -> Self {
        Self {
            server: None,
            database: None,
            host: None,
            port: None,
            user: None,
            password: None,
            command: "schema".to_string(),
            info_level: "standard".to_string(),
            output_format: "html".to_string(),
            output_file: None,
            include_tables: None,
            exclude_tables: None,
            title: None,
            load_config: None,
            load_extension: None,
            attributes_file: None,
        }
    }
}

impl SchemaCrawlerInvocation {
    /// SchemaCrawler flags as `--flag=value`, file paths mapped for the runner
    pub fn flags(&self, runner: &Runner) -> Vec<String> {
        self.flags_with(runner, false)
    }

    fn flags_with(&self, runner: &Runner, mask_password: bool) -> Vec<String> {
        let file = |path: &Option<PathBuf>| path.as_deref().map(|p| runner_path(runner, p));
        let password = if mask_password {
            self.password.as_ref().map(|_| PASSWORD_MASK.to_string())
        } else {
            self.password.clone()
        };

        let flags: [(&str, Option<String>); 16] = [
            ("server", self.server.clone()),
            ("database", self.database.clone()),
            ("host", self.host.clone()),
            ("port", self.port.map(|p| p.to_string())),
            ("user", self.user.clone()),
            ("password", password),
            ("command", Some(self.command.clone())),
            ("info-level", Some(self.info_level.clone())),
            ("output-format", Some(self.output_format.clone())),
            ("output-file", file(&self.output_file)),
            ("include-tables", self.include_tables.clone()),
            ("exclude-tables", self.exclude_tables.clone()),
            ("title", self.title.clone()),
            ("load-config", file(&self.load_config)),
            ("load-extension", self.load_extension.clone()),
            ("attributes-file", file(&self.attributes_file)),
        ];

        flags
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| format!("--{}={}", name, v)))
            .collect()
    }

    /// Full argument vector after the program name
    pub fn args(&self, runner: &Runner) -> Vec<String> {
        self.args_with(runner, false)
    }

    fn args_with(&self, runner: &Runner, mask_password: bool) -> Vec<String> {
        let mut args = Vec::new();
        if let Runner::Docker { image, share_dir } = runner {
            args.extend([
                "run".to_string(),
                "--rm".to_string(),
                "-v".to_string(),
                format!("{}:{}", share_dir.display(), CONTAINER_SHARE),
                image.clone(),
                CONTAINER_SCRIPT.to_string(),
            ]);
        }
        args.extend(self.flags_with(runner, mask_password));
        args
    }

    /// Printable command line with the password masked
    pub fn display(&self, runner: &Runner) -> String {
        std::iter::once(runner.program().to_string())
            .chain(self.args_with(runner, true))
            .map(|arg| shell_quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run SchemaCrawler with inherited stdio; a non-zero exit is an error
    pub fn run(&self, runner: &Runner) -> Result<()> {
        let program = runner.program();
        tracing::info!(command = %self.display(runner), "running SchemaCrawler");

        let status = Command::new(program)
            .args(self.args(runner))
            .status()
            .map_err(|source| SchemaDocError::ProcessLaunch {
                program: program.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(SchemaDocError::ProcessFailed {
                program: program.to_string(),
                status: status.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Map a host path to where the runner sees it
fn runner_path(runner: &Runner, path: &Path) -> String {
    match runner {
        Runner::Native { .. } => path.display().to_string(),
        Runner::Docker { share_dir, .. } => {
            let host = absolute(path);
            let relative = host
                .strip_prefix(absolute(share_dir))
                .ok()
                .map(Path::to_path_buf)
                .or_else(|| host.file_name().map(PathBuf::from))
                .unwrap_or_else(|| path.to_path_buf());
            format!("{}/{}", CONTAINER_SHARE, relative.display())
        }
    }
}

/// Resolve against the working directory; `.` components are dropped
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    joined.components().collect()
}

fn shell_quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || "'\"$`\\;&|<>()*?".contains(c)) {
        format!("'{}'", arg.replace('\'', "'\\''"))
    } else {
        arg.to_string()
    }
}
