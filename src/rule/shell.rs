// src/rule/shell.rs

//! Shell command actions.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::{ActionArgs, ExecutableAction};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)(?:\.([A-Za-z_][A-Za-z0-9_]*)|\[(\d+)\])?\}")
        .expect("placeholder regex is valid")
});

/// Runs a command line through a shell after substituting placeholders.
///
/// Supported placeholders:
/// - `{input}` / `{output}`: all paths, space separated
/// - `{input[i]}` / `{output[i]}`: the i-th path
/// - `{wildcards.name}`: a resolved wildcard value
/// - `{{` / `}}`: literal braces
#[derive(Debug, Clone)]
pub struct ShellAction {
    command: String,
    shell: String,
}

impl ShellAction {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: default_shell().to_string(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell_flag(&self) -> &'static str {
        let is_cmd = Path::new(&self.shell)
            .file_stem()
            .is_some_and(|stem| stem.eq_ignore_ascii_case("cmd"));
        if is_cmd { "/C" } else { "-c" }
    }

    async fn run(&self, args: &ActionArgs) -> Result<()> {
        let cmdline = format_command(&self.command, args)?;
        debug!(shell = %self.shell, cmd = %cmdline, "running shell action");

        let mut cmd = Command::new(&self.shell);
        cmd.arg(self.shell_flag())
            .arg(&cmdline)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning `{}` via {}", cmdline, self.shell))?;

        let stdout_task = child.stdout.take().map(|stdout| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!("stdout: {}", line);
                }
            })
        });

        // Always consume stderr so buffers don't fill; log at debug.
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("stderr: {}", line);
                }
            })
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for `{}`", cmdline))?;

        for task in [stdout_task, stderr_task].into_iter().flatten() {
            let _ = task.await;
        }

        if !status.success() {
            match status.code() {
                Some(code) => bail!("command `{}` exited with status {}", cmdline, code),
                None => bail!("command `{}` was terminated by a signal", cmdline),
            }
        }
        Ok(())
    }
}

impl ExecutableAction for ShellAction {
    fn perform<'a>(
        &'a self,
        args: &'a ActionArgs,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(self.run(args))
    }
}

pub fn default_shell() -> &'static str {
    if cfg!(windows) { "cmd" } else { "sh" }
}

/// Substitute placeholders in `template` with values from `args`.
pub fn format_command(template: &str, args: &ActionArgs) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&template[last..whole.start()]);
        last = whole.end();

        match whole.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            _ => {
                let name = caps.get(1).map_or("", |m| m.as_str());
                let attr = caps.get(2).map(|m| m.as_str());
                let index = caps
                    .get(3)
                    .map(|m| m.as_str().parse::<usize>())
                    .transpose()
                    .with_context(|| format!("invalid index in placeholder {}", whole.as_str()))?;
                out.push_str(&resolve(name, attr, index, args, whole.as_str())?);
            }
        }
    }

    out.push_str(&template[last..]);
    Ok(out)
}

fn resolve(
    name: &str,
    attr: Option<&str>,
    index: Option<usize>,
    args: &ActionArgs,
    placeholder: &str,
) -> Result<String> {
    let inputs = || args.inputs.iter().map(|p| p.display().to_string());
    let outputs = || args.outputs.iter().map(|o| o.path().display().to_string());

    match (name, attr, index) {
        ("input", None, None) => Ok(inputs().collect::<Vec<_>>().join(" ")),
        ("output", None, None) => Ok(outputs().collect::<Vec<_>>().join(" ")),
        ("input", None, Some(i)) => inputs()
            .nth(i)
            .with_context(|| format!("{placeholder}: only {} input(s)", args.inputs.len())),
        ("output", None, Some(i)) => outputs()
            .nth(i)
            .with_context(|| format!("{placeholder}: only {} output(s)", args.outputs.len())),
        ("wildcards", Some(key), None) => args
            .wildcards
            .get(key)
            .cloned()
            .with_context(|| format!("{placeholder}: no wildcard named '{key}'")),
        _ => bail!("unknown placeholder {placeholder}"),
    }
}
