//! Test environment setup and management

#![allow(dead_code)]

use clap::Parser;
use footo::cli::{execute, FootoCli};
use footo::config::FootoConfig;
use footo::modules::editor::NoopEditor;
use footo::modules::{ModuleLifecycle, Scope};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use walkdir::WalkDir;

/// Isolated footo root inside a temporary directory
pub struct TestEnvironment {
    _temp_dir: TempDir,
    config: FootoConfig,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = tempdir().expect("Failed to create temporary directory");
        let mut config = FootoConfig::with_root(temp_dir.path().join("footo"));
        config.open_editor = false;
        config
            .initialize_directories()
            .expect("Failed to initialize footo directories");

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    pub fn config(&self) -> &FootoConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut FootoConfig {
        &mut self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn lifecycle(&self) -> ModuleLifecycle<'_> {
        ModuleLifecycle::new(&self.config, Box::new(NoopEditor))
    }

    pub fn module_dir(&self, scope: Scope, name: &str) -> PathBuf {
        self.config.scope_dir(scope).join(name)
    }

    /// Write a bash module with a valid descriptor and entry script
    pub fn add_module(&self, scope: Scope, name: &str, description: &str) -> PathBuf {
        let meta = format!(
            r#"{{
  "name": "{name}",
  "version": "1.0.0",
  "description": "{description}",
  "lang": "bash",
  "entry": "script.sh"
}}"#
        );
        self.add_raw_module(scope, name, &meta, Some(("script.sh", "echo hi\n")))
    }

    /// Write a module directory with arbitrary descriptor text
    pub fn add_raw_module(
        &self,
        scope: Scope,
        name: &str,
        meta: &str,
        script: Option<(&str, &str)>,
    ) -> PathBuf {
        let dir = self.module_dir(scope, name);
        std::fs::create_dir_all(&dir).expect("Failed to create module directory");
        std::fs::write(dir.join("meta.json"), meta).expect("Failed to write meta.json");
        if let Some((file, contents)) = script {
            std::fs::write(dir.join(file), contents).expect("Failed to write script");
        }
        dir
    }

    /// Run the CLI against this root, returning exit code and stdout
    pub async fn run_cli(&self, args: &[&str]) -> (i32, String) {
        let cli = FootoCli::try_parse_from(std::iter::once("footo").chain(args.iter().copied()))
            .expect("Failed to parse CLI arguments");
        let mut out = Vec::new();
        let code = execute(cli, &self.config, &mut out).await;
        (code, String::from_utf8(out).expect("stdout is UTF-8"))
    }

    /// Every path under the root, for before/after comparisons
    pub fn snapshot(&self) -> Vec<PathBuf> {
        WalkDir::new(self.root())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .collect()
    }
}
