//! Environment stage: project directories and the environment file

use crate::handlers::{HandlerContext, ModuleHandler};
use modsync_errors::{Error, InstallError};
use modsync_events::EventEmitter;
use modsync_types::{EnvironmentVariable, Manifest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Contents of the environment file
///
/// Only `variables` is owned by this stage; every other field is carried
/// through untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentFile {
    #[serde(default)]
    pub variables: Vec<EnvironmentVariable>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvironmentFile {
    /// Read the file, treating a missing or empty file as default
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io_with_path(&e, path)),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&contents).map_err(|e| {
            InstallError::FilesystemError {
                operation: "parse environment file".to_string(),
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Write the file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io_with_path(&e, parent))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .await
            .map_err(|e| Error::io_with_path(&e, path))
    }
}

/// Built-in handler creating the directories named by system paths
///
/// Uninstalling deletes the environment file and every directory it names
/// that is empty, walking up to (never including) the project root.
/// Directories holding files are left in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvironmentHandler;

impl EnvironmentHandler {
    pub const NAME: &'static str = "environment";
}

/// `value` joined onto `root`, if it stays strictly inside it
fn project_dir(root: &Path, value: &str) -> Option<PathBuf> {
    let relative = Path::new(value.trim());
    let mut components = relative.components().peekable();
    components.peek()?;
    components
        .all(|c| matches!(c, Component::Normal(_)))
        .then(|| root.join(relative))
}

/// Remove `dir` and its ancestors below `root` while they are empty
async fn prune_empty_dirs(root: &Path, dir: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    let mut current = Some(dir);
    while let Some(path) = current.filter(|p| *p != root && p.starts_with(root)) {
        match fs::remove_dir(path).await {
            Ok(()) => removed.push(path.to_path_buf()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "leaving directory in place");
                break;
            }
        }
        current = path.parent();
    }
    removed
}

#[async_trait::async_trait]
impl ModuleHandler for EnvironmentHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn install(&self, ctx: &HandlerContext) -> Result<(), Error> {
        let manifest = Manifest {
            packages: Vec::new(),
            system_paths: ctx.system_paths.clone(),
        };
        let variables = manifest.default_variables();

        for variable in &variables {
            if variable.value.trim().is_empty() {
                continue;
            }
            let dir = ctx.project_root.join(&variable.value);
            if fs::metadata(&dir).await.is_ok() {
                continue;
            }
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::io_with_path(&e, &dir))?;
            ctx.emit_debug(format!("created {} for {}", dir.display(), variable.key));
        }

        let mut file = EnvironmentFile::load(&ctx.environment_file).await?;
        file.variables = variables;
        file.save(&ctx.environment_file).await?;
        ctx.emit_info(format!(
            "wrote {} variables to {}",
            file.variables.len(),
            ctx.environment_file.display()
        ));
        Ok(())
    }

    async fn uninstall(&self, ctx: &HandlerContext) -> Result<(), Error> {
        let file = EnvironmentFile::load(&ctx.environment_file).await?;
        let variables = if file.variables.is_empty() {
            Manifest {
                packages: Vec::new(),
                system_paths: ctx.system_paths.clone(),
            }
            .default_variables()
        } else {
            file.variables
        };

        match fs::remove_file(&ctx.environment_file).await {
            Ok(()) => ctx.emit_info(format!("removed {}", ctx.environment_file.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io_with_path(&e, &ctx.environment_file)),
        }
        if let Some(parent) = ctx.environment_file.parent() {
            prune_empty_dirs(&ctx.project_root, parent).await;
        }

        for variable in variables.iter().filter(|v| !v.value.trim().is_empty()) {
            let Some(dir) = project_dir(&ctx.project_root, &variable.value) else {
                ctx.emit_warning_with_context(
                    format!("not removing {} for {}", variable.value, variable.key),
                    "path is outside the project root",
                );
                continue;
            };
            for removed in prune_empty_dirs(&ctx.project_root, &dir).await {
                ctx.emit_debug(format!("removed {}", removed.display()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsync_types::SystemPath;
    use serde_json::json;
    use tempfile::tempdir;

    fn path(name: &str, value: &str, required: bool) -> SystemPath {
        SystemPath {
            name: name.to_string(),
            default_value: value.to_string(),
            required,
        }
    }

    #[tokio::test]
    async fn test_creates_required_directories_only() {
        let dir = tempdir().unwrap();
        let ctx = HandlerContext {
            project_root: dir.path().to_path_buf(),
            environment_file: dir.path().join("Assets/Resources/system_environments.json"),
            system_paths: vec![
                path("AOT_LIBRARY_PATH", "Assets/Aot", true),
                path("OPTIONAL_PATH", "Assets/Optional", false),
            ],
            ..HandlerContext::default()
        };

        EnvironmentHandler.install(&ctx).await.unwrap();

        assert!(dir.path().join("Assets/Aot").is_dir());
        assert!(!dir.path().join("Assets/Optional").exists());

        let file = EnvironmentFile::load(&ctx.environment_file).await.unwrap();
        assert_eq!(file.variables.len(), 2);
        assert_eq!(file.variables[1].value, "");
    }

    #[tokio::test]
    async fn test_uninstall_removes_file_and_empty_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("project");
        let ctx = HandlerContext {
            project_root: root.clone(),
            environment_file: root.join("Assets/Resources/system_environments.json"),
            system_paths: vec![
                path("AOT_LIBRARY_PATH", "Assets/Aot", true),
                path("CONFIG_PATH", "Config", true),
                path("SHARED_PATH", "../shared", true),
            ],
            ..HandlerContext::default()
        };
        EnvironmentHandler.install(&ctx).await.unwrap();
        std::fs::write(root.join("Config/user.json"), "{}").unwrap();

        EnvironmentHandler.uninstall(&ctx).await.unwrap();

        assert!(!ctx.environment_file.exists());
        assert!(!root.join("Assets").exists());
        assert!(root.join("Config/user.json").exists());
        assert!(dir.path().join("shared").is_dir());
        assert!(root.is_dir());

        // Nothing left to undo
        EnvironmentHandler.uninstall(&ctx).await.unwrap();
    }

    #[test]
    fn test_project_dir_stays_inside_root() {
        let root = Path::new("/work/game");
        assert_eq!(
            project_dir(root, "Assets/Aot"),
            Some(PathBuf::from("/work/game/Assets/Aot"))
        );
        assert_eq!(project_dir(root, "../outside"), None);
        assert_eq!(project_dir(root, "/etc"), None);
        assert_eq!(project_dir(root, "Assets/../.."), None);
        assert_eq!(project_dir(root, ""), None);
    }

    #[tokio::test]
    async fn test_extra_fields_are_preserved() {
        let dir = tempdir().unwrap();
        let env_file = dir.path().join("system_environments.json");
        std::fs::write(
            &env_file,
            serde_json::to_string(&json!({
                "variables": [{"key": "OLD", "value": "x"}],
                "modules": [{"name": "core", "order": 1, "tags": ["base"]}],
                "aot_libraries": ["System.Core.dll"]
            }))
            .unwrap(),
        )
        .unwrap();

        let ctx = HandlerContext {
            project_root: dir.path().to_path_buf(),
            environment_file: env_file.clone(),
            system_paths: vec![path("CONFIG_PATH", "Config", true)],
            ..HandlerContext::default()
        };
        EnvironmentHandler.install(&ctx).await.unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&env_file).unwrap()).unwrap();
        assert_eq!(
            written["variables"],
            json!([{"key": "CONFIG_PATH", "value": "Config"}])
        );
        assert_eq!(written["modules"][0]["name"], "core");
        assert_eq!(written["aot_libraries"], json!(["System.Core.dll"]));
    }
}
