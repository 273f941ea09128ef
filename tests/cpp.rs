// Library level tests of the `cpp` operation, with renderers that record what they are handed.
use std::{
    cell::RefCell,
    fs,
    path::{Path, PathBuf},
};
use uecli::{
    api::{self, CppOptions, CppOutcome, UecliError},
    config::Config,
    project::ProjectError,
    template::{
        ContextFile, RenderOutcome, RenderRequest, Renderer, TemplateError, TeraRenderer,
    },
};

/// Checks the staged context file while it exists, then hands over to `inner`.
struct Recording<R> {
    inner: R,
    config_files: RefCell<Vec<PathBuf>>,
    contexts: RefCell<Vec<ContextFile>>,
}
impl<R> Recording<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            config_files: RefCell::new(Vec::new()),
            contexts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.config_files.borrow().len()
    }
}
impl<R: Renderer> Renderer for Recording<R> {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutcome, TemplateError> {
        assert!(request.config_file.is_file());
        assert!(request.overwrite);

        self.config_files
            .borrow_mut()
            .push(request.config_file.to_path_buf());
        self.contexts
            .borrow_mut()
            .push(ContextFile::from_file(request.config_file).unwrap());

        self.inner.render(request)
    }
}

struct Failing;
impl Renderer for Failing {
    fn render(&self, _request: &RenderRequest<'_>) -> Result<RenderOutcome, TemplateError> {
        Err(TemplateError::MissingValue {
            name: "project_name".to_string(),
        })
    }
}

/// Stands in for a user declining the preview.
struct Declining;
impl Renderer for Declining {
    fn render(&self, _request: &RenderRequest<'_>) -> Result<RenderOutcome, TemplateError> {
        Ok(RenderOutcome::Canceled)
    }
}

/// Creates `<root>/<name>/<name>.uproject` with an `Intermediate` folder.
fn blueprint_project(root: &Path, name: &str) -> PathBuf {
    let project_dir = root.join(name);
    fs::create_dir_all(project_dir.join("Intermediate").join("ProjectFiles")).unwrap();
    fs::write(
        project_dir.join("Intermediate").join("ProjectFiles").join("stale.txt"),
        "ubt",
    )
    .unwrap();
    fs::create_dir_all(project_dir.join("Content")).unwrap();

    let project_file = project_dir.join(format!("{name}.uproject"));
    fs::write(&project_file, r#"{"FileVersion": 3}"#).unwrap();

    project_file
}

/// Every path under `root` with the contents of files.
fn snapshot(root: &Path) -> Vec<(PathBuf, Option<String>)> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
            let content = entry
                .file_type()
                .is_file()
                .then(|| fs::read_to_string(entry.path()).unwrap());
            (relative, content)
        })
        .collect()
}

fn options(project_file: &Path) -> CppOptions {
    CppOptions::new(project_file.to_str().unwrap())
}

#[test]
fn converts_blueprint_project() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    let project_dir = project_file.parent().unwrap();
    let renderer = Recording::new(TeraRenderer);

    let outcome = api::cpp(&options(&project_file), &Config::default(), &renderer).unwrap();

    let CppOutcome::Converted { written, .. } = outcome else {
        panic!("expected the project to be converted");
    };
    assert_eq!(written.len(), 5);

    let module_dir = project_dir.join("Source").join("RTSGame");
    assert!(project_dir.join("Source").join("RTSGame.Target.cs").is_file());
    assert!(project_dir.join("Source").join("RTSGameEditor.Target.cs").is_file());
    assert!(module_dir.join("RTSGame.Build.cs").is_file());
    assert!(module_dir.join("RTSGame.h").is_file());
    assert!(fs::read_to_string(module_dir.join("RTSGame.cpp"))
        .unwrap()
        .contains("IMPLEMENT_PRIMARY_GAME_MODULE( FDefaultGameModuleImpl, RTSGame, \"RTSGame\" );"));

    assert!(!project_dir.join("Intermediate").exists());
    assert!(project_dir.join("Content").is_dir());
    assert!(project_file.is_file());
}

#[test]
fn stages_project_name_and_removes_context_file() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    let renderer = Recording::new(TeraRenderer);

    api::cpp(&options(&project_file), &Config::default(), &renderer).unwrap();

    let contexts = renderer.contexts.borrow();
    assert_eq!(contexts.len(), 1);
    assert_eq!(
        serde_json::to_value(&contexts[0]).unwrap(),
        serde_json::json!({"default_context": {"project_name": "RTSGame"}})
    );

    for path in renderer.config_files.borrow().iter() {
        assert!(!path.exists(), "{} leaked", path.display());
    }
}

#[test]
fn existing_source_is_refused_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    fs::create_dir(project_file.parent().unwrap().join("Source")).unwrap();
    let before = snapshot(dir.path());
    let renderer = Recording::new(TeraRenderer);

    let error = api::cpp(&options(&project_file), &Config::default(), &renderer).unwrap_err();

    assert!(matches!(error, UecliError::AlreadyHasSource { .. }));
    assert_eq!(
        error.to_string(),
        "Cannot add cpp source file to a project that already has sources"
    );
    assert_eq!(renderer.calls(), 0);
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn renderer_failure_keeps_intermediate_and_removes_context_file() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    let renderer = Recording::new(Failing);

    let error = api::cpp(&options(&project_file), &Config::default(), &renderer).unwrap_err();

    assert!(matches!(error, UecliError::Template(TemplateError::MissingValue { .. })));
    assert!(project_file.parent().unwrap().join("Intermediate").is_dir());
    assert_eq!(renderer.calls(), 1);
    assert!(!renderer.config_files.borrow()[0].exists());
}

#[test]
fn declined_preview_leaves_project_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    let before = snapshot(dir.path());
    let renderer = Recording::new(Declining);

    let outcome = api::cpp(&options(&project_file), &Config::default(), &renderer).unwrap();

    assert_eq!(outcome, CppOutcome::Canceled);
    assert!(project_file.parent().unwrap().join("Intermediate").is_dir());
    assert_eq!(snapshot(dir.path()), before);
    assert_eq!(renderer.calls(), 1);
    assert!(!renderer.config_files.borrow()[0].exists());
}

#[test]
fn module_name_comes_from_descriptor_not_folder() {
    let dir = tempfile::tempdir().unwrap();
    let project_dir = dir.path().join("Shooter");
    fs::create_dir_all(project_dir.join("Intermediate")).unwrap();
    fs::write(project_dir.join("FPS.uproject"), "{}").unwrap();
    let renderer = Recording::new(TeraRenderer);

    let outcome = api::cpp(
        &CppOptions::new(project_dir.to_str().unwrap()),
        &Config::default(),
        &renderer,
    )
    .unwrap();

    assert_eq!(
        serde_json::to_value(&renderer.contexts.borrow()[0]).unwrap(),
        serde_json::json!({"default_context": {"project_name": "FPS"}})
    );

    let CppOutcome::Converted { written, .. } = outcome else {
        panic!("expected the project to be converted");
    };
    for path in &written {
        let file_name = path.file_name().unwrap().to_string_lossy();
        assert!(file_name.starts_with("FPS"), "unexpected file {file_name}");
    }

    // the skeleton's top folder follows the module name
    let source = dir.path().join("FPS").join("Source");
    assert!(source.join("FPS.Target.cs").is_file());
    assert!(source.join("FPSEditor.Target.cs").is_file());
    assert!(fs::read_to_string(source.join("FPS").join("FPS.Build.cs"))
        .unwrap()
        .contains("public class FPS : ModuleRules"));
    assert!(!project_dir.join("Source").join("Shooter.Target.cs").exists());
}

#[test]
fn missing_intermediate_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    fs::remove_dir_all(project_file.parent().unwrap().join("Intermediate")).unwrap();

    let outcome = api::cpp(&options(&project_file), &Config::default(), &TeraRenderer).unwrap();

    assert!(matches!(outcome, CppOutcome::Converted { .. }));
}

#[test]
fn second_run_after_removing_source_yields_same_tree() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "RTSGame");
    let source_dir = project_file.parent().unwrap().join("Source");

    api::cpp(&options(&project_file), &Config::default(), &TeraRenderer).unwrap();
    let first = snapshot(dir.path());

    fs::remove_dir_all(&source_dir).unwrap();
    api::cpp(&options(&project_file), &Config::default(), &TeraRenderer).unwrap();

    assert_eq!(snapshot(dir.path()), first);
}

#[test]
fn project_is_found_through_configured_folders() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "Arena");
    let config = Config {
        engine_path: None,
        project_paths: vec![dir.path().to_path_buf()],
    };

    api::cpp(&CppOptions::new("Arena.uproject"), &config, &TeraRenderer).unwrap();

    assert!(project_file.parent().unwrap().join("Source").join("Arena").is_dir());
}

#[test]
fn unknown_project_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        engine_path: None,
        project_paths: vec![dir.path().to_path_buf()],
    };

    let error = api::cpp(
        &CppOptions::new("DefinitelyNotAProject4242"),
        &config,
        &TeraRenderer,
    )
    .unwrap_err();

    assert!(matches!(
        error,
        UecliError::Project(ProjectError::NotFound { .. })
    ));
}

#[test]
fn invalid_module_name_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let project_file = blueprint_project(dir.path(), "My-Game");
    let before = snapshot(dir.path());
    let renderer = Recording::new(TeraRenderer);

    let error = api::cpp(&options(&project_file), &Config::default(), &renderer).unwrap_err();

    assert!(matches!(
        error,
        UecliError::Project(ProjectError::InvalidName { .. })
    ));
    assert_eq!(renderer.calls(), 0);
    assert_eq!(snapshot(dir.path()), before);
}

#[test]
fn init_merges_into_existing_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let games = dir.path().join("Games");

    api::init(&path, Some(dir.path().to_path_buf()), vec![games.clone()]).unwrap();
    let config = api::init(&path, None, vec![games.clone(), dir.path().join("More")]).unwrap();

    assert_eq!(config.engine_path.as_deref(), Some(dir.path()));
    assert_eq!(config.project_paths, vec![games, dir.path().join("More")]);
    assert_eq!(Config::load(&path).unwrap(), config);
}

// Needs a local Unreal Engine install recorded with `uecli init --engine`.
#[test]
fn configured_engine_looks_like_an_install() {
    let config = Config::default_location()
        .and_then(Config::load)
        .unwrap_or_default();

    if !config.is_ready() {
        eprintln!("skipping: Unreal Engine is not installed");
        return;
    }

    let engine = config.engine_path.unwrap();
    assert!(engine.join("Engine").is_dir(), "{} has no Engine folder", engine.display());
}
