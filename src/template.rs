use crate::{
    bundled,
    errors::{FileOperation, IoError},
    preview::preview_as_tree,
    prompt::{self, Answer, PromptError, QuestionsFile},
    transactions::{Active, RollbackOperation, Transaction},
    vfs::{VirtualEntry, VirtualFS},
};
use colored::Colorize;
use indexmap::IndexMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("I/O error within template domain")]
    #[diagnostic(code(uecli::template::io))]
    Io(#[from] IoError),

    #[error("Template directory not found: {path}")]
    #[diagnostic(
        code(uecli::template::not_found),
        help("Point --template at a directory containing the template files")
    )]
    NotFound { path: PathBuf },

    #[error("Error occurred trying to prompt user")]
    #[diagnostic(code(uecli::template::prompt))]
    Prompt(#[from] PromptError),

    #[error("Unable to parse template manifest '{path}': {source}")]
    #[diagnostic(code(uecli::template::parse_manifest), help("Review the template.toml file"))]
    ParseManifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unable to parse template context file '{path}'")]
    #[diagnostic(code(uecli::template::parse_context))]
    ParseContext {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No value for template variable '{name}'")]
    #[diagnostic(
        code(uecli::template::missing_value),
        help("Give the question a default in the manifest, or run without --no-input")
    )]
    MissingValue { name: String },

    #[error("Error occurred attempting to render template '{template}'")]
    #[diagnostic(code(uecli::template::render))]
    Render {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("Template '{path}' is not valid UTF-8")]
    #[diagnostic(
        code(uecli::template::non_utf8),
        help("Only files ending in .tera are rendered; drop the suffix to copy the file as is")
    )]
    NonUtf8Template {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Refusing to overwrite existing file: {path}")]
    #[diagnostic(code(uecli::template::output_exists))]
    OutputExists { path: PathBuf },

    #[error("unable to strip prefix from directory")]
    #[diagnostic(code(uecli::template::strip_prefix))]
    StripPrefix {
        path: PathBuf,
        dir: PathBuf,
        source: std::path::StripPrefixError,
    },
}

const TERA_FILE_EXTENSION: &str = "tera";

/// File name of a template's question manifest.
pub const MANIFEST_FILE_NAME: &str = "template.toml";

/// Where a template's files come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSource {
    /// The C++ skeleton compiled into the binary.
    Bundled,
    /// A template directory on disk.
    Directory(PathBuf),
}

/// One file or directory of an unrendered template, relative to its root.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub path: PathBuf,
    /// Raw bytes, `None` for directories.
    pub content: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub questions: QuestionsFile,
    pub entries: Vec<TemplateEntry>,
}
impl Template {
    pub fn load(source: &TemplateSource) -> Result<Self, TemplateError> {
        match source {
            TemplateSource::Bundled => Self::bundled(),
            TemplateSource::Directory(dir) => Self::from_dir(dir),
        }
    }

    fn bundled() -> Result<Self, TemplateError> {
        let questions =
            toml::from_str(bundled::CPP_MANIFEST).map_err(|source| TemplateError::ParseManifest {
                path: PathBuf::from(MANIFEST_FILE_NAME),
                source,
            })?;

        let entries = bundled::CPP_FILES
            .iter()
            .map(|(path, content)| TemplateEntry {
                path: PathBuf::from(path),
                content: Some(content.as_bytes().to_vec()),
            })
            .collect();

        Ok(Self { questions, entries })
    }

    /// Reads a template directory: the optional `template.toml` manifest plus every
    /// other file and directory beneath it.
    fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
        if !dir.is_dir() {
            return Err(TemplateError::NotFound {
                path: dir.to_path_buf(),
            });
        }

        let manifest = dir.join(MANIFEST_FILE_NAME);
        let questions = if manifest.is_file() {
            let content = fs::read_to_string(&manifest)
                .map_err(|error| IoError::new(FileOperation::Read, manifest.clone(), error))?;

            toml::from_str(&content).map_err(|source| TemplateError::ParseManifest {
                path: manifest.clone(),
                source,
            })?
        } else {
            QuestionsFile::default()
        };

        let mut entries = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(error) => {
                    let path = error.path().unwrap_or_else(|| Path::new(""));

                    Err(IoError::new(
                        FileOperation::Read,
                        path.to_path_buf(),
                        error.into(),
                    ))?
                }
            };

            let full_path = entry.path();
            if full_path == manifest {
                continue;
            }

            let relative = match full_path.strip_prefix(dir) {
                Ok(r) => r,
                Err(error) => Err(TemplateError::StripPrefix {
                    path: full_path.to_path_buf(),
                    dir: dir.to_path_buf(),
                    source: error,
                })?,
            };

            // the template root itself
            if relative.as_os_str().is_empty() {
                continue;
            }

            let content = if entry.file_type().is_dir() {
                None
            } else {
                Some(fs::read(full_path).map_err(|error| {
                    IoError::new(FileOperation::Read, full_path.to_path_buf(), error)
                })?)
            };

            entries.push(TemplateEntry {
                path: relative.to_path_buf(),
                content,
            });
        }

        Ok(Self { questions, entries })
    }
}

/// Values handed to the renderer through a JSON file:
/// `{"default_context": {"project_name": "RTSGame"}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContextFile {
    #[serde(default)]
    pub default_context: IndexMap<String, Answer>,
}
impl ContextFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        serde_json::from_str(&content).map_err(|source| TemplateError::ParseContext {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Everything a [`Renderer`] needs to materialize a template.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub template: &'a TemplateSource,
    /// JSON [`ContextFile`] with the default values.
    pub config_file: &'a Path,
    /// Use defaults without prompting or asking for confirmation.
    pub no_input: bool,
    /// Allow replacing files that already exist in `output_dir`.
    pub overwrite: bool,
    pub output_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The template was written; holds the files that were written.
    Applied { written: Vec<PathBuf> },
    /// The user declined the preview, nothing was written.
    Canceled,
}

/// Materializes a template into a directory.
pub trait Renderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutcome, TemplateError>;
}

/// [`Renderer`] backed by tera.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraRenderer;

impl Renderer for TeraRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutcome, TemplateError> {
        let template = Template::load(request.template)?;

        let context_file = ContextFile::from_file(request.config_file)?;

        let answers = resolve_answers(&template.questions, context_file, request.no_input)?;

        let tera_context = make_tera_context(&answers);

        let mut tera = Tera::default();

        let vfs = build_vfs(&template, &mut tera, &tera_context)?;

        if !request.overwrite {
            check_conflicts(&vfs, request.output_dir)?;
        }

        if !request.no_input {
            preview_as_tree(&vfs, request.output_dir);

            if !prompt::apply_changes()? {
                return Ok(RenderOutcome::Canceled);
            }
        }

        let mut trx = Transaction::<Active>::new();

        let written = apply_vfs(&vfs, request.output_dir, &mut trx)?;

        trx.commit();

        Ok(RenderOutcome::Applied { written })
    }
}

/// Picks a value for every manifest question, in manifest order, followed by any
/// context values the manifest does not ask about.
///
/// The context file value wins over the manifest default. With `no_input` the
/// default is used as is; otherwise the user is prompted with it pre-filled.
fn resolve_answers(
    questions: &QuestionsFile,
    context: ContextFile,
    no_input: bool,
) -> Result<IndexMap<String, Answer>, TemplateError> {
    let mut provided = context.default_context;
    let mut answers: IndexMap<String, Answer> = IndexMap::new();

    for (name, question) in &questions.0 {
        let default = provided.shift_remove(name).or_else(|| question.default.clone());

        let answer = if no_input {
            prompt::non_interactive_answer(question, default.as_ref())
                .ok_or_else(|| TemplateError::MissingValue { name: name.clone() })?
        } else {
            prompt::ask(name, question, default.as_ref())?
        };

        answers.insert(name.clone(), answer);
    }

    answers.extend(provided);

    Ok(answers)
}
/// Makes a [`Tera`] [`Context`] object from the resolved answers.
fn make_tera_context(answers: &IndexMap<String, Answer>) -> Context {
    let mut base_ctx = Context::new();
    for (key, answer) in answers {
        match answer {
            Answer::String(ans) => base_ctx.insert(key.as_str(), ans),
            Answer::Bool(ans) => base_ctx.insert(key.as_str(), ans),
            Answer::Array(ans) => base_ctx.insert(key.as_str(), ans),
        }
    }

    base_ctx
}
/// Loops over path segments/components and renders them as tera templates and returns `Some(PathBuf)`
/// It returns `None` if ANY segment is empty (I.E parent directory is conditionally rendered).
///
/// For example, if your path segments are:
///   `["{% if with_tests %}Tests{% endif %}", "{{ project_name }}Tests.cpp"]`
/// and `with_tests=false`, the first segment becomes `""`, so this returns `None`.
fn render_path_segments(
    path: &Path,
    tera: &mut Tera,
    ctx: &Context,
) -> Result<Option<PathBuf>, TemplateError> {
    let mut result = PathBuf::new();

    for component in path.components() {
        let segment_str = component.as_os_str().to_string_lossy();

        let rendered =
            tera.render_str(&segment_str, ctx)
                .map_err(|error| TemplateError::Render {
                    template: path.display().to_string(),
                    source: error,
                })?;

        if rendered.trim().is_empty() {
            return Ok(None);
        }

        result.push(rendered.trim());
    }

    Ok(Some(result))
}
/// Renders every template entry's path, and the bodies of `.tera` files, into a
/// [`VirtualFS`] of all directories and files that should be created.
fn build_vfs(template: &Template, tera: &mut Tera, ctx: &Context) -> Result<VirtualFS, TemplateError> {
    let mut vfs = VirtualFS::new();

    for entry in &template.entries {
        // If `None`, at least one segment rendered to empty, therefore skip
        let Some(rendered_path) = render_path_segments(&entry.path, tera, ctx)? else {
            log::debug!("skipping {}", entry.path.display());
            continue;
        };

        let Some(contents) = &entry.content else {
            vfs.entries.push(VirtualEntry {
                destination: rendered_path,
                content: None,
                is_file: false,
            });
            continue;
        };

        let is_tera = rendered_path
            .extension()
            .map(|ext| ext == TERA_FILE_EXTENSION)
            .unwrap_or(false);

        // remove file extension and render file content if .tera extension detected,
        // everything else is copied byte for byte
        let (final_dest, file_contents) = if is_tera {
            let source = String::from_utf8(contents.clone()).map_err(|error| {
                TemplateError::NonUtf8Template {
                    path: entry.path.clone(),
                    source: error,
                }
            })?;

            let rendered = tera
                .render_str(&source, ctx)
                .map_err(|error| TemplateError::Render {
                    template: entry.path.display().to_string(),
                    source: error,
                })?;

            (rendered_path.with_extension(""), rendered.into_bytes())
        } else {
            (rendered_path, contents.clone())
        };

        vfs.entries.push(VirtualEntry {
            destination: final_dest,
            content: Some(file_contents),
            is_file: true,
        });
    }

    Ok(vfs)
}
/// Fails on the first file of `vfs` that already exists under `destination_root`.
fn check_conflicts(vfs: &VirtualFS, destination_root: &Path) -> Result<(), TemplateError> {
    for entry in vfs.files() {
        let final_path = destination_root.join(&entry.destination);

        if final_path.exists() {
            return Err(TemplateError::OutputExists { path: final_path });
        }
    }

    Ok(())
}
/// Applies directory and file creation operations from a [`VirtualFS`] and
/// returns the paths of the files written.
fn apply_vfs(
    vfs: &VirtualFS,
    destination_root: &Path,
    trx: &mut Transaction<Active>,
) -> Result<Vec<PathBuf>, TemplateError> {
    // First create all directories
    for entry in vfs.directories() {
        create_directory(trx, &destination_root.join(&entry.destination))?;
    }

    let mut written = Vec::new();

    // Then create all files
    for entry in vfs.files() {
        let final_path = destination_root.join(&entry.destination);

        if let Some(parent) = final_path.parent() {
            create_directory(trx, parent)?;
        }

        let contents = entry.content.as_deref().unwrap_or_default();

        write_file(trx, &final_path, contents)?;

        written.push(final_path);
    }

    Ok(written)
}
/// Creates `path` and any missing ancestors.
///
/// Each directory that did not exist before is registered as a
/// [`RollbackOperation::RemoveDir`], outermost first, so a rollback never touches
/// directories that were already there.
///
/// # Errors
///
/// Returns a [`TemplateError`] if any directory creation fails due to I/O issues.
fn create_directory(trx: &mut Transaction<Active>, path: &Path) -> Result<(), TemplateError> {
    let missing: Vec<&Path> = path
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .collect();

    for dir in missing.into_iter().rev() {
        fs::create_dir(dir)
            .map_err(|error| IoError::new(FileOperation::Mkdir, dir.into(), error))?;

        trx.add_operation(RollbackOperation::RemoveDir(dir.to_path_buf()));
    }

    Ok(())
}
/// Writes a file with the provided contents to the specified path.
///
/// A new file registers a [`RollbackOperation::RemoveFile`]; an overwritten one
/// registers a [`RollbackOperation::RestoreFile`] with its previous contents.
///
/// # Errors
///
/// Returns a [`TemplateError`] if reading the old file or writing the new one fails.
fn write_file(trx: &mut Transaction<Active>, path: &Path, contents: &[u8]) -> Result<(), TemplateError> {
    let previous = if path.exists() {
        Some(
            fs::read(path)
                .map_err(|error| IoError::new(FileOperation::Read, path.into(), error))?,
        )
    } else {
        None
    };

    fs::write(path, contents)
        .map_err(|error| IoError::new(FileOperation::Write, path.into(), error))?;

    let msg = match previous {
        Some(previous) => {
            trx.add_operation(RollbackOperation::RestoreFile(path.to_path_buf(), previous));
            format!("{} {}", "overwrite".yellow(), path.display())
        }
        None => {
            trx.add_operation(RollbackOperation::RemoveFile(path.to_path_buf()));
            format!("{} {}", "create".green(), path.display())
        }
    };

    println!("{}", &msg);

    Ok(())
}
