//! cf-project: run file format and validation.

pub mod build;
pub mod schema;
pub mod validate;

pub use build::build_elements;
pub use schema::*;
pub use validate::{validate_run_file, ValidationError, LATEST_VERSION};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Solver error: {0}")]
    Solver(#[from] cf_solver::SolverError),

    #[error("Unknown run file extension: {path}")]
    UnknownFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<RunFile> {
    let content = std::fs::read_to_string(path)?;
    let run: RunFile = serde_yaml::from_str(&content)?;
    validate_run_file(&run)?;
    Ok(run)
}

pub fn save_yaml(path: &std::path::Path, run: &RunFile) -> ProjectResult<()> {
    validate_run_file(run)?;
    let content = serde_yaml::to_string(run)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<RunFile> {
    let content = std::fs::read_to_string(path)?;
    let run: RunFile = serde_json::from_str(&content)?;
    validate_run_file(&run)?;
    Ok(run)
}

pub fn save_json(path: &std::path::Path, run: &RunFile) -> ProjectResult<()> {
    validate_run_file(run)?;
    let content = serde_json::to_string_pretty(run)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` is JSON, `.yaml`/`.yml` is YAML.
pub fn load(path: &std::path::Path) -> ProjectResult<RunFile> {
    let run = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path)?,
        Some("yaml") | Some("yml") => load_yaml(path)?,
        _ => {
            return Err(ProjectError::UnknownFormat {
                path: path.display().to_string(),
            })
        }
    };
    tracing::debug!(
        path = %path.display(),
        elements = run.elements.len(),
        "loaded run file"
    );
    Ok(run)
}
