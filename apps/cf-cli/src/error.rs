use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Run file error: {0}")]
    Project(#[from] cf_project::ProjectError),

    #[error("Solver error: {0}")]
    Solver(#[from] cf_solver::SolverError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] cf_sim::SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArg(String),
}

pub type CliResult<T> = Result<T, CliError>;
