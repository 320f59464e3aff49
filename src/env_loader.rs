use std::env;
use std::path::PathBuf;

pub const HOME_ENV: &str = "TICKETFU_HOME";

/// Which `.env` file, if any, fed the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvSource {
    Loaded(PathBuf),
    Invalid { path: PathBuf, reason: String },
    Absent,
}

/// Candidates in the order they are tried: the working directory, then
/// `$TICKETFU_HOME/.env`, or `~/.ticketfu/.env` when that is unset.
fn dotenv_candidates(
    cwd: Option<PathBuf>,
    ticketfu_home: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = cwd.into_iter().map(|dir| dir.join(".env")).collect();
    match (ticketfu_home, home_dir) {
        (Some(base), _) => candidates.push(base.join(".env")),
        (None, Some(home)) => candidates.push(home.join(".ticketfu").join(".env")),
        (None, None) => {}
    }
    candidates
}

/// Loads the first candidate that exists. Variables already set are kept.
fn load_first(candidates: &[PathBuf]) -> DotenvSource {
    let Some(path) = candidates.iter().find(|path| path.is_file()) else {
        return DotenvSource::Absent;
    };
    match dotenvy::from_path(path) {
        Ok(()) => DotenvSource::Loaded(path.clone()),
        Err(err) => DotenvSource::Invalid {
            path: path.clone(),
            reason: err.to_string(),
        },
    }
}

pub fn load_dotenv() -> DotenvSource {
    load_first(&dotenv_candidates(
        env::current_dir().ok(),
        env::var_os(HOME_ENV).map(PathBuf::from),
        dirs::home_dir(),
    ))
}
