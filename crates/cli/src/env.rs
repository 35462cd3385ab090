use crate::error::CliError;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const DEFAULT_ENV_FILE: &str = ".env";

/// Environment snapshot: process variables plus an optional `.env` file.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Loads `explicit` if given (it must exist), otherwise `.env` in the
    /// working directory when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let mut env = Self::new();
        match explicit {
            Some(path) => env.load_from_file(path)?,
            None => {
                let default = PathBuf::from(DEFAULT_ENV_FILE);
                if default.is_file() {
                    env.load_from_file(&default)?;
                } else {
                    debug!("No .env file found; using process environment only");
                }
            }
        }
        Ok(env)
    }

    /// Variables already set in the process win over the file.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CliError::EnvFileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = parse_env_content(&content).map_err(|(line, reason)| CliError::EnvFileParse {
            path: path.to_path_buf(),
            line,
            reason,
        })?;

        let count = parsed.len();
        for (key, value) in parsed {
            self.vars.entry(key).or_insert(value);
        }
        info!(path = %path.display(), variables = count, "Loaded env file");
        Ok(())
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.vars
    }
}

/// `KEY=VALUE` lines; blank lines and `#` comments are ignored, an
/// `export ` prefix is accepted. Errors carry the 1-based line number.
fn parse_env_content(content: &str) -> Result<Vec<(String, String)>, (usize, &'static str)> {
    let mut vars = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            return Err((index + 1, "expected KEY=VALUE"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err((index + 1, "empty key"));
        }
        vars.push((key.to_string(), unquote_value(value)));
    }
    Ok(vars)
}

fn unquote_value(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn empty() -> EnvManager {
        EnvManager {
            vars: HashMap::new(),
        }
    }

    #[test]
    fn test_parse_basic_env() {
        let content = r#"
# Supabase
SUPABASE_DB_HOST=aws-0-us-east-1.pooler.supabase.com
export NAME_DB=artesanos
        "#;

        let vars = parse_env_content(content).unwrap();
        assert_eq!(
            vars,
            vec![
                (
                    "SUPABASE_DB_HOST".to_string(),
                    "aws-0-us-east-1.pooler.supabase.com".to_string()
                ),
                ("NAME_DB".to_string(), "artesanos".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_quoted_values() {
        let content = r#"
PASS_DB="p@ss word"
USER_DB='migrator'
PORT_DB=6543
URL=postgres://a=b
        "#;

        let vars: HashMap<_, _> = parse_env_content(content).unwrap().into_iter().collect();
        assert_eq!(vars["PASS_DB"], "p@ss word");
        assert_eq!(vars["USER_DB"], "migrator");
        assert_eq!(vars["PORT_DB"], "6543");
        assert_eq!(vars["URL"], "postgres://a=b");
    }

    #[test]
    fn test_invalid_env_format() {
        assert_eq!(
            parse_env_content("HOST_DB=db\nINVALID LINE WITHOUT EQUALS"),
            Err((2, "expected KEY=VALUE"))
        );
        assert_eq!(parse_env_content(" =value"), Err((1, "empty key")));
    }

    #[test]
    fn process_variables_win_over_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "HOST_DB=from-file\nNAME_DB=artesanos").unwrap();

        let mut env = empty();
        env.vars.insert("HOST_DB".into(), "from-process".into());
        env.load_from_file(file.path()).unwrap();

        assert_eq!(env.all()["HOST_DB"], "from-process");
        assert_eq!(env.all()["NAME_DB"], "artesanos");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = EnvManager::load(Some(Path::new("/nonexistent/.env.production"))).unwrap_err();
        assert!(matches!(err, CliError::EnvFileRead { .. }));
    }
}
