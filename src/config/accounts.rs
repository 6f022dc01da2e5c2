//! Account list reader
//!
//! One profile handle per line. Lines are trimmed; blank lines and lines
//! starting with `#` are skipped. Input order is preserved. A handle becomes
//! part of a directory name, so path separators and `..` are rejected.

use crate::state::Account;
use crate::ConfigError;
use std::path::Path;

/// Reads the account list file at `path`
pub fn load_accounts(path: &Path) -> Result<Vec<Account>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_accounts(&content)
}

/// Parses newline-delimited account handles
pub fn parse_accounts(content: &str) -> Result<Vec<Account>, ConfigError> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, handle)| {
            check_handle(handle)
                .map(|()| Account::new(handle))
                .map_err(|reason| {
                    ConfigError::Validation(format!(
                        "account on line {} ({:?}) {}",
                        number, handle, reason
                    ))
                })
        })
        .collect()
}

fn check_handle(handle: &str) -> Result<(), &'static str> {
    if handle.contains(['/', '\\', '\0']) {
        return Err("contains a path separator");
    }
    if handle.contains("..") {
        return Err("contains '..'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_preserves_order() {
        let accounts = parse_accounts("alice\nbob\ncarol\n").unwrap();
        let names: Vec<&str> = accounts.iter().map(|a| a.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let accounts = parse_accounts("  alice  \n\n# paused\r\nbob\r\n   \n").unwrap();
        let names: Vec<&str> = accounts.iter().map(|a| a.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_parse_rejects_handles_that_escape_the_image_dir() {
        for bad in ["x/../../etc", "..", "a\\b", "dir/name", "a..b"] {
            let result = parse_accounts(&format!("alice\n{}\n", bad));
            assert!(
                matches!(result, Err(ConfigError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_accepts_dotted_handles() {
        let accounts = parse_accounts("john.doe\n_x.y_\n").unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn test_load_accounts_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "alice").unwrap();
        writeln!(file, "bob").unwrap();
        file.flush().unwrap();

        let accounts = load_accounts(file.path()).unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_accounts(Path::new("/nonexistent/accounts"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
