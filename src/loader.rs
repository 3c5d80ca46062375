//! This module provides the `MachineLoader` struct, responsible for loading machine
//! definitions from files, directories and strings.

use crate::parser::parse;
use crate::types::{ChainError, Program, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// The file extension of machine definitions.
pub const MACHINE_EXTENSION: &str = "tm";

/// `MachineLoader` is a utility struct for loading machine definitions.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed.
    /// * `Err(ChainError::FileError)` if the file cannot be read or is too large.
    /// * `Err(ChainError::ParseError)` if the file content is not a valid definition.
    pub fn load_machine(path: &Path) -> Result<Program, ChainError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ChainError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        if content.len() > MAX_PROGRAM_SIZE {
            return Err(ChainError::FileError(format!(
                "File {} exceeds {} bytes",
                path.display(),
                MAX_PROGRAM_SIZE
            )));
        }

        Self::load_machine_from_string(&content)
    }

    /// Loads a single machine definition from the provided string content.
    pub fn load_machine_from_string(content: &str) -> Result<Program, ChainError> {
        parse(content)
    }

    /// Loads every machine definition (`.tm` extension) in a directory.
    ///
    /// Directories and other files are skipped. Each element of the result is either the
    /// path and the loaded program or the error raised while loading that file.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Program), ChainError>> {
        if !directory.exists() {
            return vec![Err(ChainError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(ChainError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(ChainError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir()
                    || path
                        .extension()
                        .is_none_or(|ext| ext != MACHINE_EXTENSION)
                {
                    return None;
                }

                match Self::load_machine(&path) {
                    Ok(program) => Some(Ok((path, program))),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping machine");
                        Some(Err(ChainError::FileError(format!(
                            "Failed to load machine from {}: {}",
                            path.display(),
                            e
                        ))))
                    }
                }
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TapeTuple, TuringSymbol};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const INVERTER: &str =
        "name: Test Machine\ntuple: 5, 21, 1\nrules:\n  0:\n    0 -> 1, R, 0\n    1 -> 0, R, 0";

    fn write(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_machine() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.tm");
        write(&file_path, INVERTER);

        let program = MachineLoader::load_machine(&file_path).unwrap();
        assert_eq!(program.name, "Test Machine");
        assert_eq!(program.tape, TapeTuple::new(0, 5, 21, TuringSymbol::One));
        assert_eq!(program.state_count(), 1);
    }

    #[test]
    fn test_load_invalid_machine() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");
        write(&file_path, "This is not a valid machine");

        assert!(MachineLoader::load_machine(&file_path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = MachineLoader::load_machine(&dir.path().join("missing.tm"));

        assert!(matches!(result, Err(ChainError::FileError(_))));
    }

    #[test]
    fn test_load_oversized_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("large.tm");
        let padding = "#".repeat(MAX_PROGRAM_SIZE);
        write(&file_path, &format!("{padding}\n{INVERTER}"));

        let error = MachineLoader::load_machine(&file_path).unwrap_err();
        assert!(error.to_string().contains("exceeds"));
    }

    #[test]
    fn test_load_machines_from_directory() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("valid.tm"), INVERTER);
        write(&dir.path().join("invalid.tm"), "This is not a valid machine");
        write(&dir.path().join("ignored.txt"), "This file should be ignored");

        let results = MachineLoader::load_machines(dir.path());

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ChainError::FileError(_))));
    }

    #[test]
    fn test_load_machines_from_missing_directory() {
        let dir = tempdir().unwrap();
        let results = MachineLoader::load_machines(&dir.path().join("nowhere"));

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
