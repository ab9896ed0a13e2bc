use std::path::Path;
use std::process::Command;

use crate::distiller::parser::parse_distiller_output;
use crate::distiller::Distiller;
use crate::error::{Error, Result};
use crate::models::AtomicChange;

/// Runs an external distiller command as `<command...> <old_file> <new_file>`
/// and reads a JSON array of changes from its stdout.
pub struct ProcessDistiller {
    program: String,
    args: Vec<String>,
}

impl ProcessDistiller {
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Config("distiller command is empty".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Distiller for ProcessDistiller {
    fn extract(&self, old_file: &Path, new_file: &Path) -> Result<Vec<AtomicChange>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(old_file)
            .arg(new_file)
            .output()
            .map_err(|e| Error::Distiller(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Distiller(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        parse_distiller_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_split_into_program_and_args() {
        let distiller = ProcessDistiller::new("java -jar distiller.jar").unwrap();
        assert_eq!(distiller.program, "java");
        assert_eq!(distiller.args, vec!["-jar", "distiller.jar"]);
        assert!(ProcessDistiller::new("   ").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_a_distiller_error() {
        let distiller = ProcessDistiller::new("false").unwrap();
        let err = distiller
            .extract(Path::new("Old.java"), Path::new("New.java"))
            .unwrap_err();
        assert!(matches!(err, Error::Distiller(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_changes_from_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("distill.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '[{\"change_type\":\"COMMENT_INSERT\",\"changed_entity\":\"LINE_COMMENT\"}]'\n",
        )
        .unwrap();
        let distiller = ProcessDistiller::new(&format!("sh {}", script.display())).unwrap();
        let changes = distiller
            .extract(Path::new("Old.java"), Path::new("New.java"))
            .unwrap();
        assert_eq!(changes.len(), 1);
    }
}
