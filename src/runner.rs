//! Running external tools (`bcftools`, `bgzip`, `samtools`).
//!
//! The pipeline only ever talks to a [`ProcessRunner`], so tests can record
//! the commands it would run instead of spawning anything.

use log::debug;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::pipeline::PipelineError;

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// If set, standard output is written to this (truncated) file.
    pub stdout: Option<PathBuf>,
    /// A non-zero exit status aborts the pipeline.
    pub must_succeed: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdout: None,
            must_succeed: true,
        }
    }

    /// Redirect standard output into `path`.
    pub fn stdout_to(mut self, path: &Path) -> Self {
        self.stdout = Some(path.to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(stdout) = &self.stdout {
            write!(f, " > {}", stdout.display())?;
        }
        Ok(())
    }
}

pub trait ProcessRunner {
    /// Run the command to completion and return its exit code.
    fn status(&self, invocation: &Invocation) -> Result<i32, PipelineError>;

    /// Run the command, failing on a non-zero exit code if it must succeed.
    fn run(&self, invocation: &Invocation) -> Result<i32, PipelineError> {
        debug!("Running: {}", invocation);
        let code = self.status(invocation)?;
        if code != 0 && invocation.must_succeed {
            return Err(PipelineError::CommandFailed {
                command: invocation.to_string(),
                code,
            });
        }
        Ok(code)
    }
}

/// Spawns commands with [`std::process::Command`], inheriting standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    fn status(&self, invocation: &Invocation) -> Result<i32, PipelineError> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(path) = &invocation.stdout {
            let file = File::create(path)?;
            command.stdout(Stdio::from(file));
        }
        let status = command
            .status()
            .map_err(|source| PipelineError::CommandSpawn {
                command: invocation.to_string(),
                source,
            })?;
        status
            .code()
            .ok_or_else(|| PipelineError::CommandTerminated(invocation.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::tempdir;

    struct FixedRunner {
        code: i32,
        seen: RefCell<Vec<Invocation>>,
    }

    impl ProcessRunner for FixedRunner {
        fn status(&self, invocation: &Invocation) -> Result<i32, PipelineError> {
            self.seen.borrow_mut().push(invocation.clone());
            Ok(self.code)
        }
    }

    #[test]
    fn test_display() {
        let inv = Invocation::new("samtools", ["faidx", "ref.fa.gz", "chr6:1-2"])
            .stdout_to(Path::new("out/chr6_region_1-2.fa"));
        assert_eq!(
            inv.to_string(),
            "samtools faidx ref.fa.gz chr6:1-2 > out/chr6_region_1-2.fa"
        );
    }

    #[test]
    fn test_fail_fast() {
        let runner = FixedRunner {
            code: 2,
            seen: RefCell::new(Vec::new()),
        };
        let inv = Invocation::new("bcftools", ["index", "x.vcf.gz"]);
        match runner.run(&inv) {
            Err(PipelineError::CommandFailed { command, code }) => {
                assert_eq!(command, "bcftools index x.vcf.gz");
                assert_eq!(code, 2);
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
        let optional = Invocation {
            must_succeed: false,
            ..inv
        };
        assert_eq!(runner.run(&optional).unwrap(), 2);
        assert_eq!(runner.seen.borrow().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_runner() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("echo.txt");
        let inv = Invocation::new("echo", ["haploblock"]).stdout_to(&out);
        assert_eq!(CommandRunner.run(&inv).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "haploblock\n");

        let failing = Invocation::new("false", Vec::<String>::new());
        assert!(matches!(
            CommandRunner.run(&failing),
            Err(PipelineError::CommandFailed { code: 1, .. })
        ));
    }

    #[test]
    fn test_missing_program() {
        let inv = Invocation::new("haploblock-no-such-tool", ["--version"]);
        assert!(matches!(
            CommandRunner.run(&inv),
            Err(PipelineError::CommandSpawn { .. })
        ));
    }
}
