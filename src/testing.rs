//! In-memory fakes of the external capabilities for unit tests

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::checks::CheckContext;
use crate::external::{CommandOutput, CommandRunner, ExecError, FileSystem};
use crate::filter::FileSet;

/// A file tree held in memory
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    unreadable: HashSet<PathBuf>,
    reads: Mutex<Vec<PathBuf>>,
    read_delay: Option<Duration>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.files
            .insert(PathBuf::from(path), content.as_ref().to_vec());
        self
    }

    /// A file that is listed but fails to read
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.files.insert(PathBuf::from(path), Vec::new());
        self.unreadable.insert(PathBuf::from(path));
        self
    }

    /// Every read blocks the calling thread for `delay`, like a slow disk
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn paths(&self) -> FileSet {
        self.files.keys().cloned().collect()
    }

    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().unwrap().clone()
    }
}

impl FileSystem for MemoryFs {
    fn list_files(&self, root: &Path) -> io::Result<FileSet> {
        let listed: FileSet = self
            .files
            .keys()
            .filter(|path| path.starts_with(root))
            .cloned()
            .collect();
        if listed.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(listed)
    }

    fn list_all_files(&self, root: &Path) -> io::Result<FileSet> {
        self.list_files(root)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.lock().unwrap().push(path.to_path_buf());
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        if self.unreadable.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// What a scripted command does
#[derive(Debug, Clone)]
pub enum Script {
    Exit { code: i32, stdout: String, stderr: String },
    Signal,
    Sleep(Duration),
    NotFound,
}

impl Script {
    pub fn exit(code: i32) -> Self {
        Script::Exit {
            code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn exit_with(code: i32, stdout: &str, stderr: &str) -> Self {
        Script::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

/// A command runner answering from a script keyed by program name.
/// Unscripted programs exit 0 with no output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, program: &str, script: Script) -> Self {
        self.scripts.insert(program.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn execute(
        &self,
        command: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandOutput, ExecError> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), args.to_vec()));

        match self.scripts.get(command).cloned().unwrap_or(Script::exit(0)) {
            Script::Exit { code, stdout, stderr } => Ok(CommandOutput {
                exit_code: Some(code),
                stdout,
                stderr,
            }),
            Script::Signal => Ok(CommandOutput::default()),
            Script::Sleep(duration) => {
                match tokio::time::timeout(timeout, tokio::time::sleep(duration)).await {
                    Ok(()) => Ok(CommandOutput {
                        exit_code: Some(0),
                        ..CommandOutput::default()
                    }),
                    Err(_) => Err(ExecError::Timeout {
                        program: command.to_string(),
                        timeout,
                    }),
                }
            }
            Script::NotFound => Err(ExecError::NotFound {
                program: command.to_string(),
            }),
        }
    }
}

/// A check context over the given fakes with a 5 second default timeout
pub fn context(runner: ScriptedRunner, fs: MemoryFs) -> (CheckContext, Arc<ScriptedRunner>, Arc<MemoryFs>) {
    let runner = Arc::new(runner);
    let fs = Arc::new(fs);
    let ctx = CheckContext::new(runner.clone(), fs.clone(), Duration::from_secs(5));
    (ctx, runner, fs)
}

pub fn files(paths: &[&str]) -> FileSet {
    paths.iter().map(PathBuf::from).collect()
}
