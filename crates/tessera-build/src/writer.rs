use crate::CodegenError;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

///
/// FileWriter
///
/// Output sink for generated artifacts: one `open_file`, any number of
/// `write` calls, then `close_file`.
///

pub trait FileWriter {
    fn open_file(&mut self, name: &str) -> Result<(), CodegenError>;

    fn write(&mut self, contents: &str) -> Result<(), CodegenError>;

    fn close_file(&mut self) -> Result<(), CodegenError>;
}

// name and buffered contents of the file currently open
#[derive(Debug, Default)]
struct OpenFile {
    current: Option<(String, String)>,
}

impl OpenFile {
    fn open(&mut self, name: &str) -> Result<(), CodegenError> {
        if let Some((open, _)) = &self.current {
            return Err(CodegenError::FileAlreadyOpen(open.clone()));
        }
        self.current = Some((name.to_string(), String::new()));

        Ok(())
    }

    fn write(&mut self, contents: &str) -> Result<(), CodegenError> {
        let (_, buf) = self.current.as_mut().ok_or(CodegenError::NoOpenFile)?;
        buf.push_str(contents);

        Ok(())
    }

    fn close(&mut self) -> Result<(String, String), CodegenError> {
        self.current.take().ok_or(CodegenError::NoOpenFile)
    }
}

///
/// FsFileWriter
///
/// Writes each artifact under a root directory, created on demand. A file
/// hits the disk when it is closed.
///

#[derive(Debug)]
pub struct FsFileWriter {
    root: PathBuf,
    open: OpenFile,
}

impl FsFileWriter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open: OpenFile::default(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileWriter for FsFileWriter {
    fn open_file(&mut self, name: &str) -> Result<(), CodegenError> {
        self.open.open(name)
    }

    fn write(&mut self, contents: &str) -> Result<(), CodegenError> {
        self.open.write(contents)
    }

    fn close_file(&mut self) -> Result<(), CodegenError> {
        let (name, contents) = self.open.close()?;
        let path = self.root.join(&name);

        fs::create_dir_all(&self.root).map_err(|source| CodegenError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(&path, contents).map_err(|source| CodegenError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "artifact written");

        Ok(())
    }
}

///
/// MemoryWriter
///
/// Keeps closed files in memory, by name.
///

#[derive(Debug, Default)]
pub struct MemoryWriter {
    files: BTreeMap<String, String>,
    open: OpenFile,
}

impl MemoryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    #[must_use]
    pub const fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    #[must_use]
    pub fn into_files(self) -> BTreeMap<String, String> {
        self.files
    }
}

impl FileWriter for MemoryWriter {
    fn open_file(&mut self, name: &str) -> Result<(), CodegenError> {
        self.open.open(name)
    }

    fn write(&mut self, contents: &str) -> Result<(), CodegenError> {
        self.open.write(contents)
    }

    fn close_file(&mut self) -> Result<(), CodegenError> {
        let (name, contents) = self.open.close()?;
        self.files.insert(name, contents);

        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_writer_keeps_closed_files() {
        let mut writer = MemoryWriter::new();

        writer.open_file("a.json").unwrap();
        writer.write("{").unwrap();
        writer.write("}").unwrap();
        assert!(writer.get("a.json").is_none());

        writer.close_file().unwrap();
        assert_eq!(writer.get("a.json"), Some("{}"));
    }

    #[test]
    fn calls_out_of_order_fail() {
        let mut writer = MemoryWriter::new();

        assert!(matches!(writer.write("x"), Err(CodegenError::NoOpenFile)));
        assert!(matches!(writer.close_file(), Err(CodegenError::NoOpenFile)));

        writer.open_file("a").unwrap();
        assert!(matches!(
            writer.open_file("b"),
            Err(CodegenError::FileAlreadyOpen(ref name)) if name == "a"
        ));
    }

    #[test]
    fn fs_writer_creates_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        let mut writer = FsFileWriter::new(&root);

        writer.open_file("org.acme.Vehicle.json").unwrap();
        writer.write("{}").unwrap();
        writer.close_file().unwrap();

        let written = fs::read_to_string(root.join("org.acme.Vehicle.json")).unwrap();
        assert_eq!(written, "{}");
    }
}
