//! Shader compiler: reads GLSL stage sources from disk and compiles them to naga IR.
//!
//! Compilation happens on the CPU so diagnostics are available before any GPU
//! object exists. The resulting [`CompiledShader`] is consumed by
//! [`Program::link`](super::program::Program::link).

use std::fmt;
use std::path::{Path, PathBuf};

use naga::front::glsl;
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderKind::Vertex => naga::ShaderStage::Vertex,
            ShaderKind::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn wgpu_stage(self) -> wgpu::ShaderStages {
        match self {
            ShaderKind::Vertex => wgpu::ShaderStages::VERTEX,
            ShaderKind::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderKind::Vertex => "vertex",
            ShaderKind::Fragment => "fragment",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read {kind} shader {}: {source}", .path.display())]
    Io {
        kind: ShaderKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} shader {} failed to compile:\n{diagnostics}", .path.display())]
    Compile {
        kind: ShaderKind,
        path: PathBuf,
        diagnostics: String,
    },
}

impl ShaderError {
    /// Compiler/validator output for compile failures.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            ShaderError::Compile { diagnostics, .. } => Some(diagnostics),
            ShaderError::Io { .. } => None,
        }
    }
}

/// A validated shader stage, ready to be linked.
#[derive(Debug)]
pub struct CompiledShader {
    pub kind: ShaderKind,
    pub path: PathBuf,
    pub module: naga::Module,
    pub info: ModuleInfo,
}

impl CompiledShader {
    /// Name of the stage's entry point (GLSL sources always use `main`).
    pub fn entry_point(&self) -> Option<&str> {
        let stage = self.kind.naga_stage();
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.stage == stage)
            .map(|ep| ep.name.as_str())
    }
}

/// Reads `path` and compiles it as a `kind` stage.
pub fn compile_shader(kind: ShaderKind, path: &Path) -> Result<CompiledShader, ShaderError> {
    let source = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    compile_source(kind, path, &source)
}

/// Compiles GLSL `source`; `path` is only used to label diagnostics.
pub fn compile_source(
    kind: ShaderKind,
    path: &Path,
    source: &str,
) -> Result<CompiledShader, ShaderError> {
    let compile_error = |diagnostics: String| ShaderError::Compile {
        kind,
        path: path.to_path_buf(),
        diagnostics: non_empty(diagnostics, kind),
    };

    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(kind.naga_stage()), source)
        .map_err(|errors| compile_error(errors.emit_to_string(source)))?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| compile_error(err.emit_to_string(source)))?;

    log::debug!("compiled {kind} shader {}", path.display());

    Ok(CompiledShader {
        kind,
        path: path.to_path_buf(),
        module,
        info,
    })
}

fn non_empty(diagnostics: String, kind: ShaderKind) -> String {
    if diagnostics.trim().is_empty() {
        format!("{kind} shader rejected without diagnostics")
    } else {
        diagnostics
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // The shipped shaders.
    pub(crate) const VERTEX_SRC: &str = include_str!("../../../../shaders/vertex.glsl");
    pub(crate) const FRAGMENT_SRC: &str = include_str!("../../../../shaders/fragment.glsl");

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn compiles_vertex_stage_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "vertex.glsl", VERTEX_SRC);

        let shader = compile_shader(ShaderKind::Vertex, &path).unwrap();
        assert_eq!(shader.kind, ShaderKind::Vertex);
        assert_eq!(shader.path, path);
        assert_eq!(shader.entry_point(), Some("main"));
    }

    #[test]
    fn compiles_fragment_stage_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fragment.glsl", FRAGMENT_SRC);

        let shader = compile_shader(ShaderKind::Fragment, &path).unwrap();
        assert_eq!(shader.entry_point(), Some("main"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.glsl");

        let err = compile_shader(ShaderKind::Vertex, &path).unwrap_err();
        assert!(matches!(err, ShaderError::Io { kind: ShaderKind::Vertex, .. }));
        assert!(err.diagnostics().is_none());
        assert!(err.to_string().contains("nope.glsl"));
    }

    #[test]
    fn syntax_error_yields_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let broken = VERTEX_SRC.replace("v_uv = a_uv;", "v_uv = a_uv");
        let path = write(&dir, "broken.glsl", &broken);

        let err = compile_shader(ShaderKind::Vertex, &path).unwrap_err();
        let diagnostics = err.diagnostics().expect("compile error carries diagnostics");
        assert!(!diagnostics.trim().is_empty());
        assert!(err.to_string().contains("failed to compile"));
    }

    #[test]
    fn long_diagnostics_are_not_truncated() {
        let symbol = format!("undefined_{}", "x".repeat(600));
        let broken = format!(
            "#version 450\nlayout(location = 0) out vec4 o_color;\nvoid main() {{ o_color = vec4({symbol}); }}\n"
        );

        let err = compile_source(ShaderKind::Fragment, Path::new("long.glsl"), &broken)
            .unwrap_err();
        let diagnostics = err.diagnostics().expect("compile error carries diagnostics");
        assert!(diagnostics.len() > 512, "got {} bytes", diagnostics.len());
        assert!(diagnostics.contains(&symbol));
    }

    #[test]
    fn empty_diagnostics_are_replaced() {
        assert_eq!(
            non_empty(String::new(), ShaderKind::Vertex),
            "vertex shader rejected without diagnostics"
        );
        assert_eq!(non_empty("boom".into(), ShaderKind::Vertex), "boom");
    }

    #[test]
    fn stage_kinds_map_to_backend_stages() {
        assert_eq!(ShaderKind::Vertex.naga_stage(), naga::ShaderStage::Vertex);
        assert_eq!(ShaderKind::Fragment.wgpu_stage(), wgpu::ShaderStages::FRAGMENT);
        assert_eq!(ShaderKind::Fragment.to_string(), "fragment");
    }
}
