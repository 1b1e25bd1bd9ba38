//! SPIR-V loading and shader modules

use ash::{vk, Device};
use std::ffi::CStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{VulkanError, VulkanResult};

/// Entry point used by both fullscreen shader stages
pub const ENTRY_POINT: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// Vertex shader file name inside the shader directory
pub const VERTEX_SHADER_FILE: &str = "fullscreen.vert.spv";
/// Fragment shader file name inside the shader directory
pub const FRAGMENT_SHADER_FILE: &str = "fullscreen.frag.spv";

/// Read a SPIR-V file into words
///
/// Files whose length is not a multiple of four bytes are rejected.
pub fn load_spirv(path: &Path) -> VulkanResult<Vec<u32>> {
    let shader_error = |source| VulkanError::ShaderLoad {
        path: path.display().to_string(),
        source,
    };
    let file = File::open(path).map_err(shader_error)?;
    ash::util::read_spv(&mut BufReader::new(file)).map_err(shader_error)
}

/// Pick the shader directory
///
/// An explicit directory wins. Otherwise `shaders/` next to the executable is
/// used when it exists, falling back to `shaders/` under the working directory.
pub fn resolve_shader_dir(configured: Option<&str>) -> PathBuf {
    if let Some(dir) = configured {
        return PathBuf::from(dir);
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("shaders")));
    match beside_exe {
        Some(dir) if dir.is_dir() => dir,
        _ => PathBuf::from("shaders"),
    }
}

/// SPIR-V for the fullscreen pipeline's two stages
#[derive(Debug, Clone)]
pub struct FullscreenShaders {
    /// Vertex stage words
    pub vertex: Vec<u32>,
    /// Fragment stage words
    pub fragment: Vec<u32>,
}

impl FullscreenShaders {
    /// Load both stages from `dir`
    pub fn load(dir: &Path) -> VulkanResult<Self> {
        let shaders = Self {
            vertex: load_spirv(&dir.join(VERTEX_SHADER_FILE))?,
            fragment: load_spirv(&dir.join(FRAGMENT_SHADER_FILE))?,
        };
        log::debug!("Loaded fullscreen shaders from {}", dir.display());
        Ok(shaders)
    }
}

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V words
    pub fn new(device: Device, code: &[u32]) -> VulkanResult<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(code);
        let module = unsafe { device.create_shader_module(&create_info, None).map_err(VulkanError::Api)? };
        Ok(Self { device, module })
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Stage description using [`ENTRY_POINT`]
    pub fn stage_info(&self, stage: vk::ShaderStageFlags) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(ENTRY_POINT)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn test_load_spirv_words() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.spv");
        let mut bytes = SPIRV_MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();

        let words = load_spirv(&path).unwrap();
        assert_eq!(words, vec![SPIRV_MAGIC, 0x0001_0000]);
    }

    #[test]
    fn test_load_spirv_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.spv");
        std::fs::write(&path, [0x03, 0x02, 0x23, 0x07, 0x00]).unwrap();

        assert!(matches!(load_spirv(&path), Err(VulkanError::ShaderLoad { .. })));
    }

    #[test]
    fn test_missing_shader_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = FullscreenShaders::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(VERTEX_SHADER_FILE));
    }

    #[test]
    fn test_configured_shader_dir_wins() {
        assert_eq!(resolve_shader_dir(Some("/opt/fractal/shaders")), PathBuf::from("/opt/fractal/shaders"));
        assert!(resolve_shader_dir(None).ends_with("shaders"));
    }
}
