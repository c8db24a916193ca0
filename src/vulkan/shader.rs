use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    sync::Arc,
};

use ash::vk;
use log::debug;

use crate::{RendererError, Result};

use super::Device;

/// Reads a SPIR-V binary and returns it as 32-bit words.
pub fn read_spirv(path: &Path) -> Result<Vec<u32>> {
    let bytes = fs::read(path).map_err(|source| RendererError::ShaderRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_spirv(path, &bytes)
}

fn parse_spirv(path: &Path, bytes: &[u8]) -> Result<Vec<u32>> {
    ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|source| RendererError::ShaderBytecode {
        path: path.to_path_buf(),
        source,
    })
}

/// A shader module that lives only until the pipeline using it is built.
pub struct ShaderModule {
    pub module: vk::ShaderModule,
    pub path: PathBuf,
    device: Arc<Device>,
}

impl ShaderModule {
    pub fn from_file(device: &Arc<Device>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let code = read_spirv(path)?;
        let module = unsafe {
            device.create_shader_module(&vk::ShaderModuleCreateInfo::default().code(&code), None)?
        };
        debug!("Loaded shader {path:?} ({} words)", code.len());
        Ok(Self {
            module,
            path: path.to_path_buf(),
            device: device.clone(),
        })
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe { self.device.destroy_shader_module(self.module, None) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn reads_little_endian_words() {
        let words = [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0];
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let parsed = parse_spirv(Path::new("inline.spv"), &bytes).unwrap();
        assert_eq!(parsed, words);
    }

    #[test]
    fn truncated_bytecode_is_rejected() {
        let bytes = [0x03, 0x02, 0x23, 0x07, 0x00, 0x00];
        let err = parse_spirv(Path::new("broken.spv"), &bytes).unwrap_err();
        assert!(matches!(err, RendererError::ShaderBytecode { .. }));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_spirv(Path::new("no/such/shader.spv")).unwrap_err();
        match err {
            RendererError::ShaderRead { path, .. } => {
                assert_eq!(path, Path::new("no/such/shader.spv"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
