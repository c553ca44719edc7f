//! Texture registry: level texture keys resolved to handles once at startup.

use crate::entity::TextureHandle;
use std::collections::{BTreeMap, HashMap};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read texture {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: ledge_render::TextureError,
    },
}

/// Turns an image path into a texture the renderer can bind.
pub trait TextureLoader {
    fn load_texture(&mut self, path: &str) -> Result<TextureHandle, AssetError>;
}

#[derive(Debug, Clone, Default)]
pub struct TextureSet {
    handles: BTreeMap<String, TextureHandle>,
}

impl TextureSet {
    /// Load every texture in `textures` (key -> path). A path shared by
    /// several keys is loaded once.
    pub fn load(
        textures: &BTreeMap<String, String>,
        loader: &mut impl TextureLoader,
    ) -> Result<Self, AssetError> {
        let mut by_path: HashMap<&str, TextureHandle> = HashMap::new();
        let mut handles = BTreeMap::new();
        for (key, path) in textures {
            let handle = match by_path.get(path.as_str()) {
                Some(&handle) => handle,
                None => {
                    let handle = loader.load_texture(path)?;
                    by_path.insert(path, handle);
                    handle
                }
            };
            log::debug!("Texture '{key}' -> {path} ({handle:?})");
            handles.insert(key.clone(), handle);
        }
        log::info!(
            "Loaded {} textures for {} keys",
            by_path.len(),
            handles.len()
        );
        Ok(Self { handles })
    }

    pub fn get(&self, key: &str) -> Option<TextureHandle> {
        self.handles.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Hands out sequential handles and records every path it was asked for.
    #[derive(Default)]
    pub(crate) struct FakeLoader {
        pub loaded: Vec<String>,
    }

    impl TextureLoader for FakeLoader {
        fn load_texture(&mut self, path: &str) -> Result<TextureHandle, AssetError> {
            if path.contains("missing") {
                return Err(AssetError::Read {
                    path: path.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
                });
            }
            self.loaded.push(path.to_string());
            Ok(TextureHandle(self.loaded.len() as u32 - 1))
        }
    }

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn shared_paths_load_once() {
        let mut loader = FakeLoader::default();
        let set = TextureSet::load(
            &map(&[
                ("enemy", "assets/textures/enemy.png"),
                ("font", "assets/textures/font.png"),
                ("walker", "assets/textures/enemy.png"),
            ]),
            &mut loader,
        )
        .unwrap();

        assert_eq!(loader.loaded.len(), 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get("enemy"), set.get("walker"));
        assert_ne!(set.get("enemy"), set.get("font"));
        assert_eq!(set.get("player"), None);
    }

    #[test]
    fn loader_failure_names_the_path() {
        let mut loader = FakeLoader::default();
        let err = TextureSet::load(&map(&[("x", "missing.png")]), &mut loader).unwrap_err();
        assert!(err.to_string().contains("missing.png"));
    }
}
