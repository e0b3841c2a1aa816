// src/services/storage_service.rs

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::common::error::AppError;

/// Armazenamento de objetos (fotos de perfil, logos).
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<(), AppError>;

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, AppError>;

    async fn delete(&self, path: &str) -> Result<(), AppError>;

    fn public_url(&self, path: &str) -> String;
}

pub type SharedObjectStorage = Arc<dyn ObjectStorage>;

pub struct LocalObjectStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    // Só caminhos relativos simples; nada de `..` ou raiz absoluta.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(AppError::InvalidInput(format!("caminho de objeto inválido: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>, AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

/// Reenvio com backoff exponencial até esgotar o orçamento de tempo.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub budget: Duration,
}

impl RetryPolicy {
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            budget,
        }
    }
}

pub async fn put_with_retry(
    storage: &dyn ObjectStorage,
    policy: RetryPolicy,
    path: &str,
    bytes: &[u8],
    content_type: &str,
) -> Result<(), AppError> {
    let started = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt = 1u32;

    loop {
        match storage.put(path, bytes, content_type).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                let elapsed = started.elapsed();
                if elapsed + delay > policy.budget {
                    tracing::error!("❌ Upload de '{}' desistiu após {} tentativas: {}", path, attempt, e);
                    return Err(e);
                }
                tracing::warn!(
                    "⚠️ Upload de '{}' falhou (tentativa {}), nova tentativa em {:?}: {}",
                    path,
                    attempt,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
        }
    }
}

/// Content-type servido para um objeto gravado, pela extensão.
pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("jpg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Extensão do arquivo para um content-type de imagem; `None` se não for imagem.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyStorage {
        failures_left: AtomicU32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ObjectStorage for FlakyStorage {
        async fn put(&self, _path: &str, _bytes: &[u8], _ct: &str) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(std::io::Error::other("rede instável").into());
            }
            Ok(())
        }

        async fn get(&self, _path: &str) -> Result<Option<Vec<u8>>, AppError> {
            Ok(None)
        }

        async fn delete(&self, _path: &str) -> Result<(), AppError> {
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            path.to_string()
        }
    }

    fn quick(budget_ms: u64) -> RetryPolicy {
        RetryPolicy {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            budget: Duration::from_millis(budget_ms),
        }
    }

    #[tokio::test]
    async fn retries_until_the_upload_succeeds() {
        let storage = FlakyStorage {
            failures_left: AtomicU32::new(3),
            calls: AtomicU32::new(0),
        };

        put_with_retry(&storage, quick(5_000), "a.png", b"x", "image/png").await.unwrap();

        assert_eq!(storage.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn gives_up_when_the_budget_is_spent() {
        let storage = FlakyStorage {
            failures_left: AtomicU32::new(u32::MAX),
            calls: AtomicU32::new(0),
        };

        let result = put_with_retry(&storage, quick(20), "a.png", b"x", "image/png").await;

        assert_matches!(result, Err(AppError::StorageError(_)));
        assert!(storage.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn local_storage_writes_and_deletes_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://localhost:3000/files/");

        storage.put("users/u1/photo.png", b"png", "image/png").await.unwrap();
        assert!(dir.path().join("users/u1/photo.png").exists());
        assert_eq!(storage.get("users/u1/photo.png").await.unwrap(), Some(b"png".to_vec()));
        assert_eq!(
            storage.public_url("users/u1/photo.png"),
            "http://localhost:3000/files/users/u1/photo.png"
        );

        storage.delete("users/u1/photo.png").await.unwrap();
        storage.delete("users/u1/photo.png").await.unwrap();
        assert!(!dir.path().join("users/u1/photo.png").exists());
        assert_eq!(storage.get("users/u1/photo.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_paths_escaping_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://x");

        assert_matches!(storage.put("../evil", b"x", "image/png").await, Err(AppError::InvalidInput(_)));
        assert_matches!(storage.put("/etc/passwd", b"x", "image/png").await, Err(AppError::InvalidInput(_)));
    }

    #[test]
    fn only_images_have_an_extension() {
        assert_eq!(image_extension("image/PNG"), Some("png"));
        assert_eq!(image_extension("image/jpeg; charset=binary"), Some("jpg"));
        assert_eq!(image_extension("application/pdf"), None);
        assert_eq!(content_type_for("users/u1/photo-1.jpg"), "image/jpeg");
        assert_eq!(content_type_for("notes.txt"), "application/octet-stream");
    }
}
