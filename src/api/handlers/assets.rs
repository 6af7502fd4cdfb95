use anyhow::Context;
use path_clean::PathClean;
use rocket::State;
use rocket::fs::NamedFile;
use rocket::http::uri::{Segments, fmt::Path as UriPath};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::api::ServeError;

/// Directory `GET /<path..>` serves from.
#[derive(Debug, Clone)]
pub struct ServeRoot(pub PathBuf);

/// Join request segments under `root`. Lexical only: the filesystem is not consulted.
///
/// Dotfiles (`.env`, `.git/..`) are never served.
pub fn resolve<'a>(
    root: &Path,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<PathBuf, ServeError> {
    let joined: PathBuf = segments.into_iter().collect();
    let cleaned = joined.clean();
    let rejected = cleaned.components().any(|component| {
        match component {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => true,
            Component::Normal(name) => name.as_encoded_bytes().starts_with(b"."),
            Component::CurDir => false,
        }
    });
    if rejected {
        return Err(ServeError::InvalidPath);
    }
    Ok(root.join(cleaned))
}

// Raw segments: Rocket's own `PathBuf` guard would silently drop `..` instead of rejecting it
#[get("/<path..>", rank = 20)]
pub async fn serve(
    serve_root: &State<ServeRoot>,
    path: Segments<'_, UriPath>,
) -> Result<NamedFile, ServeError> {
    let resolved = resolve(&serve_root.0, path)?;

    match tokio::fs::metadata(&resolved).await {
        Ok(metadata) if metadata.is_file() => NamedFile::open(&resolved)
            .await
            .context(format!("Failed to open {:?}", resolved))
            .map_err(ServeError::Io),
        Ok(_) => Err(ServeError::NotFound),
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) =>
        {
            Err(ServeError::NotFound)
        }
        Err(err) => Err(ServeError::Io(
            anyhow::Error::new(err).context(format!("Failed to stat {:?}", resolved)),
        )),
    }
}

pub fn generate_asset_routes() -> Vec<rocket::Route> {
    routes![serve]
}
