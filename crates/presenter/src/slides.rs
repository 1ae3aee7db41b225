use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use shared::domain::SlideId;
use tracing::{debug, error};

use crate::error::PresenterError;

/// One opaque renderable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub id: SlideId,
    pub payload: String,
}

/// Ordered, non-empty, immutable sequence of slides.
#[derive(Debug, Clone)]
pub struct SlideDeck {
    slides: Vec<Arc<Slide>>,
}

impl SlideDeck {
    pub fn new(slides: Vec<Slide>) -> Result<Self, PresenterError> {
        if slides.is_empty() {
            return Err(PresenterError::EmptyDeck);
        }
        Ok(Self {
            slides: slides.into_iter().map(Arc::new).collect(),
        })
    }

    /// Fetches every slide in order. The first slide that cannot be fetched
    /// aborts the whole load, so indices always match `ids`.
    pub async fn load(loader: &dyn SlideLoader, ids: &[SlideId]) -> Result<Self, PresenterError> {
        if ids.is_empty() {
            return Err(PresenterError::EmptyDeck);
        }

        let mut slides = Vec::with_capacity(ids.len());
        for id in ids {
            let payload = loader.fetch(id).await.map_err(|source| {
                error!(%id, %source, "presenter: slide failed to load, aborting presentation load");
                PresenterError::SlideLoad {
                    id: id.clone(),
                    source,
                }
            })?;
            debug!(%id, bytes = payload.len(), "presenter: slide loaded");
            slides.push(Slide {
                id: id.clone(),
                payload,
            });
        }
        Self::new(slides)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.slides.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Slide>> {
        self.slides.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slide> {
        self.slides.iter().map(|slide| slide.as_ref())
    }
}

#[async_trait]
pub trait SlideLoader: Send + Sync {
    async fn fetch(&self, id: &SlideId) -> io::Result<String>;
}

/// Reads `<root>/<id>.html`, falling back to `<root>/<id>`.
pub struct DirectorySlideLoader {
    root: PathBuf,
}

impl DirectorySlideLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, id: &SlideId) -> io::Result<[PathBuf; 2]> {
        let raw = id.as_str();
        if raw.is_empty() || raw.contains(['/', '\\']) || raw == "." || raw == ".." {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("slide id '{raw}' is not a plain file name"),
            ));
        }
        Ok([self.root.join(format!("{raw}.html")), self.root.join(raw)])
    }
}

#[async_trait]
impl SlideLoader for DirectorySlideLoader {
    async fn fetch(&self, id: &SlideId) -> io::Result<String> {
        let mut last_err = None;
        for path in self.candidates(id)? {
            match tokio::fs::read_to_string(&path).await {
                Ok(payload) => return Ok(payload),
                Err(err) if err.kind() == io::ErrorKind::NotFound => last_err = Some(err),
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotFound)))
    }
}

/// One slide id per line; blank lines and `#` comments are skipped.
pub fn parse_manifest(raw: &str) -> Vec<SlideId> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(SlideId::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_slides_dir(tag: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let root = env::temp_dir().join(format!("presenter_slides_{tag}_{suffix}"));
        fs::create_dir_all(&root).expect("temp root");
        root
    }

    fn ids(raw: &[&str]) -> Vec<SlideId> {
        raw.iter().copied().map(SlideId::new).collect()
    }

    #[tokio::test]
    async fn loads_slides_in_manifest_order() {
        let root = temp_slides_dir("order");
        fs::write(root.join("intro.html"), "<h1>Intro</h1>").expect("write");
        fs::write(root.join("outro"), "<h1>Outro</h1>").expect("write");

        let deck = SlideDeck::load(&DirectorySlideLoader::new(&root), &ids(&["outro", "intro"]))
            .await
            .expect("load");

        let payloads: Vec<&str> = deck.iter().map(|slide| slide.payload.as_str()).collect();
        assert_eq!(payloads, vec!["<h1>Outro</h1>", "<h1>Intro</h1>"]);
        assert_eq!(deck.last_index(), 1);

        fs::remove_dir_all(root).expect("cleanup");
    }

    #[tokio::test]
    async fn missing_slide_fails_the_whole_load() {
        let root = temp_slides_dir("missing");
        fs::write(root.join("a.html"), "A").expect("write");
        fs::write(root.join("c.html"), "C").expect("write");

        let err = SlideDeck::load(&DirectorySlideLoader::new(&root), &ids(&["a", "b", "c"]))
            .await
            .expect_err("must fail");
        match err {
            PresenterError::SlideLoad { id, source } => {
                assert_eq!(id.as_str(), "b");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }

        fs::remove_dir_all(root).expect("cleanup");
    }

    #[tokio::test]
    async fn empty_id_list_is_rejected() {
        let loader = DirectorySlideLoader::new(env::temp_dir());
        assert!(matches!(
            SlideDeck::load(&loader, &[]).await,
            Err(PresenterError::EmptyDeck)
        ));
    }

    #[tokio::test]
    async fn ids_cannot_escape_the_slide_directory() {
        let loader = DirectorySlideLoader::new(env::temp_dir());
        let err = loader
            .fetch(&SlideId::new("../etc/passwd"))
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn manifest_skips_blank_lines_and_comments() {
        let parsed = parse_manifest("# talk\nintro\n\n  agenda  \n#skip\nsummary\n");
        assert_eq!(parsed, ids(&["intro", "agenda", "summary"]));
    }
}
