//! Downloadable ZIP bundle of a finished site.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NAME_PART_MAX_CHARS: usize = 60;

static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).unwrap());

const README: &str = "\
Your Professional Portfolio Website

FILES INCLUDED
- index.html: your complete portfolio
- README.txt: this file
- resume.pdf: your original resume (if available)

HOW TO HOST (FREE)

Option 1: Netlify Drop
1. Go to app.netlify.com/drop
2. Drag this folder onto the page
3. Get an instant URL

Option 2: Vercel
1. Go to vercel.com/new
2. Upload this folder
3. Get an instant URL

Option 3: GitHub Pages
1. Create a repository named <username>.github.io
2. Upload index.html
3. Visit <username>.github.io

Questions? Reply to the delivery email.
";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct ArchiveInput {
    pub order_id: String,
    pub html: String,
    pub resume_pdf: Option<PathBuf>,
    pub customer_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveOutput {
    pub path: PathBuf,
    pub basename: String,
}

#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, input: ArchiveInput) -> Result<ArchiveOutput, ArchiveError>;
}

/// Strips filesystem-unsafe characters, collapses whitespace and caps the length.
fn sanitize_part(input: &str, fallback: &str) -> String {
    let cleaned = RE_UNSAFE.replace_all(input, "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let part = if collapsed.is_empty() { fallback } else { collapsed.as_str() };
    part.chars().take(NAME_PART_MAX_CHARS).collect()
}

/// `<CustomerName>_<emailLocal>--<orderId>.zip`
pub fn archive_basename(customer_name: &str, email: &str, order_id: &str) -> String {
    let local = match email.find('@') {
        Some(at) if at > 0 => &email[..at],
        _ => email,
    };
    format!(
        "{}_{}--{order_id}.zip",
        sanitize_part(customer_name, "Customer"),
        sanitize_part(local, "email")
    )
}

pub struct ZipArchiver {
    dir: PathBuf,
}

impl ZipArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive(&self, input: ArchiveInput) -> Result<ArchiveOutput, ArchiveError> {
        let pdf = match &input.resume_pdf {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Résumé PDF {} not included in archive: {e}", path.display());
                    None
                }
            },
            None => None,
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let basename = archive_basename(&input.customer_name, &input.email, &input.order_id);
        let path = self.dir.join(&basename);

        let target = path.clone();
        let html = input.html;
        tokio::task::spawn_blocking(move || write_zip(&target, &html, pdf.as_deref())).await??;

        info!("Archive for order {} written to {}", input.order_id, path.display());
        Ok(ArchiveOutput { path, basename })
    }
}

fn write_zip(path: &Path, html: &str, pdf: Option<&[u8]>) -> Result<(), ArchiveError> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("index.html", options)?;
        zip.write_all(html.as_bytes())?;
        zip.start_file("README.txt", options)?;
        zip.write_all(README.as_bytes())?;
        if let Some(pdf) = pdf {
            zip.start_file("resume.pdf", options)?;
            zip.write_all(pdf)?;
        }
        zip.finish()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
