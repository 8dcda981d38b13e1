use crate::error::{BlotterError, PageFault};
use crate::extraction::geometry::{BBox, Scale};
use crate::extraction::{PageContent, PageExtraction, PdfExtractor};
use crate::model::{ImageRegion, Token};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Settings for the poppler backend. Sizes are in page units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopplerConfig {
    /// Zoom passed to `pdftohtml`; image boxes come back in this render space.
    pub render_zoom: f32,
    /// Positioned images narrower or shorter than this are treated as logos.
    pub min_image_size: f32,
    /// Positioned images starting this close to the top of the page are page headers.
    pub header_band: f32,
}

impl Default for PopplerConfig {
    fn default() -> Self {
        PopplerConfig {
            render_zoom: 1.5,
            min_image_size: 25.0,
            header_band: 50.0,
        }
    }
}

/// Document source backed by the poppler-utils binaries.
///
/// - `pdftotext -bbox` supplies word tokens,
/// - `pdftotext -layout` supplies the plain-text fallback,
/// - `pdftohtml -xml` supplies positioned images,
/// - `pdfimages -png -p` supplies unpositioned images for pages where
///   `pdftohtml` found none.
pub struct PopplerExtractor {
    config: PopplerConfig,
}

impl PopplerExtractor {
    pub fn new() -> Self {
        Self::with_config(PopplerConfig::default())
    }

    pub fn with_config(config: PopplerConfig) -> Self {
        PopplerExtractor { config }
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PopplerExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PopplerExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, BlotterError> {
        let workdir =
            tempfile::tempdir().map_err(|e| BlotterError::Extraction(e.to_string()))?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::write(&pdf_path, pdf_bytes)
            .map_err(|e| BlotterError::Extraction(e.to_string()))?;

        let words = run_tool(
            "pdftotext",
            &[OsStr::new("-bbox"), pdf_path.as_os_str(), OsStr::new("-")],
        )?;
        let word_pages = parse_word_pages(&String::from_utf8_lossy(&words));

        let layout = run_tool(
            "pdftotext",
            &[OsStr::new("-layout"), pdf_path.as_os_str(), OsStr::new("-")],
        )?;
        let layout = String::from_utf8_lossy(&layout);
        let layout_pages: Vec<&str> = layout.split('\x0c').collect();

        let mut positioned = self.positioned_images(&pdf_path, workdir.path(), &word_pages);
        let need_fallback = (1..=word_pages.len()).any(|n| !positioned.contains_key(&n));
        let mut unpositioned = if need_fallback {
            log::info!("no positioned images on some pages, falling back to pdfimages");
            unpositioned_images(&pdf_path, workdir.path())
        } else {
            BTreeMap::new()
        };

        let pages = word_pages
            .into_iter()
            .enumerate()
            .map(|(i, parsed)| -> PageExtraction {
                let page_number = i + 1;
                let word_page = parsed.map_err(|reason| PageFault::new(page_number, reason))?;
                let images = match positioned.remove(&page_number) {
                    Some(images) => images,
                    None => unpositioned.remove(&page_number).unwrap_or_default(),
                };
                Ok(PageContent {
                    page_number,
                    tokens: word_page.tokens,
                    fallback_text: layout_pages
                        .get(i)
                        .map(|s| s.to_string())
                        .unwrap_or_default(),
                    images,
                })
            })
            .collect();

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "poppler"
    }
}

impl PopplerExtractor {
    /// Images with midpoints in page units, keyed by page number.
    ///
    /// A page is present in the map when `pdftohtml` reported at least one
    /// image on it, even if every image was filtered out as a logo or header.
    fn positioned_images(
        &self,
        pdf_path: &Path,
        workdir: &Path,
        word_pages: &[Result<WordPage, String>],
    ) -> BTreeMap<usize, Vec<ImageRegion>> {
        let html_dir = workdir.join("html");
        if let Err(e) = std::fs::create_dir_all(&html_dir) {
            log::warn!("cannot create pdftohtml output dir: {e}");
            return BTreeMap::new();
        }
        let prefix = html_dir.join("doc");
        let zoom = self.config.render_zoom.to_string();

        let run = run_tool(
            "pdftohtml",
            &[
                OsStr::new("-xml"),
                OsStr::new("-q"),
                OsStr::new("-nodrm"),
                OsStr::new("-fmt"),
                OsStr::new("png"),
                OsStr::new("-zoom"),
                OsStr::new(&zoom),
                pdf_path.as_os_str(),
                prefix.as_os_str(),
            ],
        );
        if let Err(e) = run {
            log::info!("pdftohtml unavailable, images will be unpositioned: {e}");
            return BTreeMap::new();
        }

        let xml = match std::fs::read_to_string(html_dir.join("doc.xml")) {
            Ok(xml) => xml,
            Err(e) => {
                log::warn!("pdftohtml produced no xml: {e}");
                return BTreeMap::new();
            }
        };
        let render_pages = match parse_render_pages(&xml) {
            Ok(pages) => pages,
            Err(e) => {
                log::warn!("could not read pdftohtml xml: {e}");
                return BTreeMap::new();
            }
        };

        let mut out = BTreeMap::new();
        for render_page in render_pages {
            if render_page.images.is_empty() {
                continue;
            }
            let page_dims = word_pages
                .get(render_page.number.saturating_sub(1))
                .and_then(|p| p.as_ref().ok())
                .map(|p| (p.width, p.height));
            let scale = render_to_page_scale(&render_page, page_dims, self.config.render_zoom);

            let mut regions = Vec::new();
            for (bbox, src) in place_images(&render_page, scale, &self.config) {
                let path = resolve_src(&src, &html_dir);
                match std::fs::read(&path) {
                    Ok(bytes) => regions.push(ImageRegion::positioned(bytes, bbox.mid_y())),
                    Err(e) => log::debug!("skipping image {}: {e}", path.display()),
                }
            }
            out.insert(render_page.number, regions);
        }
        out
    }
}

/// Word boxes of one `pdftotext -bbox` page.
#[derive(Debug, Clone, PartialEq)]
struct WordPage {
    width: f32,
    height: f32,
    tokens: Vec<Token>,
}

/// Parse `pdftotext -bbox` output, one entry per page.
///
/// Pages are parsed independently so that one damaged page does not take the
/// rest of the document with it.
fn parse_word_pages(xml: &str) -> Vec<Result<WordPage, String>> {
    split_pages(xml).into_iter().map(parse_word_page).collect()
}

fn split_pages(xml: &str) -> Vec<&str> {
    const CLOSE: &str = "</page>";
    let mut chunks = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find("<page ") {
        let tail = &rest[start..];
        let end = tail.find(CLOSE).map(|i| i + CLOSE.len()).unwrap_or(tail.len());
        chunks.push(&tail[..end]);
        rest = &tail[end..];
    }

    chunks
}

fn parse_word_page(chunk: &str) -> Result<WordPage, String> {
    if !chunk.trim_end().ends_with("</page>") {
        return Err("truncated page data".to_string());
    }

    let mut reader = Reader::from_str(chunk);
    reader.config_mut().trim_text(true);

    let mut page: Option<WordPage> = None;
    let mut current: Option<(f32, f32)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"page" => {
                    page = Some(WordPage {
                        width: attr_f32(&e, "width")?,
                        height: attr_f32(&e, "height")?,
                        tokens: Vec::new(),
                    });
                }
                b"word" => {
                    current = Some((attr_f32(&e, "yMin")?, attr_f32(&e, "xMin")?));
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if current.is_some() {
                    text.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"word" {
                    if let (Some((top, left)), Some(page)) = (current.take(), page.as_mut()) {
                        page.tokens.push(Token::new(text.trim(), top, left));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed word data at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }

    page.ok_or_else(|| "no page element".to_string())
}

/// A page of `pdftohtml -xml` output, in render space.
#[derive(Debug, Clone, PartialEq)]
struct RenderPage {
    number: usize,
    width: f32,
    height: f32,
    images: Vec<RenderImage>,
}

#[derive(Debug, Clone, PartialEq)]
struct RenderImage {
    bbox: BBox,
    src: String,
}

fn parse_render_pages(xml: &str) -> Result<Vec<RenderPage>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut pages: Vec<RenderPage> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"page" => pages.push(RenderPage {
                    number: attr_f32(&e, "number")? as usize,
                    width: attr_f32(&e, "width")?,
                    height: attr_f32(&e, "height")?,
                    images: Vec::new(),
                }),
                b"image" => {
                    let image = RenderImage {
                        bbox: BBox::from_origin_size(
                            attr_f32(&e, "left")?,
                            attr_f32(&e, "top")?,
                            attr_f32(&e, "width")?,
                            attr_f32(&e, "height")?,
                        ),
                        src: attr_string(&e, "src")?,
                    };
                    if let Some(page) = pages.last_mut() {
                        page.images.push(image);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    Ok(pages)
}

/// Scale from a page's render space into its word-box page units.
///
/// Uses the measured page sizes of both outputs; without word-box dimensions
/// it falls back to the inverse of the render zoom.
fn render_to_page_scale(
    render: &RenderPage,
    page_dims: Option<(f32, f32)>,
    zoom: f32,
) -> Scale {
    match page_dims {
        Some((width, height)) if width > 0.0 && height > 0.0 => {
            Scale::between(render.width, render.height, width, height)
        }
        _ if zoom > 0.0 => Scale {
            x: 1.0 / zoom,
            y: 1.0 / zoom,
        },
        _ => Scale::IDENTITY,
    }
}

/// Convert a page's images to page units and drop logos and header images.
fn place_images(
    render: &RenderPage,
    scale: Scale,
    config: &PopplerConfig,
) -> Vec<(BBox, String)> {
    render
        .images
        .iter()
        .filter_map(|img| {
            let bbox = img.bbox.scaled(scale);
            if bbox.width() < config.min_image_size || bbox.height() < config.min_image_size {
                log::debug!("page {}: dropping small image {}", render.number, img.src);
                return None;
            }
            if bbox.y_min < config.header_band {
                log::debug!("page {}: dropping header image {}", render.number, img.src);
                return None;
            }
            Some((bbox, img.src.clone()))
        })
        .collect()
}

fn resolve_src(src: &str, html_dir: &Path) -> PathBuf {
    let path = PathBuf::from(src);
    if path.is_absolute() || path.exists() {
        return path;
    }
    match path.file_name() {
        Some(name) => html_dir.join(name),
        None => html_dir.join(src),
    }
}

/// Every image of the document as raw PNG bytes, keyed by page, without positions.
fn unpositioned_images(pdf_path: &Path, workdir: &Path) -> BTreeMap<usize, Vec<ImageRegion>> {
    let img_dir = workdir.join("img");
    if let Err(e) = std::fs::create_dir_all(&img_dir) {
        log::warn!("cannot create pdfimages output dir: {e}");
        return BTreeMap::new();
    }
    let prefix = img_dir.join("img");

    let run = run_tool(
        "pdfimages",
        &[
            OsStr::new("-png"),
            OsStr::new("-p"),
            pdf_path.as_os_str(),
            prefix.as_os_str(),
        ],
    );
    if let Err(e) = run {
        log::warn!("pdfimages failed, pages will have no images: {e}");
        return BTreeMap::new();
    }

    let entries = match std::fs::read_dir(&img_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot list pdfimages output: {e}");
            return BTreeMap::new();
        }
    };

    let mut found: Vec<(usize, usize, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let (page, num) = parse_pdfimages_name(name.to_str()?)?;
            Some((page, num, entry.path()))
        })
        .collect();
    found.sort();

    let mut out: BTreeMap<usize, Vec<ImageRegion>> = BTreeMap::new();
    for (page, _, path) in found {
        match std::fs::read(&path) {
            Ok(bytes) => out.entry(page).or_default().push(ImageRegion::unpositioned(bytes)),
            Err(e) => log::debug!("skipping image {}: {e}", path.display()),
        }
    }
    out
}

/// Parse `img-PPP-NNN.png` into (page, image number).
fn parse_pdfimages_name(name: &str) -> Option<(usize, usize)> {
    let stem = name.strip_prefix("img-")?.strip_suffix(".png")?;
    let (page, num) = stem.split_once('-')?;
    Some((page.parse().ok()?, num.parse().ok()?))
}

fn run_tool(tool: &'static str, args: &[&OsStr]) -> Result<Vec<u8>, BlotterError> {
    let output = Command::new(tool).args(args).output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            if tool == "pdftotext" {
                BlotterError::PdftotextNotFound
            } else {
                BlotterError::Extraction(format!("{tool} not found"))
            }
        } else {
            BlotterError::Extraction(format!("{tool} failed: {e}"))
        }
    })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(BlotterError::PopplerFailed { tool, code, stderr });
    }

    Ok(output.stdout)
}

fn attr_string(e: &BytesStart, name: &str) -> Result<String, String> {
    let attr = e
        .try_get_attribute(name)
        .map_err(|err| err.to_string())?
        .ok_or_else(|| format!("missing attribute '{name}'"))?;
    let value = attr.unescape_value().map_err(|err| err.to_string())?;
    Ok(value.into_owned())
}

fn attr_f32(e: &BytesStart, name: &str) -> Result<f32, String> {
    let value = attr_string(e, name)?;
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid {name} '{value}'"))
}
