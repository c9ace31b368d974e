use crate::render::{HeadlessError, LayoutOptions, SvgRenderOptions, render_artifact_svg};
use base64::Engine as _;
use studymap_core::{Artifact, StudyConfig};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Headless(#[from] HeadlessError),
    #[error("nothing has been rendered yet")]
    NothingRendered,
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
    #[error("invalid background color: {0}")]
    InvalidBackground(String),
    #[error("export requires an opaque background color (e.g. white), got {0:?}")]
    OpaqueBackgroundRequired(String),
    #[error("failed to encode JPG")]
    JpegEncode,
    #[error("failed to convert SVG to PDF")]
    PdfConvert,
}

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Pdf,
}

impl RasterFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Pdf => "pdf",
        }
    }
}

impl std::str::FromStr for RasterFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unsupported raster format: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Supersampling factor applied to the SVG's viewBox size.
    pub scale: f32,
    /// Solid fill painted under the drawing. Rendered SVG has no background of its own.
    pub background: String,
    pub jpeg_quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            background: "white".to_string(),
            jpeg_quality: 90,
        }
    }
}

impl RasterOptions {
    pub fn from_config(config: &StudyConfig) -> Self {
        let d = Self::default();
        Self {
            scale: config
                .get_f64("export.scale")
                .filter(|s| s.is_finite() && *s > 0.0)
                .map_or(d.scale, |s| s as f32),
            background: config
                .get_str("export.background")
                .map_or(d.background, str::to_string),
            jpeg_quality: config
                .get_u64("export.jpegQuality")
                .map_or(d.jpeg_quality, |q| q.clamp(1, 100) as u8),
        }
    }
}

pub fn svg_to_png(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options.scale, &options.background)?;
    pixmap.encode_png().map_err(|_| RasterError::PngEncode)
}

pub fn svg_to_jpeg(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, options.scale, &options.background)?;
    let (w, h) = (pixmap.width(), pixmap.height());

    // The background is opaque, so alpha is always 255 and can be dropped.
    let rgba = pixmap.data();
    let mut rgb = vec![0u8; (w as usize) * (h as usize) * 3];
    for (src, dst) in rgba.chunks_exact(4).zip(rgb.chunks_exact_mut(3)) {
        dst.copy_from_slice(&src[..3]);
    }

    let mut out = Vec::new();
    let mut enc =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
    enc.encode(&rgb, w, h, image::ExtendedColorType::Rgb8)
        .map_err(|_| RasterError::JpegEncode)?;
    Ok(out)
}

/// Vector PDF. The background is drawn as a full-page rect so it survives conversion.
pub fn svg_to_pdf(svg: &str, options: &RasterOptions) -> Result<Vec<u8>> {
    opaque_background(&options.background)?;
    let svg = with_background_rect(svg, &options.background);
    let mut opt = svg2pdf::usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = svg2pdf::usvg::Tree::from_str(&svg, &opt).map_err(|_| RasterError::SvgParse)?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| RasterError::PdfConvert)
}

/// `data:image/png;base64,...` for inline embedding.
pub fn png_data_url(svg: &str, options: &RasterOptions) -> Result<String> {
    let png = svg_to_png(svg, options)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    ))
}

pub fn export(svg: &str, format: RasterFormat, options: &RasterOptions) -> Result<Vec<u8>> {
    match format {
        RasterFormat::Png => svg_to_png(svg, options),
        RasterFormat::Jpeg => svg_to_jpeg(svg, options),
        RasterFormat::Pdf => svg_to_pdf(svg, options),
    }
}

/// Holds the most recently rendered drawing and exports it on request.
///
/// Exporting before anything was rendered is a caller error ([`RasterError::NothingRendered`]),
/// not an empty image.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: RasterOptions,
    rendered: Option<String>,
}

impl Exporter {
    pub fn new(options: RasterOptions) -> Self {
        Self {
            options,
            rendered: None,
        }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    pub fn set_rendered(&mut self, svg: impl Into<String>) {
        self.rendered = Some(svg.into());
    }

    /// Renders an artifact and remembers it. Artifacts without a drawing leave the previous
    /// render in place and return `false`.
    pub fn render_artifact(
        &mut self,
        artifact: &Artifact,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<bool> {
        match render_artifact_svg(artifact, layout_options, svg_options)? {
            Some(svg) => {
                self.rendered = Some(svg);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn rendered(&self) -> Option<&str> {
        self.rendered.as_deref()
    }

    pub fn export(&self, format: RasterFormat) -> Result<Vec<u8>> {
        let svg = self.rendered.as_deref().ok_or(RasterError::NothingRendered)?;
        let bytes = export(svg, format, &self.options)?;
        tracing::info!(
            format = format.extension(),
            scale = self.options.scale,
            bytes = bytes.len(),
            "exported rendered artifact"
        );
        Ok(bytes)
    }

    pub fn png_data_url(&self) -> Result<String> {
        let svg = self.rendered.as_deref().ok_or(RasterError::NothingRendered)?;
        png_data_url(svg, &self.options)
    }
}

fn parse_svg_viewbox(svg: &str) -> Option<(f32, f32)> {
    // Non-validating parse of the root `viewBox="minX minY w h"`; our own SVG always has one.
    let i = svg.find("viewBox=\"")?;
    let rest = &svg[i + "viewBox=\"".len()..];
    let end = rest.find('"')?;
    let mut it = rest[..end].split_whitespace();
    let _min_x = it.next()?.parse::<f32>().ok()?;
    let _min_y = it.next()?.parse::<f32>().ok()?;
    let width = it.next()?.parse::<f32>().ok()?;
    let height = it.next()?.parse::<f32>().ok()?;
    (width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0)
        .then_some((width, height))
}

fn with_background_rect(svg: &str, background: &str) -> String {
    let Some(open_end) = svg.find("<svg").and_then(|i| svg[i..].find('>').map(|j| i + j + 1))
    else {
        return svg.to_string();
    };
    let mut out = String::with_capacity(svg.len() + 80);
    out.push_str(&svg[..open_end]);
    out.push_str(r#"<rect x="0" y="0" width="100%" height="100%" fill=""#);
    out.push_str(&background.replace('"', ""));
    out.push_str(r#""/>"#);
    out.push_str(&svg[open_end..]);
    out
}

fn opaque_background(background: &str) -> Result<tiny_skia::Color> {
    let color = parse_tiny_skia_color(background)
        .ok_or_else(|| RasterError::InvalidBackground(background.to_string()))?;
    if color.alpha() != 1.0 {
        return Err(RasterError::OpaqueBackgroundRequired(background.to_string()));
    }
    Ok(color)
}

fn svg_to_pixmap(svg: &str, scale: f32, background: &str) -> Result<tiny_skia::Pixmap> {
    let color = opaque_background(background)?;

    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = "Arial".to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| RasterError::SvgParse)?;
    let (width, height) = parse_svg_viewbox(svg).unwrap_or_else(|| {
        let size = tree.size();
        (size.width(), size.height())
    });

    let width_px = (width * scale).ceil().max(1.0) as u32;
    let height_px = (height * scale).ceil().max(1.0) as u32;
    let mut pixmap = tiny_skia::Pixmap::new(width_px, height_px).ok_or(RasterError::PixmapAlloc)?;
    pixmap.fill(color);

    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    tracing::debug!(width_px, height_px, scale, "rasterized svg");
    Ok(pixmap)
}

fn parse_tiny_skia_color(text: &str) -> Option<tiny_skia::Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(tiny_skia::Color::from_rgba8(255, 255, 255, 255)),
        "black" => return Some(tiny_skia::Color::from_rgba8(0, 0, 0, 255)),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    fn hex2(b: &[u8]) -> Option<u8> {
        let hi = (*b.first()? as char).to_digit(16)? as u8;
        let lo = (*b.get(1)? as char).to_digit(16)? as u8;
        Some((hi << 4) | lo)
    }
    fn hex1(c: u8) -> Option<u8> {
        let v = (c as char).to_digit(16)? as u8;
        Some((v << 4) | v)
    }

    let bytes = hex.as_bytes();
    let (r, g, b, a) = match bytes.len() {
        3 => (hex1(bytes[0])?, hex1(bytes[1])?, hex1(bytes[2])?, 255),
        4 => (
            hex1(bytes[0])?,
            hex1(bytes[1])?,
            hex1(bytes[2])?,
            hex1(bytes[3])?,
        ),
        6 => (
            hex2(&bytes[0..2])?,
            hex2(&bytes[2..4])?,
            hex2(&bytes[4..6])?,
            255,
        ),
        8 => (
            hex2(&bytes[0..2])?,
            hex2(&bytes[2..4])?,
            hex2(&bytes[4..6])?,
            hex2(&bytes[6..8])?,
        ),
        _ => return None,
    };
    Some(tiny_skia::Color::from_rgba8(r, g, b, a))
}
