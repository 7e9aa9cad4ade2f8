use std::path::PathBuf;

use crate::layout::Align;

/// Which form field a drawn line comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Name,
    Job,
    Course,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Bold,
    Regular,
}

/// One hard-coded text slot on the template: label prefix, vertical
/// offset, font, and wrap width. The table lives in `Config` so handlers
/// receive it explicitly instead of reaching for globals.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub source: FieldSource,
    pub label: &'static str,
    pub start_y: i32,
    pub font_size: f32,
    pub max_width: u32,
    pub align: Align,
    pub weight: FontWeight,
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub template_path: PathBuf,
    pub font_bold: PathBuf,
    pub font_regular: PathBuf,
    pub line_spacing: f32,
    pub fields: Vec<FieldSpec>,
    /// Path of the serialized OAuth token cache. Absent disables the
    /// Drive copy entirely.
    pub token_cache: Option<PathBuf>,
    pub drive_folder: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8090".to_string())
            .parse()
            .unwrap_or(8090);

        let template_path = PathBuf::from(
            std::env::var("CERT_TEMPLATE").unwrap_or_else(|_| "assets/template.png".to_string()),
        );

        let font_bold = resolve_font("CERT_FONT_BOLD", "assets/Rubik-Bold.ttf")?;
        let font_regular = resolve_font("CERT_FONT_REGULAR", "assets/Rubik-Regular.ttf")?;

        let line_spacing: f32 = std::env::var("CERT_LINE_SPACING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        let font_size: f32 = std::env::var("CERT_FONT_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(40.0);

        let max_width: u32 = std::env::var("CERT_MAX_WIDTH")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1200);

        let token_cache = std::env::var("DRIVE_TOKEN_CACHE").ok().map(PathBuf::from);
        let drive_folder =
            std::env::var("DRIVE_FOLDER").unwrap_or_else(|_| "certo_certificates".to_string());

        Ok(Self {
            host,
            port,
            template_path,
            font_bold,
            font_regular,
            line_spacing,
            fields: default_fields(font_size, max_width),
            token_cache,
            drive_folder,
        })
    }
}

/// The simplest template variant: three labeled fields down the left
/// side at a fixed x anchor, plus an optional job line drawn only when
/// the form supplies one.
pub fn default_fields(font_size: f32, max_width: u32) -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            source: FieldSource::Name,
            label: "Name: ",
            start_y: 200,
            font_size,
            max_width,
            align: Align::Anchor(300),
            weight: FontWeight::Bold,
        },
        FieldSpec {
            source: FieldSource::Course,
            label: "Course: ",
            start_y: 300,
            font_size,
            max_width,
            align: Align::Anchor(300),
            weight: FontWeight::Bold,
        },
        FieldSpec {
            source: FieldSource::Date,
            label: "Date: ",
            start_y: 400,
            font_size,
            max_width,
            align: Align::Anchor(300),
            weight: FontWeight::Bold,
        },
        FieldSpec {
            source: FieldSource::Job,
            label: "Title: ",
            start_y: 500,
            font_size,
            max_width,
            align: Align::Anchor(300),
            weight: FontWeight::Regular,
        },
    ]
}

fn resolve_font(
    var: &str,
    default: &str,
) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
    if let Ok(path) = std::env::var(var) {
        return Ok(PathBuf::from(path));
    }
    let default = PathBuf::from(default);
    if default.exists() {
        return Ok(default);
    }
    crate::render::fonts::find_system_font().ok_or_else(|| {
        format!("{var} not set and no usable font found. Install: apt install fonts-liberation")
            .into()
    })
}
