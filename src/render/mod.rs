pub mod fonts;

use image::{ImageBuffer, ImageEncoder, Rgba};
use rusttype::{point, Font, Scale};
use thiserror::Error;

use crate::config::{Config, FieldSource, FontWeight};
use crate::layout::{LayoutEngine, LayoutError, LayoutParams};

const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template: {0}")]
    Template(String),
    #[error("font: {0}")]
    Font(String),
    #[error("layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("png encode: {0}")]
    Encode(String),
}

/// Validated field values for one certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    pub name: String,
    pub course: String,
    pub date: String,
    pub job: Option<String>,
}

/// Draws the configured fields onto the template and returns the PNG
/// bytes. Deterministic: identical inputs and unchanged assets produce
/// byte-identical output. Coordinates past the image bounds simply clip;
/// a missing or unreadable template or font is fatal for the request.
pub fn render_certificate(config: &Config, cert: &Certificate) -> Result<Vec<u8>, RenderError> {
    let mut img = image::open(&config.template_path)
        .map_err(|e| {
            RenderError::Template(format!(
                "failed to open {}: {e}",
                config.template_path.display()
            ))
        })?
        .to_rgba8();
    let canvas_width = img.width();

    for field in &config.fields {
        let value = match field.source {
            FieldSource::Name => cert.name.as_str(),
            FieldSource::Course => cert.course.as_str(),
            FieldSource::Date => cert.date.as_str(),
            FieldSource::Job => match cert.job.as_deref() {
                Some(j) if !j.trim().is_empty() => j,
                _ => continue,
            },
        };
        let text = format!("{}{}", field.label, value);

        let font_path = match field.weight {
            FontWeight::Bold => &config.font_bold,
            FontWeight::Regular => &config.font_regular,
        };
        let font = fonts::load_font(font_path)?;

        let engine = LayoutEngine::new(&font, field.font_size);
        let lines = engine.wrap(
            &text,
            LayoutParams {
                start_y: field.start_y,
                max_width: field.max_width,
                canvas_width,
                line_spacing: config.line_spacing,
                align: field.align,
            },
        )?;

        for line in lines {
            draw_line(&mut img, &font, engine.scale(), line.x, line.y, &line.text);
        }
    }

    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Rasterizes one line with `(x, y)` as its top-left corner, alpha
/// blending glyph coverage over the template.
fn draw_line(
    img: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    font: &Font<'static>,
    scale: Scale,
    x: i32,
    y: i32,
    text: &str,
) {
    let v_metrics = font.v_metrics(scale);
    let baseline = y as f32 + v_metrics.ascent;

    for glyph in font.layout(text, scale, point(x as f32, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 {
                return;
            }
            let (px, py) = (px as u32, py as u32);
            if px >= img.width() || py >= img.height() {
                return;
            }
            let a = (v * 255.0) as u8;
            if a == 0 {
                return;
            }
            let dst = img.get_pixel_mut(px, py);
            let sa = a as f32 / 255.0;
            let inv = 1.0 - sa;
            dst.0[0] = (TEXT_COLOR.0[0] as f32 * sa + dst.0[0] as f32 * inv) as u8;
            dst.0[1] = (TEXT_COLOR.0[1] as f32 * sa + dst.0[1] as f32 * inv) as u8;
            dst.0[2] = (TEXT_COLOR.0[2] as f32 * sa + dst.0[2] as f32 * inv) as u8;
            dst.0[3] = 255;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_fields;
    use crate::layout::Align;
    use std::path::PathBuf;

    fn test_config(dir: &std::path::Path) -> Option<Config> {
        let font = fonts::find_system_font()?;
        let template = dir.join("template.png");
        image::RgbaImage::from_pixel(800, 600, image::Rgba([255, 255, 255, 255]))
            .save(&template)
            .unwrap();
        Some(Config {
            host: "127.0.0.1".into(),
            port: 0,
            template_path: template,
            font_bold: font.clone(),
            font_regular: font,
            line_spacing: 1.0,
            fields: default_fields(40.0, 1200),
            token_cache: None,
            drive_folder: "certo_certificates".into(),
        })
    }

    fn sample() -> Certificate {
        Certificate {
            name: "Ali".into(),
            course: "Security".into(),
            date: "2024-01-01".into(),
            job: None,
        }
    }

    #[test]
    fn renders_a_decodable_png() {
        let dir = tempfile::tempdir().unwrap();
        let Some(config) = test_config(dir.path()) else { return };
        let png = render_certificate(&config, &sample()).unwrap();
        assert!(!png.is_empty());
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 600);
    }

    #[test]
    fn drawing_changes_pixels_at_the_anchored_fields() {
        let dir = tempfile::tempdir().unwrap();
        let Some(config) = test_config(dir.path()) else { return };
        let png = render_certificate(&config, &sample()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        // Every field row should contain at least one darkened pixel.
        for band in [200..260, 300..360, 400..460] {
            let mut touched = false;
            for y in band {
                for x in 300..700 {
                    if decoded.get_pixel(x, y).0[0] < 250 {
                        touched = true;
                    }
                }
            }
            assert!(touched, "expected drawn text in the field band");
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let Some(config) = test_config(dir.path()) else { return };
        let first = render_certificate(&config, &sample()).unwrap();
        let second = render_certificate(&config, &sample()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn job_field_is_skipped_when_absent_and_drawn_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let Some(config) = test_config(dir.path()) else { return };
        let without = render_certificate(&config, &sample()).unwrap();
        let mut cert = sample();
        cert.job = Some("Engineer".into());
        let with = render_certificate(&config, &cert).unwrap();
        assert_ne!(without, with);
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let Some(font) = fonts::find_system_font() else { return };
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            template_path: PathBuf::from("/nonexistent/template.png"),
            font_bold: font.clone(),
            font_regular: font,
            line_spacing: 1.0,
            fields: default_fields(40.0, 1200),
            token_cache: None,
            drive_folder: "certo_certificates".into(),
        };
        let err = render_certificate(&config, &sample()).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn centered_variant_renders_too() {
        let dir = tempfile::tempdir().unwrap();
        let Some(mut config) = test_config(dir.path()) else { return };
        for field in &mut config.fields {
            field.align = Align::Center;
            field.max_width = 400;
        }
        let png = render_certificate(&config, &sample()).unwrap();
        assert!(image::load_from_memory(&png).is_ok());
    }
}
