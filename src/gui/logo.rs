use anyhow::Context;
use eframe::egui;
use std::path::{Path, PathBuf};

const LOGO_HEIGHT: f32 = 32.0;

/// Decode the logo file into an egui image.
pub fn decode_logo(path: &Path) -> anyhow::Result<egui::ColorImage> {
    let img = image::open(path).with_context(|| format!("failed to open logo {}", path.display()))?;
    let size = [img.width() as usize, img.height() as usize];
    let rgba = img.to_rgba8();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// Logo shown next to the title. The texture is loaded on first use; a file
/// that fails to load is reported once and then skipped.
pub struct TitleLogo {
    path: PathBuf,
    texture: Option<egui::TextureHandle>,
    failed: bool,
}

impl TitleLogo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            texture: None,
            failed: false,
        }
    }

    fn load_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() || self.failed {
            return;
        }
        match decode_logo(&self.path) {
            Ok(image) => {
                self.texture = Some(ctx.load_texture("title_logo", image, egui::TextureOptions::LINEAR));
            }
            Err(e) => {
                tracing::warn!(error = %e, "logo not shown");
                self.failed = true;
            }
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui) {
        self.load_texture(ui.ctx());
        if let Some(tex) = &self.texture {
            let size = tex.size_vec2();
            let scale = LOGO_HEIGHT / size.y.max(1.0);
            ui.add(egui::Image::new(tex).fit_to_exact_size(size * scale));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_logo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();
        let decoded = decode_logo(&path).unwrap();
        assert_eq!(decoded.size, [4, 2]);
        assert_eq!(decoded.pixels[0], egui::Color32::from_rgb(10, 20, 30));
    }

    #[test]
    fn missing_logo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut logo = TitleLogo::new(dir.path().join("missing.png"));
        assert!(decode_logo(&logo.path).is_err());
        egui::__run_test_ui(|ui| logo.ui(ui));
        assert!(logo.failed);
        assert!(logo.texture.is_none());
    }
}
