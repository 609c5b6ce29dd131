//! PNG output for rendered pages

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::debug;

use crate::pdf::RenderedPage;

/// File name used for a page, e.g. `page-003@1.25x.png`
#[must_use]
pub fn page_file_name(page: &RenderedPage) -> String {
    format!("page-{:03}@{:.2}x.png", page.page, page.scale)
}

/// Write an RGB page bitmap as PNG
pub fn write_png(path: &Path, page: &RenderedPage) -> Result<()> {
    let bitmap = &page.bitmap;
    let expected = bitmap.width_px as usize * bitmap.height_px as usize * 3;
    if bitmap.pixels.len() != expected {
        bail!(
            "page {} bitmap holds {} bytes, expected {expected}",
            page.page,
            bitmap.pixels.len()
        );
    }

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), bitmap.width_px, bitmap.height_px);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Fast);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&bitmap.pixels)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Write every page into `dir`, creating it when missing
pub fn export_pages(dir: &Path, pages: &[&RenderedPage]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    pages
        .iter()
        .map(|page| {
            let path = dir.join(page_file_name(page));
            write_png(&path, page)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::Bitmap;

    fn page(n: usize, w: u32, h: u32) -> RenderedPage {
        RenderedPage {
            page: n,
            scale: 1.5,
            bitmap: Bitmap::filled(w, h, (10, 20, 30)),
        }
    }

    #[test]
    fn names_carry_page_and_scale() {
        assert_eq!(page_file_name(&page(7, 1, 1)), "page-007@1.50x.png");
    }

    #[test]
    fn exports_decodable_png() {
        let dir = tempfile::tempdir().unwrap();
        let rendered = page(1, 4, 3);
        let paths = export_pages(&dir.path().join("out"), &[&rendered]).unwrap();
        assert_eq!(paths.len(), 1);

        let decoder = png::Decoder::new(File::open(&paths[0]).unwrap());
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (4, 3));
        assert_eq!(info.color_type, png::ColorType::Rgb);
    }

    #[test]
    fn rejects_truncated_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let mut rendered = page(2, 4, 4);
        rendered.bitmap.pixels.truncate(10);
        assert!(write_png(&dir.path().join("bad.png"), &rendered).is_err());
    }
}
