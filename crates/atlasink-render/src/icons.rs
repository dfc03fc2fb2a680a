//! Icon decoding for sign shapes.

use atlasink_core::surface::{IconError, IconImage};
use std::path::Path;

/// Decode PNG, JPEG or WebP bytes into straight-alpha RGBA8.
pub fn decode_icon(bytes: &[u8]) -> Result<IconImage, IconError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| IconError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    IconImage::new(width, height, rgba.into_vec())
}

/// Read and decode an icon from disk.
pub fn load_icon_file(path: impl AsRef<Path>) -> Result<IconImage, IconError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IconError::Fetch(format!("{}: {e}", path.display())))?;
    decode_icon(&bytes)
}

/// Resolve an icon url against a local directory.
///
/// `file://` urls and plain paths are supported; anything with another
/// scheme is reported as unreachable.
pub fn resolve_icon_path(url: &str, base: &Path) -> Result<std::path::PathBuf, IconError> {
    let path = match url.split_once("://") {
        Some(("file", rest)) => rest,
        Some((scheme, _)) => {
            return Err(IconError::Fetch(format!("unsupported scheme `{scheme}` in {url}")));
        }
        None => url,
    };
    let path = Path::new(path);
    Ok(if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut img = RgbaImage::new(2, 3);
        img.put_pixel(1, 2, Rgba([10, 20, 30, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let icon = decode_icon(&png_bytes()).unwrap();
        assert_eq!((icon.width, icon.height), (2, 3));
        let last = &icon.rgba[icon.rgba.len() - 4..];
        assert_eq!(last, &[10, 20, 30, 40]);
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_icon(b"not an image"), Err(IconError::Decode(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.png");
        std::fs::write(&path, png_bytes()).unwrap();
        assert!(load_icon_file(&path).is_ok());
        assert!(matches!(
            load_icon_file(dir.path().join("missing.png")),
            Err(IconError::Fetch(_))
        ));
    }

    #[test]
    fn test_resolve_paths() {
        let base = Path::new("/icons");
        assert_eq!(resolve_icon_path("stop.png", base).unwrap(), Path::new("/icons/stop.png"));
        assert_eq!(
            resolve_icon_path("file:///tmp/yield.png", base).unwrap(),
            Path::new("/tmp/yield.png")
        );
        assert!(resolve_icon_path("https://example.com/a.png", base).is_err());
    }
}
