#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use codescan::collab::{
    ClassLabel, CollaboratorError, DecodedSymbol, Decoder, Frame, GroundTruth, ImageLoader,
    Localization, Localizer, SymbologyFilter,
};
use codescan::model::{BBox, ImageId, Pixel, Symbology};
use codescan::ScanError;
use image::{DynamicImage, GrayImage, Luma};
use rxing::Writer;

/// An all-black 24-bit BMP.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Renders `contents` as a QR code, 6 px per module with a 4-module quiet zone.
pub fn render_qr(contents: &str) -> GrayImage {
    let code = qrcode::QrCode::new(contents.as_bytes()).expect("encode qr");
    let modules = code.width() as u32;
    let (scale, quiet) = (6u32, 4u32);
    let side = (modules + 2 * quiet) * scale;

    let mut img = GrayImage::from_pixel(side, side, Luma([255]));
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let (mx, my) = (i as u32 % modules, i as u32 / modules);
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel((mx + quiet) * scale + dx, (my + quiet) * scale + dy, Luma([0]));
            }
        }
    }
    img
}

/// Renders `contents` as a Code 128 barcode with a white margin.
pub fn render_code128(contents: &str) -> GrayImage {
    let matrix = rxing::MultiFormatWriter::default()
        .encode(contents, &rxing::BarcodeFormat::CODE_128, 400, 120)
        .expect("encode code 128");
    let margin = 40;
    let mut img = GrayImage::from_pixel(
        matrix.getWidth() + 2 * margin,
        matrix.getHeight() + 2 * margin,
        Luma([255]),
    );
    for y in 0..matrix.getHeight() {
        for x in 0..matrix.getWidth() {
            if matrix.get(x, y) {
                img.put_pixel(x + margin, y + margin, Luma([0]));
            }
        }
    }
    img
}

pub fn write_png(path: &Path, img: &GrayImage) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    img.save(path).expect("write png");
}

/// A file with an image extension that no decoder accepts.
pub fn write_corrupt(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"definitely not an image").expect("write corrupt file");
}

/// Writes a YOLO label file, one `class cx cy w h [conf]` line per entry.
pub fn write_label(path: &Path, lines: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let mut contents = lines.join("\n");
    contents.push('\n');
    fs::write(path, contents).expect("write label file");
}

/// Serves blank 640x480 frames; paths containing "corrupt" fail to load.
pub struct MemoryLoader;

impl ImageLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<DynamicImage, ScanError> {
        if path.to_string_lossy().contains("corrupt") {
            return Err(ScanError::Read {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "truncated file",
                )),
            });
        }
        Ok(DynamicImage::new_rgb8(640, 480))
    }
}

fn bbox(xywh: [f64; 4]) -> BBox<Pixel> {
    BBox::from_xywh(xywh[0], xywh[1], xywh[2], xywh[3])
}

/// Decoder returning fixed symbols per image id.
#[derive(Default)]
pub struct FakeDecoder {
    symbols: HashMap<String, Vec<DecodedSymbol>>,
    failing: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeDecoder {
    pub fn with(mut self, id: &str, symbology: Symbology, payload: &str, xywh: [f64; 4]) -> Self {
        self.symbols.entry(id.to_string()).or_default().push(DecodedSymbol {
            bbox: bbox(xywh),
            payload: payload.to_string(),
            symbology,
        });
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for FakeDecoder {
    fn decode(
        &self,
        frame: &Frame<'_>,
        filter: SymbologyFilter,
    ) -> Result<Vec<DecodedSymbol>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|id| id == frame.id.as_str()) {
            return Err(CollaboratorError::Failed("decoder crashed".to_string()));
        }
        Ok(self
            .symbols
            .get(frame.id.as_str())
            .map(|all| {
                all.iter()
                    .filter(|sym| filter.accepts(sym.symbology))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeLocalizer {
    boxes: HashMap<String, Vec<Localization>>,
    pub calls: AtomicUsize,
}

impl FakeLocalizer {
    pub fn with(mut self, id: &str, confidence: Option<f64>, xywh: [f64; 4]) -> Self {
        let entry = self.boxes.entry(id.to_string()).or_default();
        entry.push(Localization {
            bbox: bbox(xywh),
            class_label: ClassLabel::Single,
            confidence,
        });
        if entry.len() > 1 {
            for loc in entry.iter_mut() {
                loc.class_label = ClassLabel::Multiple;
            }
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Localizer for FakeLocalizer {
    fn locate(&self, frame: &Frame<'_>) -> Result<Vec<Localization>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.boxes.get(frame.id.as_str()).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeGroundTruth {
    boxes: HashMap<String, Vec<BBox<Pixel>>>,
    pub calls: AtomicUsize,
}

impl FakeGroundTruth {
    pub fn with(mut self, id: &str, xywh: [f64; 4]) -> Self {
        self.boxes.entry(id.to_string()).or_default().push(bbox(xywh));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GroundTruth for FakeGroundTruth {
    fn lookup(&self, image: &ImageId) -> Result<Vec<BBox<Pixel>>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.boxes.get(image.as_str()).cloned().unwrap_or_default())
    }
}
