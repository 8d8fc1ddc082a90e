#![allow(dead_code)]

use std::io::{Cursor, Read};

use axum_test::multipart::Part;
use axum_test::TestServer;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use tiffpress_web::{build_router, AppState, Config};

pub fn test_server() -> TestServer {
    test_server_with(Config::default())
}

pub fn test_server_with(config: Config) -> TestServer {
    TestServer::new(build_router(AppState::new(config))).expect("Failed to create test server")
}

/// Small RGB gradient encoded as TIFF.
pub fn tiff_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Tiff)
        .expect("Failed to encode TIFF fixture");
    out.into_inner()
}

pub fn tiff_part(name: &str, bytes: Vec<u8>) -> Part {
    Part::bytes(bytes).file_name(name).mime_type("image/tiff")
}

/// `(name, decoded width, decoded height)` for every archive entry.
pub fn archive_entries(bytes: &[u8]) -> Vec<(String, u32, u32)> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("Invalid zip");
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).expect("Missing entry");
            let mut data = Vec::new();
            file.read_to_end(&mut data).expect("Unreadable entry");
            let jpeg = image::load_from_memory_with_format(&data, ImageFormat::Jpeg)
                .expect("Entry is not a JPEG");
            (file.name().to_string(), jpeg.width(), jpeg.height())
        })
        .collect()
}
