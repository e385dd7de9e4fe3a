#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use webstack_logos::api::{Fetch, FetchResponse};
use webstack_logos::catalog::LinkId;
use webstack_logos::error::AcquireResult;

/// Serves canned responses by exact URL and records every request.
/// Unknown URLs get a 404.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, FetchResponse>,
    requests: RefCell<Vec<(String, Option<String>)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                status,
                body: body.into(),
            },
        );
        self
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn user_agent_for(&self, url: &str) -> Option<String> {
        self.requests
            .borrow()
            .iter()
            .find(|(requested, _)| requested == url)
            .and_then(|(_, agent)| agent.clone())
    }
}

impl Fetch for FakeFetcher {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> AcquireResult<FetchResponse> {
        self.requests
            .borrow_mut()
            .push((url.to_string(), user_agent.map(str::to_string)));
        let not_found = FetchResponse {
            status: 404,
            body: Vec::new(),
        };
        Ok(self.responses.get(url).cloned().unwrap_or(not_found))
    }
}

pub fn direct(category: usize, index: usize) -> LinkId {
    LinkId::Direct { category, index }
}

pub fn grouped(category: usize, term: usize, index: usize) -> LinkId {
    LinkId::Grouped {
        category,
        term,
        index,
    }
}

pub fn google_lookup(domain: &str) -> String {
    format!("https://www.google.com/s2/favicons?domain={domain}&sz=128")
}

pub fn favicon_io(domain: &str) -> String {
    format!("https://favicon.io/api/get?url={domain}")
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
    encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}
