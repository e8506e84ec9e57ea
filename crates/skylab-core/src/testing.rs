//! In-memory transport and image helpers shared by the unit tests.

use crate::error::TransportError;
use crate::transport::{Header, Method, Transport};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded API call.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: Method,
    pub endpoint: String,
    pub payload: Option<Value>,
}

/// One recorded presigned PUT.
#[derive(Debug, Clone)]
pub(crate) struct Put {
    pub url: String,
    pub body: Vec<u8>,
    pub headers: Vec<Header>,
}

#[derive(Default)]
struct State {
    photos: HashMap<u64, Value>,
    jobs: HashMap<u64, Value>,
    profiles: HashMap<u64, Value>,
    assets: HashMap<String, Vec<u8>>,
    next_photo_id: u64,
    create_response: Option<Value>,
    put_failures: VecDeque<TransportError>,
    upload_url_failure: Option<TransportError>,
    calls: Vec<Call>,
    asset_calls: Vec<String>,
    puts: Vec<Put>,
}

/// A fake studio service backed by hash maps.
///
/// Unknown ids answer with `InvalidEndpoint`, like the real 404 mapping.
pub(crate) struct FakeTransport {
    state: Mutex<State>,
    asset_delay: Option<Duration>,
    in_flight: Arc<AtomicU32>,
    max_in_flight: Arc<AtomicU32>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_photo_id: 1000,
                ..State::default()
            }),
            asset_delay: None,
            in_flight: Arc::new(AtomicU32::new(0)),
            max_in_flight: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Hold every asset download for `delay` (for concurrency assertions).
    pub fn with_asset_delay(mut self, delay: Duration) -> Self {
        self.asset_delay = Some(delay);
        self
    }

    pub fn add_photo(&self, photo: Value) {
        let id = photo["id"].as_u64().unwrap();
        self.state.lock().unwrap().photos.insert(id, photo);
    }

    pub fn add_job(&self, job: Value) {
        let id = job["id"].as_u64().unwrap();
        self.state.lock().unwrap().jobs.insert(id, job);
    }

    pub fn add_profile(&self, profile: Value) {
        let id = profile["id"].as_u64().unwrap();
        self.state.lock().unwrap().profiles.insert(id, profile);
    }

    pub fn add_asset(&self, url: &str, bytes: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .assets
            .insert(url.to_string(), bytes);
    }

    /// Override the create-photo response (e.g. `Value::Null`).
    pub fn set_create_response(&self, response: Value) {
        self.state.lock().unwrap().create_response = Some(response);
    }

    /// Make the next `count` PUTs fail with `error`.
    pub fn fail_puts(&self, count: usize, error: TransportError) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..count {
            state.put_failures.push_back(error.clone());
        }
    }

    /// Make every upload-url request fail with `error`.
    pub fn fail_upload_url(&self, error: TransportError) {
        self.state.lock().unwrap().upload_url_failure = Some(error);
    }

    pub fn has_photo(&self, id: u64) -> bool {
        self.state.lock().unwrap().photos.contains_key(&id)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn puts(&self) -> Vec<Put> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn asset_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().asset_calls.clone()
    }

    /// API calls + asset downloads + PUTs.
    pub fn call_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.calls.len() + state.asset_calls.len() + state.puts.len()
    }

    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lookup(map: &HashMap<u64, Value>, id: &str) -> Result<Value, TransportError> {
        id.parse::<u64>()
            .ok()
            .and_then(|id| map.get(&id).cloned())
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("Resource not found: {id}")))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            payload: payload.cloned(),
        });

        let segments: Vec<&str> = endpoint.split('/').collect();
        match (method.as_str(), segments.as_slice()) {
            ("GET", ["photos", "list_for_job"]) => {
                let job_id = payload.and_then(|p| p["job_id"].as_u64());
                let photos: Vec<Value> = state
                    .photos
                    .values()
                    .filter(|p| p["jobId"].as_u64() == job_id)
                    .cloned()
                    .collect();
                Ok(Value::Array(photos))
            }
            ("GET", ["photos", "upload_url"]) => {
                if let Some(error) = state.upload_url_failure.clone() {
                    return Err(error);
                }
                let photo_id = payload.and_then(|p| p["photo_id"].as_u64()).unwrap_or(0);
                Ok(json!({ "url": format!("https://bucket.test/upload/{photo_id}") }))
            }
            ("GET", ["photos", id]) => Self::lookup(&state.photos, id),
            ("GET", ["jobs", id]) => Self::lookup(&state.jobs, id),
            ("GET", ["profiles", id]) => Self::lookup(&state.profiles, id),
            ("POST", ["photos"]) => {
                if let Some(response) = state.create_response.clone() {
                    return Ok(response);
                }
                let payload = payload.cloned().unwrap_or(Value::Null);
                let id = state.next_photo_id;
                state.next_photo_id += 1;
                let record = json!({
                    "id": id,
                    "name": payload["name"],
                    "jobId": payload["job_id"],
                });
                state.photos.insert(id, record.clone());
                Ok(record)
            }
            ("DELETE", ["photos", id]) => {
                let removed = id
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| state.photos.remove(&id));
                match removed {
                    Some(_) => Ok(json!({})),
                    None => Err(TransportError::InvalidEndpoint(endpoint.to_string())),
                }
            }
            _ => Err(TransportError::InvalidEndpoint(endpoint.to_string())),
        }
    }

    async fn put_bytes(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[Header],
    ) -> Result<u16, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.puts.push(Put {
            url: url.to_string(),
            body,
            headers: headers.to_vec(),
        });
        match state.put_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(200),
        }
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.asset_delay {
            tokio::time::sleep(delay).await;
        }
        let result = {
            let mut state = self.state.lock().unwrap();
            state.asset_calls.push(url.to_string());
            state
                .assets
                .get(url)
                .cloned()
                .ok_or_else(|| TransportError::InvalidEndpoint(url.to_string()))
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Encode an image as PNG bytes.
pub(crate) fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// A foreground with a transparent left half and an opaque red right half.
pub(crate) fn extract_image(width: u32, height: u32) -> DynamicImage {
    let image = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([255, 0, 0, 255])
        }
    });
    DynamicImage::ImageRgba8(image)
}

/// A solid opaque background.
pub(crate) fn solid_background(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([color[0], color[1], color[2], 255]),
    ))
}
