//! Browser bindings: a session object the page drives from its file input,
//! drop zone and quality slider, plus console logging.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Blob, BlobPropertyBag, Url};

use crate::compressor::{Compressor, CompressorOptions, DefaultCompressor, FallbackPolicy};
use crate::error::CompressError;
use crate::quality::QualityFraction;
use crate::reencode::CanvasReencoder;
use crate::result::CompressionResult;
use crate::routine::JpegSearchRoutine;
use crate::session::{Completion, Request, Session};
use crate::source::{accepts_drop, SourceImage};

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Routes `log` output to the browser console and installs the panic hook.
/// Safe to call more than once.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(verbose: bool) {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        });
    }
}

#[wasm_bindgen(js_name = acceptsDrop)]
pub fn accepts_dropped_file(mime: &str) -> bool {
    accepts_drop(mime)
}

/// The `blob:` URL currently on screen. Whatever it hands back must be revoked.
#[derive(Debug, Default)]
struct ShownUrl(Option<String>);

impl ShownUrl {
    fn show(&mut self, url: String) -> Option<String> {
        self.0.replace(url)
    }

    fn clear(&mut self) -> Option<String> {
        self.0.take()
    }
}

/// One page's worth of state. `select` and `setQuality` return promises that
/// resolve to `{ url, size, sizeLabel, stage }`, or to `null` when a newer
/// request superseded them. Failures reject with the error message.
#[wasm_bindgen]
pub struct CompressorSession {
    state: Rc<RefCell<Session>>,
    compressor: Rc<DefaultCompressor>,
    shown_url: Rc<RefCell<ShownUrl>>,
}

#[wasm_bindgen]
impl CompressorSession {
    /// `policy` is `"keep-smaller"` (default) or `"always-replace"`.
    #[wasm_bindgen(constructor)]
    pub fn new(quality_percent: u8, policy: Option<String>) -> Result<CompressorSession, JsError> {
        console_error_panic_hook::set_once();
        let policy = match policy.as_deref() {
            Some(name) => name
                .parse::<FallbackPolicy>()
                .map_err(|e| JsError::new(&e.to_string()))?,
            None => FallbackPolicy::default(),
        };
        let options = CompressorOptions {
            policy,
            ..CompressorOptions::default()
        };
        Ok(CompressorSession {
            state: Rc::new(RefCell::new(Session::new(QualityFraction::from_percent(
                quality_percent,
            )))),
            compressor: Rc::new(Compressor::new(JpegSearchRoutine, CanvasReencoder, options)),
            shown_url: Rc::new(RefCell::new(ShownUrl::default())),
        })
    }

    pub fn select(&self, name: String, mime: String, bytes: Vec<u8>) -> Promise {
        let request = self
            .state
            .borrow_mut()
            .select(SourceImage::new(name, mime, bytes));
        revoke(self.shown_url.borrow_mut().clear());
        self.run(request)
    }

    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&self, quality_percent: u8) -> Promise {
        let request = self
            .state
            .borrow_mut()
            .set_quality(QualityFraction::from_percent(quality_percent));
        match request {
            Some(request) => self.run(request),
            None => Promise::resolve(&JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = originalSizeLabel)]
    pub fn original_size_label(&self) -> Option<String> {
        self.state.borrow().original_size_label()
    }

    #[wasm_bindgen(js_name = resultBytes)]
    pub fn result_bytes(&self) -> Option<Vec<u8>> {
        self.state.borrow().result().map(|r| r.bytes().to_vec())
    }

    #[wasm_bindgen(js_name = resultMime)]
    pub fn result_mime(&self) -> Option<String> {
        self.state.borrow().result().map(|r| r.mime().to_string())
    }

    #[wasm_bindgen(js_name = downloadName)]
    pub fn download_name(&self) -> Option<String> {
        self.state.borrow().download_name()
    }
}

impl CompressorSession {
    fn run(&self, request: Request) -> Promise {
        future_to_promise(run_request(
            Rc::clone(&self.state),
            Rc::clone(&self.compressor),
            Rc::clone(&self.shown_url),
            request,
        ))
    }
}

/// Compresses, then builds the display handle before the session sees the
/// result, so the session only holds results the page can show.
async fn run_request(
    state: Rc<RefCell<Session>>,
    compressor: Rc<DefaultCompressor>,
    shown_url: Rc<RefCell<ShownUrl>>,
    request: Request,
) -> Result<JsValue, JsValue> {
    let outcome = compressor.compress(&request.source, request.quality).await;
    if !state.borrow().is_latest(request.seq) {
        state.borrow_mut().complete(request.seq, outcome);
        return Ok(JsValue::NULL);
    }

    let (outcome, shown) = match outcome.and_then(|result| {
        let shown = present(&result).map_err(|e| CompressError::display(format!("{:?}", e)))?;
        Ok((result, shown))
    }) {
        Ok((result, shown)) => (Ok(result), Some(shown)),
        Err(err) => (Err(err), None),
    };

    let completion = state.borrow_mut().complete(request.seq, outcome);
    match (completion, shown) {
        (Completion::Applied, Some((url, view))) => {
            revoke(shown_url.borrow_mut().show(url));
            Ok(view)
        }
        (Completion::Failed(err), _) => Err(JsError::new(&err.to_string()).into()),
        (_, shown) => {
            revoke(shown.map(|(url, _)| url));
            Ok(JsValue::NULL)
        }
    }
}

/// Object URL plus the `{ url, size, sizeLabel, stage }` view for a result.
fn present(result: &CompressionResult) -> Result<(String, JsValue), JsValue> {
    let url = object_url(result)?;
    match result_view(&url, result) {
        Ok(view) => Ok((url, view)),
        Err(e) => {
            revoke(Some(url));
            Err(e)
        }
    }
}

fn revoke(url: Option<String>) {
    if let Some(url) = url {
        if let Err(e) = Url::revoke_object_url(&url) {
            log::warn!("failed to revoke {}: {:?}", url, e);
        }
    }
}

/// Display handle for a result: a `blob:` URL an `<img>` can show.
fn object_url(result: &CompressionResult) -> Result<String, JsValue> {
    let parts = Array::new();
    parts.push(&Uint8Array::from(result.bytes()));
    let options = BlobPropertyBag::new();
    options.set_type(result.mime());
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    Url::create_object_url_with_blob(&blob)
}

fn result_view(url: &str, result: &CompressionResult) -> Result<JsValue, JsValue> {
    let view = Object::new();
    Reflect::set(&view, &"url".into(), &url.into())?;
    Reflect::set(&view, &"size".into(), &JsValue::from_f64(result.size() as f64))?;
    Reflect::set(&view, &"sizeLabel".into(), &result.size_label().into())?;
    Reflect::set(&view, &"stage".into(), &result.stage().as_str().into())?;
    Ok(view.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shown_url_hands_back_replaced_url() {
        let mut shown = ShownUrl::default();
        assert_eq!(shown.show("blob:a".to_string()), None);
        assert_eq!(shown.show("blob:b".to_string()).as_deref(), Some("blob:a"));
    }

    #[test]
    fn test_shown_url_clear_on_new_selection() {
        let mut shown = ShownUrl::default();
        shown.show("blob:old".to_string());
        assert_eq!(shown.clear().as_deref(), Some("blob:old"));
        // Nothing left to revoke once the next result arrives.
        assert_eq!(shown.show("blob:new".to_string()), None);
        assert_eq!(shown.clear().as_deref(), Some("blob:new"));
        assert_eq!(shown.clear(), None);
    }
}
