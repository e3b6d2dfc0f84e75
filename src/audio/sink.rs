//! Turning locators into files and files into `rodio` sinks.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};
use url::Url;

/// Map a track locator to a local file.
///
/// Plain paths and `file://` URLs are accepted; any other scheme is not
/// something this engine can open.
pub(crate) fn resolve_locator(locator: &str) -> Result<PathBuf, String> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err("empty locator".to_string());
    }

    match Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| format!("not a local file url: {locator}")),
        // A one-letter scheme is a Windows drive letter, not a URL.
        Ok(url) if url.scheme().len() > 1 => {
            Err(format!("unsupported locator scheme: {}", url.scheme()))
        }
        _ => Ok(PathBuf::from(locator)),
    }
}

/// Create a paused `Sink` for `path` that starts playback at `start_at`.
///
/// Also returns the decoder's total duration when it knows one.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    path: &Path,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;

    let decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;
    let total = decoder.total_duration();
    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok((sink, total))
}
