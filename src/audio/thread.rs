use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;
use crate::library::TrackId;
use crate::playback::{EngineEvent, EngineMessage};

use super::sink::create_sink_at;
use super::types::EngineCmd;

/// Callback receiving everything the audio thread reports.
pub(super) type EventSink = Box<dyn Fn(EngineMessage) + Send + 'static>;

/// The file currently bound to the engine.
struct Loaded {
    track_id: TrackId,
    path: PathBuf,
    sink: Sink,
    // Position bookkeeping: `accumulated` holds time played before the last
    // (re)start; `started_at` is set only while playing.
    started_at: Option<Instant>,
    accumulated: Duration,
    ended: bool,
}

impl Loaded {
    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<EngineCmd>,
    emit: EventSink,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        // Without a device the thread still runs and answers every load with an
        // error event, so the rest of the app keeps working.
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped; the shell owns stderr.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                error!(error = %e, "no audio output device");
                None
            }
        };

        let tick = Duration::from_millis(audio_settings.position_interval_ms.max(1));
        let mut current: Option<Loaded> = None;
        let mut volume: f32 = 1.0;

        let send = |track_id: &TrackId, event: EngineEvent| {
            emit(EngineMessage::new(track_id.clone(), event));
        };

        loop {
            match rx.recv_timeout(tick) {
                Ok(cmd) => match cmd {
                    EngineCmd::Load { track_id, path } => {
                        if let Some(old) = current.take() {
                            old.sink.stop();
                        }
                        let Some(stream) = stream.as_ref() else {
                            let detail = "no audio output device".to_string();
                            send(&track_id, EngineEvent::Error(detail));
                            continue;
                        };
                        match create_sink_at(stream, &path, Duration::ZERO) {
                            Ok((sink, total)) => {
                                sink.set_volume(volume);
                                debug!(track = %track_id, path = %path.display(), "sink ready");
                                if let Some(total) = total {
                                    send(
                                        &track_id,
                                        EngineEvent::MetadataReady {
                                            duration_seconds: total.as_secs_f64(),
                                        },
                                    );
                                }
                                current = Some(Loaded {
                                    track_id,
                                    path,
                                    sink,
                                    started_at: None,
                                    accumulated: Duration::ZERO,
                                    ended: false,
                                });
                            }
                            Err(detail) => {
                                warn!(track = %track_id, %detail, "load failed");
                                send(&track_id, EngineEvent::Error(detail));
                            }
                        }
                    }

                    EngineCmd::Reject { track_id, detail } => {
                        if let Some(old) = current.take() {
                            old.sink.stop();
                        }
                        send(&track_id, EngineEvent::Error(detail));
                    }

                    EngineCmd::Play => {
                        let Some(loaded) = current.as_mut() else {
                            continue;
                        };
                        if loaded.is_playing() {
                            continue;
                        }
                        if loaded.ended || loaded.sink.empty() {
                            // Finished sinks cannot be resumed; start over from the top.
                            if let Some(stream) = stream.as_ref() {
                                let rebuilt = rebuild(stream, loaded, Duration::ZERO, volume);
                                if let Err(detail) = rebuilt {
                                    send(&loaded.track_id, EngineEvent::Error(detail));
                                    continue;
                                }
                            }
                        }
                        loaded.sink.play();
                        loaded.started_at = Some(Instant::now());
                        send(&loaded.track_id, EngineEvent::Started);
                    }

                    EngineCmd::Pause => {
                        let Some(loaded) = current.as_mut() else {
                            continue;
                        };
                        if let Some(st) = loaded.started_at.take() {
                            loaded.accumulated += st.elapsed();
                            loaded.sink.pause();
                            send(&loaded.track_id, EngineEvent::Paused);
                        }
                    }

                    EngineCmd::Seek(seconds) => {
                        // Scrubbing: rebuild the current sink and skip into the file.
                        let (Some(loaded), Some(stream)) = (current.as_mut(), stream.as_ref())
                        else {
                            continue;
                        };
                        let target =
                            Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default();
                        let was_playing = loaded.is_playing();
                        match rebuild(stream, loaded, target, volume) {
                            Ok(()) => {
                                if was_playing {
                                    loaded.sink.play();
                                    loaded.started_at = Some(Instant::now());
                                }
                                send(
                                    &loaded.track_id,
                                    EngineEvent::PositionChanged(target.as_secs_f64()),
                                );
                            }
                            Err(detail) => send(&loaded.track_id, EngineEvent::Error(detail)),
                        }
                    }

                    EngineCmd::SetVolume(v) => {
                        volume = v.clamp(0.0, 1.0);
                        if let Some(loaded) = current.as_ref() {
                            loaded.sink.set_volume(volume);
                        }
                    }

                    EngineCmd::Quit { fade_out_ms } => {
                        if let Some(loaded) = current.as_ref() {
                            if loaded.is_playing() {
                                fade_out_sink(&loaded.sink, volume, fade_out_ms);
                            }
                            loaded.sink.stop();
                        }
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {
                    // Periodic position report and end-of-track check.
                    let Some(loaded) = current.as_mut() else {
                        continue;
                    };
                    if !loaded.is_playing() || loaded.ended {
                        continue;
                    }
                    if loaded.sink.empty() {
                        loaded.accumulated = loaded.elapsed();
                        loaded.started_at = None;
                        loaded.ended = true;
                        send(&loaded.track_id, EngineEvent::Ended);
                    } else {
                        send(
                            &loaded.track_id,
                            EngineEvent::PositionChanged(loaded.elapsed().as_secs_f64()),
                        );
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// Replace `loaded.sink` with a paused sink positioned at `start_at`.
fn rebuild(
    stream: &OutputStream,
    loaded: &mut Loaded,
    start_at: Duration,
    volume: f32,
) -> Result<(), String> {
    loaded.sink.stop();
    let (sink, _) = create_sink_at(stream, &loaded.path, start_at)?;
    sink.set_volume(volume);
    loaded.sink = sink;
    loaded.accumulated = start_at;
    loaded.started_at = None;
    loaded.ended = false;
    Ok(())
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
