//! Microphone capture using CPAL (Cross-Platform Audio Library).

use crate::audio::source::AudioSource;
use crate::audio::wav::{StreamResampler, downmix};
use crate::error::{MoodshError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// CPAL probing makes ALSA/JACK/PipeWire print harmless but alarming noise.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Keep JACK and PipeWire quiet while CPAL probes backends.
///
/// # Safety
/// Modifies environment variables; call at startup before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// Preferred device names for PipeWire/PulseAudio desktops.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "PulseAudio"];

/// Device name patterns that are never a microphone.
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "Digital Output",
    "HDMI",
    "S/PDIF",
];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS
        .iter()
        .any(|pattern| lower.contains(&pattern.to_lowercase()))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES
        .iter()
        .any(|pref| lower.contains(&pref.to_lowercase()))
}

/// List available input devices, preferred ones marked "\[recommended\]".
///
/// # Errors
/// Returns `MoodshError::AudioCapture` if device enumeration fails.
pub fn list_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| MoodshError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut device_names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            if should_filter_device(&name) {
                continue;
            }
            if is_preferred_device(&name) {
                device_names.push(format!("{} [recommended]", name));
            } else {
                device_names.push(name);
            }
        }
    }

    Ok(device_names)
}

/// Best default input device: PipeWire, then Pulse, then the system default.
fn get_best_default_device() -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name()
                    && is_preferred_device(&name)
                {
                    return Ok(device);
                }
            }
        }

        host.default_input_device()
            .ok_or_else(|| MoodshError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched through the Mutex in CpalAudioSource,
/// one thread at a time.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Live microphone source delivering mono `f32` at a fixed rate.
///
/// Asks the device for mono at the target rate first and falls back to the
/// native config with software downmix and resampling. Stream errors raised
/// by the backend (for example an unplugged device) surface on the next
/// `read_samples` call.
pub struct CpalAudioSource {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream_error: Arc<Mutex<Option<String>>>,
    callback_count: Arc<AtomicU64>,
    sample_rate: u32,
}

impl CpalAudioSource {
    /// Open `device_name`, or the best default device when `None`.
    ///
    /// # Errors
    /// - `AudioDeviceNotFound` if no device matches
    /// - `AudioCapture` if enumeration fails
    pub fn new(device_name: Option<&str>, sample_rate: u32) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host
                    .input_devices()
                    .map_err(|e| MoodshError::AudioCapture {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                let mut found_device = None;
                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        found_device = Some(dev);
                        break;
                    }
                }

                found_device.ok_or_else(|| MoodshError::AudioDeviceNotFound {
                    device: name.to_string(),
                })
            } else {
                get_best_default_device()
            }
        })?;

        if let Ok(name) = device.name() {
            info!(device = %name, sample_rate, "opened input device");
        }

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream_error: Arc::new(Mutex::new(None)),
            callback_count: Arc::new(AtomicU64::new(0)),
            sample_rate,
        })
    }

    fn error_callback(&self) -> impl FnMut(cpal::StreamError) + Send + 'static {
        let slot = Arc::clone(&self.stream_error);
        move |err| {
            warn!(error = %err, "audio stream error");
            if let Ok(mut slot) = slot.lock() {
                slot.get_or_insert_with(|| err.to_string());
            }
        }
    }

    /// Try f32 mono at the target rate, then i16, then the native config.
    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: self.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        if let Ok(stream) = self.input_stream::<f32>(&preferred_config, clamp_f32) {
            return Ok(stream);
        }
        if let Ok(stream) = self.input_stream::<i16>(&preferred_config, i16_to_f32) {
            return Ok(stream);
        }
        self.build_stream_native()
    }

    /// Capture at the device's default config and convert in software.
    fn build_stream_native(&self) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| MoodshError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        info!(
            channels = stream_config.channels,
            rate = stream_config.sample_rate,
            format = ?default_config.sample_format(),
            "using native audio format, converting in software"
        );

        let stream = match default_config.sample_format() {
            SampleFormat::F32 => self.input_stream::<f32>(&stream_config, clamp_f32),
            SampleFormat::I16 => self.input_stream::<i16>(&stream_config, i16_to_f32),
            fmt => {
                return Err(MoodshError::AudioCapture {
                    message: format!(
                        "Unsupported native sample format: {:?}. \
                         Try specifying a device with --device.",
                        fmt
                    ),
                });
            }
        };
        stream.map_err(|e| MoodshError::AudioCapture {
            message: format!("Failed to build native input stream: {}", e),
        })
    }

    /// Input stream of sample type `T` whose callback appends mono `f32` at
    /// the target rate to the shared buffer.
    fn input_stream<T>(
        &self,
        config: &cpal::StreamConfig,
        to_f32: fn(T) -> f32,
    ) -> std::result::Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: cpal::SizedSample + Send + 'static,
    {
        let channels = usize::from(config.channels);
        let mut resampler = StreamResampler::new(config.sample_rate, self.sample_rate);
        let buffer = Arc::clone(&self.buffer);
        let counter = Arc::clone(&self.callback_count);

        self.device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                counter.fetch_add(1, Ordering::Relaxed);
                let floats: Vec<f32> = data.iter().map(|&s| to_f32(s)).collect();
                let converted = resampler.process(&downmix(&floats, channels));
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(&converted);
                }
            },
            self.error_callback(),
            None,
        )
    }
}

fn clamp_f32(sample: f32) -> f32 {
    sample.clamp(-1.0, 1.0)
}

fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

impl AudioSource for CpalAudioSource {
    fn start(&mut self) -> Result<()> {
        {
            let stream_guard = self.stream.lock().map_err(|e| MoodshError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if stream_guard.is_some() {
                return Ok(());
            }
        }

        if let Ok(mut slot) = self.stream_error.lock() {
            slot.take();
        }

        let stream = self.build_stream()?;
        stream.play().map_err(|e| MoodshError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        // Some PipeWire-ALSA setups accept non-native configs but never fire
        // the data callback.
        std::thread::sleep(std::time::Duration::from_millis(200));

        let final_stream = if self.callback_count.load(Ordering::Relaxed) == 0 {
            drop(stream);
            if let Ok(mut buf) = self.buffer.lock() {
                buf.clear();
            }

            let native_stream = self.build_stream_native()?;
            native_stream
                .play()
                .map_err(|e| MoodshError::AudioCapture {
                    message: format!("Failed to start native audio stream: {}", e),
                })?;
            native_stream
        } else {
            stream
        };

        let mut stream_guard = self.stream.lock().map_err(|e| MoodshError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *stream_guard = Some(SendableStream(final_stream));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| MoodshError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(sendable_stream) = stream_guard.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| MoodshError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        let failure = self
            .stream_error
            .lock()
            .map_err(|e| MoodshError::AudioCapture {
                message: format!("Failed to lock stream error slot: {}", e),
            })?
            .take();
        if let Some(message) = failure {
            return Err(MoodshError::AudioCapture { message });
        }

        let mut buffer = self.buffer.lock().map_err(|e| MoodshError::AudioCapture {
            message: format!("Failed to lock audio buffer: {}", e),
        })?;
        Ok(std::mem::take(&mut *buffer))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
