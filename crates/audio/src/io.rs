use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::dsp::downmix_to_mono;

/// Decoded PCM audio, interleaved when `channels > 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioReader {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioReader {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn to_mono(&self) -> Vec<f32> {
        downmix_to_mono(&self.samples, self.channels)
    }
}

pub struct AudioDecoder;

impl AudioDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<AudioReader> {
        let path_ref = path.as_ref();
        let file =
            File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
        let extension = path_ref.extension().and_then(|ext| ext.to_str());
        Self::decode_source(Box::new(file), extension)
    }

    /// Decode an in-memory upload. `extension` is only a probing hint.
    pub fn decode_bytes<B>(bytes: B, extension: Option<&str>) -> Result<AudioReader>
    where
        B: AsRef<[u8]> + Send + Sync + 'static,
    {
        Self::decode_source(Box::new(Cursor::new(bytes)), extension)
    }

    fn decode_source(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<AudioReader> {
        let mss = MediaSourceStream::new(source, Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("unrecognised audio container")?;
        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| anyhow!("no default track found"))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("unsupported audio codec")?;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);
        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphError::ResetRequired) => break,
                Err(err) => return Err(err.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(buffer) => {
                    let spec = *buffer.spec();
                    sample_rate = Some(spec.rate);
                    channels = Some(spec.channels.count() as u16);
                    let mut out = SampleBuffer::<f32>::new(buffer.capacity() as u64, spec);
                    out.copy_interleaved_ref(buffer);
                    samples.extend_from_slice(out.samples());
                }
                Err(SymphError::DecodeError(reason)) => {
                    debug!(reason, "skipping undecodable packet");
                }
                Err(err) => return Err(err.into()),
            }
        }

        let sample_rate = sample_rate.ok_or_else(|| anyhow!("audio stream has no sample rate"))?;
        Ok(AudioReader {
            sample_rate,
            channels: channels.unwrap_or(1).max(1),
            samples,
        })
    }
}
