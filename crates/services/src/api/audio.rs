//! Turns synthesized speech into something a player can open.
//!
//! The backend usually sends bare PCM samples; those get a WAV header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::ApiError;

/// Sample rate of raw PCM returned by the speech backend.
pub const TTS_SAMPLE_RATE: u32 = 24_000;

const WAV_HEADER_LEN: usize = 44;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Layer III bitrates in kbit/s by header index; 0 and 15 are invalid.
const MPEG1_L3_KBPS: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const MPEG2_L3_KBPS: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];
const MPEG1_SAMPLE_RATES: [u32; 3] = [44_100, 48_000, 32_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
}

impl AudioFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if bytes.starts_with(b"ID3") || starts_with_mp3_frames(bytes) {
            return Some(AudioFormat::Mp3);
        }
        if bytes.starts_with(b"OggS") {
            return Some(AudioFormat::Ogg);
        }
        if bytes.starts_with(b"fLaC") {
            return Some(AudioFormat::Flac);
        }
        None
    }
}

/// Byte length of the MPEG Layer III frame whose header starts `bytes`.
fn mp3_frame_len(bytes: &[u8]) -> Option<usize> {
    let [0xFF, b1, b2, ..] = *bytes else {
        return None;
    };
    if b1 & 0xE0 != 0xE0 {
        return None;
    }
    let version = (b1 >> 3) & 0b11;
    let layer = (b1 >> 1) & 0b11;
    if version == 0b01 || layer != 0b01 {
        return None;
    }
    let bitrate_index = usize::from(b2 >> 4);
    let rate_index = usize::from((b2 >> 2) & 0b11);
    if bitrate_index == 0 || bitrate_index == 15 || rate_index == 3 {
        return None;
    }

    let padding = u32::from((b2 >> 1) & 1);
    let (kbps, sample_rate, slots) = match version {
        0b11 => (MPEG1_L3_KBPS[bitrate_index], MPEG1_SAMPLE_RATES[rate_index], 144),
        0b10 => (MPEG2_L3_KBPS[bitrate_index], MPEG1_SAMPLE_RATES[rate_index] / 2, 72),
        _ => (MPEG2_L3_KBPS[bitrate_index], MPEG1_SAMPLE_RATES[rate_index] / 4, 72),
    };
    usize::try_from(slots * kbps * 1000 / sample_rate + padding).ok()
}

/// A frame header followed by another one exactly one frame later.
fn starts_with_mp3_frames(bytes: &[u8]) -> bool {
    mp3_frame_len(bytes)
        .and_then(|len| bytes.get(len..))
        .and_then(mp3_frame_len)
        .is_some()
}

/// Audio ready to be written to a file and played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Decode base-64 speech and wrap raw PCM in a WAV container.
///
/// # Errors
///
/// Returns `ApiError::EmptyAudio` for empty content and
/// `ApiError::InvalidAudio` if it is not valid base-64.
pub fn normalize_tts_audio(audio_content: &str) -> Result<PlayableAudio, ApiError> {
    let bytes = STANDARD.decode(audio_content.trim())?;
    if bytes.is_empty() {
        return Err(ApiError::EmptyAudio);
    }
    if let Some(format) = AudioFormat::sniff(&bytes) {
        return Ok(PlayableAudio { bytes, format });
    }
    Ok(PlayableAudio {
        bytes: pcm_to_wav(&bytes, TTS_SAMPLE_RATE),
        format: AudioFormat::Wav,
    })
}

/// Prefix 16-bit little-endian mono PCM with a canonical 44-byte WAV header.
#[must_use]
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    // Sample data is copied whole; an odd trailing byte is kept as-is.
    let data_len = u32::try_from(pcm.len()).unwrap_or(u32::MAX);
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * u32::from(block_align);

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
