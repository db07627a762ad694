//! Integration tests for StreamMixer driven by a simulated sink
//!
//! These tests verify that the mixer correctly handles:
//! - Frame conservation across mismatched decode and request sizes
//! - Zero-filled remainders at end of stream
//! - The end-of-stream callback contract (one final audio callback, one silent one)
//! - Carry-over bounds
//! - Volume scaling and decode faults

mod helpers;

use helpers::{drive_until_terminating, expected_stereo, ScriptedSource};
use oplay::audio::types::{Channels, VolumeLevel, BYTES_PER_FRAME, MAX_DECODE_FRAMES};
use oplay::playback::{
    event_channel, MixerOptions, PlaybackEvent, PlaybackState, PlaybackStatus, StreamMixer,
    TerminationCause,
};
use std::sync::Arc;

fn build_mixer(
    source: ScriptedSource,
    volume: VolumeLevel,
    request_frames: usize,
) -> (StreamMixer<ScriptedSource>, Arc<PlaybackStatus>, oplay::playback::EventConsumer) {
    let status = Arc::new(PlaybackStatus::new());
    let (tx, rx) = event_channel(16);
    let options = MixerOptions {
        volume,
        request_frames,
        max_decode_frames: MAX_DECODE_FRAMES,
    };
    let mixer = StreamMixer::new(source, options, Arc::clone(&status), tx).unwrap();
    (mixer, status, rx)
}

/// Split delivered output into (audio, trailing padding)
fn split_audio(output: &[i16], audio_samples: usize) -> (&[i16], &[i16]) {
    output.split_at(audio_samples.min(output.len()))
}

#[test]
fn test_frame_conservation_stereo_non_uniform_requests() {
    let total = 100_003;
    let source = ScriptedSource::new(Channels::Stereo, total, 960)
        .with_chunks(&[960, 2400, 120, 5760, 1]);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 4096);

    let run = drive_until_terminating(&mut mixer, &status, &[4096, 1000, 333, 2048, 1, 9000], 10_000);

    let expected = expected_stereo(Channels::Stereo, total);
    let (audio, padding) = split_audio(&run.output, expected.len());
    assert_eq!(audio, &expected[..], "every frame delivered once, in order");
    assert!(padding.iter().all(|&s| s == 0), "nothing but silence after the last frame");
    assert_eq!(status.frames_delivered(), total);
    assert_eq!(status.cause(), Some(TerminationCause::Completed));
}

#[test]
fn test_frame_conservation_mono() {
    let total = 48_000;
    let source = ScriptedSource::new(Channels::Mono, total, 2400).with_chunks(&[2400, 960, 5760]);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 1024);

    let run = drive_until_terminating(&mut mixer, &status, &[1024, 700, 1500], 10_000);

    let expected = expected_stereo(Channels::Mono, total);
    let (audio, padding) = split_audio(&run.output, expected.len());
    assert_eq!(audio, &expected[..]);
    assert!(padding.iter().all(|&s| s == 0));

    // Mono is duplicated: L == R for every frame
    for frame in audio.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}

#[test]
fn test_remainder_is_zero_filled() {
    let source = ScriptedSource::new(Channels::Stereo, 10, 960);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 4096);

    let mut region = vec![0x7F7Fi16; 4096 * 2];
    mixer.fill(&mut region);

    assert_eq!(&region[..20], &expected_stereo(Channels::Stereo, 10)[..]);
    assert!(region[20..].iter().all(|&s| s == 0));
    assert_eq!(status.state(), PlaybackState::Draining);
}

#[test]
fn test_exactly_one_silent_callback_after_final_audio() {
    // Stream ends exactly on the third request boundary
    let source = ScriptedSource::new(Channels::Stereo, 3 * 4096, 4096);
    let (mut mixer, status, mut rx) = build_mixer(source, VolumeLevel::Passthrough, 4096);

    let run = drive_until_terminating(&mut mixer, &status, &[4096], 100);

    assert_eq!(run.callbacks.len(), 4, "three audio callbacks, one silent");
    assert!(run.callbacks[..3].iter().all(|c| !c.is_silent()));
    assert_eq!(run.callbacks[2].state_after, PlaybackState::Draining);
    assert!(run.callbacks[3].is_silent());
    assert_eq!(run.callbacks[3].state_after, PlaybackState::Terminating);

    assert!(matches!(rx.pop(), Some(PlaybackEvent::EndOfStream { total_frames: 12_288 })));
    assert!(matches!(rx.pop(), Some(PlaybackEvent::Drained { frames_delivered: 12_288 })));
    assert!(rx.pop().is_none());

    // Further callbacks stay silent and do not touch the decoder
    let mut region = vec![1i16; 64];
    mixer.fill(&mut region);
    assert!(region.iter().all(|&s| s == 0));
    assert_eq!(status.state(), PlaybackState::Terminating);
}

#[test]
fn test_partial_final_callback_then_silence() {
    let source = ScriptedSource::new(Channels::Stereo, 4096 + 100, 960);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 4096);

    let run = drive_until_terminating(&mut mixer, &status, &[4096], 100);

    assert_eq!(run.callbacks.len(), 3);
    assert_eq!(run.callbacks[1].audio_samples, 200);
    assert!(run.callbacks[2].is_silent());
}

#[test]
fn test_carry_over_2400_chunks_4096_requests() {
    let source = ScriptedSource::new(Channels::Stereo, 10 * 48_000, 2400);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 4096);

    let request_bytes = 4096 * BYTES_PER_FRAME;
    let mut delivered_bytes = 0;
    let mut carries = Vec::new();

    for _ in 0..3 {
        let mut region = vec![0i16; 4096 * 2];
        mixer.fill(&mut region);
        delivered_bytes += region.iter().filter(|&&s| s != 0).count() * 2;
        assert!(mixer.carry_bytes() < request_bytes);
        carries.push(mixer.carry_bytes());
    }

    assert_eq!(delivered_bytes, 3 * 4096 * 4);
    assert_eq!(status.frames_delivered(), 3 * 4096);
    assert_eq!(carries, vec![704 * 4, 1408 * 4, 2112 * 4]);
}

#[test]
fn test_oversized_decoder_chunk_survives_end_of_stream() {
    // One 5760-frame chunk holds the whole stream; the tail is carried
    // through Draining without being dropped.
    let source = ScriptedSource::new(Channels::Stereo, 5000, 5760);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 1024);

    let run = drive_until_terminating(&mut mixer, &status, &[1024], 100);

    let expected = expected_stereo(Channels::Stereo, 5000);
    assert_eq!(&run.output[..expected.len()], &expected[..]);
    assert_eq!(status.frames_delivered(), 5000);
    assert!(run.callbacks.last().is_some_and(|c| c.is_silent()));
    assert_eq!(mixer.source().calls(), 1);
}

#[test]
fn test_half_volume_scales_every_sample() {
    let source = ScriptedSource::new(Channels::Stereo, 2048, 960);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::from_percent(50), 512);

    let run = drive_until_terminating(&mut mixer, &status, &[512], 100);

    let expected: Vec<i16> = expected_stereo(Channels::Stereo, 2048)
        .into_iter()
        .map(|s| (s as i32 * 64 / 128) as i16)
        .collect();
    assert_eq!(&run.output[..expected.len()], &expected[..]);
}

#[test]
fn test_minimum_volume_is_near_silent() {
    let source = ScriptedSource::new(Channels::Stereo, 2048, 960);
    let (mut mixer, status, _rx) = build_mixer(source, VolumeLevel::from_percent(0), 512);

    let run = drive_until_terminating(&mut mixer, &status, &[512], 100);

    // ramp peaks at 16000, 16000 / 128 = 125
    assert!(run.output.iter().all(|&s| s.unsigned_abs() <= 125));
    assert_eq!(status.frames_delivered(), 2048);
}

#[test]
fn test_decode_fault_mid_stream() {
    let source = ScriptedSource::new(Channels::Stereo, 48_000, 960).with_fault_at(2 * 960);
    let (mut mixer, status, mut rx) = build_mixer(source, VolumeLevel::Passthrough, 1024);

    let mut first = vec![0i16; 2048];
    mixer.fill(&mut first);
    assert_eq!(status.state(), PlaybackState::Playing);

    let mut second = vec![0i16; 2048];
    mixer.fill(&mut second);
    assert_eq!(status.state(), PlaybackState::Terminating);
    assert_eq!(status.cause(), Some(TerminationCause::DecodeFault));
    assert!(second.iter().all(|&s| s == 0), "faulted callback is silent");

    match rx.pop() {
        Some(PlaybackEvent::DecodeFault { position, .. }) => assert_eq!(position, 1920),
        other => panic!("expected DecodeFault event, got {:?}", other),
    }

    // Never retried
    let calls = mixer.source().calls();
    mixer.fill(&mut second);
    assert_eq!(mixer.source().calls(), calls);
}

#[test]
fn test_fill_bytes_matches_sample_path() {
    let source = ScriptedSource::new(Channels::Mono, 4096, 960);
    let (mut mixer, _status, _rx) = build_mixer(source, VolumeLevel::Passthrough, 256);

    let mut scratch = vec![0i16; 512];
    let mut bytes = vec![0u8; 1024];
    mixer.fill_bytes(&mut bytes, &mut scratch);

    let expected = expected_stereo(Channels::Mono, 256);
    let decoded: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(decoded, expected);
}
