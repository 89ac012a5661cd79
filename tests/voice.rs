//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use std::io::Cursor;

use sightline::voice::{
    MAX_UTTERANCE_SAMPLES, SAMPLE_RATE, Utterance, UtteranceSegmenter, samples_to_wav,
};

/// Generate sine wave audio samples
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

/// Feed audio in 100ms chunks, collecting finished utterances
fn feed(segmenter: &mut UtteranceSegmenter, audio: &[f32]) -> Vec<Vec<f32>> {
    audio
        .chunks(SAMPLE_RATE as usize / 10)
        .filter_map(|chunk| segmenter.push(chunk))
        .collect()
}

#[test]
fn test_speech_then_silence_yields_one_utterance() {
    let mut segmenter = UtteranceSegmenter::default();

    let mut audio = generate_silence(0.5);
    audio.extend(generate_sine_samples(440.0, 1.0, 0.5));
    audio.extend(generate_silence(0.8));

    let utterances = feed(&mut segmenter, &audio);

    assert_eq!(utterances.len(), 1);
    // 1s of speech plus the trailing silence that closed it
    assert!(utterances[0].len() >= SAMPLE_RATE as usize);
    assert!(!segmenter.is_speaking());
}

#[test]
fn test_silence_alone_yields_nothing() {
    let mut segmenter = UtteranceSegmenter::default();

    let utterances = feed(&mut segmenter, &generate_silence(3.0));

    assert!(utterances.is_empty());
    assert!(!segmenter.is_speaking());
}

#[test]
fn test_short_noise_burst_is_dropped() {
    let mut segmenter = UtteranceSegmenter::default();

    let mut audio = generate_sine_samples(1000.0, 0.1, 0.5);
    audio.extend(generate_silence(1.0));

    assert!(feed(&mut segmenter, &audio).is_empty());
}

#[test]
fn test_pause_inside_speech_does_not_split() {
    let mut segmenter = UtteranceSegmenter::default();

    let mut audio = generate_sine_samples(440.0, 0.6, 0.5);
    audio.extend(generate_silence(0.2));
    audio.extend(generate_sine_samples(440.0, 0.6, 0.5));
    audio.extend(generate_silence(0.8));

    assert_eq!(feed(&mut segmenter, &audio).len(), 1);
}

#[test]
fn test_two_utterances() {
    let mut segmenter = UtteranceSegmenter::default();

    let mut audio = Vec::new();
    for _ in 0..2 {
        audio.extend(generate_sine_samples(440.0, 0.6, 0.5));
        audio.extend(generate_silence(0.8));
    }

    assert_eq!(feed(&mut segmenter, &audio).len(), 2);
}

#[test]
fn test_constant_noise_still_yields_utterances() {
    let mut segmenter = UtteranceSegmenter::default();

    // A minute of a fan or TV that never falls silent
    let noise = generate_sine_samples(120.0, 60.0, 0.2);
    let utterances = feed(&mut segmenter, &noise);

    assert_eq!(utterances.len(), 4);
    assert!(utterances.iter().all(|u| u.len() == MAX_UTTERANCE_SAMPLES));
}

#[test]
fn test_reset_discards_partial_speech() {
    let mut segmenter = UtteranceSegmenter::default();

    feed(&mut segmenter, &generate_sine_samples(440.0, 0.5, 0.5));
    assert!(segmenter.is_speaking());

    segmenter.reset();
    assert!(!segmenter.is_speaking());
    assert!(feed(&mut segmenter, &generate_silence(1.0)).is_empty());
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.5, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // RIFF header
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");
}

#[test]
fn test_utterance_wav_roundtrip() {
    let utterance = Utterance::new(generate_sine_samples(440.0, 0.25, 0.5), SAMPLE_RATE);
    assert!((utterance.duration_secs() - 0.25).abs() < 0.001);

    let wav_data = utterance.to_wav().unwrap();
    let reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len() as usize, utterance.samples.len());
}
