use super::*;

#[test]
fn half_scale_survives_round_trip_within_one_step() {
    let decoded = decode_sample(encode_sample(0.5));
    assert!((decoded - 0.5).abs() <= 1.0 / 32_768.0, "got {decoded}");
    let decoded = decode_sample(encode_sample(-0.5));
    assert!((decoded + 0.5).abs() <= 1.0 / 32_768.0, "got {decoded}");
}

#[test]
fn full_scale_does_not_overflow() {
    assert_eq!(encode_sample(1.0), i16::MAX);
    assert_eq!(encode_sample(-1.0), i16::MIN);
}

#[test]
fn out_of_range_samples_are_clamped() {
    assert_eq!(encode_sample(3.5), i16::MAX);
    assert_eq!(encode_sample(-7.0), i16::MIN);
    assert_eq!(encode_sample(0.0), 0);
}

#[test]
fn encode_pcm16_is_little_endian() {
    let bytes = encode_pcm16(&[1.0, -1.0]);
    assert_eq!(bytes, vec![0xFF, 0x7F, 0x00, 0x80]);
}

#[test]
fn decode_pcm16_rejects_odd_length() {
    let err = decode_pcm16(&[0, 1, 2]).unwrap_err();
    assert!(matches!(err, PcmError::OddLength(3)));
}

#[test]
fn encode_block_tags_mime_type() {
    let chunk = encode_block(&[0.0; 4]);
    assert_eq!(chunk.mime_type, "audio/pcm;rate=16000");
    // 4 samples * 2 bytes = 8 zero bytes.
    assert_eq!(chunk.data, "AAAAAAAAAAA=");
}

#[test]
fn audio_chunk_serializes_camel_case() {
    let json = serde_json::to_value(encode_block(&[0.0])).unwrap();
    assert_eq!(json["mimeType"], INPUT_MIME_TYPE);
    assert!(json.get("data").is_some());
}

#[test]
fn decode_chunk_reads_model_audio() {
    let chunk = encode_block(&[0.25, -0.25, 0.0]);
    let samples = decode_chunk(&chunk.data).unwrap();
    assert_eq!(samples.len(), 3);
    assert!((samples[0] - 0.25).abs() < 1e-3);
    assert!((samples[1] + 0.25).abs() < 1e-3);
}

#[test]
fn decode_chunk_rejects_bad_base64() {
    assert!(matches!(decode_chunk("@@not base64@@"), Err(PcmError::Base64(_))));
}

#[test]
fn resample_identity_when_rates_match() {
    let input = vec![0.1, 0.2, 0.3];
    assert_eq!(resample(&input, 16_000, 16_000).unwrap(), input);
}

#[test]
fn resample_rejects_zero_rate() {
    assert!(matches!(StreamResampler::new(0, 16_000), Err(PcmError::InvalidRate { .. })));
}

#[test]
fn resample_buffer_has_exact_length() {
    let input = vec![0.25f32; 2400];
    assert_eq!(resample(&input, 24_000, 48_000).unwrap().len(), 4800);
    assert_eq!(resample(&input, 24_000, 44_100).unwrap().len(), 4410);
}

#[test]
fn resample_buffer_keeps_level_without_leading_gap() {
    let out = resample(&vec![0.5f32; 4800], 48_000, 16_000).unwrap();
    assert_eq!(out.len(), 1600);
    // Only the edges see the silence padding.
    assert!(out[8..1500].iter().all(|s| (s - 0.5).abs() < 1e-3), "{:?}", &out[..8]);
}

#[test]
fn stream_resampler_keeps_every_sample_across_small_callbacks() {
    let mut rs = StreamResampler::new(44_100, 16_000).unwrap();
    // 441 resampler chunks fed as 882 callbacks of 512 frames: 10.24 s.
    let callback = vec![0.0f32; 512];
    let mut produced = 0usize;
    for _ in 0..882 {
        produced += rs.push(&callback).unwrap().len();
    }
    assert_eq!(rs.pending(), 0);
    let expected = 1024 * 441 * 16_000 / 44_100;
    assert!(produced.abs_diff(expected) <= 2, "produced {produced}, expected {expected}");
}

#[test]
fn stream_resampler_is_continuous_across_callbacks() {
    let mut rs = StreamResampler::new(48_000, 16_000).unwrap();
    let mut out = Vec::new();
    for _ in 0..100 {
        out.extend(rs.push(&[0.5f32; 480]).unwrap());
    }
    let settled = &out[rs.delay() + 16..];
    assert!(!settled.is_empty());
    assert!(settled.iter().all(|s| (s - 0.5).abs() < 1e-3));
}

#[test]
fn stream_resampler_flush_drains_pending_input() {
    let mut rs = StreamResampler::new(32_000, 16_000).unwrap();
    assert!(rs.push(&[0.1f32; 100]).unwrap().is_empty());
    assert_eq!(rs.pending(), 100);
    assert!(!rs.flush().unwrap().is_empty());
    assert_eq!(rs.pending(), 0);
}

#[test]
fn reblocker_emits_fixed_blocks_and_keeps_remainder() {
    let mut rb = Reblocker::new(4);
    assert!(rb.push(&[0.0; 3]).is_empty());
    let blocks = rb.push(&[1.0; 6]);
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|b| b.len() == 4));
    assert_eq!(blocks[0], vec![0.0, 0.0, 0.0, 1.0]);
    assert_eq!(rb.pending(), 1);
}
