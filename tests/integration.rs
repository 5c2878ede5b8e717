//! Integration tests for the preprocessing pipeline
//!
//! These exercise the engine end to end on synthetic signals and the
//! dataset assembler on a temporary corpus.

use std::f32::consts::PI;

use tacotron_prep::{Config, SpectrogramEngine};

fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Dominant frequency of a waveform, estimated from the engine's own
/// analysis: peak bin of the time-averaged magnitude spectrum.
fn dominant_frequency(engine: &SpectrogramEngine, samples: &[f32], n_fft: usize) -> f32 {
    let preemph = engine.config().preemphasis;
    let stft = tacotron_prep::Stft::new(
        n_fft,
        engine.config().frame_shift,
        engine.config().frame_length,
    );
    let frames = stft.stft(&tacotron_prep::preemphasis(samples, preemph));

    let n_bins = n_fft / 2 + 1;
    let mut avg = vec![0.0f32; n_bins];
    for frame in &frames {
        for (bin, c) in frame.iter().enumerate() {
            avg[bin] += c.norm();
        }
    }

    let peak_bin = avg
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .unwrap()
        .0;
    peak_bin as f32 * engine.config().sample_rate as f32 / n_fft as f32
}

mod engine_tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            num_freq: 513,
            frame_shift: 128,
            frame_length: 512,
            num_mels: 80,
            gl_iters: 15,
            ..Default::default()
        }
    }

    #[test]
    fn test_spectrogram_inversion_preserves_dominant_frequency() {
        let config = test_config();
        let n_fft = config.n_fft();
        let sample_rate = config.sample_rate;
        let engine = SpectrogramEngine::new(config).unwrap();

        // 1-second 440 Hz test tone
        let tone = sine(440.0, sample_rate, sample_rate as usize);
        let spec = engine.spectrogram(&tone);
        let recon = engine.inv_spectrogram_seeded(&spec, Some(42));

        assert!(!recon.is_empty());
        assert!(recon.iter().all(|v| v.is_finite()));

        let bin_hz = sample_rate as f32 / n_fft as f32;
        let peak_hz = dominant_frequency(&engine, &recon, n_fft);
        assert!(
            (peak_hz - 440.0).abs() <= bin_hz,
            "dominant frequency {peak_hz} Hz, expected within {bin_hz} Hz of 440"
        );
    }

    #[test]
    fn test_mel_inversion_preserves_dominant_frequency() {
        let config = test_config();
        let n_fft = config.n_fft();
        let sample_rate = config.sample_rate;
        let engine = SpectrogramEngine::new(config).unwrap();

        let tone = sine(440.0, sample_rate, sample_rate as usize);
        let mel = engine.melspectrogram(&tone);
        let recon = engine.inv_melspectrogram_seeded(&mel, Some(42)).unwrap();

        assert!(recon.iter().all(|v| v.is_finite()));

        // Mel projection is lossy; allow a few bins of drift
        let bin_hz = sample_rate as f32 / n_fft as f32;
        let peak_hz = dominant_frequency(&engine, &recon, n_fft);
        assert!(
            (peak_hz - 440.0).abs() <= 4.0 * bin_hz,
            "dominant frequency {peak_hz} Hz, expected near 440"
        );
    }

    #[test]
    fn test_linear_and_mel_spectrogram_shapes_agree() {
        let config = test_config();
        let engine = SpectrogramEngine::new(config).unwrap();
        let tone = sine(220.0, 22050, 22050);

        let linear = engine.spectrogram(&tone);
        let mel = engine.melspectrogram(&tone);

        assert_eq!(linear.len(), mel.len());
        assert_eq!(linear[0].len(), 513);
        assert_eq!(mel[0].len(), 80);
    }

    #[test]
    fn test_gl_iteration_count_does_not_change_output_length() {
        let base = test_config();
        let tone = sine(440.0, 22050, 11025);

        let mut lengths = Vec::new();
        for gl_iters in [0, 1, 5] {
            let config = Config {
                gl_iters,
                ..base.clone()
            };
            let engine = SpectrogramEngine::new(config).unwrap();
            let spec = engine.spectrogram(&tone);
            lengths.push(engine.inv_spectrogram_seeded(&spec, Some(0)).len());
        }
        assert_eq!(lengths[0], lengths[1]);
        assert_eq!(lengths[1], lengths[2]);
    }
}

mod corpus_tests {
    use super::*;
    use tacotron_prep::audio::save_wav;
    use tacotron_prep::{load_corpus, CorpusEntry, DatasetAssembler};
    use tempfile::tempdir;

    #[test]
    fn test_full_preprocessing_run() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("wavs")).unwrap();
        std::fs::write(
            dir.path().join("metadata.csv"),
            "utt1|The first utterance.\nutt2|And the second!\nbroken line\n",
        )
        .unwrap();

        let tone = sine(440.0, 22050, 8192);
        save_wav(dir.path().join("wavs/utt1.wav"), &tone, 22050).unwrap();
        save_wav(dir.path().join("wavs/utt2.wav"), &tone, 22050).unwrap();

        let cache = dir.path().join("train.bin");
        let config = Config {
            num_freq: 257,
            frame_shift: 64,
            frame_length: 256,
            num_mels: 40,
            prep: true,
            pth: Some(cache.clone()),
            ..Default::default()
        };

        let assembler = DatasetAssembler::new(config).unwrap();
        let entries = assembler.assemble(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);

        let loaded = load_corpus(&cache).unwrap();
        assert_eq!(loaded.len(), 2);
        for entry in &loaded {
            match entry {
                CorpusEntry::Prepared { tokens, mel, .. } => {
                    assert!(!tokens.is_empty());
                    assert!(!mel.is_empty());
                    assert_eq!(mel[0].len(), 40);
                    for frame in mel {
                        for &v in frame {
                            assert!((0.0..=1.0).contains(&v));
                        }
                    }
                }
                other => panic!("expected prepared entries, got {other:?}"),
            }
        }
    }
}
