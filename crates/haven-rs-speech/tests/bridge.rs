use haven_rs_speech::{RetentionPolicy, SpeechBridge, SpeechError};
use haven_rs_test_utils::{StubRecognizer, StubSynthesizer, write_silence, write_tone};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

fn bridge(dir: &TempDir, transcript: &str) -> (SpeechBridge, StubRecognizer, StubSynthesizer) {
    let recognizer = StubRecognizer::new(transcript);
    let synthesizer = StubSynthesizer::default();
    let bridge = SpeechBridge::new(
        Arc::new(recognizer.clone()),
        Arc::new(synthesizer.clone()),
        dir.path().join("audio"),
    );
    (bridge, recognizer, synthesizer)
}

#[tokio::test]
async fn tone_is_transcribed_by_the_recognizer() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("question.wav");
    write_tone(&path, 0.5, 0.4).expect("wav");
    let (bridge, recognizer, _) = bridge(&temp, "How do I calm down?");

    let text = bridge.transcribe(&path).await.expect("transcript");
    assert_eq!(text, "How do I calm down?");
    assert_eq!(recognizer.call_count(), 1);
}

#[tokio::test]
async fn silent_recording_never_reaches_the_recognizer() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("silence.wav");
    write_silence(&path, 0.5).expect("wav");
    let (bridge, recognizer, _) = bridge(&temp, "phantom");

    assert!(matches!(
        bridge.transcribe(&path).await,
        Err(SpeechError::EmptyTranscript)
    ));
    assert_eq!(recognizer.call_count(), 0);
}

#[tokio::test]
async fn non_wav_file_is_invalid_audio() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("notes.wav");
    std::fs::write(&path, "not audio").expect("write");
    let (bridge, _, _) = bridge(&temp, "anything");

    assert!(matches!(
        bridge.transcribe(&path).await,
        Err(SpeechError::InvalidAudio(_))
    ));
}

#[tokio::test]
async fn synthesized_files_accumulate_until_pruned() {
    let temp = TempDir::new().expect("tmp");
    let (bridge, _, synthesizer) = bridge(&temp, "");

    for text in ["one", "two", "three"] {
        bridge.synthesize(text).await.expect("synthesize");
    }
    assert_eq!(synthesizer.spoken.lock().clone(), vec!["one", "two", "three"]);
    assert_eq!(
        std::fs::read_dir(bridge.output_dir()).expect("dir").count(),
        3
    );

    assert_eq!(
        bridge
            .prune_artifacts(&RetentionPolicy::default())
            .expect("keep all"),
        0
    );
    let policy = RetentionPolicy {
        max_files: Some(1),
        max_age: None,
    };
    assert_eq!(bridge.prune_artifacts(&policy).expect("prune"), 2);
    assert_eq!(
        std::fs::read_dir(bridge.output_dir()).expect("dir").count(),
        1
    );
}
