use mot_tracker::persistence::HEADER;
use mot_tracker::platform::{
    Autopilot, Frame, InputSource, Instruction, Message, RecordingRenderer, UnpacedClock,
};
use mot_tracker::sim::{InputEvent, Key, TrialPhase};
use mot_tracker::{
    CsvSink, ExperimentConfig, ExperimentSession, MemorySink, ResponseRecord, SessionOutcome,
};

fn short_config() -> ExperimentConfig {
    ExperimentConfig {
        num_distractors: 6,
        num_targets: 2,
        window_width: 1024.0,
        window_height: 768.0,
        t_fixation: 0.1,
        t_flash: 0.7,
        t_animate: 1.2,
        t_answer: 4.0,
        feedback_secs: 0.1,
        tick_rate: 60,
        practice_trials: 1,
        real_trials: 2,
        seed: Some(2024),
        ..Default::default()
    }
}

fn autopilot(config: &ExperimentConfig) -> Autopilot {
    Autopilot::new(config.num_targets, 7).with_think_ticks(6)
}

/// Presses Continue on instruction screens and never answers
struct ContinueOnly;

impl InputSource for ContinueOnly {
    fn poll(&mut self, frame: &Frame<'_>) -> Vec<InputEvent> {
        if frame.awaits_continue() {
            vec![InputEvent::KeyPress(Key::Char('f'))]
        } else {
            Vec::new()
        }
    }
}

/// Delegates to the autopilot and quits on the n-th feedback screen
struct QuitOnFeedback {
    inner: Autopilot,
    remaining: usize,
    last_phase: Option<TrialPhase>,
}

impl InputSource for QuitOnFeedback {
    fn poll(&mut self, frame: &Frame<'_>) -> Vec<InputEvent> {
        let entered_feedback =
            frame.phase == Some(TrialPhase::Feedback) && self.last_phase != frame.phase;
        self.last_phase = frame.phase;
        if entered_feedback {
            self.remaining -= 1;
            if self.remaining == 0 {
                return vec![InputEvent::Quit];
            }
        }
        self.inner.poll(frame)
    }
}

// A participant who picks exactly the flashed objects scores full marks on every trial
#[test]
fn autopilot_session_records_perfect_scores() {
    let config = short_config();
    let mut session = ExperimentSession::new(
        &config,
        autopilot(&config),
        RecordingRenderer::default(),
        MemorySink::new(),
        UnpacedClock::new(config.tick_rate),
    );

    let summary = session.run().expect("session should run");

    assert_eq!(summary.outcome, SessionOutcome::Completed);
    assert_eq!(summary.practice_trials, 1);
    assert_eq!(summary.real_trials, 2);
    assert_eq!(summary.records_written, 2);

    let sink = session.sink();
    assert!(sink.closed);
    assert_eq!(sink.records.len(), 2);
    for record in &sink.records {
        assert_eq!(record.score, Some(2));
        assert!(!record.timed_out);
        let latency = record.latency_secs.expect("latency recorded");
        assert!(latency > 0.0);
        assert!(latency < config.answer_window_secs());
    }

    let messages = &session.renderer().messages;
    assert!(messages.contains(&Message::Score {
        correct: 2,
        selected: 2
    }));
    assert_eq!(
        messages.last(),
        Some(&Message::Instructions(Instruction::ExperimentFinished))
    );
}

#[test]
fn unanswered_trials_record_sentinels() {
    let config = short_config();
    let mut session = ExperimentSession::new(
        &config,
        ContinueOnly,
        RecordingRenderer::default(),
        MemorySink::new(),
        UnpacedClock::new(config.tick_rate),
    );

    let summary = session.run().expect("session should run");

    assert_eq!(summary.outcome, SessionOutcome::Completed);
    assert_eq!(session.sink().records, vec![ResponseRecord::timed_out(); 2]);
    assert!(session.renderer().messages.contains(&Message::TimeUp));
}

#[test]
fn guide_runs_before_practice_without_records() {
    let config = ExperimentConfig {
        run_guide: true,
        ..short_config()
    };
    let mut session = ExperimentSession::new(
        &config,
        autopilot(&config),
        RecordingRenderer::default(),
        MemorySink::new(),
        UnpacedClock::new(config.tick_rate),
    );

    let summary = session.run().expect("session should run");

    assert!(summary.guide_completed);
    assert_eq!(summary.records_written, config.real_trials);

    let messages = &session.renderer().messages;
    assert_eq!(messages[0], Message::Instructions(Instruction::Start));
    assert!(messages.contains(&Message::Answer));
    assert!(messages.contains(&Message::GuideScore { correct: 2 }));
    assert!(messages.contains(&Message::Instructions(Instruction::GuideFinished)));
}

#[test]
fn quit_mid_block_keeps_written_records() {
    let config = short_config();
    // Feedback #1 is the practice trial, #2 the first real trial
    let input = QuitOnFeedback {
        inner: autopilot(&config),
        remaining: 2,
        last_phase: None,
    };
    let mut session = ExperimentSession::new(
        &config,
        input,
        RecordingRenderer::default(),
        MemorySink::new(),
        UnpacedClock::new(config.tick_rate),
    );

    let summary = session.run().expect("quit is not an error");

    assert_eq!(summary.outcome, SessionOutcome::Aborted);
    assert_eq!(summary.records_written, 1);
    assert!(session.sink().closed);
}

#[test]
fn csv_log_has_header_and_one_row_per_real_trial() {
    let config = short_config();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.csv");

    let mut session = ExperimentSession::new(
        &config,
        autopilot(&config),
        RecordingRenderer::default(),
        CsvSink::create(&path).unwrap(),
        UnpacedClock::new(config.tick_rate),
    );
    session.run().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + config.real_trials);
    assert_eq!(lines[0], HEADER.join(","));
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields[1], "2");
        assert_eq!(fields[2], "False");
        assert!(fields[0].parse::<f64>().unwrap() > 0.0);
    }
}

#[test]
fn same_seed_same_records() {
    let config = short_config();
    let run = || {
        let mut session = ExperimentSession::new(
            &config,
            autopilot(&config),
            RecordingRenderer::default(),
            MemorySink::new(),
            UnpacedClock::new(config.tick_rate),
        );
        session.run().unwrap();
        session.sink().records.clone()
    };

    assert_eq!(run(), run());
}
