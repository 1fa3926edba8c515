use beatline_core::{
    song, AudioFrame, BandEnergies, GameConfig, GameEvent, HitGrade, InputAction, PlayMode, Player,
    RoundController, RoundMode, SoundId, Timeline, TimelineEvent,
};

fn single_event(player: Player, sound: SoundId) -> RoundController {
    let timeline = Timeline::new(vec![TimelineEvent::new(0.0, player, sound)]);
    RoundController::with_timeline(GameConfig::default(), timeline).unwrap()
}

/// ready → select → play in scripted mode
fn start_scripted(controller: &mut RoundController) {
    controller.handle_input(InputAction::AdvanceMode);
    controller.tick(None);
    controller.handle_input(InputAction::ChooseMode(PlayMode::Scripted));
    controller.tick(None);
    assert_eq!(controller.mode(), RoundMode::Play);
}

fn run_until_end(controller: &mut RoundController, max_ticks: usize) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..max_ticks {
        events.extend(controller.tick(None));
        if controller.mode() == RoundMode::End {
            break;
        }
    }
    events
}

fn count<F: Fn(&GameEvent) -> bool>(events: &[GameEvent], f: F) -> usize {
    events.iter().filter(|e| f(e)).count()
}

#[test]
fn test_unhit_beat_expires_as_miss() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);

    // The event is due before the travel time, so it spawns on the first tick
    let first = controller.tick(None);
    assert!(first.contains(&GameEvent::BeatSpawned {
        player: Player::One,
        sound: SoundId::Don
    }));
    assert_eq!(controller.live_beats().len(), 1);

    let events = run_until_end(&mut controller, 500);
    assert_eq!(controller.mode(), RoundMode::End);
    assert_eq!(
        count(&events, |e| matches!(e, GameEvent::Miss { player: Player::One, .. })),
        1
    );

    let stats = controller.scores().get(Player::One);
    assert_eq!(stats.miss, 1);
    assert_eq!(stats.combo, 0);
    assert_eq!(stats.score, 0);
    assert!(controller.live_beats().is_empty());
}

#[test]
fn test_event_due_within_travel_time_spawns_at_once_and_expires() {
    let config = GameConfig::default();
    assert_eq!(config.travel_time_secs, 1.43);
    let speed = config.scripted_speed;
    let timeline = Timeline::new(vec![TimelineEvent::new(1.0, Player::One, SoundId::Don)]);
    let mut controller = RoundController::with_timeline(config, timeline).unwrap();
    start_scripted(&mut controller);

    assert_eq!(controller.round_tick(), 0);
    let first = controller.tick(None);
    assert!(first.contains(&GameEvent::BeatSpawned {
        player: Player::One,
        sound: SoundId::Don
    }));

    let mut expected = 30.0 - speed;
    let miss_tick = loop {
        assert!(controller.round_tick() < 200, "beat never expired");
        let beat = controller.live_beats()[0].clone();
        assert_eq!(beat.target_zone(), 0.0);
        assert!(
            (beat.position() - expected).abs() < 1e-4,
            "tick {}: at {} instead of {}",
            controller.round_tick(),
            beat.position(),
            expected
        );

        let events = controller.tick(None);
        let miss = events.iter().find_map(|e| match e {
            GameEvent::Miss { player, position } => Some((*player, *position)),
            _ => None,
        });
        if let Some(miss) = miss {
            assert_eq!(miss, (Player::One, 0.0));
            break controller.round_tick();
        }
        expected -= speed;
    };

    // First position more than one pixel past 0: 30 - 0.35 * 89 = -1.15
    assert_eq!(miss_tick, 89);
    let stats = controller.scores().get(Player::One);
    assert_eq!(stats.miss, 1);
    assert_eq!(stats.combo, 0);
}

#[test]
fn test_miss_resets_combo() {
    let timeline = Timeline::new(vec![
        TimelineEvent::new(0.0, Player::One, SoundId::Ka),
        TimelineEvent::new(1.0, Player::One, SoundId::Don),
    ]);
    let mut controller = RoundController::with_timeline(GameConfig::default(), timeline).unwrap();
    start_scripted(&mut controller);
    controller.tick(None);
    assert_eq!(controller.live_beats().len(), 2);

    // Both beats travel together; the press takes the earlier one
    let speed = controller.config().scripted_speed;
    while controller.live_beats()[0].distance_to_target() - speed > 0.5 {
        controller.tick(None);
    }
    controller.handle_input(InputAction::Hit(Player::One));
    let events = controller.tick(None);
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Hit {
            sound: SoundId::Ka,
            grade: HitGrade::Perfect,
            ..
        }
    )));
    assert_eq!(controller.scores().get(Player::One).combo, 1);

    let events = run_until_end(&mut controller, 200);
    assert_eq!(count(&events, |e| matches!(e, GameEvent::Miss { .. })), 1);
    let stats = controller.scores().get(Player::One);
    assert_eq!(stats.combo, 0);
    assert_eq!(stats.max_combo, 1);
    assert_eq!(stats.perfect, 1);
    assert_eq!(stats.miss, 1);
    assert_eq!(stats.score, 300);
}

#[test]
fn test_beat_expires_only_past_tolerance() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);

    loop {
        let events = controller.tick(None);
        if let Some(beat) = controller.live_beats().first() {
            assert!(beat.position() >= -1.0, "beat still live at {}", beat.position());
        }
        if events.iter().any(|e| matches!(e, GameEvent::Miss { .. })) {
            break;
        }
        assert!(controller.round_tick() < 200);
    }
    assert!(controller.live_beats().is_empty());
}

#[test]
fn test_timed_hit_scores_perfect() {
    let mut controller = single_event(Player::Two, SoundId::NoteC);
    start_scripted(&mut controller);
    controller.tick(None);

    // Press so that the next advance lands inside the perfect window
    let speed = controller.config().scripted_speed;
    while controller.live_beats()[0].distance_to_target() - speed > 0.9 {
        controller.tick(None);
    }
    controller.handle_input(InputAction::Hit(Player::Two));
    let events = controller.tick(None);

    let hit = events
        .iter()
        .find_map(|e| match e {
            GameEvent::Hit {
                grade,
                position,
                sound,
                volume,
                play_sound,
                ..
            } => Some((*grade, *position, *sound, *volume, *play_sound)),
            _ => None,
        })
        .expect("hit event");
    assert_eq!(hit, (HitGrade::Perfect, 59.0, SoundId::NoteC, 1.0, true));

    // Hit beats leave the live set in the same tick
    assert!(controller.live_beats().is_empty());
    let stats = controller.scores().get(Player::Two);
    assert_eq!(stats.score, 300);
    assert_eq!(stats.combo, 1);
    assert!(!controller.feedback().is_empty());
}

#[test]
fn test_early_press_is_ignored() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);
    controller.tick(None);

    controller.handle_input(InputAction::Hit(Player::One));
    let events = controller.tick(None);
    assert!(events.is_empty());
    assert_eq!(controller.live_beats().len(), 1);
    assert_eq!(controller.scores().get(Player::One).beats_seen(), 0);
}

#[test]
fn test_input_is_consumed_once() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);

    let speed = controller.config().scripted_speed;
    controller.tick(None);
    while controller.live_beats()[0].distance_to_target() - speed > 2.0 {
        controller.tick(None);
    }
    controller.handle_input(InputAction::Hit(Player::One));
    let hit_tick = controller.tick(None);
    assert_eq!(count(&hit_tick, |e| matches!(e, GameEvent::Hit { .. })), 1);

    let later = controller.tick(None);
    assert_eq!(count(&later, |e| matches!(e, GameEvent::Hit { .. })), 0);
}

#[test]
fn test_round_ends_exactly_once() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);

    let mut events = run_until_end(&mut controller, 500);
    for _ in 0..100 {
        events.extend(controller.tick(None));
    }

    assert_eq!(count(&events, |e| matches!(e, GameEvent::RoundEnded(_))), 1);
    assert_eq!(
        count(&events, |e| matches!(
            e,
            GameEvent::ModeChanged {
                from: RoundMode::Play,
                to: RoundMode::End
            }
        )),
        1
    );
    let summary = controller.last_summary().copied().unwrap();
    assert_eq!(summary.total_score, 0);
    assert_eq!(summary.players[0].miss, 1);
    assert_eq!(summary.play_mode, PlayMode::Scripted);
}

#[test]
fn test_round_waits_for_feedback() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);

    let mut miss_tick = None;
    for _ in 0..500 {
        let events = controller.tick(None);
        if events.iter().any(|e| matches!(e, GameEvent::Miss { .. })) {
            miss_tick = Some(controller.round_tick());
        }
        if controller.mode() == RoundMode::End {
            break;
        }
    }

    let flash_ticks = controller.config().flash_ticks as u64;
    let miss_tick = miss_tick.unwrap();
    assert_eq!(controller.round_tick() - miss_tick, flash_ticks - 1);
}

#[test]
fn test_empty_timeline_ends_on_first_tick() {
    let mut controller =
        RoundController::with_timeline(GameConfig::default(), Timeline::default()).unwrap();
    start_scripted(&mut controller);
    let events = controller.tick(None);
    assert_eq!(controller.mode(), RoundMode::End);
    assert_eq!(count(&events, |e| matches!(e, GameEvent::RoundEnded(_))), 1);
}

#[test]
fn test_reset_returns_to_ready() {
    let mut controller = single_event(Player::One, SoundId::Don);
    start_scripted(&mut controller);
    run_until_end(&mut controller, 500);
    assert!(controller.end_fill().is_some());

    controller.handle_input(InputAction::Reset);
    let events = controller.tick(None);
    assert_eq!(
        events,
        vec![GameEvent::ModeChanged {
            from: RoundMode::End,
            to: RoundMode::Ready
        }]
    );
    assert_eq!(controller.play_mode(), PlayMode::Scripted);
    assert_eq!(controller.scores().total_score(), 0);
    assert!(controller.end_fill().is_none());
    assert!(controller.source_finished());

    // A second round plays the same timeline again
    start_scripted(&mut controller);
    let spawned = controller.tick(None);
    assert_eq!(count(&spawned, |e| matches!(e, GameEvent::BeatSpawned { .. })), 1);
}

#[test]
fn test_reset_outside_end_is_ignored() {
    let mut controller = single_event(Player::One, SoundId::Don);
    assert!(!controller.reset());
    start_scripted(&mut controller);
    assert!(!controller.reset());
    controller.handle_input(InputAction::Reset);
    controller.tick(None);
    assert_eq!(controller.mode(), RoundMode::Play);
}

#[test]
fn test_end_fill_progresses() {
    let mut controller =
        RoundController::with_timeline(GameConfig::default(), Timeline::default()).unwrap();
    start_scripted(&mut controller);
    controller.tick(None);
    assert_eq!(controller.end_fill().map(|f| f.progress()), Some(0.0));

    for _ in 0..100 {
        controller.tick(None);
    }
    let fill = controller.end_fill().unwrap();
    assert!(fill.is_done());
    assert_eq!(fill.reach(), 30);
}

#[test]
fn test_live_round_spawns_and_mutes_hits() {
    let mut controller =
        RoundController::with_timeline(GameConfig::default(), Timeline::default()).unwrap();
    controller.set_live_available(true);
    controller.handle_input(InputAction::AdvanceMode);
    controller.tick(None);
    controller.handle_input(InputAction::ChooseMode(PlayMode::Live));
    controller.tick(None);
    assert_eq!(controller.play_mode(), PlayMode::Live);

    let quiet = AudioFrame::playing(BandEnergies::default());
    for _ in 0..3 {
        assert!(controller.tick(Some(quiet)).is_empty());
    }
    let spike = AudioFrame::playing(BandEnergies::new(50.0, 0.0, 0.0));
    let events = controller.tick(Some(spike));
    assert_eq!(
        events,
        vec![GameEvent::BeatSpawned {
            player: Player::One,
            sound: SoundId::Don
        }]
    );
    assert_eq!(controller.live_beats()[0].speed(), controller.config().live_speed);

    let speed = controller.config().live_speed;
    while controller.live_beats()[0].distance_to_target() - speed > 1.5 {
        controller.tick(Some(quiet));
    }
    controller.handle_input(InputAction::Hit(Player::One));
    let events = controller.tick(Some(AudioFrame::ended()));
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Hit {
            grade: HitGrade::Perfect,
            play_sound: false,
            ..
        }
    )));
    assert!(controller.source_finished());

    let events = run_until_end(&mut controller, 100);
    assert_eq!(controller.mode(), RoundMode::End);
    let summary = events
        .iter()
        .find_map(|e| match e {
            GameEvent::RoundEnded(summary) => Some(*summary),
            _ => None,
        })
        .unwrap();
    assert_eq!(summary.play_mode, PlayMode::Live);
    assert_eq!(summary.players[0].score, 300);
}

#[test]
fn test_live_round_stops_at_duration_cap() {
    let mut config = GameConfig::default();
    config.onset.max_duration_secs = 0.5;
    let mut controller = RoundController::with_timeline(config, Timeline::default()).unwrap();
    controller.set_live_available(true);
    controller.handle_input(InputAction::AdvanceMode);
    controller.tick(None);
    controller.handle_input(InputAction::ChooseMode(PlayMode::Live));
    controller.tick(None);

    let quiet = AudioFrame::playing(BandEnergies::default());
    for _ in 0..30 {
        controller.tick(Some(quiet));
    }
    assert_eq!(controller.mode(), RoundMode::Play);
    controller.tick(Some(quiet));
    assert_eq!(controller.mode(), RoundMode::End);
}

#[test]
fn test_default_song_round_completes() {
    let mut controller = RoundController::new(GameConfig::default()).unwrap();
    start_scripted(&mut controller);

    let events = run_until_end(&mut controller, 60 * 40);
    assert_eq!(controller.mode(), RoundMode::End);
    let spawned = count(&events, |e| matches!(e, GameEvent::BeatSpawned { .. }));
    let missed = count(&events, |e| matches!(e, GameEvent::Miss { .. }));
    assert_eq!(spawned, 88);
    assert_eq!(missed, 88);
}

#[test]
fn test_snapshot_reports_live_availability() {
    let mut controller = single_event(Player::One, SoundId::Don);
    assert!(!controller.snapshot().live_available);
    controller.set_live_available(true);
    assert!(controller.snapshot().live_available);
}

#[test]
fn test_scripted_round_drives_backing_pad() {
    let timeline = Timeline::new(vec![TimelineEvent::new(5.0, Player::One, SoundId::Don)]);
    let mut controller = RoundController::with_timeline(GameConfig::default(), timeline).unwrap();
    controller.handle_input(InputAction::AdvanceMode);
    controller.tick(None);
    controller.handle_input(InputAction::ChooseMode(PlayMode::Scripted));
    let started = controller.tick(None);
    assert!(started.contains(&GameEvent::BackingStarted {
        frequencies_hz: song::BACKING_CHORDS[0],
        volume: song::BACKING_VOLUME,
    }));
    assert_eq!(controller.backing_chord(), Some(0));
    assert_eq!(controller.snapshot().backing_chord, Some(0));

    let chord_ticks = controller.config().backing_chord_ticks() as u64;
    let mut changes = Vec::new();
    let mut stops = 0;
    for _ in 0..1000 {
        for event in controller.tick(None) {
            match event {
                GameEvent::BackingChordChanged {
                    chord,
                    frequencies_hz,
                } => {
                    assert_eq!(frequencies_hz, song::BACKING_CHORDS[chord]);
                    changes.push((controller.round_tick(), chord));
                }
                GameEvent::BackingStopped => stops += 1,
                _ => {}
            }
        }
        if controller.mode() == RoundMode::End {
            break;
        }
    }

    assert_eq!(controller.mode(), RoundMode::End);
    assert_eq!(changes, vec![(chord_ticks, 1)]);
    assert_eq!(stops, 1);
    assert_eq!(controller.backing_chord(), None);

    // Already silent, so reset has nothing to stop
    controller.handle_input(InputAction::Reset);
    let events = controller.tick(None);
    assert_eq!(count(&events, |e| matches!(e, GameEvent::BackingStopped)), 0);
}

#[test]
fn test_live_round_has_no_backing_pad() {
    let mut controller =
        RoundController::with_timeline(GameConfig::default(), Timeline::default()).unwrap();
    controller.set_live_available(true);
    controller.handle_input(InputAction::AdvanceMode);
    controller.tick(None);
    controller.handle_input(InputAction::ChooseMode(PlayMode::Live));
    let events = controller.tick(None);
    assert_eq!(controller.mode(), RoundMode::Play);
    assert_eq!(
        count(&events, |e| matches!(e, GameEvent::BackingStarted { .. })),
        0
    );
    assert_eq!(controller.backing_chord(), None);
}
