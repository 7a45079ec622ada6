/// Protocol handlers
///
/// | Signal          | Args        | Payload                     |
/// |-----------------|-------------|-----------------------------|
/// | `SCORE`         | 1 or 2 ints | `{score1}` / `{score1, score2}` |
/// | `GAME_ACTIVE`   | ms          | `{gameMs}`                  |
/// | `GAME_INACTIVE` | none        | `{}`                        |
/// | `TARGET_HIT`    | target id   | `{}`                        |
/// | `GAME_MODE`     | 0 / 1       | `{gameMode}`                |
/// | `TIME_SYNC`     | board ms    | `{}`                        |
use std::time::Duration;

use super::context::HandlerScope;
use super::dispatcher::SignalDispatcher;
use crate::audio_system::Cue;
use crate::error::{ClockError, HandlerError, SessionError};
use crate::hardware::{CountdownSkip, MAX_SCORE, MIN_SCORE};
use crate::messaging::Payload;
use crate::state::GameMode;

pub const SCORE: &str = "SCORE";
pub const GAME_ACTIVE: &str = "GAME_ACTIVE";
pub const GAME_INACTIVE: &str = "GAME_INACTIVE";
pub const TARGET_HIT: &str = "TARGET_HIT";
pub const GAME_MODE: &str = "GAME_MODE";
pub const TIME_SYNC: &str = "TIME_SYNC";

/// The clock board keeps counting a little past the match end
pub const COUNTDOWN_GRACE_MILLIS: i64 = 2_000;

/// Longest match a controller may start (one day)
pub const MAX_GAME_MILLIS: i64 = 86_400_000;

/// Delay between the start sting and the background loop
pub const BACKGROUND_MUSIC_DELAY: Duration = Duration::from_secs(1);

pub const INVALID_SCORE_DATA: &str = "Invalid score data";

pub fn register_default_handlers(dispatcher: &mut SignalDispatcher) {
    dispatcher.register(SCORE, update_score);
    dispatcher.register(GAME_ACTIVE, activate_game);
    dispatcher.register(GAME_INACTIVE, end_game);
    dispatcher.register(TARGET_HIT, target_hit);
    dispatcher.register(GAME_MODE, change_game_mode);
    dispatcher.register(TIME_SYNC, sync_time);
}

fn parse_int(arg: &str) -> Result<i64, HandlerError> {
    arg.parse::<i64>()
        .map_err(|_| HandlerError::InvalidInteger(arg.to_string()))
}

fn expect_args(signal: &str, args: &[String], count: usize) -> Result<(), HandlerError> {
    if args.len() == count {
        return Ok(());
    }
    let noun = if count == 1 { "argument" } else { "arguments" };
    Err(HandlerError::arguments(format!(
        "{} expects {} {}, got {}",
        signal,
        count,
        noun,
        args.len()
    )))
}

fn single_int(signal: &str, args: &[String]) -> Result<i64, HandlerError> {
    expect_args(signal, args, 1)?;
    parse_int(&args[0])
}

pub fn update_score(scope: &mut HandlerScope<'_>, args: &[String]) -> Result<Payload, HandlerError> {
    if !(1..=2).contains(&args.len()) {
        return Err(HandlerError::arguments(INVALID_SCORE_DATA));
    }

    let score = parse_int(&args[0])?;
    let opponent_score = args.get(1).map(|arg| parse_int(arg)).transpose()?;

    if let Some(display) = &scope.devices.score_display {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(HandlerError::OutOfRange {
                value: score,
                min: MIN_SCORE,
                max: MAX_SCORE,
            });
        }
        display.send_score(score)?;
    }

    scope.session.record_score(score, opponent_score);

    let payload = Payload::new().with("score1", score);
    Ok(match opponent_score {
        Some(opponent) => payload.with("score2", opponent),
        None => payload,
    })
}

pub fn activate_game(scope: &mut HandlerScope<'_>, args: &[String]) -> Result<Payload, HandlerError> {
    let game_ms = single_int(GAME_ACTIVE, args)?;
    if game_ms < 0 {
        return Err(HandlerError::arguments(format!(
            "{} length must not be negative, got {}",
            GAME_ACTIVE, game_ms
        )));
    }
    if game_ms > MAX_GAME_MILLIS {
        return Err(HandlerError::OutOfRange {
            value: game_ms,
            min: 0,
            max: MAX_GAME_MILLIS,
        });
    }

    scope.session.start_game(game_ms / 1000);
    tracing::info!("Starting game with ms: {}", game_ms);

    if let Some(display) = &scope.devices.score_display {
        display.send_score(0)?;
    }

    if let Some(clock) = &scope.devices.clock_display {
        let target = scope
            .session
            .end_time_millis()?
            .checked_add(COUNTDOWN_GRACE_MILLIS)
            .ok_or(SessionError::TimeOverflow)?;
        match clock.send_countdown_target(target) {
            Ok(hardware_target) => {
                tracing::debug!("Clock board countdown target {}", hardware_target);
            }
            Err(CountdownSkip::Clock(err @ ClockError::NotSynced)) => {
                tracing::info!("Skipping clock countdown: {}", err);
            }
            Err(CountdownSkip::Clock(err)) => {
                tracing::warn!("Skipping clock countdown: {}", err);
            }
            Err(CountdownSkip::Transport(err)) => return Err(err.into()),
        }
    }

    let cues = &scope.devices.cues;
    cues.play(Cue::GameStart);
    cues.play_after(Cue::BackgroundMusic, BACKGROUND_MUSIC_DELAY);

    Ok(Payload::new().with("gameMs", game_ms))
}

pub fn end_game(scope: &mut HandlerScope<'_>, args: &[String]) -> Result<Payload, HandlerError> {
    expect_args(GAME_INACTIVE, args, 0)?;

    scope.session.reset();
    tracing::info!("Game over, score {}", scope.session.score());

    let cues = &scope.devices.cues;
    cues.stop(Cue::BackgroundMusic);
    cues.play(Cue::GameWon);

    Ok(Payload::new())
}

pub fn target_hit(scope: &mut HandlerScope<'_>, args: &[String]) -> Result<Payload, HandlerError> {
    let target = single_int(TARGET_HIT, args)?;

    scope.devices.cues.play(Cue::Hit);
    tracing::info!("Target hit: {}", target);

    Ok(Payload::new())
}

pub fn change_game_mode(
    scope: &mut HandlerScope<'_>,
    args: &[String],
) -> Result<Payload, HandlerError> {
    let code = single_int(GAME_MODE, args)?;

    scope.devices.cues.play(Cue::Hit);
    let mode = GameMode::from_code(code);
    scope.session.set_mode(mode);
    tracing::info!("Game mode: {} (score {})", mode, scope.session.score());

    Ok(Payload::new().with("gameMode", code))
}

pub fn sync_time(scope: &mut HandlerScope<'_>, args: &[String]) -> Result<Payload, HandlerError> {
    let hardware_millis = single_int(TIME_SYNC, args)?;

    let clock = scope
        .devices
        .clock_display
        .as_ref()
        .ok_or(HandlerError::MissingDevice("Clock"))?;

    let offset = clock.sync(hardware_millis)?;
    tracing::info!("Syncing time to {} (offset {} ms)", hardware_millis, offset);

    Ok(Payload::new())
}
