use tabled::Table;

use crate::{
    clock::CancelToken,
    config,
    countdown::{self, CountdownConfig, CountdownEvent},
    error::{Error, Result},
    info,
    management::ExportManager,
    progress::{self, StepLogger},
    session::Session,
    spotify::{
        player::{self, PollPolicy},
        tracks,
    },
    types::TrackUri,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct PlayOptions {
    /// Start without the priming track in front of the queue.
    pub no_priming: bool,
    /// Skip the recorded-tracks check after playback.
    pub skip_verify: bool,
}

/// Plays canonical tracks on the first eligible device and waits until the
/// planned playback time has passed.
pub async fn play(args: Vec<String>, options: PlayOptions, cancel: CancelToken) -> Result<()> {
    let mut logger = StepLogger::new("track aggregation", 7);

    let references = super::read_references(args)?;
    logger.step("input");

    let session = Session::from_env();
    super::connect(&session, &super::PLAYBACK_SCOPES).await?;
    logger.step("spotify connection");

    let uris = tracks::assert_canonical(&references)?;
    logger.step("URIs");

    let policy = PollPolicy::from_env();
    let spinner = progress::spinner("Looking for a playback device...");
    let device = player::select_device(&session, &policy, &cancel, &mut |attempt| {
        spinner.set_message(format!(
            "No valid devices found (attempt {}), retrying in {} seconds...",
            attempt,
            policy.interval.as_secs()
        ));
    })
    .await;
    spinner.finish_and_clear();
    let device = device?;
    logger.step("get devices");

    let priming = if options.no_priming {
        None
    } else {
        Some(priming_track()?)
    };

    player::start_playback(&session, &uris, &device, priming.as_ref()).await?;
    logger.step("start playing");

    let plan = player::playback_plan(&session, &uris, priming.as_ref()).await?;
    println!("{}", Table::new(plan.table_rows()));
    logger.step("get tracks");

    info!("Waiting for tracks to play to completion on {}...", device.name);
    let countdown_config = CountdownConfig::from_env();
    let bar = progress::countdown_bar(
        countdown::Countdown::new(
            plan.durations(),
            countdown_config.tick,
            countdown_config.margin,
        )
        .total_ticks(),
    );
    let summary = countdown::await_completion(session.clock(), &plan, countdown_config, &cancel, |event| {
        match event {
            CountdownEvent::NowPlaying { track, .. } => {
                bar.println(format!("Current part: {}", track.name));
                bar.set_message(track.name.clone());
            }
            CountdownEvent::Tick { .. } => bar.inc(1),
        }
    })
    .await;
    bar.finish_and_clear();
    let summary = summary?;
    info!(
        "Countdown finished after {} ticks and {} track changes",
        summary.ticks, summary.track_changes
    );
    logger.step("waiting");

    if !options.skip_verify {
        verify_recorded(&ExportManager::new(config::data_dir()), uris.len()).await?;
    }

    logger.done();
    Ok(())
}

fn priming_track() -> Result<TrackUri> {
    let value = config::priming_track();
    TrackUri::parse(&value).ok_or_else(|| {
        Error::Configuration(format!("Priming track is not a track URI: {}", value))
    })
}

/// Checks that the recorder produced at least one file per requested track.
pub async fn verify_recorded(exports: &ExportManager, expected: usize) -> Result<()> {
    let found = exports.count_recorded_tracks().await?;
    if found < expected {
        return Err(Error::Verification(format!(
            "Files were not actually downloaded: {} of {} in {}",
            found,
            expected,
            exports.track_dir().display()
        )));
    }
    Ok(())
}
