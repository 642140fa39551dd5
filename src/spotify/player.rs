use std::time::Duration;

use reqwest::Method;

use crate::{
    clock::{CancelToken, sleep_or_cancel},
    config,
    error::{Error, Result},
    session::Session,
    spotify::tracks,
    types::{Device, DevicesResponse, PlayRequest, PlaybackPlan, TrackUri},
};

/// How the device list is polled while no eligible device is online.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Device type that may receive playback, e.g. `Computer`.
    pub device_type: String,
    pub interval: Duration,
    /// `None` keeps polling until cancelled.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            device_type: "Computer".to_string(),
            interval: Duration::from_secs(15),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    pub fn from_env() -> Self {
        Self {
            device_type: config::device_type(),
            interval: config::device_poll_interval(),
            max_attempts: config::device_poll_attempts(),
        }
    }
}

/// Called before each wait with the attempt number that came up empty.
pub type PollObserver<'a> = &'a mut dyn FnMut(u32);

pub fn is_eligible(device: &Device, device_type: &str) -> bool {
    device.id.is_some() && !device.is_restricted && device.kind == device_type
}

pub async fn list_devices(session: &Session) -> Result<Vec<Device>> {
    let request = session
        .api_request(Method::GET, "me/player/devices")?
        .build()?;
    let response: DevicesResponse = session.client().get_json(request).await?;
    Ok(response.devices)
}

/// Returns the first eligible device, polling until one shows up.
///
/// An eligible device on the first poll is returned without any wait.
///
/// # Arguments
///
/// * `session` - Authorized session; its clock drives the wait between polls
/// * `policy` - Device type, poll interval and optional attempt limit
/// * `cancel` - Checked before every poll and while waiting
/// * `on_empty` - Called with the attempt number whenever a poll found nothing
///
/// # Returns
///
/// The first device with an id, not restricted, whose type matches
/// `policy.device_type`.
///
/// # Errors
///
/// - `Error::Cancelled` once `cancel` fires
/// - `Error::DeviceUnavailable` after `policy.max_attempts` empty polls
/// - Any error of the device listing request
///
/// # Example
///
/// ```
/// let device = player::select_device(&session, &PollPolicy::default(), &cancel, &mut |attempt| {
///     warning!("No device yet (attempt {})", attempt);
/// })
/// .await?;
/// ```
pub async fn select_device(
    session: &Session,
    policy: &PollPolicy,
    cancel: &CancelToken,
    on_empty: PollObserver<'_>,
) -> Result<Device> {
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        attempts += 1;
        let devices = list_devices(session).await?;
        if let Some(device) = devices
            .into_iter()
            .find(|d| is_eligible(d, &policy.device_type))
        {
            return Ok(device);
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(Error::DeviceUnavailable { attempts });
        }

        on_empty(attempts);
        sleep_or_cancel(session.clock(), policy.interval, cancel).await?;
    }
}

/// Playback order: the optional priming track followed by `uris`.
pub fn playback_queue(uris: &[TrackUri], priming: Option<&TrackUri>) -> Vec<TrackUri> {
    priming.into_iter().chain(uris.iter()).cloned().collect()
}

/// Starts playing `uris` on `device`, preceded by `priming` when given.
pub async fn start_playback(
    session: &Session,
    uris: &[TrackUri],
    device: &Device,
    priming: Option<&TrackUri>,
) -> Result<()> {
    let device_id = device.id.as_deref().ok_or_else(|| {
        Error::Configuration(format!("device {} has no id", device.name))
    })?;

    let request = session
        .api_request(Method::PUT, "me/player/play")?
        .query(&[("device_id", device_id)])
        .json(&PlayRequest {
            uris: playback_queue(uris, priming),
        })
        .build()?;

    session.client().execute(request).await?;
    Ok(())
}

/// Metadata for exactly the queue that [`start_playback`] sends.
pub async fn playback_plan(
    session: &Session,
    uris: &[TrackUri],
    priming: Option<&TrackUri>,
) -> Result<PlaybackPlan> {
    let queue = playback_queue(uris, priming);
    let tracks = tracks::fetch_metadata(session, &queue).await?;
    Ok(PlaybackPlan::new(tracks))
}
