// SPDX-License-Identifier: GPL-3.0-only

//! One-shot CLI commands
//!
//! This module drives the same controller as the terminal page, without a
//! screen:
//! - Taking a photo and uploading it
//! - Recording a video and uploading it
//! - Printing the configuration

use camera_capture::app::{
    CaptureController, Collaborators, Message, Runtime, StatusKind, ViewState,
};
use camera_capture::config::Config;
use camera_capture::constants::{
    CAMERA_WARMUP, FIRST_FRAME_TIMEOUT, PIPELINE_START_TIMEOUT_SECS, REDIRECT_DELAY,
    RECORDER_FINALIZE_TIMEOUT_SECS,
};
use camera_capture::media::MediaKind;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Take a photo and upload it
pub fn take_photo(config: Config) -> CliResult<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut runtime = start_camera(&config).await?;

        // Wait for the camera to settle (exposure, white balance)
        println!("Warming up...");
        tokio::time::sleep(CAMERA_WARMUP).await;
        wait_for_frame(&runtime).await?;

        runtime.process(Message::TakePhoto);
        runtime
            .run_until(FIRST_FRAME_TIMEOUT, |c| {
                c.view() != ViewState::Streaming
                    || c.status().is_some_and(|s| s.kind == StatusKind::Error)
            })
            .await;
        if runtime.controller().view() != ViewState::PhotoReady {
            return Err(failure(&runtime, "Photo capture failed"));
        }

        let size = runtime.controller().photo().map(|b| b.len()).unwrap_or(0);
        println!("Photo captured: {} bytes", size);

        upload(&mut runtime, MediaKind::Photo, &config).await
    })
}

/// Record a video for `duration` seconds (Ctrl+C stops early) and upload it
pub fn record_video(config: Config, duration: u64) -> CliResult<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut runtime = start_camera(&config).await?;

        runtime.process(Message::StartRecording);
        if runtime.controller().view() != ViewState::Recording {
            return Err(failure(&runtime, "Could not start recording"));
        }

        println!();
        println!("Recording... (press Ctrl+C to stop early)");

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_clone = stop_flag.clone();
        ctrlc::set_handler(move || {
            stop_flag_clone.store(true, Ordering::SeqCst);
        })?;

        let start = Instant::now();
        let target_duration = Duration::from_secs(duration);

        while start.elapsed() < target_duration {
            if stop_flag.load(Ordering::SeqCst) {
                println!();
                println!("Stopping early...");
                break;
            }
            runtime.try_process();

            let elapsed = start.elapsed().as_secs();
            print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
            std::io::Write::flush(&mut std::io::stdout())?;

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        println!();

        runtime.process(Message::StopRecording);
        runtime
            .run_until(
                Duration::from_secs(RECORDER_FINALIZE_TIMEOUT_SECS),
                |c| c.view() != ViewState::Recording,
            )
            .await;
        if runtime.controller().view() != ViewState::VideoReady {
            return Err(failure(&runtime, "Recording failed"));
        }

        let size = runtime.controller().video().map(|b| b.len()).unwrap_or(0);
        println!("Video recorded: {} bytes", size);

        upload(&mut runtime, MediaKind::Video, &config).await
    })
}

/// Print the config file location and the effective settings
pub fn show_config(config: &Config) -> CliResult<()> {
    match Config::default_path() {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no config directory)"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

async fn start_camera(config: &Config) -> CliResult<Runtime> {
    let controller = CaptureController::new(Collaborators::from_config(config)?);
    let mut runtime = Runtime::new(controller);

    println!("Starting camera...");
    runtime.process(Message::StartCamera);
    // Building a pipeline may take a state-change timeout per pipeline
    runtime
        .run_until(
            Duration::from_secs(PIPELINE_START_TIMEOUT_SECS * 2),
            |c| !c.is_acquiring(),
        )
        .await;

    if runtime.controller().stream().is_none() {
        return Err(failure(&runtime, "Camera did not start"));
    }
    print_status(&runtime);
    Ok(runtime)
}

async fn wait_for_frame(runtime: &Runtime) -> CliResult<()> {
    let start = Instant::now();
    while start.elapsed() < FIRST_FRAME_TIMEOUT {
        let ready = runtime
            .controller()
            .stream()
            .is_some_and(|stream| stream.frame().is_some());
        if ready {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    Err("Failed to capture frame from camera".into())
}

async fn upload(runtime: &mut Runtime, kind: MediaKind, config: &Config) -> CliResult<()> {
    runtime.process(Message::Upload(kind));
    if runtime.controller().view() != ViewState::Uploading(kind) {
        return Err(failure(runtime, "Upload did not start"));
    }
    println!("Uploading {} to {}...", kind, config.server_url);

    runtime
        .run_until(config.request_timeout() + REDIRECT_DELAY, |c| {
            !matches!(c.view(), ViewState::Uploading(_))
        })
        .await;
    print_status(runtime);

    let succeeded = runtime
        .controller()
        .status()
        .is_some_and(|status| status.kind == StatusKind::Success);

    // Success and login both redirect after a short delay
    runtime
        .run_until(REDIRECT_DELAY * 2, |c| c.navigation().is_some())
        .await;
    if let Some(route) = runtime.take_navigation() {
        println!("Continue at: {}", config.resolve(&route)?);
    }

    if succeeded {
        Ok(())
    } else {
        Err("Upload failed".into())
    }
}

fn print_status(runtime: &Runtime) {
    if let Some(status) = runtime.controller().status() {
        println!("{}", status.text);
    }
}

/// Error carrying the banner text if there is one
fn failure(runtime: &Runtime, fallback: &str) -> Box<dyn std::error::Error> {
    match runtime.controller().status() {
        Some(status) if status.kind == StatusKind::Error => status.text.clone().into(),
        _ => fallback.into(),
    }
}
