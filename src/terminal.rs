// SPDX-License-Identifier: GPL-3.0-only

//! Terminal capture page
//!
//! Renders the live camera and the captured photo using Unicode half-block
//! characters, with the visible controls, the status banner and key hints
//! along the bottom.

use crate::app::{
    CaptureController, Collaborators, Control, ControlState, Controls, Runtime, StatusKind,
};
use crate::backends::MediaFrame;
use crate::config::Config;
use crate::media::Blob;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{error, info};

/// Rows reserved below the camera: controls, status, key hints
const FOOTER_HEIGHT: u16 = 3;

/// Run the capture page until the user quits or an upload navigates away
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let controller = CaptureController::new(Collaborators::from_config(&config)?);
    let mut runtime = Runtime::new(controller);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_page(&mut terminal, &mut runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Tear the page down (releases the camera) before leaving it
    drop(runtime);

    if let Some(route) = result? {
        let url = config.resolve(&route)?;
        println!("Continue at: {}", url);
        if config.open_browser
            && let Err(e) = open::that(&url)
        {
            error!(url = %url, error = %e, "Failed to open browser");
        }
    }
    Ok(())
}

/// Event loop; returns the route to navigate to, if any
fn run_page(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    runtime: &mut Runtime,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut photo_preview = PhotoPreview::default();

    loop {
        runtime.try_process();
        if let Some(route) = runtime.take_navigation() {
            info!(route = %route, "Leaving capture page");
            return Ok(Some(route));
        }

        let controller = runtime.controller();
        let controls = controller.controls();
        photo_preview.update(controls.photo_preview.then(|| controller.photo()).flatten());

        terminal.draw(|f| render_page(f, controller, &controls, &photo_preview))?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            if key.code == KeyCode::Char('q') {
                break;
            }
            if let KeyCode::Char(c) = key.code
                && let Some(control) = control_for_key(&controls, c)
            {
                runtime.dispatch(control.message());
            }
        }
    }

    Ok(None)
}

fn render_page(
    f: &mut Frame,
    controller: &CaptureController,
    controls: &Controls,
    photo_preview: &PhotoPreview,
) {
    let area = f.area();
    let body = Rect {
        height: area.height.saturating_sub(FOOTER_HEIGHT),
        ..area
    };

    let preview_text = if controls.video_preview {
        controller
            .video()
            .map(|blob| format!("Video ready: {} KiB WebM", blob.len() / 1024))
    } else {
        None
    };
    let has_preview = controls.photo_preview || preview_text.is_some();

    // Camera on the left, preview on the right when there is one
    let (camera_area, preview_area) = if has_preview {
        let half = body.width / 2;
        (
            Rect { width: half, ..body },
            Rect {
                x: body.x + half,
                width: body.width - half,
                ..body
            },
        )
    } else {
        (body, Rect::default())
    };

    let camera = if controls.camera_surface {
        FrameWidget {
            frame: controller.stream().and_then(|stream| stream.frame()),
            placeholder: "Waiting for camera...",
        }
    } else {
        FrameWidget {
            frame: None,
            placeholder: "Camera is off",
        }
    };
    f.render_widget(&camera, camera_area);

    if controls.photo_preview {
        let preview = FrameWidget {
            frame: photo_preview.frame.clone(),
            placeholder: "Photo ready",
        };
        f.render_widget(&preview, preview_area);
    } else if let Some(text) = &preview_text {
        let preview = FrameWidget {
            frame: None,
            placeholder: text,
        };
        f.render_widget(&preview, preview_area);
    }

    let footer_y = area.y + area.height.saturating_sub(FOOTER_HEIGHT);
    let line = |offset: u16| Rect {
        x: area.x,
        y: footer_y + offset,
        width: area.width,
        height: 1,
    };

    f.render_widget(
        ControlBar {
            controls,
            recording_secs: controller
                .recording()
                .is_recording()
                .then(|| controller.recording().elapsed_duration()),
        },
        line(0),
    );
    let (message, kind) = match controller.status() {
        Some(status) => (status.text.as_str(), Some(status.kind)),
        None => ("", None),
    };
    f.render_widget(StatusBar { message, kind }, line(1));
    f.render_widget(
        StatusBar {
            message: "press the highlighted key | q quit",
            kind: None,
        },
        line(2),
    );
}

/// Key that activates a control
fn key_for(control: Control) -> char {
    match control {
        Control::StartCamera => 's',
        Control::StopCamera => 'x',
        Control::TakePhoto => 'p',
        Control::StartRecording | Control::StopRecording => 'r',
        Control::UploadPhoto | Control::UploadVideo => 'u',
    }
}

/// Visible, enabled control bound to `key`
///
/// Hidden and disabled controls do not react, like greyed-out buttons.
fn control_for_key(controls: &Controls, key: char) -> Option<Control> {
    controls
        .visible()
        .into_iter()
        .find(|(control, state)| *state == ControlState::Enabled && key_for(*control) == key)
        .map(|(control, _)| control)
}

/// Decoded photo preview, refreshed when the photo changes
#[derive(Default)]
struct PhotoPreview {
    source: Option<usize>,
    frame: Option<MediaFrame>,
}

impl PhotoPreview {
    fn update(&mut self, photo: Option<&Blob>) {
        let source = photo.map(|blob| blob.bytes.as_ptr() as usize);
        if source == self.source {
            return;
        }
        self.source = source;
        self.frame = photo.and_then(decode_photo);
    }
}

fn decode_photo(blob: &Blob) -> Option<MediaFrame> {
    match image::load_from_memory(&blob.bytes) {
        Ok(image) => {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Some(MediaFrame::from_rgb(width, height, rgb.into_raw()))
        }
        Err(e) => {
            error!(error = %e, "Could not decode photo preview");
            None
        }
    }
}

/// Widget that renders a frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<MediaFrame>,
    placeholder: &'a str,
}

impl Widget for &FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let frame = match &self.frame {
            Some(frame) if frame.width > 0 && frame.height > 0 => frame,
            _ => {
                let msg = self.placeholder;
                let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
                let y = area.y + area.height / 2;
                if y < area.y + area.height && x < area.x + area.width {
                    buf.set_string(x, y, msg, Style::default());
                }
                return;
            }
        };

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let (r, g, b) = frame.pixel(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = frame.pixel(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Row of visible controls with their keys
struct ControlBar<'a> {
    controls: &'a Controls,
    recording_secs: Option<u64>,
}

impl Widget for ControlBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut x = area.x;
        let right = area.x + area.width;

        if let Some(secs) = self.recording_secs {
            let rec = format!(" ● REC {:02}:{:02} ", secs / 60, secs % 60);
            let style = Style::default().fg(Color::White).bg(Color::Red);
            x = buf.set_stringn(x, area.y, &rec, right.saturating_sub(x) as usize, style).0 + 1;
        }

        for (control, state) in self.controls.visible() {
            if x >= right {
                break;
            }
            let label = format!(" [{}] {} ", key_for(control), control.label());
            let style = match state {
                ControlState::Enabled => Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default().fg(Color::DarkGray),
            };
            x = buf
                .set_stringn(x, area.y, &label, right.saturating_sub(x) as usize, style)
                .0
                + 1;
        }
    }
}

/// Single-line banner
struct StatusBar<'a> {
    message: &'a str,
    kind: Option<StatusKind>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = match self.kind {
            Some(StatusKind::Success) => Color::Green,
            Some(StatusKind::Error) => Color::Red,
            Some(StatusKind::Info) => Color::Blue,
            None => Color::DarkGray,
        };

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(bg),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewState;
    use crate::backends::memory::test_pattern;
    use crate::media::MediaKind;

    #[test]
    fn test_keys_follow_visible_controls() {
        let streaming = ViewState::Streaming.controls();
        assert_eq!(control_for_key(&streaming, 'p'), Some(Control::TakePhoto));
        assert_eq!(control_for_key(&streaming, 'r'), Some(Control::StartRecording));
        assert_eq!(control_for_key(&streaming, 's'), None);

        let recording = ViewState::Recording.controls();
        assert_eq!(control_for_key(&recording, 'r'), Some(Control::StopRecording));
        // Take photo is shown but disabled
        assert_eq!(control_for_key(&recording, 'p'), None);
    }

    #[test]
    fn test_disabled_upload_ignores_key() {
        let uploading = ViewState::Uploading(MediaKind::Photo).controls();
        assert_eq!(control_for_key(&uploading, 'u'), None);
        assert_eq!(control_for_key(&uploading, 'x'), Some(Control::StopCamera));
    }

    #[test]
    fn test_frame_widget_draws_half_blocks() {
        let area = Rect::new(0, 0, 8, 2);
        let mut buf = Buffer::empty(area);
        let widget = FrameWidget {
            frame: Some(test_pattern(8, 4)),
            placeholder: "",
        };
        (&widget).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "▀");
    }

    #[test]
    fn test_frame_widget_placeholder() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        let widget = FrameWidget {
            frame: None,
            placeholder: "Camera is off",
        };
        (&widget).render(area, &mut buf);
        let row: String = (0..20).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Camera is off"));
    }

    #[test]
    fn test_photo_preview_decodes_png() {
        let png = crate::pipelines::photo::PhotoEncoder::encode_png(&test_pattern(4, 2)).unwrap();
        let blob = Blob::new(png, MediaKind::Photo.mime());
        let mut preview = PhotoPreview::default();
        preview.update(Some(&blob));
        let frame = preview.frame.as_ref().unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));

        preview.update(None);
        assert!(preview.frame.is_none());
    }
}
