// SPDX-License-Identifier: GPL-3.0-only

//! Terminal frontend
//!
//! Renders the annotated camera feed with Unicode half-block characters for
//! improved vertical resolution. Overlay labels are placed in the cell that
//! covers their pixel anchor. When face mode finds a face, the crop is shown
//! in a side panel.

use crate::app::frontend::Frontend;
use crate::app::overlay::{Overlay, OverlayLabel};
use crate::app::state::Command;
use crate::backends::camera::types::Frame;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbImage;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Widget},
};
use std::io::{self, Stdout, stdout};
use std::time::Duration;
use tracing::debug;

const STATUS_HINT: &str = "r record | c capture | f face mode | q quit";

/// Raw-mode terminal session; restored on drop
pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    face_visible: bool,
}

impl TerminalFrontend {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            face_visible: false,
        })
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

impl Frontend for TerminalFrontend {
    fn present(&mut self, overlay: &Overlay, face: Option<&Frame>) -> io::Result<()> {
        if face.is_some() {
            self.face_visible = true;
        }
        let show_face = self.face_visible;

        self.terminal.draw(|f| {
            let area = f.area();
            let [content, status] =
                Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);

            let camera_area = if show_face {
                let [camera, side] = Layout::horizontal([
                    Constraint::Percentage(70),
                    Constraint::Percentage(30),
                ])
                .areas(content);
                let block = Block::bordered().title(" Face ");
                let inner = block.inner(side);
                f.render_widget(block, side);
                f.render_widget(
                    ImageWidget {
                        image: face.map(|frame| &frame.image),
                        labels: &[],
                        placeholder: "No face",
                    },
                    inner,
                );
                camera
            } else {
                content
            };

            f.render_widget(
                ImageWidget {
                    image: Some(&overlay.image),
                    labels: &overlay.labels,
                    placeholder: "Waiting for camera...",
                },
                camera_area,
            );
            f.render_widget(StatusBar { message: STATUS_HINT }, status);
        })?;
        Ok(())
    }

    fn hide_face_preview(&mut self) -> io::Result<()> {
        debug!("Hiding face preview");
        self.face_visible = false;
        Ok(())
    }

    fn poll_command(&mut self, timeout: Duration) -> io::Result<Option<Command>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(Some(Command::Quit));
                }
                Ok(match key.code {
                    KeyCode::Esc => Some(Command::Quit),
                    KeyCode::Char(c) => Command::from_key(c),
                    _ => None,
                })
            }
            _ => Ok(None),
        }
    }
}

/// Cells covered by an image of `width`x`height` pixels fitted into `area`
///
/// Each cell shows two vertical pixels.
pub fn fit_image(width: u32, height: u32, area: Rect) -> Rect {
    if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }
    let aspect = width as f64 / height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height as f64) * 2.0;

    let (w, h) = if term_width / term_height > aspect {
        // Terminal is wider - fit to height
        (term_height * aspect, term_height)
    } else {
        // Terminal is taller - fit to width
        (term_width, term_width / aspect)
    };
    let display_width = (w as u16).clamp(1, area.width);
    let display_height = ((h / 2.0) as u16).clamp(1, area.height);

    Rect::new(
        area.x + (area.width - display_width) / 2,
        area.y + (area.height - display_height) / 2,
        display_width,
        display_height,
    )
}

/// Cell holding the pixel `(x, y)` of an image shown in `target`
pub fn pixel_to_cell(x: u32, y: u32, width: u32, height: u32, target: Rect) -> (u16, u16) {
    let cx = (x as u64 * target.width as u64 / width.max(1) as u64) as u16;
    let cy = (y as u64 * target.height as u64 / height.max(1) as u64) as u16;
    (
        target.x + cx.min(target.width.saturating_sub(1)),
        target.y + cy.min(target.height.saturating_sub(1)),
    )
}

/// Renders an image using half-block characters, with optional text labels
struct ImageWidget<'a> {
    image: Option<&'a RgbImage>,
    labels: &'a [OverlayLabel],
    placeholder: &'a str,
}

impl Widget for ImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.image else {
            let x = area.x + (area.width.saturating_sub(self.placeholder.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, self.placeholder, Style::default());
            }
            return;
        };

        let (width, height) = image.dimensions();
        let target = fit_image(width, height, area);
        if target.width == 0 || target.height == 0 {
            return;
        }

        let x_scale = width as f64 / target.width as f64;
        let y_scale = height as f64 / (target.height as f64 * 2.0);

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..target.height {
            for tx in 0..target.width {
                let src_x = ((tx as f64 * x_scale) as u32).min(width - 1);
                let src_top = ((ty as f64 * 2.0 * y_scale) as u32).min(height - 1);
                let src_bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(height - 1);

                if let Some(cell) = buf.cell_mut((target.x + tx, target.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(to_color(image.get_pixel(src_x, src_top).0));
                    cell.set_bg(to_color(image.get_pixel(src_x, src_bottom).0));
                }
            }
        }

        for label in self.labels {
            let (x, y) = pixel_to_cell(label.x, label.y, width, height, target);
            let room = (target.x + target.width).saturating_sub(x) as usize;
            let text: String = label.text.chars().take(room).collect();
            buf.set_string(
                x,
                y,
                text,
                Style::default().fg(to_color(label.color)).bg(Color::Black),
            );
        }
    }
}

fn to_color([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fit_wide_image_into_square_area() {
        // 80 cells wide, 40 rows = 80 pixel rows; 2:1 image fits to width
        let target = fit_image(200, 100, Rect::new(0, 0, 80, 40));
        assert_eq!(target.width, 80);
        assert_eq!(target.height, 20);
        assert_eq!(target.y, 10);
    }

    #[test]
    fn test_fit_tall_image_centers_horizontally() {
        let target = fit_image(100, 200, Rect::new(0, 0, 80, 20));
        assert_eq!(target.height, 20);
        assert_eq!(target.width, 20);
        assert_eq!(target.x, 30);
    }

    #[test]
    fn test_fit_empty_area() {
        let target = fit_image(100, 100, Rect::new(3, 4, 0, 0));
        assert_eq!((target.width, target.height), (0, 0));
    }

    #[test]
    fn test_pixel_to_cell_clamps_to_target() {
        let target = Rect::new(5, 2, 40, 10);
        assert_eq!(pixel_to_cell(0, 0, 400, 200, target), (5, 2));
        assert_eq!(pixel_to_cell(200, 100, 400, 200, target), (25, 7));
        assert_eq!(pixel_to_cell(400, 200, 400, 200, target), (44, 11));
    }

    #[test]
    fn test_image_widget_draws_labels() {
        let image = RgbImage::from_pixel(80, 40, Rgb([10, 20, 30]));
        let labels = [OverlayLabel {
            x: 0,
            y: 0,
            text: "REC".into(),
            color: [255, 0, 0],
        }];
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        ImageWidget {
            image: Some(&image),
            labels: &labels,
            placeholder: "",
        }
        .render(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "R");
        assert_eq!(buf[(0, 0)].fg, Color::Rgb(255, 0, 0));
        assert_eq!(buf[(10, 10)].symbol(), "▀");
        assert_eq!(buf[(10, 10)].fg, Color::Rgb(10, 20, 30));
    }
}
