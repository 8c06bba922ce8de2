//! Terminal display and input handling
//!
//! Presents a published [`Image`] with half-block characters: each character
//! cell carries two vertically stacked pixels, the upper one as foreground and
//! the lower one as background color.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, stdout, BufWriter, Stdout, Write};
use std::time::{Duration, Instant};

use crate::color::{rgb_to_256color, unpack_rgb};
use crate::image::{Image, ImageSurface};

/// Rows reserved below the image for the status line
const STATUS_ROWS: u16 = 2;

/// Convert an image to half-block text with 256-color ANSI codes
pub fn to_halfblock(image: &Image) -> String {
    let width = image.width();
    let height = image.height();

    let output_height = height.div_ceil(2);
    let mut result = String::with_capacity(width as usize * output_height as usize * 15);

    // Last emitted palette indices, to skip redundant escape codes
    let mut last_fg: Option<u8> = None;
    let mut last_bg: Option<u8> = None;

    let palette_index = |x: u32, y: u32| {
        image.pixel(x, y).map(|p| {
            let (r, g, b) = unpack_rgb(p);
            rgb_to_256color(r, g, b)
        })
    };

    for row in 0..output_height {
        let top_y = row * 2;
        for x in 0..width {
            let top = palette_index(x, top_y).unwrap_or(16);
            // Odd heights leave the last lower half black
            let bottom = palette_index(x, top_y + 1).unwrap_or(16);

            let fg_changed = last_fg != Some(top);
            let bg_changed = last_bg != Some(bottom);

            if fg_changed && bg_changed {
                result.push_str(&format!("\x1b[38;5;{};48;5;{}m", top, bottom));
            } else if fg_changed {
                result.push_str(&format!("\x1b[38;5;{}m", top));
            } else if bg_changed {
                result.push_str(&format!("\x1b[48;5;{}m", bottom));
            }
            last_fg = Some(top);
            last_bg = Some(bottom);

            result.push('\u{2580}');
        }
        result.push('\n');
    }

    result.push_str("\x1b[0m");
    result
}

/// Terminal display handler with buffered output
pub struct TerminalDisplay {
    width: u16,
    height: u16,
    last_resize_check: Instant,
    buffer: BufWriter<Stdout>,
}

impl TerminalDisplay {
    pub fn new() -> io::Result<Self> {
        // Built before touching terminal modes so Drop restores them on any failure below
        let mut display = Self {
            width: 0,
            height: 0,
            last_resize_check: Instant::now(),
            buffer: BufWriter::new(stdout()),
        };

        // Enter alternate screen first to get accurate dimensions
        execute!(display.buffer, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(display.buffer, terminal::Clear(terminal::ClearType::All))?;

        let (width, height) = terminal::size()?;
        display.width = width;
        display.height = height.saturating_sub(STATUS_ROWS);

        Ok(display)
    }

    /// Character cells available for the image
    pub fn get_size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    /// Pixel dimensions the renderer should use for this terminal
    pub fn render_size(&self) -> (u32, u32) {
        let (width, height) = self.get_size();
        (
            width.max(crate::MIN_DIMENSION),
            (height * 2).max(crate::MIN_DIMENSION),
        )
    }

    /// Check if terminal has been resized
    pub fn check_resize(&mut self) -> bool {
        if self.last_resize_check.elapsed() < Duration::from_millis(100) {
            return false;
        }
        self.last_resize_check = Instant::now();

        if let Ok((new_width, new_height)) = terminal::size() {
            let new_height = new_height.saturating_sub(STATUS_ROWS);
            if new_width != self.width || new_height != self.height {
                self.width = new_width;
                self.height = new_height;
                return true;
            }
        }
        false
    }

    /// Draw an image followed by a status line
    pub fn present(&mut self, image: &Image, status: &str) -> io::Result<()> {
        let content = to_halfblock(image);

        // Hide cursor and disable line wrap while drawing
        write!(self.buffer, "\x1b[?25l\x1b[?7l")?;

        // Explicit positioning keeps an overlong line from shifting the rest
        for (i, line) in content.lines().enumerate() {
            write!(self.buffer, "\x1b[{};1H{}", i + 1, line)?;
        }

        // Clear leftovers from a larger previous frame
        write!(self.buffer, "\x1b[J")?;

        let status_row = content.lines().count() + 1;
        write!(self.buffer, "\x1b[{};1H\x1b[0m\x1b[K{}", status_row, status)?;

        write!(self.buffer, "\x1b[?25h\x1b[?7h")?;
        self.buffer.flush()
    }

    /// Check for keyboard input
    pub fn poll_input(&self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if event::poll(timeout)? {
            if let Event::Key(key_event) = event::read()? {
                return Ok(Some(key_event));
            }
        }
        Ok(None)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = self.buffer.flush();
        let _ = execute!(stdout(), LeaveAlternateScreen);
    }
}

/// Key actions for the interactive viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    Quit,
    NextMode,
    Pause,
}

/// Parse keyboard input into actions
pub fn parse_key_event(event: KeyEvent) -> Action {
    match event.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('m') | KeyCode::Tab => Action::NextMode,
        KeyCode::Char(' ') => Action::Pause,
        _ => Action::None,
    }
}
