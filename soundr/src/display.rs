//! Renders the estimates as a single status line in the terminal.
//!
//! Green while locking on, blue while only listening. The arrow gets picked from
//! the smoothed angle, it doesn't point to the sound source.

use std::io::{self, Write};

use colored::Colorize;
use soundr_audio::Estimate;

use crate::config::DisplayConfig;

const ARROWS: [char; 8] = ['↑', '↗', '→', '↘', '↓', '↙', '←', '↖'];

/// Base rotation of the drawn arrow in degrees.
const ARROW_OFFSET: f64 = 45.;

pub struct Display {
    color: bool,
    // width of the last line, to wipe leftovers of longer lines
    last_width: usize,
}

impl Display {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            color: config.color,
            last_width: 0,
        }
    }

    pub fn show(&mut self, estimate: &Estimate) -> io::Result<()> {
        let line = status_line(estimate, self.color);
        let width = line.chars().count();
        let padding = self.last_width.saturating_sub(width);
        self.last_width = width;

        let mut stdout = io::stdout().lock();
        write!(stdout, "\r{}{}", line, " ".repeat(padding))?;
        stdout.flush()
    }

    /// Moves the cursor below the status line.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.last_width > 0 {
            self.last_width = 0;
            writeln!(io::stdout())?;
        }

        Ok(())
    }
}

pub fn arrow(angle_degrees: f64) -> char {
    let angle = (angle_degrees + ARROW_OFFSET).rem_euclid(360.);
    let idx = ((angle + 22.5) / 45.) as usize % ARROWS.len();
    ARROWS[idx]
}

pub fn status_line(estimate: &Estimate, color: bool) -> String {
    let state = if estimate.is_locking_on {
        "LOCKING ON"
    } else {
        "listening "
    };
    let distance = format!("{:.2} meters", estimate.distance_meters);

    let (state, distance) = match (color, estimate.is_locking_on) {
        (false, _) => (state.to_string(), distance),
        (true, true) => (
            state.green().bold().to_string(),
            distance.green().to_string(),
        ),
        (true, false) => (state.blue().to_string(), distance),
    };

    format!(
        "{} {} {:>8.1}°  {}",
        state,
        arrow(estimate.angle_degrees),
        estimate.angle_degrees,
        distance
    )
}
